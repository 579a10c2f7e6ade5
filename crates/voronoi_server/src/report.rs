//! End-of-game reporting.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{info, instrument, warn};
use voronoi_game::GameSummary;

/// Logs every player's final score and the winner or tie set.
pub fn log_results(summary: &GameSummary) {
    for result in summary.players() {
        info!(
            player = %result.player,
            name = %result.name,
            score = %result.score,
            "Final score"
        );
    }

    match summary.winner_names().as_slice() {
        [] => warn!("No winner: every player was eliminated"),
        [winner] => info!("Winner: {winner}"),
        tied => info!("Tied between: {}", tied.join(", ")),
    }
}

/// Writes the summary as pretty JSON.
#[instrument(skip(summary), fields(path = %path.display()))]
pub fn write_json(summary: &GameSummary, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(summary)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!("Summary written");
    Ok(())
}
