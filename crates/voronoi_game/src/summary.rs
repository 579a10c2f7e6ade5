//! End-of-game result record.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};

use crate::engine::Game;
use crate::protocol::Placement;
use crate::types::{PlayerId, Score};

/// Final standing of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerResult {
    /// 1-based id.
    pub player: PlayerId,
    /// Name the player gave at connect time.
    pub name: String,
    /// Final score, as on the wire.
    pub score: Score,
    /// Whether the player is among the winners.
    pub winner: bool,
}

/// Outcome of a finished game: who played, how it scored, every move.
///
/// This records results only; it cannot be loaded back into a [`Game`].
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct GameSummary {
    grid_size: usize,
    num_stones: usize,
    players: Vec<PlayerResult>,
    winners: Vec<PlayerId>,
    moves: Vec<Placement>,
}

impl GameSummary {
    /// Builds the summary of `game`. Missing names fall back to `player<N>`.
    pub fn from_game(game: &Game, names: &[String]) -> Self {
        let winners = game.winners();
        let players = game
            .players()
            .iter()
            .map(|&player| PlayerResult {
                player,
                name: names
                    .get(player.index())
                    .cloned()
                    .unwrap_or_else(|| format!("player{player}")),
                score: game.scores()[player.index()],
                winner: winners.contains(&player),
            })
            .collect();

        Self {
            grid_size: *game.config().grid_size(),
            num_stones: *game.config().num_stones(),
            players,
            winners,
            moves: game.history().iter().map(Placement::from).collect(),
        }
    }

    /// Names of the winners, in player order.
    pub fn winner_names(&self) -> Vec<&str> {
        self.players
            .iter()
            .filter(|result| result.winner)
            .map(|result| result.name.as_str())
            .collect()
    }
}
