//! Voronoi - unified CLI
//!
//! `serve` runs the game engine; `agent` runs the reference random player.

#![warn(missing_docs)]

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use voronoi_game::Game;
use voronoi_server::cli::{Cli, Command};
use voronoi_server::{
    AgentClient, GameEngine, RandomStrategy, ServerConfig, Strategy, TcpSessions, VisualFeed,
    report,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            num_stones,
            num_players,
            host,
            port,
            visualize,
            config,
            summary_json,
        } => {
            run_server(
                num_stones,
                num_players,
                host,
                port,
                visualize,
                config,
                summary_json,
            )
            .await
        }
        Command::Agent { host, port, name } => run_agent(host, port, name).await,
    }
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,voronoi_server=debug,voronoi_game=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the game engine
#[instrument(skip(config_path, summary_json))]
async fn run_server(
    num_stones: usize,
    num_players: usize,
    host: String,
    port: u16,
    visualize: bool,
    config_path: Option<PathBuf>,
    summary_json: Option<PathBuf>,
) -> Result<()> {
    let config = ServerConfig::load(config_path.as_deref())?;
    let game = Game::new(config.game_config(num_players, num_stones))?;

    let sessions = TcpSessions::bind((host.as_str(), port)).await?;
    let feed = if visualize {
        VisualFeed::connect(config.display_addr()).await
    } else {
        VisualFeed::disabled()
    };

    let mut engine = GameEngine::new(game, sessions).with_feed(feed);
    let summary = engine.run().await?;

    report::log_results(&summary);
    if let Some(path) = summary_json {
        report::write_json(&summary, &path)?;
    }
    Ok(())
}

/// Run the reference agent
#[instrument]
async fn run_agent(host: String, port: u16, name: Option<String>) -> Result<()> {
    let mut strategy = RandomStrategy::new();
    let name = name.unwrap_or_else(|| format!("{}-{}", strategy.name(), std::process::id()));

    let mut client = AgentClient::connect((host.as_str(), port), &name).await?;
    let message = client.play(&mut strategy).await?;
    info!(%message, "Agent finished");
    Ok(())
}
