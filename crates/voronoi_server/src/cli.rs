//! Command-line interface for voronoi.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Voronoi - inverse-square territory game over TCP
#[derive(Parser, Debug)]
#[command(name = "voronoi")]
#[command(about = "Game engine and reference agent for the Voronoi stone game", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game engine and wait for players
    Serve {
        /// Stones each player places
        num_stones: usize,

        /// Number of players to wait for
        num_players: usize,

        /// Host to bind to
        host: String,

        /// Port to bind to
        port: u16,

        /// Stream board updates to the display address from the config
        #[arg(long)]
        visualize: bool,

        /// Path to a TOML config file (defaults to voronoi.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Write the game summary as JSON to this path
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Run the reference random agent
    Agent {
        /// Engine host
        host: String,

        /// Engine port
        port: u16,

        /// Name to play under
        #[arg(short, long)]
        name: Option<String>,
    },
}
