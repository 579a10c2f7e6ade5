//! Networked engine and reference agent for the Voronoi stone game.
//!
//! The engine accepts one TCP connection per player, runs the turn loop
//! from [`orchestrator`] over [`session::TcpSessions`] and reports the
//! result. Game rules live in `voronoi_game`.

#![warn(missing_docs)]

pub mod agent;
pub mod cli;
pub mod config;
pub mod orchestrator;
pub mod report;
pub mod session;
pub mod visualization;

pub use agent::{AgentClient, AgentView, RandomStrategy, Strategy};
pub use config::{ConfigError, ServerConfig};
pub use orchestrator::{GameEngine, GameEvent};
pub use session::{PlayerSessions, TcpSessions};
pub use visualization::VisualFeed;
