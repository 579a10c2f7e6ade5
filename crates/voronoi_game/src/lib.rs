//! Voronoi stone game - pure game logic.
//!
//! Players take turns placing stones on a square grid. Every cell belongs
//! to the player whose stones pull on it hardest, where a stone's pull is
//! the inverse square of its distance. A player's score is the number of
//! cells it owns.
//!
//! # Architecture
//!
//! - **PullField**: per-player inverse-square accumulator ([`pull`])
//! - **Ownership**: argmax over pull fields, lowest id wins ties ([`ownership`])
//! - **MoveValidator**: bounds, occupancy and minimum separation ([`validation`])
//! - **TimeTracker**: per-player clocks charged after each request ([`clock`])
//! - **TurnMessage**: per-player state and move delta on the wire ([`protocol`])
//! - **Game**: the turn state machine tying these together ([`engine`])
//!
//! This crate performs no I/O; see `voronoi_server` for the networked engine.

#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod engine;
pub mod invariants;
pub mod ownership;
pub mod protocol;
pub mod pull;
pub mod summary;
pub mod types;
pub mod validation;

pub use clock::{RequestToken, TimeTracker};
pub use config::{
    DEFAULT_GRID_SIZE, DEFAULT_MIN_DIST, DEFAULT_TIME_BUDGET_SECS, GameConfig, MAX_PLAYERS,
};
pub use engine::{Ending, Game, GameError, GameState, TurnOutcome, Violation, winners};
pub use invariants::{GameInvariants, Invariant, InvariantSet, InvariantViolation};
pub use ownership::Ownership;
pub use protocol::{Handshake, Placement, ProtocolError, TurnMessage, VisualFrame};
pub use pull::{PullField, SELF_PULL, compute_pull};
pub use summary::{GameSummary, PlayerResult};
pub use types::{Board, Cell, PlayerId, Proposal, Score, Stone};
pub use validation::{MoveError, MoveValidator, distance};
