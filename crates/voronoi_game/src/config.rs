//! Fixed parameters of one game.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::engine::GameError;

/// Default side length of the grid.
pub const DEFAULT_GRID_SIZE: usize = 1000;
/// Default minimum distance between any two stones.
pub const DEFAULT_MIN_DIST: f64 = 66.0;
/// Default per-player time budget, in seconds.
pub const DEFAULT_TIME_BUDGET_SECS: f64 = 120.0;
/// Player ids are stored in `u8` grid cells, with `0` meaning "none".
pub const MAX_PLAYERS: usize = u8::MAX as usize;

/// Parameters fixed at game start.
#[derive(Debug, Clone, PartialEq, Getters, Serialize, Deserialize)]
pub struct GameConfig {
    /// Number of players.
    num_players: usize,
    /// Stones each player places.
    num_stones: usize,
    /// Side length of the square grid.
    grid_size: usize,
    /// Minimum Euclidean distance between any two stones.
    min_dist: f64,
    /// Starting clock per player, in seconds.
    time_budget_secs: f64,
}

impl GameConfig {
    /// Creates a configuration with default grid, distance and clock.
    pub fn new(num_players: usize, num_stones: usize) -> Self {
        Self {
            num_players,
            num_stones,
            grid_size: DEFAULT_GRID_SIZE,
            min_dist: DEFAULT_MIN_DIST,
            time_budget_secs: DEFAULT_TIME_BUDGET_SECS,
        }
    }

    /// Overrides the grid side length.
    pub fn with_grid_size(mut self, grid_size: usize) -> Self {
        self.grid_size = grid_size;
        self
    }

    /// Overrides the minimum stone separation.
    pub fn with_min_dist(mut self, min_dist: f64) -> Self {
        self.min_dist = min_dist;
        self
    }

    /// Overrides the per-player time budget.
    pub fn with_time_budget_secs(mut self, time_budget_secs: f64) -> Self {
        self.time_budget_secs = time_budget_secs;
        self
    }

    /// Upper bound on moves: every player places every stone.
    pub fn total_moves(&self) -> usize {
        self.num_players * self.num_stones
    }

    /// Checks that the parameters describe a playable game.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidParameter`] naming the first bad field.
    #[instrument]
    pub fn validate(&self) -> Result<(), GameError> {
        let invalid = |name: &'static str, reason: &str| -> Result<(), GameError> {
            Err(GameError::InvalidParameter {
                name,
                reason: reason.to_string(),
            })
        };

        if self.num_players == 0 {
            return invalid("num_players", "at least one player is required");
        }
        if self.num_players > MAX_PLAYERS {
            return invalid("num_players", "at most 255 players are supported");
        }
        if self.num_stones == 0 {
            return invalid("num_stones", "each player needs at least one stone");
        }
        if self.grid_size == 0 {
            return invalid("grid_size", "grid must have at least one cell");
        }
        if !self.min_dist.is_finite() || self.min_dist < 0.0 {
            return invalid("min_dist", "must be a finite, non-negative distance");
        }
        if !self.time_budget_secs.is_finite() {
            return invalid("time_budget_secs", "must be finite");
        }
        Ok(())
    }
}
