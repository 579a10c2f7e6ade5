//! Move legality: bounds, occupancy and minimum stone separation.

use derive_more::{Display, Error};
use tracing::{instrument, warn};

use crate::types::{Board, Cell, Proposal, Stone};

/// Why a proposed move was rejected.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum MoveError {
    /// Coordinates fall outside the grid.
    #[display("({}, {}) is out of bounds", proposal.row, proposal.col)]
    OutOfBounds {
        /// The rejected proposal.
        proposal: Proposal,
    },

    /// The cell already holds a stone.
    #[display("{cell} is already occupied")]
    Occupied {
        /// The occupied cell.
        cell: Cell,
    },

    /// The cell is closer than the minimum distance to an existing stone.
    #[display("{cell} is {distance:.3} units from {}, closer than {min_dist}", stone.cell)]
    TooClose {
        /// The proposed cell.
        cell: Cell,
        /// The first stone found within range, of any player.
        stone: Stone,
        /// Distance between the two.
        distance: f64,
        /// Configured minimum separation.
        min_dist: f64,
    },
}

/// Euclidean distance between two cells.
pub fn distance(a: Cell, b: Cell) -> f64 {
    let dr = a.row.abs_diff(b.row) as f64;
    let dc = a.col.abs_diff(b.col) as f64;
    (dr * dr + dc * dc).sqrt()
}

/// Checks proposals against the board and the full stone history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveValidator {
    grid_size: usize,
    min_dist: f64,
}

impl MoveValidator {
    /// Creates a validator for a `grid_size` board. A `min_dist` of zero
    /// disables the separation rule.
    pub fn new(grid_size: usize, min_dist: f64) -> Self {
        Self {
            grid_size,
            min_dist,
        }
    }

    /// Validates a proposal, returning the in-bounds cell on success.
    ///
    /// Checks run in order: bounds, occupancy, then distance to every
    /// previous stone regardless of owner.
    ///
    /// # Errors
    ///
    /// Returns the first [`MoveError`] encountered.
    #[instrument(skip(self, board, history), fields(history = history.len()))]
    pub fn check(
        &self,
        proposal: Proposal,
        board: &Board,
        history: &[Stone],
    ) -> Result<Cell, MoveError> {
        let cell = Cell::checked(proposal.row, proposal.col, self.grid_size)
            .ok_or(MoveError::OutOfBounds { proposal })?;

        if !board.is_empty(cell) {
            return Err(MoveError::Occupied { cell });
        }

        if let Some((stone, distance)) = history
            .iter()
            .map(|stone| (*stone, distance(cell, stone.cell)))
            .find(|(_, d)| *d < self.min_dist)
        {
            return Err(MoveError::TooClose {
                cell,
                stone,
                distance,
                min_dist: self.min_dist,
            });
        }

        Ok(cell)
    }

    /// Boolean form of [`MoveValidator::check`]; logs the rejection reason.
    pub fn is_legal(&self, proposal: Proposal, board: &Board, history: &[Stone]) -> bool {
        match self.check(proposal, board, history) {
            Ok(_) => true,
            Err(error) => {
                warn!(%proposal, %error, "Illegal move");
                false
            }
        }
    }

    /// Configured minimum separation.
    pub fn min_dist(&self) -> f64 {
        self.min_dist
    }

    /// Configured grid side.
    pub fn grid_size(&self) -> usize {
        self.grid_size
    }
}
