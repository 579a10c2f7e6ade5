//! Inverse-square pull fields.
//!
//! Every stone exerts a pull of `1 / d²` on each cell, where `d` is the
//! Euclidean distance between the cell and the stone. A player's
//! [`PullField`] is the sum of the pulls of all of that player's stones.

use ndarray::Array2;
use tracing::{instrument, trace};

use crate::types::Cell;

/// Pull assigned to the stone's own cell in place of `1 / 0`.
///
/// Large enough that no finite sum of other pulls can exceed it, so the
/// placer always owns its stone's cell.
pub const SELF_PULL: f64 = 1e31;

/// Pull exerted on `(row, col)` by a stone at `stone`.
pub fn pull_at(row: usize, col: usize, stone: Cell) -> f64 {
    let dr = row.abs_diff(stone.row) as f64;
    let dc = col.abs_diff(stone.col) as f64;
    let squared = dr * dr + dc * dc;
    if squared == 0.0 { SELF_PULL } else { squared.recip() }
}

/// Computes the full pull matrix of a single stone on a square grid.
#[instrument]
pub fn compute_pull(grid_size: usize, stone: Cell) -> Array2<f64> {
    Array2::from_shape_fn((grid_size, grid_size), |(i, j)| pull_at(i, j, stone))
}

/// Accumulated pull of one player's stones over every cell.
#[derive(Debug, Clone, PartialEq)]
pub struct PullField {
    values: Array2<f64>,
}

impl PullField {
    /// Creates an all-zero field.
    pub fn new(grid_size: usize) -> Self {
        Self {
            values: Array2::zeros((grid_size, grid_size)),
        }
    }

    /// Adds the pull of a stone at `stone` into this field.
    #[instrument(skip(self), fields(stone = %stone))]
    pub fn accumulate(&mut self, stone: Cell) {
        for ((i, j), value) in self.values.indexed_iter_mut() {
            *value += pull_at(i, j, stone);
        }
        trace!("Pull accumulated");
    }

    /// Pull at a single cell.
    pub fn at(&self, cell: Cell) -> f64 {
        self.values[cell.ix()]
    }

    /// The underlying matrix.
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pull_is_inverse_square() {
        let stone = Cell::new(2, 2);
        assert_eq!(pull_at(2, 4, stone), 0.25);
        assert_eq!(pull_at(5, 6, stone), 1.0 / 25.0);
        assert_eq!(pull_at(2, 2, stone), SELF_PULL);
    }

    #[test]
    fn test_accumulate_matches_compute_pull() {
        let mut field = PullField::new(6);
        field.accumulate(Cell::new(1, 1));
        assert_eq!(field.values(), &compute_pull(6, Cell::new(1, 1)));

        field.accumulate(Cell::new(4, 4));
        let expected = compute_pull(6, Cell::new(1, 1)) + compute_pull(6, Cell::new(4, 4));
        assert_eq!(field.values(), &expected);
    }

    #[test]
    fn test_self_pull_dominates_any_neighbourhood() {
        // Every other cell of a large grid pulling at once stays below SELF_PULL.
        let grid_size = 1000usize;
        let bound = (grid_size * grid_size) as f64;
        assert!(bound < SELF_PULL);
    }
}
