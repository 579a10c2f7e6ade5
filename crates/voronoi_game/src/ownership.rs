//! Cell ownership derived from the players' pull fields.

use ndarray::Array2;
use tracing::{debug, instrument};

use crate::pull::PullField;
use crate::types::{Cell, PlayerId};

/// Index of the greatest value, keeping the first one on exact ties.
pub fn argmax_first(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, value) in values.into_iter().enumerate() {
        match best {
            Some((_, top)) if value <= top => {}
            _ => best = Some((index, value)),
        }
    }
    best.map(|(index, _)| index)
}

/// Per-cell owner and per-player cell counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ownership {
    /// Owning player id per cell; `0` until the first recompute.
    grid: Array2<u8>,
    /// Owned cells per player slot.
    counts: Vec<u64>,
}

impl Ownership {
    /// Creates an ownership map in which nothing is owned yet.
    pub fn new(grid_size: usize, num_players: usize) -> Self {
        Self {
            grid: Array2::zeros((grid_size, grid_size)),
            counts: vec![0; num_players],
        }
    }

    /// Reassigns every cell to the player with the greatest pull.
    ///
    /// Exact ties go to the lowest player id.
    #[instrument(skip_all, fields(players = fields.len()))]
    pub fn recompute(&mut self, fields: &[PullField]) {
        if fields.is_empty() {
            return;
        }

        self.counts = vec![0; fields.len()];
        for ((i, j), owner) in self.grid.indexed_iter_mut() {
            let best = argmax_first(fields.iter().map(|f| f.values()[[i, j]])).unwrap_or(0);
            *owner = PlayerId::from_index(best).map_or(0, PlayerId::get);
            self.counts[best] += 1;
        }

        debug!(counts = ?self.counts, "Ownership recomputed");
    }

    /// Owner of a cell, or `None` before any stone has been placed.
    pub fn owner(&self, cell: Cell) -> Option<PlayerId> {
        self.grid.get(cell.ix()).copied().and_then(PlayerId::new)
    }

    /// Cells owned by `player`.
    pub fn count(&self, player: PlayerId) -> u64 {
        self.counts.get(player.index()).copied().unwrap_or(0)
    }

    /// Cell counts in player order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Raw owner matrix.
    pub fn grid(&self) -> &Array2<u8> {
        &self.grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argmax_first_prefers_lowest_index_on_tie() {
        assert_eq!(argmax_first([0.5, 1.0, 1.0]), Some(1));
        assert_eq!(argmax_first([2.0, 2.0]), Some(0));
        assert_eq!(argmax_first(std::iter::empty()), None);
    }

    #[test]
    fn test_unplayed_player_owns_nothing() {
        let mut fields = vec![PullField::new(5), PullField::new(5)];
        fields[1].accumulate(Cell::new(0, 0));

        let mut ownership = Ownership::new(5, 2);
        ownership.recompute(&fields);

        assert_eq!(ownership.count(PlayerId::FIRST), 0);
        assert_eq!(ownership.count(PlayerId::new(2).unwrap()), 25);
    }

    #[test]
    fn test_nothing_owned_before_recompute() {
        let ownership = Ownership::new(3, 2);
        assert_eq!(ownership.owner(Cell::new(1, 1)), None);
        assert_eq!(ownership.total(), 0);
    }
}
