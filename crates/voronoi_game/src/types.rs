//! Core domain types: players, cells, stones, scores and the stone grid.

use derive_more::Display;
use derive_new::new;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::instrument;

use crate::validation::MoveError;

/// A 1-based player identifier, as used on the wire and in grids.
///
/// Grid cells store `0` for "no player", so the id itself is never zero.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize,
)]
#[display("{_0}")]
#[serde(try_from = "u8", into = "u8")]
pub struct PlayerId(u8);

impl PlayerId {
    /// The player who moves first.
    pub const FIRST: Self = Self(1);

    /// Creates an id from its 1-based wire value. Zero is rejected.
    pub const fn new(id: u8) -> Option<Self> {
        if id == 0 { None } else { Some(Self(id)) }
    }

    /// Creates an id from a 0-based slot index.
    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index + 1).ok().map(Self)
    }

    /// Returns the 1-based wire value.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Returns the 0-based slot index.
    pub const fn index(self) -> usize {
        self.0 as usize - 1
    }
}

impl TryFrom<u8> for PlayerId {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or_else(|| "player id must be non-zero".to_string())
    }
}

impl From<PlayerId> for u8 {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl FromStr for PlayerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s.parse().map_err(|e| format!("{e}"))?;
        Self::try_from(raw)
    }
}

/// A cell that lies inside the grid.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize, new,
)]
#[display("({row}, {col})")]
pub struct Cell {
    /// Row index, `0..grid_size`.
    pub row: usize,
    /// Column index, `0..grid_size`.
    pub col: usize,
}

impl Cell {
    /// Converts signed coordinates into a cell, or `None` when outside a
    /// `grid_size × grid_size` grid.
    pub fn checked(row: i64, col: i64, grid_size: usize) -> Option<Self> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        (row < grid_size && col < grid_size).then_some(Self { row, col })
    }

    /// Index pair for `ndarray` access.
    pub const fn ix(self) -> [usize; 2] {
        [self.row, self.col]
    }
}

/// A move as proposed by a player, before any validation.
///
/// Coordinates are signed so that negative input survives parsing and is
/// rejected by bounds checking instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize, new)]
#[display("{row} {col}")]
pub struct Proposal {
    /// Proposed row.
    pub row: i64,
    /// Proposed column.
    pub col: i64,
}

impl From<Cell> for Proposal {
    fn from(cell: Cell) -> Self {
        // Grid sides are far below i64::MAX.
        Self {
            row: cell.row as i64,
            col: cell.col as i64,
        }
    }
}

/// An accepted, immutable stone placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
pub struct Stone {
    /// Where the stone sits.
    pub cell: Cell,
    /// Who placed it.
    pub player: PlayerId,
    /// 0-based position in the move log.
    pub sequence: usize,
}

impl std::fmt::Display for Stone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} player {} at {}", self.sequence, self.player, self.cell)
    }
}

/// A player's score: owned cell count, or an elimination sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum Score {
    /// Number of grid cells owned.
    Cells(u64),
    /// Eliminated for an illegal or malformed move (`-1` on the wire).
    IllegalMove,
    /// Eliminated for exhausting the time budget (`-2` on the wire).
    Timeout,
}

impl Score {
    /// Wire value of the illegal-move sentinel.
    pub const ILLEGAL_MOVE: i64 = -1;
    /// Wire value of the timeout sentinel.
    pub const TIMEOUT: i64 = -2;

    /// Returns the integer sent on the wire.
    pub fn wire_value(self) -> i64 {
        match self {
            Score::Cells(n) => i64::try_from(n).unwrap_or(i64::MAX),
            Score::IllegalMove => Self::ILLEGAL_MOVE,
            Score::Timeout => Self::TIMEOUT,
        }
    }

    /// Returns the owned cell count, or `None` for a sentinel.
    pub fn cells(self) -> Option<u64> {
        match self {
            Score::Cells(n) => Some(n),
            Score::IllegalMove | Score::Timeout => None,
        }
    }

    /// Whether this score marks an eliminated player.
    pub fn is_eliminated(self) -> bool {
        self.cells().is_none()
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::Cells(0)
    }
}

impl std::fmt::Display for Score {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.wire_value())
    }
}

impl From<Score> for i64 {
    fn from(score: Score) -> Self {
        score.wire_value()
    }
}

impl TryFrom<i64> for Score {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            Self::ILLEGAL_MOVE => Ok(Score::IllegalMove),
            Self::TIMEOUT => Ok(Score::Timeout),
            n => u64::try_from(n)
                .map(Score::Cells)
                .map_err(|_| format!("unknown score sentinel {n}")),
        }
    }
}

/// Square grid of placed stones.
///
/// A cell holds the placing player's id, or `0` when empty. Cells are
/// append-only: once a stone is placed it is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: Array2<u8>,
}

impl Board {
    /// Creates an empty `grid_size × grid_size` board.
    #[instrument]
    pub fn new(grid_size: usize) -> Self {
        Self {
            cells: Array2::zeros((grid_size, grid_size)),
        }
    }

    /// Side length of the board.
    pub fn size(&self) -> usize {
        self.cells.nrows()
    }

    /// Returns the player whose stone occupies `cell`, if any.
    pub fn stone_at(&self, cell: Cell) -> Option<PlayerId> {
        self.cells.get(cell.ix()).copied().and_then(PlayerId::new)
    }

    /// Whether `cell` is free of stones.
    pub fn is_empty(&self, cell: Cell) -> bool {
        self.stone_at(cell).is_none()
    }

    /// Records a stone.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::Occupied`] if the cell already holds a stone, and
    /// [`MoveError::OutOfBounds`] if it lies outside this board.
    pub fn place(&mut self, stone: &Stone) -> Result<(), MoveError> {
        let cell = stone.cell;
        match self.cells.get_mut(cell.ix()) {
            None => Err(MoveError::OutOfBounds {
                proposal: cell.into(),
            }),
            Some(slot) if *slot != 0 => Err(MoveError::Occupied { cell }),
            Some(slot) => {
                *slot = stone.player.get();
                Ok(())
            }
        }
    }

    /// Number of stones on the board.
    pub fn stone_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c != 0).count()
    }

    /// Raw cell matrix (`0` = empty).
    pub fn cells(&self) -> &Array2<u8> {
        &self.cells
    }
}
