//! First-class invariants over [`Game`] state.
//!
//! Each invariant is a logical property that must hold after every
//! committed move. They are checked in debug builds and can be tested
//! independently.

use crate::engine::Game;
use crate::types::Board;

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants checked together. Implemented for tuples.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !$inv::holds(state) {
                        violations.push(InvariantViolation::new($inv::description()));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);

/// Once any stone exists, every cell is owned by exactly one player.
pub struct TotalOwnershipInvariant;

impl Invariant<Game> for TotalOwnershipInvariant {
    fn holds(game: &Game) -> bool {
        if game.history().is_empty() {
            return game.ownership().total() == 0;
        }
        let size = *game.config().grid_size() as u64;
        game.ownership().total() == size * size
    }

    fn description() -> &'static str {
        "Owned cells sum to the grid area once a stone is placed"
    }
}

/// Stones are never overwritten: replaying the log rebuilds the board.
pub struct MonotonicBoardInvariant;

impl Invariant<Game> for MonotonicBoardInvariant {
    fn holds(game: &Game) -> bool {
        let mut rebuilt = Board::new(*game.config().grid_size());
        for stone in game.history() {
            if rebuilt.place(stone).is_err() {
                return false;
            }
        }
        rebuilt == *game.board()
    }

    fn description() -> &'static str {
        "Board squares are monotonic (never overwritten)"
    }
}

/// Players move in strict rotation, and sequence numbers match log order.
pub struct AlternatingTurnInvariant;

impl Invariant<Game> for AlternatingTurnInvariant {
    fn holds(game: &Game) -> bool {
        let players = game.players();
        game.history()
            .iter()
            .enumerate()
            .all(|(i, stone)| stone.sequence == i && stone.player == players[i % players.len()])
    }

    fn description() -> &'static str {
        "Players alternate turns in slot order"
    }
}

/// No more than `players × stones` moves are ever committed.
pub struct MoveBoundInvariant;

impl Invariant<Game> for MoveBoundInvariant {
    fn holds(game: &Game) -> bool {
        game.history().len() <= game.config().total_moves()
    }

    fn description() -> &'static str {
        "Move count never exceeds players × stones"
    }
}

/// All game invariants as a composable set.
pub type GameInvariants = (
    TotalOwnershipInvariant,
    MonotonicBoardInvariant,
    AlternatingTurnInvariant,
    MoveBoundInvariant,
);
