//! The game state machine.
//!
//! ```text
//! AwaitingMove ──move──▶ Evaluating ──legal──▶ AwaitingMove
//!                                  └─illegal / timeout / last stone─▶ Terminated
//! ```
//!
//! [`Game`] owns every piece of mutable game state. It performs no I/O:
//! the caller fetches moves from players and feeds them in.

use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::clock::{RequestToken, TimeTracker};
use crate::config::GameConfig;
#[cfg(debug_assertions)]
use crate::invariants::{GameInvariants, InvariantSet};
use crate::ownership::Ownership;
use crate::protocol::{ProtocolError, TurnMessage, VisualFrame};
use crate::pull::PullField;
use crate::summary::GameSummary;
use crate::types::{Board, Cell, PlayerId, Proposal, Score, Stone};
use crate::validation::{MoveError, MoveValidator};

/// Phase of the turn loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
pub enum GameState {
    /// A move request to the current player is (or may be) outstanding.
    AwaitingMove,
    /// A response arrived and is being validated and applied.
    Evaluating,
    /// The game is over; only the final broadcast remains.
    Terminated,
}

/// Misuse of the engine, or broken internal state.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum GameError {
    /// A game parameter is out of range.
    #[display("invalid game parameter {name}: {reason}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The operation is not allowed in the current phase.
    #[display("operation requires {expected} but game is {actual}")]
    WrongPhase {
        /// Phase the operation needs.
        expected: GameState,
        /// Phase the game is in.
        actual: GameState,
    },

    /// A request token was issued to a different player.
    #[display("request token belongs to player {holder} but player {current} is to move")]
    ForeignToken {
        /// Player the token was issued to.
        holder: PlayerId,
        /// Player whose turn it is.
        current: PlayerId,
    },

    /// Game state no longer satisfies its invariants.
    #[display("invariant violation: {description}")]
    InvariantViolation {
        /// Which invariants failed.
        description: String,
    },
}

/// Why a player was disqualified.
#[derive(Debug, Clone, PartialEq, Display, From)]
pub enum Violation {
    /// The move broke a placement rule.
    #[display("illegal move: {_0}")]
    Illegal(MoveError),
    /// The response was not a move at all.
    #[display("malformed move: {_0}")]
    Malformed(ProtocolError),
}

/// How a game that accepted its last move came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Ending {
    /// The mover's clock went negative.
    #[display("player {_0} ran out of time")]
    Timeout(PlayerId),
    /// Every player has placed every stone.
    #[display("all stones placed")]
    StonesExhausted,
}

/// Result of resolving one move request.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Stone committed; the next player is up.
    Continue(Stone),
    /// Stone committed and the game is over.
    Final(Stone, Ending),
    /// Nothing committed; the player is disqualified and the game is over.
    Rejected(PlayerId, Violation),
}

impl TurnOutcome {
    /// The committed stone, if any.
    pub fn stone(&self) -> Option<&Stone> {
        match self {
            TurnOutcome::Continue(stone) | TurnOutcome::Final(stone, _) => Some(stone),
            TurnOutcome::Rejected(..) => None,
        }
    }

    /// Whether the game ended with this turn.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TurnOutcome::Continue(_))
    }
}

/// Players sharing the best cell count. Eliminated players never win; if
/// everyone is eliminated the result is empty.
pub fn winners(scores: &[Score]) -> Vec<PlayerId> {
    let Some(best) = scores.iter().filter_map(|s| s.cells()).max() else {
        return Vec::new();
    };
    scores
        .iter()
        .enumerate()
        .filter(|(_, score)| score.cells() == Some(best))
        .filter_map(|(index, _)| PlayerId::from_index(index))
        .collect()
}

/// Authoritative state of one game.
#[derive(Debug, Clone)]
pub struct Game {
    config: GameConfig,
    validator: MoveValidator,
    players: Vec<PlayerId>,
    state: GameState,
    board: Board,
    fields: Vec<PullField>,
    ownership: Ownership,
    scores: Vec<Score>,
    clock: TimeTracker,
    history: Vec<Stone>,
    turn: usize,
}

impl Game {
    /// Creates a game awaiting the first player's move.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidParameter`] if the configuration is unplayable.
    #[instrument]
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        config.validate()?;

        let grid_size = *config.grid_size();
        let num_players = *config.num_players();
        let players = (0..num_players)
            .filter_map(PlayerId::from_index)
            .collect();

        info!(
            grid_size,
            num_players,
            num_stones = config.num_stones(),
            min_dist = config.min_dist(),
            "Creating game"
        );

        Ok(Self {
            validator: MoveValidator::new(grid_size, *config.min_dist()),
            players,
            state: GameState::AwaitingMove,
            board: Board::new(grid_size),
            fields: vec![PullField::new(grid_size); num_players],
            ownership: Ownership::new(grid_size, num_players),
            scores: vec![Score::default(); num_players],
            clock: TimeTracker::new(num_players, *config.time_budget_secs()),
            history: Vec::new(),
            turn: 0,
            config,
        })
    }

    /// Player whose turn it is (or was, once terminated).
    pub fn current_player(&self) -> PlayerId {
        self.players[self.turn % self.players.len()]
    }

    /// Current phase.
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Whether the game has ended.
    pub fn is_terminated(&self) -> bool {
        self.state == GameState::Terminated
    }

    /// The state message for the current player.
    pub fn turn_message(&self) -> TurnMessage {
        TurnMessage::for_player(
            self.is_terminated(),
            &self.scores,
            &self.history,
            self.current_player(),
        )
    }

    /// Starts timing a move request to the current player.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::WrongPhase`] unless the game is awaiting a move.
    pub fn begin_turn(&self) -> Result<RequestToken, GameError> {
        self.require(GameState::AwaitingMove)?;
        let player = self.current_player();
        debug!(
            %player,
            remaining_secs = self.clock.remaining(player),
            "Requesting move"
        );
        Ok(self.clock.begin_request(player))
    }

    /// Charges the request's wall-clock time and resolves the proposal.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] on phase or token misuse, or if an invariant
    /// breaks while committing.
    #[instrument(skip(self, token), fields(player = %token.player()))]
    pub fn end_turn(
        &mut self,
        token: RequestToken,
        proposal: Proposal,
    ) -> Result<TurnOutcome, GameError> {
        self.check_token(&token)?;
        self.clock.end_request(token);
        self.resolve(proposal)
    }

    /// Resolves a proposal that took `elapsed` to arrive.
    ///
    /// # Errors
    ///
    /// Same as [`Game::end_turn`].
    #[instrument(skip(self), fields(player = %self.current_player()))]
    pub fn apply(&mut self, proposal: Proposal, elapsed: Duration) -> Result<TurnOutcome, GameError> {
        self.require(GameState::AwaitingMove)?;
        self.clock.charge(self.current_player(), elapsed);
        self.resolve(proposal)
    }

    /// Disqualifies the current player for a response that is not a move.
    ///
    /// # Errors
    ///
    /// Returns [`GameError`] on phase or token misuse.
    #[instrument(skip(self, token), fields(player = %token.player()))]
    pub fn disqualify(
        &mut self,
        token: RequestToken,
        error: ProtocolError,
    ) -> Result<TurnOutcome, GameError> {
        self.check_token(&token)?;
        self.clock.end_request(token);
        self.state = GameState::Evaluating;
        Ok(self.reject(error.into()))
    }

    /// Current winners; see [`winners`].
    pub fn winners(&self) -> Vec<PlayerId> {
        winners(&self.scores)
    }

    /// Result record for this game, using the names given at connect time.
    pub fn summary(&self, names: &[String]) -> GameSummary {
        GameSummary::from_game(self, names)
    }

    /// Display update for a just-committed stone.
    pub fn visual_frame(&self, stone: &Stone) -> VisualFrame {
        VisualFrame {
            ownership: self.ownership.grid().clone(),
            scores: self.scores.clone(),
            player: stone.player,
            cell: stone.cell,
        }
    }

    fn require(&self, expected: GameState) -> Result<(), GameError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(GameError::WrongPhase {
                expected,
                actual: self.state,
            })
        }
    }

    fn check_token(&self, token: &RequestToken) -> Result<(), GameError> {
        self.require(GameState::AwaitingMove)?;
        let current = self.current_player();
        if token.player() != current {
            return Err(GameError::ForeignToken {
                holder: token.player(),
                current,
            });
        }
        Ok(())
    }

    fn resolve(&mut self, proposal: Proposal) -> Result<TurnOutcome, GameError> {
        self.state = GameState::Evaluating;
        let player = self.current_player();

        let cell = match self.validator.check(proposal, &self.board, &self.history) {
            Ok(cell) => cell,
            Err(error) => return Ok(self.reject(error.into())),
        };

        let stone = self.commit(player, cell)?;

        if self.clock.is_overrun(player) {
            warn!(
                %player,
                remaining_secs = self.clock.remaining(player),
                "Player timed out"
            );
            self.scores[player.index()] = Score::Timeout;
            self.state = GameState::Terminated;
            return Ok(TurnOutcome::Final(stone, Ending::Timeout(player)));
        }

        if self.history.len() == self.config.total_moves() {
            info!(moves = self.history.len(), "All stones placed");
            self.state = GameState::Terminated;
            return Ok(TurnOutcome::Final(stone, Ending::StonesExhausted));
        }

        self.turn += 1;
        self.state = GameState::AwaitingMove;
        Ok(TurnOutcome::Continue(stone))
    }

    fn reject(&mut self, violation: Violation) -> TurnOutcome {
        let player = self.current_player();
        warn!(%player, %violation, "Disqualifying player");
        self.scores[player.index()] = Score::IllegalMove;
        self.state = GameState::Terminated;
        TurnOutcome::Rejected(player, violation)
    }

    fn commit(&mut self, player: PlayerId, cell: Cell) -> Result<Stone, GameError> {
        let stone = Stone::new(cell, player, self.history.len());

        self.board
            .place(&stone)
            .map_err(|e| GameError::InvariantViolation {
                description: format!("validated move could not be placed: {e}"),
            })?;
        self.history.push(stone);
        self.fields[player.index()].accumulate(cell);
        self.ownership.recompute(&self.fields);
        for (score, &count) in self.scores.iter_mut().zip(self.ownership.counts()) {
            *score = Score::Cells(count);
        }

        info!(%stone, scores = ?self.scores, "Stone placed");

        #[cfg(debug_assertions)]
        <GameInvariants as InvariantSet<Game>>::check_all(self).map_err(|violations| {
            let description = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            GameError::InvariantViolation { description }
        })?;

        Ok(stone)
    }

    /// Game parameters.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// All players in turn order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Placed stones.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Per-player pull fields.
    pub fn pull_fields(&self) -> &[PullField] {
        &self.fields
    }

    /// Current cell ownership.
    pub fn ownership(&self) -> &Ownership {
        &self.ownership
    }

    /// Scores in player order.
    pub fn scores(&self) -> &[Score] {
        &self.scores
    }

    /// Remaining clocks.
    pub fn clock(&self) -> &TimeTracker {
        &self.clock
    }

    /// Move log, oldest first.
    pub fn history(&self) -> &[Stone] {
        &self.history
    }
}
