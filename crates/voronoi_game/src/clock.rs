//! Per-player time budgets.
//!
//! A budget is charged with the wall-clock duration of each move request
//! after the response arrives. Nothing interrupts a request in flight, so
//! a single slow response can overrun the budget; the overrun is detected
//! afterwards by [`TimeTracker::is_overrun`].

use std::time::{Duration, Instant};
use tracing::{debug, instrument};

use crate::types::PlayerId;

/// Proof that a move request was started, carrying its start instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    player: PlayerId,
    started: Instant,
}

impl RequestToken {
    /// Player the request was issued to.
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Time since the request began.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Remaining time budget per player, in seconds. May go negative.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeTracker {
    remaining: Vec<f64>,
}

impl TimeTracker {
    /// Gives every player the same starting budget.
    pub fn new(num_players: usize, budget_secs: f64) -> Self {
        Self {
            remaining: vec![budget_secs; num_players],
        }
    }

    /// Starts timing a request to `player`.
    pub fn begin_request(&self, player: PlayerId) -> RequestToken {
        RequestToken {
            player,
            started: Instant::now(),
        }
    }

    /// Stops timing and charges the elapsed time to the token's player.
    pub fn end_request(&mut self, token: RequestToken) -> Duration {
        let elapsed = token.elapsed();
        self.charge(token.player, elapsed);
        elapsed
    }

    /// Deducts `elapsed` from `player`'s budget and returns what is left.
    #[instrument(skip(self), fields(elapsed_secs = elapsed.as_secs_f64()))]
    pub fn charge(&mut self, player: PlayerId, elapsed: Duration) -> f64 {
        match self.remaining.get_mut(player.index()) {
            Some(left) => {
                *left -= elapsed.as_secs_f64();
                debug!(remaining = *left, "Clock charged");
                *left
            }
            None => f64::NEG_INFINITY,
        }
    }

    /// Seconds left for `player`.
    pub fn remaining(&self, player: PlayerId) -> f64 {
        self.remaining
            .get(player.index())
            .copied()
            .unwrap_or(f64::NEG_INFINITY)
    }

    /// Whether `player` has spent more than its budget.
    pub fn is_overrun(&self, player: PlayerId) -> bool {
        self.remaining(player) < 0.0
    }

    /// All clocks in player order.
    pub fn all(&self) -> &[f64] {
        &self.remaining
    }
}
