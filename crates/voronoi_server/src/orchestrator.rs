//! The networked turn loop.

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use voronoi_game::{Game, GameSummary, Proposal, TurnOutcome, VisualFrame};

use crate::session::PlayerSessions;
use crate::visualization::VisualFeed;

/// Progress notifications for an observer of the game.
#[derive(Debug, Clone)]
pub enum GameEvent {
    /// Every player is connected.
    Started {
        /// Names in player order.
        names: Vec<String>,
    },
    /// A stone was committed.
    MoveMade(VisualFrame),
    /// The final broadcast went out.
    GameOver {
        /// Names of the winners; empty if everyone was eliminated.
        winners: Vec<String>,
    },
}

/// Drives one [`Game`] over a set of player sessions.
///
/// Only one move request is ever outstanding: the loop awaits each
/// player's answer before doing anything else.
pub struct GameEngine<S> {
    game: Game,
    sessions: S,
    feed: VisualFeed,
    event_tx: Option<mpsc::UnboundedSender<GameEvent>>,
    names: Vec<String>,
}

impl<S: PlayerSessions> GameEngine<S> {
    /// Creates an engine with no display and no observer.
    pub fn new(game: Game, sessions: S) -> Self {
        Self {
            game,
            sessions,
            feed: VisualFeed::disabled(),
            event_tx: None,
            names: Vec::new(),
        }
    }

    /// Sends display updates to `feed`.
    pub fn with_feed(mut self, feed: VisualFeed) -> Self {
        self.feed = feed;
        self
    }

    /// Reports progress on `event_tx`.
    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<GameEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    /// Connects the players and plays the game to the end.
    ///
    /// # Errors
    ///
    /// Any transport failure ends the game with an error. Illegal,
    /// malformed and late moves are game outcomes, not errors.
    #[instrument(skip(self))]
    pub async fn run(&mut self) -> Result<GameSummary> {
        info!("Waiting for players");
        self.names = self.sessions.establish(self.game.config()).await?;
        self.feed.names(&self.names).await;
        self.emit(GameEvent::Started {
            names: self.names.clone(),
        })?;

        loop {
            let message = self.game.turn_message().to_string();

            if self.game.is_terminated() {
                for &player in self.game.players() {
                    self.sessions.send(player, &message).await?;
                }
                break;
            }

            let player = self.game.current_player();
            self.sessions.send(player, &message).await?;

            // Only the wait for the reply is charged to the player.
            let token = self.game.begin_turn()?;
            debug!(
                %player,
                name = %self.name_of(player.index()),
                remaining_secs = self.game.clock().remaining(player),
                "Waiting for player"
            );
            let line = self.sessions.receive(player).await?;

            let outcome = match line.parse::<Proposal>() {
                Ok(proposal) => self.game.end_turn(token, proposal)?,
                Err(error) => self.game.disqualify(token, error)?,
            };

            if let Some(stone) = outcome.stone() {
                let frame = self.game.visual_frame(stone);
                self.feed.frame(&frame).await;
                self.emit(GameEvent::MoveMade(frame))?;
            }

            if let TurnOutcome::Final(_, ending) = &outcome {
                info!(%ending, "Game over");
            }
        }

        let summary = self.game.summary(&self.names);
        self.emit(GameEvent::GameOver {
            winners: summary
                .winner_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
        })?;
        Ok(summary)
    }

    fn emit(&self, event: GameEvent) -> Result<()> {
        if let Some(tx) = &self.event_tx {
            tx.send(event)?;
        }
        Ok(())
    }

    fn name_of(&self, index: usize) -> &str {
        self.names.get(index).map_or("?", String::as_str)
    }

    /// The game being played.
    pub fn game(&self) -> &Game {
        &self.game
    }

    /// The underlying sessions.
    pub fn sessions(&self) -> &S {
        &self.sessions
    }

    /// Names in player order, once connected.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
