//! Turn loop behaviour over in-memory sessions.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use voronoi_game::{Game, GameConfig, PlayerId, Score};
use voronoi_server::{GameEngine, GameEvent, PlayerSessions};

/// Sessions that answer from a fixed script and record what was sent.
struct ScriptedSessions {
    names: Vec<String>,
    replies: Vec<VecDeque<String>>,
    delay: Duration,
    send_delay: Duration,
    sent: Vec<(PlayerId, String)>,
}

impl ScriptedSessions {
    fn new(scripts: &[(&str, &[&str])]) -> Self {
        Self {
            names: scripts.iter().map(|(name, _)| name.to_string()).collect(),
            replies: scripts
                .iter()
                .map(|(_, lines)| lines.iter().map(|l| l.to_string()).collect())
                .collect(),
            delay: Duration::ZERO,
            send_delay: Duration::ZERO,
            sent: Vec::new(),
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_send_delay(mut self, send_delay: Duration) -> Self {
        self.send_delay = send_delay;
        self
    }

    fn sent_to(&self, id: u8) -> Vec<&str> {
        self.sent
            .iter()
            .filter(|(player, _)| player.get() == id)
            .map(|(_, line)| line.as_str())
            .collect()
    }
}

#[async_trait::async_trait]
impl PlayerSessions for ScriptedSessions {
    async fn establish(&mut self, config: &GameConfig) -> Result<Vec<String>> {
        assert_eq!(*config.num_players(), self.names.len());
        Ok(self.names.clone())
    }

    async fn send(&mut self, player: PlayerId, line: &str) -> Result<()> {
        if !self.send_delay.is_zero() {
            tokio::time::sleep(self.send_delay).await;
        }
        self.sent.push((player, line.to_string()));
        Ok(())
    }

    async fn receive(&mut self, player: PlayerId) -> Result<String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.replies[player.index()]
            .pop_front()
            .context("script exhausted")
    }
}

fn game(players: usize, stones: usize, grid_size: usize) -> Game {
    let config = GameConfig::new(players, stones)
        .with_grid_size(grid_size)
        .with_min_dist(0.0);
    Game::new(config).unwrap()
}

#[tokio::test]
async fn test_two_player_game_broadcasts_deltas() {
    let sessions = ScriptedSessions::new(&[("alice", &["5 5"]), ("bob", &["10 10"])]);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = GameEngine::new(game(2, 1, 20), sessions).with_events(tx);

    let summary = engine.run().await.unwrap();

    assert_eq!(
        engine.sessions().sent_to(1),
        vec!["0 2 0 0 0", "1 2 136 264 0"]
    );
    assert_eq!(
        engine.sessions().sent_to(2),
        vec!["0 2 400 0 1 5 5 1", "1 2 136 264 0"]
    );
    assert_eq!(summary.winner_names(), vec!["bob"]);

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(matches!(&events[0], GameEvent::Started { names } if names.len() == 2));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, GameEvent::MoveMade(_)))
            .count(),
        2
    );
    assert!(matches!(events.last(), Some(GameEvent::GameOver { winners }) if winners == &["bob"]));
}

#[tokio::test]
async fn test_malformed_reply_ends_game_as_illegal() {
    let sessions = ScriptedSessions::new(&[("alice", &["3 3"]), ("bob", &["over there"])]);
    let mut engine = GameEngine::new(game(2, 2, 8), sessions);

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.players()[1].score, Score::IllegalMove);
    assert_eq!(summary.winner_names(), vec!["alice"]);
    assert_eq!(engine.game().history().len(), 1);
    // Both players get the final line, which repeats the offender's delta.
    let last = "1 2 64 -1 1 3 3 1";
    assert_eq!(engine.sessions().sent_to(1).last(), Some(&last));
    assert_eq!(engine.sessions().sent_to(2).last(), Some(&last));
}

#[tokio::test]
async fn test_slow_player_times_out() {
    let sessions = ScriptedSessions::new(&[("slow", &["1 1"]), ("idle", &[])])
        .with_delay(Duration::from_millis(20));
    let config = GameConfig::new(2, 3)
        .with_grid_size(6)
        .with_min_dist(0.0)
        .with_time_budget_secs(0.005);
    let mut engine = GameEngine::new(Game::new(config).unwrap(), sessions);

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.players()[0].score, Score::Timeout);
    assert_eq!(summary.moves().len(), 1);
    assert!(engine.game().is_terminated());
    assert_eq!(engine.sessions().sent_to(2), vec!["1 2 -2 0 0"]);
}

#[tokio::test]
async fn test_transport_failure_is_fatal() {
    let sessions = ScriptedSessions::new(&[("alice", &["0 0"]), ("bob", &[])]);
    let mut engine = GameEngine::new(game(2, 2, 8), sessions);

    let error = engine.run().await.unwrap_err();
    assert!(error.to_string().contains("script exhausted"));
    assert!(!engine.game().is_terminated());
}

#[tokio::test]
async fn test_slow_send_is_not_charged_to_player() {
    let sessions = ScriptedSessions::new(&[("quick", &["1 1"])])
        .with_send_delay(Duration::from_millis(50));
    let config = GameConfig::new(1, 1)
        .with_grid_size(4)
        .with_min_dist(0.0)
        .with_time_budget_secs(0.02);
    let mut engine = GameEngine::new(Game::new(config).unwrap(), sessions);

    let summary = engine.run().await.unwrap();

    assert_eq!(summary.players()[0].score, Score::Cells(16));
    assert!(engine.game().clock().remaining(PlayerId::FIRST) > 0.0);
}

#[tokio::test]
async fn test_timeout_frame_carries_sentinel_score() {
    let sessions = ScriptedSessions::new(&[("slow", &["1 1"]), ("idle", &[])])
        .with_delay(Duration::from_millis(20));
    let config = GameConfig::new(2, 3)
        .with_grid_size(6)
        .with_min_dist(0.0)
        .with_time_budget_secs(0.005);
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut engine = GameEngine::new(Game::new(config).unwrap(), sessions).with_events(tx);

    engine.run().await.unwrap();

    let mut frames = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let GameEvent::MoveMade(frame) = event {
            frames.push(frame);
        }
    }
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0].scores, vec![Score::Timeout, Score::Cells(0)]);
    assert_eq!(frames[0].to_string().split(' ').nth(36), Some("-2"));
}
