//! Best-effort feed to an external display.
//!
//! The display is never authoritative: if it cannot be reached, drops
//! the connection or stops reading, the feed logs a warning and goes quiet.

use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::{info, instrument, warn};
use voronoi_game::VisualFrame;

/// How long one line may take to write before the display is dropped.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_millis(500);

/// Line sink for the display.
#[derive(Debug)]
pub struct VisualFeed {
    stream: Option<TcpStream>,
    write_timeout: Duration,
}

impl VisualFeed {
    /// A feed that sends nothing.
    pub fn disabled() -> Self {
        Self {
            stream: None,
            write_timeout: DEFAULT_WRITE_TIMEOUT,
        }
    }

    /// Sets the per-line write deadline.
    pub fn with_write_timeout(mut self, write_timeout: Duration) -> Self {
        self.write_timeout = write_timeout;
        self
    }

    /// Connects to the display. Failure leaves the feed disabled.
    #[instrument]
    pub async fn connect(addr: &str) -> Self {
        match TcpStream::connect(addr).await {
            Ok(stream) => {
                info!("Connected to display");
                Self {
                    stream: Some(stream),
                    write_timeout: DEFAULT_WRITE_TIMEOUT,
                }
            }
            Err(error) => {
                warn!(%error, "Display unreachable, continuing without it");
                Self::disabled()
            }
        }
    }

    /// Whether lines are still being sent.
    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    /// Sends the player names line.
    pub async fn names(&mut self, names: &[String]) {
        self.send_line(&names.join(" ")).await;
    }

    /// Sends one per-move update.
    pub async fn frame(&mut self, frame: &VisualFrame) {
        self.send_line(&frame.to_string()).await;
    }

    async fn send_line(&mut self, line: &str) {
        let Some(stream) = self.stream.as_mut() else {
            return;
        };
        let mut bytes = Vec::with_capacity(line.len() + 1);
        bytes.extend_from_slice(line.as_bytes());
        bytes.push(b'\n');
        match tokio::time::timeout(self.write_timeout, stream.write_all(&bytes)).await {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                warn!(%error, "Display connection lost");
                self.stream = None;
            }
            Err(_) => {
                warn!(timeout = ?self.write_timeout, "Display stopped reading");
                self.stream = None;
            }
        }
    }
}
