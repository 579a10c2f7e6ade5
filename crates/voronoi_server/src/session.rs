//! Player connections.
//!
//! The engine talks to players only through [`PlayerSessions`]: one
//! line out, one line back. [`TcpSessions`] is the networked version.

use anyhow::{Context, Result, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, instrument};
use voronoi_game::{GameConfig, Handshake, PlayerId};

/// Line-oriented transport to every player slot.
#[async_trait::async_trait]
pub trait PlayerSessions: Send {
    /// Connects one player per slot in arrival order, sends each its
    /// handshake and returns the names they reply with.
    async fn establish(&mut self, config: &GameConfig) -> Result<Vec<String>>;

    /// Sends one line to `player`.
    async fn send(&mut self, player: PlayerId, line: &str) -> Result<()>;

    /// Waits for the next line from `player`.
    async fn receive(&mut self, player: PlayerId) -> Result<String>;
}

/// Cleans up a name sent by a player. Whitespace would break the
/// visualization's space-separated name line.
pub fn sanitize_name(raw: &str, player: PlayerId) -> String {
    let name = raw
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    if name.is_empty() {
        format!("player{player}")
    } else {
        name
    }
}

struct Connection {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

impl Connection {
    fn new(stream: TcpStream) -> Self {
        let (read, writer) = stream.into_split();
        Self {
            reader: BufReader::new(read).lines(),
            writer,
        }
    }

    async fn send(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn receive(&mut self) -> Result<String> {
        match self.reader.next_line().await? {
            Some(line) => Ok(line),
            None => bail!("connection closed"),
        }
    }
}

/// Players connected over TCP.
pub struct TcpSessions {
    listener: TcpListener,
    connections: Vec<Connection>,
}

impl TcpSessions {
    /// Binds the listening socket.
    #[instrument(skip(addr))]
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .context("Failed to bind engine socket")?;
        info!(addr = %listener.local_addr()?, "Listening for players");
        Ok(Self {
            listener,
            connections: Vec::new(),
        })
    }

    /// Address actually bound, useful when binding port 0.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    fn connection(&mut self, player: PlayerId) -> Result<&mut Connection> {
        self.connections
            .get_mut(player.index())
            .with_context(|| format!("no connection for player {player}"))
    }
}

#[async_trait::async_trait]
impl PlayerSessions for TcpSessions {
    #[instrument(skip(self, config), fields(players = config.num_players()))]
    async fn establish(&mut self, config: &GameConfig) -> Result<Vec<String>> {
        let mut names = Vec::with_capacity(*config.num_players());

        for index in 0..*config.num_players() {
            let player = PlayerId::from_index(index).context("player slot out of range")?;
            let (stream, peer) = self.listener.accept().await?;
            let mut connection = Connection::new(stream);

            connection
                .send(&Handshake::new(config, player).to_string())
                .await
                .with_context(|| format!("handshake with player {player}"))?;
            let raw = connection
                .receive()
                .await
                .with_context(|| format!("name from player {player}"))?;
            let name = sanitize_name(&raw, player);

            info!(%player, %peer, name = %name, "Player connected");
            self.connections.push(connection);
            names.push(name);
        }

        Ok(names)
    }

    async fn send(&mut self, player: PlayerId, line: &str) -> Result<()> {
        debug!(%player, line, "Sending");
        self.connection(player)?
            .send(line)
            .await
            .with_context(|| format!("send to player {player}"))
    }

    async fn receive(&mut self, player: PlayerId) -> Result<String> {
        let line = self
            .connection(player)?
            .receive()
            .await
            .with_context(|| format!("receive from player {player}"))?;
        debug!(%player, line, "Received");
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_name() {
        let player = PlayerId::new(3).unwrap();
        assert_eq!(sanitize_name("  Deep Blue \r", player), "Deep_Blue");
        assert_eq!(sanitize_name("   ", player), "player3");
        assert_eq!(sanitize_name("solo", player), "solo");
    }
}
