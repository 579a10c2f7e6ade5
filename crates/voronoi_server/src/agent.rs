//! Reference player agent.
//!
//! The agent keeps its own copy of the board, folding in the moves each
//! turn message reports plus its own accepted placements, and asks a
//! [`Strategy`] for the next move.

use anyhow::{Context, Result, bail};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info, instrument};
use voronoi_game::{
    Board, Cell, Handshake, MoveValidator, Placement, PlayerId, Proposal, Stone, TurnMessage,
};

/// Samples tried before falling back to a full scan.
pub const DEFAULT_ATTEMPTS: usize = 1000;

/// What an agent knows about the game.
#[derive(Debug, Clone)]
pub struct AgentView {
    handshake: Handshake,
    validator: MoveValidator,
    board: Board,
    history: Vec<Stone>,
}

impl AgentView {
    /// Empty board for the game described by `handshake`.
    pub fn new(handshake: Handshake) -> Self {
        Self {
            validator: MoveValidator::new(handshake.grid_size, handshake.min_dist),
            board: Board::new(handshake.grid_size),
            history: Vec::new(),
            handshake,
        }
    }

    /// Records stones placed by other players.
    ///
    /// # Errors
    ///
    /// Fails if a reported stone lands on an occupied or off-grid cell,
    /// which means the agent's board has drifted from the engine's.
    pub fn fold(&mut self, placements: &[Placement]) -> Result<()> {
        for placement in placements {
            self.record(placement.cell.row, placement.cell.col, placement.player)?;
        }
        Ok(())
    }

    /// Records the agent's own move if the engine will accept it.
    pub fn record_own(&mut self, proposal: Proposal) -> Result<()> {
        if let Ok(cell) = self.validator.check(proposal, &self.board, &self.history) {
            self.record(cell.row, cell.col, self.handshake.player)?;
        }
        Ok(())
    }

    fn record(&mut self, row: usize, col: usize, player: PlayerId) -> Result<()> {
        let stone = Stone::new(Cell::new(row, col), player, self.history.len());
        self.board
            .place(&stone)
            .with_context(|| format!("engine reported {stone}"))?;
        self.history.push(stone);
        Ok(())
    }

    /// Whether `proposal` would be accepted right now.
    pub fn is_legal(&self, proposal: Proposal) -> bool {
        self.validator
            .check(proposal, &self.board, &self.history)
            .is_ok()
    }

    /// Game parameters.
    pub fn handshake(&self) -> &Handshake {
        &self.handshake
    }

    /// Known stones.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Known stones in placement order.
    pub fn history(&self) -> &[Stone] {
        &self.history
    }
}

/// Chooses moves for an agent.
pub trait Strategy: Send {
    /// Picks the next move.
    fn choose(&mut self, view: &AgentView) -> Proposal;

    /// Strategy name, used as the default player name.
    fn name(&self) -> &str;
}

/// Uniform random legal cells.
#[derive(Debug)]
pub struct RandomStrategy {
    rng: StdRng,
    attempts: usize,
}

impl RandomStrategy {
    /// Seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            attempts: DEFAULT_ATTEMPTS,
        }
    }

    /// Sets the number of random samples before scanning.
    pub fn with_attempts(mut self, attempts: usize) -> Self {
        self.attempts = attempts;
        self
    }
}

impl Default for RandomStrategy {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomStrategy {
    fn choose(&mut self, view: &AgentView) -> Proposal {
        let size = view.handshake().grid_size as i64;
        let mut last = Proposal::new(0, 0);

        for _ in 0..self.attempts {
            let proposal = Proposal::new(self.rng.gen_range(0..size), self.rng.gen_range(0..size));
            if view.is_legal(proposal) {
                return proposal;
            }
            last = proposal;
        }

        debug!(attempts = self.attempts, "Sampling failed, scanning board");
        (0..size)
            .flat_map(|row| (0..size).map(move |col| Proposal::new(row, col)))
            .find(|&proposal| view.is_legal(proposal))
            .unwrap_or(last)
    }

    fn name(&self) -> &str {
        "random"
    }
}

/// A connected agent.
pub struct AgentClient {
    reader: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
    view: AgentView,
}

impl AgentClient {
    /// Connects, reads the handshake and replies with `name`.
    #[instrument(skip(addr))]
    pub async fn connect(addr: impl ToSocketAddrs, name: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .context("Failed to connect to engine")?;
        let (read, writer) = stream.into_split();
        let mut reader = BufReader::new(read).lines();

        let line = reader
            .next_line()
            .await?
            .context("engine closed before handshake")?;
        let handshake: Handshake = line.parse().context("invalid handshake")?;
        info!(
            player = %handshake.player,
            players = handshake.num_players,
            grid_size = handshake.grid_size,
            min_dist = handshake.min_dist,
            "Joined game"
        );

        let mut client = Self {
            reader,
            writer,
            view: AgentView::new(handshake),
        };
        client.write_line(name).await?;
        Ok(client)
    }

    /// Plays until the engine reports game over, returning the final message.
    #[instrument(skip_all, fields(player = %self.view.handshake().player))]
    pub async fn play(&mut self, strategy: &mut dyn Strategy) -> Result<TurnMessage> {
        loop {
            let line = self.read_line().await?;
            let message: TurnMessage = line.parse().context("invalid turn message")?;

            // The final broadcast is built for whoever moved last, so its
            // delta may repeat stones this agent already holds.
            if message.game_over {
                let me = self.view.handshake().player;
                info!(message = %line, "Game over");
                if let Some(score) = message.scores.get(me.index()) {
                    info!(%score, "Own final score");
                }
                return Ok(message);
            }

            self.view.fold(&message.moves)?;

            let proposal = strategy.choose(&self.view);
            debug!(%proposal, "Playing");
            self.view.record_own(proposal)?;
            self.write_line(&proposal.to_string()).await?;
        }
    }

    /// Local view of the game.
    pub fn view(&self) -> &AgentView {
        &self.view
    }

    async fn read_line(&mut self) -> Result<String> {
        match self.reader.next_line().await? {
            Some(line) => Ok(line),
            None => bail!("engine closed the connection"),
        }
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handshake(grid_size: usize, min_dist: f64) -> Handshake {
        Handshake {
            num_players: 2,
            num_stones: 3,
            grid_size,
            min_dist,
            player: PlayerId::new(2).unwrap(),
        }
    }

    #[test]
    fn test_random_strategy_returns_legal_cells() {
        let mut view = AgentView::new(handshake(10, 2.0));
        let mut strategy = RandomStrategy::seeded(7);
        for _ in 0..5 {
            let proposal = strategy.choose(&view);
            assert!(view.is_legal(proposal));
            view.record_own(proposal).unwrap();
        }
        assert_eq!(view.history().len(), 5);
    }

    #[test]
    fn test_scan_finds_last_free_cell() {
        let mut view = AgentView::new(handshake(2, 0.0));
        let others = PlayerId::FIRST;
        view.fold(&[
            Placement { cell: Cell::new(0, 0), player: others },
            Placement { cell: Cell::new(0, 1), player: others },
            Placement { cell: Cell::new(1, 1), player: others },
        ])
        .unwrap();

        let mut strategy = RandomStrategy::seeded(1).with_attempts(0);
        assert_eq!(strategy.choose(&view), Proposal::new(1, 0));
    }

    #[test]
    fn test_fold_rejects_drifted_board() {
        let mut view = AgentView::new(handshake(4, 0.0));
        let stone = Placement {
            cell: Cell::new(1, 1),
            player: PlayerId::FIRST,
        };
        view.fold(&[stone]).unwrap();
        assert!(view.fold(&[stone]).is_err());
    }
}
