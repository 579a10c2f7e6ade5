//! Line protocol shared by the engine and player agents.
//!
//! Every message is one line of space-separated tokens. The same types
//! encode (via `Display`) and decode (via `FromStr`), so both ends agree
//! on framing:
//!
//! ```text
//! handshake   engine → player   <players> <stones> <grid_size> <min_dist> <your_id>
//! name        player → engine   <name>
//! turn state  engine → player   <over 0|1> <players> <score>... <count> (<row> <col> <player>)...
//! move        player → engine   <row> <col>
//! ```

use derive_more::{Display, Error};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Write as _};
use std::str::{FromStr, SplitWhitespace};
use tracing::instrument;

use crate::config::{GameConfig, MAX_PLAYERS};
use crate::types::{Cell, PlayerId, Proposal, Score, Stone};

/// A line that could not be decoded.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum ProtocolError {
    /// The line ended before a required token.
    #[display("missing {field}")]
    Missing {
        /// Name of the absent token.
        field: &'static str,
    },

    /// A token did not parse as the expected type.
    #[display("invalid {field}: {token:?}")]
    Invalid {
        /// Name of the token.
        field: &'static str,
        /// The raw text.
        token: String,
    },

    /// Tokens remained after a complete message.
    #[display("unexpected trailing token {token:?}")]
    Trailing {
        /// First extra token.
        token: String,
    },
}

/// Cursor over the tokens of one line.
struct Tokens<'a> {
    inner: SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn new(line: &'a str) -> Self {
        Self {
            inner: line.split_whitespace(),
        }
    }

    fn next<T: FromStr>(&mut self, field: &'static str) -> Result<T, ProtocolError> {
        let token = self.inner.next().ok_or(ProtocolError::Missing { field })?;
        token.parse().map_err(|_| ProtocolError::Invalid {
            field,
            token: token.to_string(),
        })
    }

    fn finish(mut self) -> Result<(), ProtocolError> {
        match self.inner.next() {
            Some(token) => Err(ProtocolError::Trailing {
                token: token.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl FromStr for Proposal {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = Tokens::new(line);
        let row = tokens.next("row")?;
        let col = tokens.next("col")?;
        tokens.finish()?;
        Ok(Proposal { row, col })
    }
}

/// Game parameters sent to each player when it connects.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Handshake {
    /// Number of players in the game.
    pub num_players: usize,
    /// Stones each player will place.
    pub num_stones: usize,
    /// Side length of the grid.
    pub grid_size: usize,
    /// Minimum separation between any two stones.
    pub min_dist: f64,
    /// The receiving player's own id.
    pub player: PlayerId,
}

impl Handshake {
    /// Builds the handshake for one player slot.
    pub fn new(config: &GameConfig, player: PlayerId) -> Self {
        Self {
            num_players: *config.num_players(),
            num_stones: *config.num_stones(),
            grid_size: *config.grid_size(),
            min_dist: *config.min_dist(),
            player,
        }
    }
}

impl fmt::Display for Handshake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {}",
            self.num_players, self.num_stones, self.grid_size, self.min_dist, self.player
        )
    }
}

impl FromStr for Handshake {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = Tokens::new(line);
        let handshake = Self {
            num_players: tokens.next("player count")?,
            num_stones: tokens.next("stone count")?,
            grid_size: tokens.next("grid size")?,
            min_dist: tokens.next("minimum distance")?,
            player: tokens.next("player id")?,
        };
        tokens.finish()?;
        Ok(handshake)
    }
}

/// One move as it appears in a turn message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Placement {
    /// Where the stone was placed.
    pub cell: Cell,
    /// Who placed it.
    pub player: PlayerId,
}

impl From<&Stone> for Placement {
    fn from(stone: &Stone) -> Self {
        Self {
            cell: stone.cell,
            player: stone.player,
        }
    }
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.cell.row, self.cell.col, self.player)
    }
}

/// State sent to a player before its turn, and to everyone at game end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnMessage {
    /// Whether the game has ended.
    pub game_over: bool,
    /// Every player's score, in player order.
    pub scores: Vec<Score>,
    /// Moves the recipient has not seen yet, oldest first.
    pub moves: Vec<Placement>,
}

impl TurnMessage {
    /// Builds the message for `player`.
    ///
    /// The move delta walks the log back from the newest stone and stops at
    /// the recipient's own latest stone: everything from there on was
    /// already known to it.
    #[instrument(skip(scores, history), fields(history = history.len()))]
    pub fn for_player(
        game_over: bool,
        scores: &[Score],
        history: &[Stone],
        player: PlayerId,
    ) -> Self {
        let mut moves: Vec<Placement> = history
            .iter()
            .rev()
            .take_while(|stone| stone.player != player)
            .map(Placement::from)
            .collect();
        moves.reverse();

        Self {
            game_over,
            scores: scores.to_vec(),
            moves,
        }
    }
}

impl fmt::Display for TurnMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", u8::from(self.game_over), self.scores.len())?;
        for score in &self.scores {
            write!(f, " {score}")?;
        }
        write!(f, " {}", self.moves.len())?;
        for placement in &self.moves {
            write!(f, " {placement}")?;
        }
        Ok(())
    }
}

impl FromStr for TurnMessage {
    type Err = ProtocolError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = Tokens::new(line);

        let game_over = match tokens.next::<u8>("game-over flag")? {
            0 => false,
            1 => true,
            other => {
                return Err(ProtocolError::Invalid {
                    field: "game-over flag",
                    token: other.to_string(),
                });
            }
        };

        let num_players: usize = tokens.next("player count")?;
        if num_players > MAX_PLAYERS {
            return Err(ProtocolError::Invalid {
                field: "player count",
                token: num_players.to_string(),
            });
        }
        let mut scores = Vec::with_capacity(num_players);
        for _ in 0..num_players {
            let raw: i64 = tokens.next("score")?;
            let score = Score::try_from(raw).map_err(|_| ProtocolError::Invalid {
                field: "score",
                token: raw.to_string(),
            })?;
            scores.push(score);
        }

        let count: usize = tokens.next("move count")?;
        let mut moves = Vec::with_capacity(count.min(4096));
        for _ in 0..count {
            let row = tokens.next("move row")?;
            let col = tokens.next("move column")?;
            let player = tokens.next("move player")?;
            moves.push(Placement {
                cell: Cell { row, col },
                player,
            });
        }

        tokens.finish()?;
        Ok(Self {
            game_over,
            scores,
            moves,
        })
    }
}

/// One update line for the external display, sent after each accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisualFrame {
    /// Owner of every cell.
    pub ownership: Array2<u8>,
    /// Scores after the move.
    pub scores: Vec<Score>,
    /// Player who just moved.
    pub player: PlayerId,
    /// Where the stone went.
    pub cell: Cell,
}

impl fmt::Display for VisualFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut line = String::with_capacity(self.ownership.len() * 2 + 64);
        for owner in &self.ownership {
            write!(line, "{owner} ")?;
        }
        for score in &self.scores {
            write!(line, "{score} ")?;
        }
        write!(
            line,
            "{} {} {} {}",
            self.scores.len(),
            self.player,
            self.cell.row,
            self.cell.col
        )?;
        f.write_str(&line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(id: u8) -> PlayerId {
        PlayerId::new(id).unwrap()
    }

    fn stone(row: usize, col: usize, player: u8, sequence: usize) -> Stone {
        Stone::new(Cell::new(row, col), p(player), sequence)
    }

    #[test]
    fn test_proposal_parses_negative_coordinates() {
        assert_eq!("-1 5".parse::<Proposal>(), Ok(Proposal::new(-1, 5)));
        assert_eq!(" 3  4 \n".parse::<Proposal>(), Ok(Proposal::new(3, 4)));
    }

    #[test]
    fn test_proposal_rejects_garbage() {
        assert_eq!(
            "3".parse::<Proposal>(),
            Err(ProtocolError::Missing { field: "col" })
        );
        assert!(matches!(
            "a b".parse::<Proposal>(),
            Err(ProtocolError::Invalid { field: "row", .. })
        ));
        assert!(matches!(
            "1 2 3".parse::<Proposal>(),
            Err(ProtocolError::Trailing { .. })
        ));
    }

    #[test]
    fn test_delta_stops_at_recipients_last_stone() {
        let history = vec![
            stone(0, 0, 1, 0),
            stone(5, 5, 2, 1),
            stone(9, 9, 3, 2),
            stone(1, 8, 1, 3),
            stone(8, 1, 2, 4),
        ];
        let scores = vec![Score::Cells(10); 3];

        let for_three = TurnMessage::for_player(false, &scores, &history, p(3));
        let cells: Vec<Cell> = for_three.moves.iter().map(|m| m.cell).collect();
        assert_eq!(cells, vec![Cell::new(1, 8), Cell::new(8, 1)]);

        let for_two = TurnMessage::for_player(false, &scores, &history, p(2));
        assert!(for_two.moves.is_empty());
    }

    #[test]
    fn test_first_turn_sees_whole_log() {
        let history = vec![stone(0, 0, 1, 0)];
        let message = TurnMessage::for_player(false, &[Score::Cells(4), Score::Cells(0)], &history, p(2));
        assert_eq!(message.to_string(), "0 2 4 0 1 0 0 1");
    }

    #[test]
    fn test_turn_message_framing_is_symmetric() {
        let message = TurnMessage {
            game_over: true,
            scores: vec![Score::Cells(250), Score::IllegalMove, Score::Timeout],
            moves: vec![Placement {
                cell: Cell::new(4, 7),
                player: p(3),
            }],
        };
        let line = message.to_string();
        assert_eq!(line, "1 3 250 -1 -2 1 4 7 3");
        assert_eq!(line.parse::<TurnMessage>(), Ok(message));
    }

    #[test]
    fn test_turn_message_rejects_short_move_list() {
        assert_eq!(
            "0 1 5 2 1 1 1".parse::<TurnMessage>(),
            Err(ProtocolError::Missing { field: "move row" })
        );
    }

    #[test]
    fn test_turn_message_rejects_oversized_player_count() {
        assert!(matches!(
            "0 18446744073709551615 1".parse::<TurnMessage>(),
            Err(ProtocolError::Invalid { field: "player count", .. })
        ));
        assert!(matches!(
            "0 256 1".parse::<TurnMessage>(),
            Err(ProtocolError::Invalid { field: "player count", .. })
        ));
    }

    #[test]
    fn test_handshake_line() {
        let config = GameConfig::new(2, 3).with_grid_size(20).with_min_dist(0.0);
        let handshake = Handshake::new(&config, p(2));
        assert_eq!(handshake.to_string(), "2 3 20 0 2");
        assert_eq!("2 3 20 0 2".parse::<Handshake>(), Ok(handshake));
    }

    #[test]
    fn test_visual_frame_layout() {
        let frame = VisualFrame {
            ownership: Array2::from_shape_vec((2, 2), vec![1, 1, 2, 2]).unwrap(),
            scores: vec![Score::Cells(2), Score::Cells(2)],
            player: p(2),
            cell: Cell::new(1, 0),
        };
        assert_eq!(frame.to_string(), "1 1 2 2 2 2 2 2 1 0");
    }
}
