//! Value types shared by the board engine, sessions and the wire protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of columns on the board.
pub const COLUMNS: usize = 7;

/// Number of rows on the board. Row 0 is the bottom row.
pub const ROWS: usize = 6;

/// Contiguous marks needed to win.
pub const CONNECT: usize = 4;

/// One of the two seated players.
///
/// Serialized as the integers `1` and `2` so clients can index colours directly.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The player who moves after `self`.
    pub fn other(self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Single-character mark used by the textual board rendering.
    pub fn mark(self) -> char {
        match self {
            Player::One => 'X',
            Player::Two => 'O',
        }
    }
}

impl From<Player> for u8 {
    fn from(player: Player) -> Self {
        match player {
            Player::One => 1,
            Player::Two => 2,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(format!("invalid player {other}, expected 1 or 2")),
        }
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", u8::from(*self))
    }
}

/// A move that has been applied to the board.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Move {
    pub player: Player,
    pub row: usize,
    pub column: usize,
}

/// Result of the game so far.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "player", rename_all = "snake_case")]
pub enum GameOutcome {
    #[default]
    InProgress,
    Won(Player),
    Drawn,
}

impl GameOutcome {
    /// Whether no further moves can be applied.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameOutcome::InProgress)
    }

    /// The winner, if any.
    pub fn winner(self) -> Option<Player> {
        match self {
            GameOutcome::Won(player) => Some(player),
            _ => None,
        }
    }
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameOutcome::InProgress => write!(f, "in progress"),
            GameOutcome::Won(player) => write!(f, "won by {player}"),
            GameOutcome::Drawn => write!(f, "drawn"),
        }
    }
}
