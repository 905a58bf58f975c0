//! Session actor message types.

use super::code::JoinCode;
use crate::game::{GameOutcome, IllegalMove, Move, Player};
use crate::net::messages::ServerEvent;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Identifies one attached connection for the lifetime of its handler.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which seat a connection asks for when attaching.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SeatRequest {
    /// The connection that created the session; always seated as player one.
    Host,
    /// A connection that joined by code; player two if free, else spectator.
    Guest,
}

/// What an attached connection may do in the session.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Player(Player),
    Spectator,
}

impl Role {
    pub fn player(self) -> Option<Player> {
        match self {
            Role::Player(player) => Some(player),
            Role::Spectator => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Player(player) => write!(f, "{player}"),
            Role::Spectator => write!(f, "spectator"),
        }
    }
}

/// Messages that can be sent to a SessionActor
#[derive(Debug)]
pub enum SessionMessage {
    /// Add a connection to the subscriber set and assign it a role
    Attach {
        connection: ConnectionId,
        seat: SeatRequest,
        outbox: mpsc::Sender<ServerEvent>,
        response: oneshot::Sender<Role>,
    },

    /// Remove a connection from the subscriber set, freeing its seat
    Detach { connection: ConnectionId },

    /// Move attempt by an attached connection
    Play {
        connection: ConnectionId,
        column: usize,
        response: oneshot::Sender<Result<Move, IllegalMove>>,
    },

    /// Read-only view of the session
    Snapshot {
        response: oneshot::Sender<SessionSnapshot>,
    },
}

/// Point-in-time view of a session, used by the HTTP lookup endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub code: JoinCode,
    pub moves: Vec<Move>,
    pub next_player: Player,
    pub outcome: GameOutcome,
    /// Seated players currently attached
    pub players: usize,
    pub spectators: usize,
    /// Text rendering, top row first
    pub board: String,
}
