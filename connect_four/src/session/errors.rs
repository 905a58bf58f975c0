//! Session error types.

use crate::game::IllegalMove;
use thiserror::Error;

/// Errors surfaced by the registry and session handles
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    /// Join code was never issued or has been retired
    #[error("Game not found.")]
    NotFound,

    /// The session actor stopped before answering
    #[error("Game is closed.")]
    Closed,

    /// The board rejected a move
    #[error(transparent)]
    IllegalMove(#[from] IllegalMove),
}

impl SessionError {
    /// Message sent to the client in an `error` event.
    ///
    /// A closed session is reported like an unknown code.
    pub fn client_message(&self) -> String {
        match self {
            SessionError::Closed => SessionError::NotFound.to_string(),
            _ => self.to_string(),
        }
    }
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;
