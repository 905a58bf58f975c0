//! Connection handler error types.

use crate::session::SessionError;
use thiserror::Error;

/// Message sent before closing a connection that broke the protocol.
pub const INVALID_MESSAGE: &str = "Invalid message format.";

/// Protocol violations. Fatal to the offending connection only.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// Transport closed
    #[error("connection closed")]
    Closed,

    /// Inbound text did not decode to a known event
    #[error("malformed event: {0}")]
    Malformed(String),

    /// A known event arrived at the wrong point of the conversation
    #[error("unexpected {0} event")]
    Unexpected(&'static str),
}

/// Reasons a connection handler stopped
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Result type for connection handlers
pub type HandlerResult<T> = Result<T, HandlerError>;
