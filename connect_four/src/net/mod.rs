//! Wire protocol and the per-connection handler.

pub mod errors;
pub mod handler;
pub mod messages;

pub use errors::{HandlerError, HandlerResult, INVALID_MESSAGE, ProtocolError};
pub use handler::ConnectionHandler;
pub use messages::{ClientEvent, ServerEvent};
