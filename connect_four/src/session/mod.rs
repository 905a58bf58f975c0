//! Game sessions: join codes, the session registry, and event fanout.
//!
//! This module implements:
//! - SessionActor: async actor owning one board and its subscribers
//! - SessionRegistry: join code to session handle table
//! - Fanout: independent delivery of broadcast events
//! - Attachment/RetireGuard: cleanup bound to a connection's scope
//!
//! ## Architecture
//!
//! Each session runs in its own Tokio task with an mpsc inbox, so moves for
//! one session are applied strictly one at a time while different sessions
//! never contend. The registry only maps codes to handles.
//!
//! ## Example
//!
//! ```
//! use connect_four::session::{ConnectionId, SeatRequest, SessionConfig, SessionRegistry};
//! use tokio::sync::mpsc;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let registry = SessionRegistry::new(SessionConfig::default());
//! let (code, session) = registry.create();
//!
//! let (outbox, mut events) = mpsc::channel(8);
//! let host = ConnectionId::new();
//! session.attach(host, SeatRequest::Host, outbox).await.unwrap();
//! session.play(host, 3).await.unwrap();
//!
//! assert!(events.recv().await.is_some());
//! assert!(registry.retire(&code));
//! # }
//! ```

pub mod actor;
pub mod code;
pub mod config;
pub mod errors;
pub mod fanout;
pub mod guard;
pub mod messages;
pub mod registry;

pub use actor::{SessionActor, SessionHandle};
pub use code::JoinCode;
pub use config::SessionConfig;
pub use errors::{SessionError, SessionResult};
pub use fanout::{DeliveryFailure, DeliveryReport, Fanout};
pub use guard::{Attachment, RetireGuard};
pub use messages::{ConnectionId, Role, SeatRequest, SessionMessage, SessionSnapshot};
pub use registry::SessionRegistry;
