//! Connect Four WebSocket server.
//!
//! Serves the `connect_four` session protocol over WebSockets with axum, plus
//! a health check and a read-only session lookup.

pub mod api;
pub mod config;
pub mod logging;
