//! Structured logging configuration.
//!
//! The `connect_four` library logs through the `log` facade; the subscriber
//! installed here bridges those records into `tracing` so both end up in the
//! same output.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "info,hyper=warn,tungstenite=warn";

/// Initialize structured logging
///
/// Log levels are configurable through the `RUST_LOG` env var.
///
/// # Example
///
/// ```no_run
/// use c4_server::logging;
///
/// #[tokio::main]
/// async fn main() {
///     logging::init();
///     tracing::info!("Server starting");
/// }
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log a client that misbehaved at the protocol level
///
/// # Arguments
///
/// * `connection` - Connection identifier
/// * `kind` - Short violation category, such as `rate_limit` or `malformed`
/// * `message` - Event message
pub fn log_protocol_event(connection: &str, kind: &str, message: &str) {
    tracing::warn!(
        connection = connection,
        event_type = kind,
        "PROTOCOL: {}",
        message
    );
}
