//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use connect_four::session::{
    SessionConfig,
    config::{MAX_JOIN_CODE_LENGTH, MIN_JOIN_CODE_LENGTH},
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// Address used when neither `--bind` nor `SERVER_BIND` is given
pub const DEFAULT_BIND: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 8001);

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Tunables handed to the session registry
    pub session: SessionConfig,
    /// Per-connection inbound limits
    pub rate_limit: RateLimitConfig,
}

/// Inbound message limits applied to every WebSocket connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Messages allowed per second
    pub burst: usize,
    /// Messages allowed per minute
    pub sustained: usize,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            burst: 10,
            sustained: 100,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND,
            session: SessionConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if `SERVER_BIND` is set but is not a
    /// socket address. Unparsable numeric variables fall back to defaults;
    /// out-of-range values are caught by [`ServerConfig::validate`].
    pub fn from_env(bind_override: Option<SocketAddr>) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(value) => value.parse().map_err(|e| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{value:?} is not a socket address: {e}"),
                })?,
                Err(_) => DEFAULT_BIND,
            },
        };

        let defaults = SessionConfig::default();
        let session = SessionConfig {
            join_code_length: parse_env_or("JOIN_CODE_LENGTH", defaults.join_code_length),
            inbox_capacity: parse_env_or("SESSION_INBOX_CAPACITY", defaults.inbox_capacity),
            outbound_buffer: parse_env_or("OUTBOUND_BUFFER", defaults.outbound_buffer),
        };

        let defaults = RateLimitConfig::default();
        let rate_limit = RateLimitConfig {
            burst: parse_env_or("RATE_LIMIT_BURST", defaults.burst),
            sustained: parse_env_or("RATE_LIMIT_SUSTAINED", defaults.sustained),
        };

        Ok(ServerConfig {
            bind,
            session,
            rate_limit,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_JOIN_CODE_LENGTH..=MAX_JOIN_CODE_LENGTH).contains(&self.session.join_code_length) {
            return Err(ConfigError::Invalid {
                var: "JOIN_CODE_LENGTH".to_string(),
                reason: format!(
                    "Must be between {MIN_JOIN_CODE_LENGTH} and {MAX_JOIN_CODE_LENGTH}"
                ),
            });
        }

        let positive = [
            ("SESSION_INBOX_CAPACITY", self.session.inbox_capacity),
            ("OUTBOUND_BUFFER", self.session.outbound_buffer),
            ("RATE_LIMIT_BURST", self.rate_limit.burst),
            ("RATE_LIMIT_SUSTAINED", self.rate_limit.sustained),
        ];
        for (var, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    var: var.to_string(),
                    reason: "Must be greater than 0".to_string(),
                });
            }
        }

        // Anything the registry would still refuse.
        self.session
            .validate()
            .map_err(|reason| ConfigError::Invalid {
                var: "SESSION".to_string(),
                reason,
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
