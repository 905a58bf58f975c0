//! Session configuration.

use crate::game::{COLUMNS, ROWS};
use serde::{Deserialize, Serialize};

/// Shortest join code accepted by [`SessionConfig::validate`].
pub const MIN_JOIN_CODE_LENGTH: usize = 12;

/// Longest join code accepted by [`SessionConfig::validate`].
pub const MAX_JOIN_CODE_LENGTH: usize = 64;

/// Broadcasts one connection can receive in a whole game: every move plus
/// the closing `win` or `draw`.
pub const MAX_BROADCASTS_PER_GAME: usize = ROWS * COLUMNS + 1;

/// Tunables shared by every session created by a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Alphanumeric characters per join code (16 chars is ~95 bits)
    pub join_code_length: usize,

    /// Bounded inbox capacity of each session actor
    pub inbox_capacity: usize,

    /// Bounded outbound queue per connection; a full queue drops broadcasts
    /// for that connection only. The default holds a whole game, so only a
    /// client that stops reading falls behind; it can resynchronise from a
    /// session snapshot.
    pub outbound_buffer: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            join_code_length: 16,
            inbox_capacity: 64,
            outbound_buffer: 64,
        }
    }
}

impl SessionConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_JOIN_CODE_LENGTH..=MAX_JOIN_CODE_LENGTH).contains(&self.join_code_length) {
            return Err(format!(
                "Join code length must be between {MIN_JOIN_CODE_LENGTH} and {MAX_JOIN_CODE_LENGTH}"
            ));
        }

        if self.inbox_capacity == 0 {
            return Err("Session inbox capacity must be greater than 0".to_string());
        }

        if self.outbound_buffer == 0 {
            return Err("Outbound buffer must be greater than 0".to_string());
        }

        Ok(())
    }
}
