//! Registry mapping join codes to running sessions.

use super::{
    actor::{SessionActor, SessionHandle},
    code::JoinCode,
    config::SessionConfig,
    errors::{SessionError, SessionResult},
};
use dashmap::{DashMap, mapref::entry::Entry};

/// Process-wide table of live sessions, created once at startup and shared
/// through an `Arc`.
///
/// The map is sharded, so `create`, `resolve` and `retire` on different codes
/// do not contend on a single lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: DashMap<JoinCode, SessionHandle>,
    config: SessionConfig,
}

impl SessionRegistry {
    /// Create an empty registry
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: DashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Spawn a new session with an empty board and register it under a fresh code.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn create(&self) -> (JoinCode, SessionHandle) {
        let (code, handle) = loop {
            let code = JoinCode::generate(self.config.join_code_length);
            // The entry holds its shard's write lock until the match ends; do
            // not call back into the map from inside it.
            match self.sessions.entry(code.clone()) {
                Entry::Occupied(_) => {
                    log::warn!("Join code collision, regenerating");
                }
                Entry::Vacant(slot) => {
                    let (actor, handle) = SessionActor::new(code.clone(), &self.config);
                    slot.insert(handle.clone());
                    tokio::spawn(actor.run());
                    break (code, handle);
                }
            }
        };

        log::info!("Created session {} ({} live)", code, self.sessions.len());
        (code, handle)
    }

    /// Look up a live session by its join code.
    pub fn resolve(&self, code: &str) -> SessionResult<SessionHandle> {
        self.sessions
            .get(code)
            .map(|entry| entry.value().clone())
            .ok_or(SessionError::NotFound)
    }

    /// Remove a session from the registry. Returns `false` if it was already gone.
    ///
    /// Connections still attached keep the session running until they detach,
    /// but no new connection can resolve it.
    pub fn retire(&self, code: &JoinCode) -> bool {
        let removed = self.sessions.remove(code.as_str()).is_some();
        if removed {
            log::info!("Retired session {} ({} live)", code, self.sessions.len());
        }
        removed
    }

    /// Number of live sessions
    pub fn live_sessions(&self) -> usize {
        self.sessions.len()
    }
}
