//! Join codes: the only credential needed to attach to a running session.

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use std::{borrow::Borrow, fmt};

/// Unguessable token identifying a live session in the registry.
///
/// Drawn from the thread-local CSPRNG, never from a counter.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JoinCode(String);

impl JoinCode {
    /// Generate a fresh alphanumeric code of `length` characters.
    pub fn generate(length: usize) -> Self {
        let code = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect();
        Self(code)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JoinCode {
    fn from(code: String) -> Self {
        Self(code)
    }
}

impl From<&str> for JoinCode {
    fn from(code: &str) -> Self {
        Self(code.to_string())
    }
}

// Lets the registry look codes up by `&str` without allocating.
impl Borrow<str> for JoinCode {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JoinCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
