//! Rate limiting for inbound WebSocket messages.
//!
//! Every connection gets its own [`ConnectionLimits`]: a short burst window
//! and a longer sustained window, both sliding.

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

/// Sliding window of recent message timestamps.
#[derive(Debug)]
pub struct RateLimiter {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Allow `max_requests` within any `window`.
    ///
    /// # Example
    ///
    /// ```
    /// use c4_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    pub fn per_second(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(1))
    }

    pub fn per_minute(max_requests: usize) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    /// Record a request if the window has room.
    ///
    /// Returns `false` without recording anything when the limit is reached.
    pub fn check(&mut self) -> bool {
        let now = Instant::now();
        if !self.has_room(now) {
            return false;
        }
        self.record(now);
        true
    }

    /// Expire old entries and report whether one more request fits at `now`.
    fn has_room(&mut self, now: Instant) -> bool {
        while self
            .timestamps
            .front()
            .is_some_and(|ts| now.duration_since(*ts) > self.window)
        {
            self.timestamps.pop_front();
        }
        self.timestamps.len() < self.max_requests
    }

    fn record(&mut self, now: Instant) {
        self.timestamps.push_back(now);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.timestamps.len()
    }
}

/// Which window rejected a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Limited {
    Burst,
    Sustained,
}

impl Limited {
    /// Text sent to the client in an `error` event
    pub fn client_message(self) -> &'static str {
        match self {
            Limited::Burst => "Rate limit exceeded. Please slow down.",
            Limited::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

impl fmt::Display for Limited {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Limited::Burst => write!(f, "burst"),
            Limited::Sustained => write!(f, "sustained"),
        }
    }
}

/// Burst and sustained limiters for one connection.
#[derive(Debug)]
pub struct ConnectionLimits {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl ConnectionLimits {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            burst: RateLimiter::per_second(config.burst),
            sustained: RateLimiter::per_minute(config.sustained),
        }
    }

    /// Admit one inbound message.
    ///
    /// A rejected message is recorded in neither window; an admitted one is
    /// recorded in both.
    pub fn admit(&mut self) -> Result<(), Limited> {
        let now = Instant::now();
        if !self.burst.has_room(now) {
            return Err(Limited::Burst);
        }
        if !self.sustained.has_room(now) {
            return Err(Limited::Sustained);
        }
        self.burst.record(now);
        self.sustained.record(now);
        Ok(())
    }
}
