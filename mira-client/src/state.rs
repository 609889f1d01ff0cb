//! Connection state machine and retry policy
//!
//! Named states rather than callback chains, so tests (and the UI's
//! offline/live indicator) can assert on state directly.

use std::time::Duration;

/// Logical session state, published through a watch channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport; either initial, after an error, or retries exhausted
    Disconnected,

    /// Dialing the gateway (the token rides on the upgrade request)
    Connecting,

    /// Upgrade accepted, handshake authenticated
    Authenticated,

    /// `Ready` received; the notification stream is live
    Connected,
}

impl ConnectionState {
    /// True while the layer will keep retrying on its own
    pub fn is_live(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

/// Bounded exponential backoff between reconnect attempts
///
/// After `max_attempts` consecutive failures the layer stays Disconnected
/// until an explicit external restart (e.g. user re-login). A successful
/// session resets the attempt counter.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1),
    /// capped at `max_delay`
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << shift);
        delay.min(self.max_delay)
    }

    /// True once `attempt` failures mean the layer should stop retrying
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
