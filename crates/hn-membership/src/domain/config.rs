//! Membership timing parameters.

use std::time::Duration;

/// Timing knobs for the poller and the connection manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipConfig {
    /// Fixed interval between poll ticks.
    pub poll_interval: Duration,
    /// Upper bound on one connect-and-greet exchange.
    /// A peer that does not answer within this window counts as a failed greet.
    pub greet_timeout: Duration,
    /// Wait before the first tick (zero = poll immediately).
    pub startup_delay: Duration,
}

impl Default for MembershipConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            greet_timeout: Duration::from_secs(3),
            startup_delay: Duration::ZERO,
        }
    }
}

impl MembershipConfig {
    /// Short timings for tests.
    pub fn for_testing() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            greet_timeout: Duration::from_millis(500),
            startup_delay: Duration::ZERO,
        }
    }

    /// Override the poll interval.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the greet timeout.
    #[must_use]
    pub fn with_greet_timeout(mut self, timeout: Duration) -> Self {
        self.greet_timeout = timeout;
        self
    }

    /// Wait `delay` before the first tick.
    #[must_use]
    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}
