//! Timing parameters for a bounded poll sequence.

use std::time::Duration;

use crate::error::ConfigError;

/// Timing policy for a readiness poll.
///
/// Fields are private so a policy cannot change once a poll sequence has
/// started; construct a new one instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    total_timeout: Duration,
    interval: Duration,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(30),
            interval: Duration::from_secs(2),
            connect_timeout: Duration::from_secs(2),
            response_timeout: Duration::from_secs(5),
        }
    }
}

impl PollPolicy {
    /// Create a policy.
    ///
    /// `total_timeout` must be non-zero. A zero `interval` retries
    /// immediately. A zero connect or response timeout leaves that phase of
    /// an attempt unbounded.
    pub fn new(
        total_timeout: Duration,
        interval: Duration,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, ConfigError> {
        if total_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                key: "total_timeout".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            total_timeout,
            interval,
            connect_timeout,
            response_timeout,
        })
    }

    /// Total time budget measured from the first attempt.
    pub fn total_timeout(&self) -> Duration {
        self.total_timeout
    }

    /// Fixed delay between attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Per-attempt connect timeout (zero = unbounded).
    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Per-attempt response timeout (zero = unbounded).
    pub fn response_timeout(&self) -> Duration {
        self.response_timeout
    }

    /// Upper bound on a single attempt, or `None` if either phase is unbounded.
    pub fn attempt_budget(&self) -> Option<Duration> {
        if self.connect_timeout.is_zero() || self.response_timeout.is_zero() {
            None
        } else {
            Some(self.connect_timeout + self.response_timeout)
        }
    }
}
