use std::time::Duration;

use crate::config::helpers::{parse_bool_env, parse_env};
use crate::error::ConfigError;
use crate::readiness::PollPolicy;
use crate::settings::Settings;

/// Readiness wait configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Total time budget in seconds.
    pub timeout_secs: u64,
    /// Delay between attempts in milliseconds.
    pub interval_ms: u64,
    /// Per-attempt connect timeout in milliseconds (0 = unbounded).
    pub connect_timeout_ms: u64,
    /// Per-attempt response timeout in milliseconds (0 = unbounded).
    pub response_timeout_ms: u64,
    /// Only count 2xx responses as ready.
    pub require_2xx: bool,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            interval_ms: 2_000,
            connect_timeout_ms: 2_000,
            response_timeout_ms: 5_000,
            require_2xx: false,
        }
    }
}

impl ReadinessConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let file = &settings.readiness;

        let config = Self {
            timeout_secs: parse_env("READY_TIMEOUT_SECS", "a positive integer")?
                .or(file.timeout_secs)
                .unwrap_or(defaults.timeout_secs),
            interval_ms: parse_env("READY_INTERVAL_MS", "a non-negative integer")?
                .or(file.interval_ms)
                .unwrap_or(defaults.interval_ms),
            connect_timeout_ms: parse_env("READY_CONNECT_TIMEOUT_MS", "a non-negative integer")?
                .or(file.connect_timeout_ms)
                .unwrap_or(defaults.connect_timeout_ms),
            response_timeout_ms: parse_env("READY_RESPONSE_TIMEOUT_MS", "a non-negative integer")?
                .or(file.response_timeout_ms)
                .unwrap_or(defaults.response_timeout_ms),
            require_2xx: parse_bool_env("READY_REQUIRE_2XX")?
                .or(file.require_2xx)
                .unwrap_or(defaults.require_2xx),
        };

        if config.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "READY_TIMEOUT_SECS".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(config)
    }

    /// Build the poll policy.
    pub fn policy(&self) -> Result<PollPolicy, ConfigError> {
        PollPolicy::new(
            Duration::from_secs(self.timeout_secs),
            Duration::from_millis(self.interval_ms),
            Duration::from_millis(self.connect_timeout_ms),
            Duration::from_millis(self.response_timeout_ms),
        )
    }
}
