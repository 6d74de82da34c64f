//! Error types for readiness polling.

use std::time::Duration;

use thiserror::Error;

/// A single connectivity check failed.
///
/// Every variant is transient: the poller treats it as "not ready yet".
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Connection could not be established.
    #[error("connection to {target} failed: {reason}")]
    Connect { target: String, reason: String },

    /// The attempt ran past its per-attempt budget.
    #[error("no answer from {target} within {after:?}")]
    Timeout { target: String, after: Duration },

    /// Connected, but the request itself failed.
    #[error("request to {target} failed: {reason}")]
    Request { target: String, reason: String },

    /// Got a response, but the probe requires a 2xx status.
    #[error("{target} answered with status {status}")]
    UnexpectedStatus { target: String, status: u16 },
}

/// Terminal failure of a poll sequence.
#[derive(Debug, Error)]
pub enum ReadinessError {
    /// No check succeeded within the total timeout.
    #[error("{target} not ready after {attempts} attempt(s) in {elapsed:?}{}", error_suffix(.last_error))]
    DeadlineExceeded {
        target: String,
        attempts: u32,
        elapsed: Duration,
        last_error: Option<String>,
    },
}

fn error_suffix(last_error: &Option<String>) -> String {
    last_error
        .as_deref()
        .map(|e| format!(": {e}"))
        .unwrap_or_default()
}
