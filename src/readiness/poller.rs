//! Bounded readiness polling.
//!
//! The poller runs one probe at a time until a check succeeds or the total
//! timeout has elapsed. Transient probe failures never escape the loop; the
//! only terminal failure is [`PollOutcome::DeadlineExceeded`].
//!
//! ```text
//!            ┌──────────┐   attempt   ┌──────────┐   success   ┌───────┐
//!  start ──▶ │ Waiting  │ ──────────▶ │ Checking │ ──────────▶ │ Ready │
//!            └──────────┘             └──────────┘             └───────┘
//!                 ▲   failure, time left   │
//!                 └────────────────────────┤
//!                                          │ failure, time used up
//!                                          ▼
//!                                     ┌─────────┐
//!                                     │ Expired │
//!                                     └─────────┘
//! ```

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::readiness::error::ReadinessError;
use crate::readiness::policy::PollPolicy;
use crate::readiness::probe::Probe;
use crate::util::duration_millis;

/// Poll state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Waiting,
    Checking,
    /// Terminal: a check succeeded.
    Ready,
    /// Terminal: the time budget ran out.
    Expired,
}

impl PollState {
    /// State reached once a check has completed.
    ///
    /// `elapsed` is measured from the start of the first attempt.
    pub fn after_check(succeeded: bool, elapsed: Duration, total_timeout: Duration) -> Self {
        if succeeded {
            PollState::Ready
        } else if elapsed >= total_timeout {
            PollState::Expired
        } else {
            PollState::Waiting
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Ready | PollState::Expired)
    }
}

/// What a single attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Success { status: Option<u16> },
    TransientFailure { reason: String },
}

impl AttemptOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, AttemptOutcome::Success { .. })
    }
}

/// Record of one attempt, handed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    /// 1-based attempt number.
    pub number: u32,
    pub outcome: AttemptOutcome,
    /// Time spent in this attempt alone.
    pub elapsed: Duration,
}

/// Terminal outcome of a poll sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PollOutcome {
    Ready,
    DeadlineExceeded,
}

/// Result of a full poll sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PollReport {
    pub target: String,
    pub outcome: PollOutcome,
    pub attempts: u32,
    #[serde(rename = "elapsed_ms", with = "duration_millis")]
    pub elapsed: Duration,
    /// Status code from the successful check, if the probe reports one.
    pub last_status: Option<u16>,
    /// Most recent transient failure, if any.
    pub last_error: Option<String>,
}

impl PollReport {
    pub fn is_ready(&self) -> bool {
        self.outcome == PollOutcome::Ready
    }

    /// Turn a deadline-exceeded report into an error.
    pub fn into_result(self) -> Result<PollReport, ReadinessError> {
        match self.outcome {
            PollOutcome::Ready => Ok(self),
            PollOutcome::DeadlineExceeded => Err(ReadinessError::DeadlineExceeded {
                target: self.target,
                attempts: self.attempts,
                elapsed: self.elapsed,
                last_error: self.last_error,
            }),
        }
    }
}

impl fmt::Display for PollReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.outcome {
            PollOutcome::Ready => {
                write!(
                    f,
                    "{} ready after {} attempt(s) in {:?}",
                    self.target, self.attempts, self.elapsed
                )?;
                if let Some(status) = self.last_status {
                    write!(f, " (status {status})")?;
                }
                Ok(())
            }
            PollOutcome::DeadlineExceeded => {
                write!(
                    f,
                    "{} not ready after {} attempt(s) in {:?}",
                    self.target, self.attempts, self.elapsed
                )?;
                if let Some(e) = &self.last_error {
                    write!(f, ": {e}")?;
                }
                Ok(())
            }
        }
    }
}

/// Polls a probe until it succeeds or the policy's deadline passes.
pub struct ReadinessPoller<P> {
    probe: P,
    policy: PollPolicy,
}

impl<P: Probe> ReadinessPoller<P> {
    pub fn new(probe: P, policy: PollPolicy) -> Self {
        Self { probe, policy }
    }

    pub fn policy(&self) -> &PollPolicy {
        &self.policy
    }

    pub fn probe(&self) -> &P {
        &self.probe
    }

    /// Poll until ready or expired.
    pub async fn wait(&self) -> PollReport {
        self.wait_with(|_| {}).await
    }

    /// Poll until ready or expired, or return `None` as soon as `shutdown`
    /// completes.
    pub async fn wait_until<F>(&self, shutdown: F) -> Option<PollReport>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            report = self.wait() => Some(report),
            () = shutdown => {
                tracing::info!("Readiness wait on {} cancelled", self.probe.target());
                None
            }
        }
    }

    /// Poll until ready or expired, calling `on_attempt` after every check.
    pub async fn wait_with<F>(&self, mut on_attempt: F) -> PollReport
    where
        F: FnMut(&Attempt) + Send,
    {
        let target = self.probe.target();
        let total_timeout = self.policy.total_timeout();
        let interval = self.policy.interval();

        let start = Instant::now();
        let mut state = PollState::Waiting;
        let mut attempts: u32 = 0;
        let mut last_status = None;
        let mut last_error = None;

        loop {
            state = transition(&target, state, PollState::Checking);
            attempts += 1;

            let attempt_start = Instant::now();
            let outcome = match self.probe.check().await {
                Ok(success) => {
                    last_status = success.status;
                    AttemptOutcome::Success {
                        status: success.status,
                    }
                }
                Err(e) => {
                    tracing::trace!("Attempt {} on {} failed: {}", attempts, target, e);
                    let reason = e.to_string();
                    last_error = Some(reason.clone());
                    AttemptOutcome::TransientFailure { reason }
                }
            };
            let elapsed = start.elapsed();

            let next = PollState::after_check(outcome.is_success(), elapsed, total_timeout);
            on_attempt(&Attempt {
                number: attempts,
                outcome,
                elapsed: attempt_start.elapsed(),
            });
            state = transition(&target, state, next);

            let outcome = match state {
                PollState::Ready => PollOutcome::Ready,
                PollState::Expired => PollOutcome::DeadlineExceeded,
                PollState::Waiting | PollState::Checking => {
                    // Never sleep past the deadline; the last attempt lands on it.
                    let delay = interval.min(total_timeout.saturating_sub(elapsed));
                    if delay.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(delay).await;
                    }
                    continue;
                }
            };

            let report = PollReport {
                target,
                outcome,
                attempts,
                elapsed: start.elapsed(),
                last_status,
                last_error,
            };
            match report.outcome {
                PollOutcome::Ready => tracing::info!("{}", report),
                PollOutcome::DeadlineExceeded => tracing::warn!("{}", report),
            }
            return report;
        }
    }
}

fn transition(target: &str, from: PollState, to: PollState) -> PollState {
    if from != to {
        tracing::debug!("Readiness of {}: {:?} -> {:?}", target, from, to);
    }
    to
}
