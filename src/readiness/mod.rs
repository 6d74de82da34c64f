//! Readiness polling for network services.
//!
//! Answers one question: did a service become reachable within a bounded
//! time budget? A [`ReadinessPoller`] drives a [`Probe`] (HTTP or TCP) under a
//! [`PollPolicy`] and produces a [`PollReport`].
//!
//! # Example
//!
//! ```rust,no_run
//! use dockwait::readiness::{PollPolicy, ProbeTarget, ReadinessPoller};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let target: ProbeTarget = "http://127.0.0.1:8080/".parse()?;
//! let policy = PollPolicy::default();
//! let poller = ReadinessPoller::new(target.probe(&policy, false), policy);
//!
//! let report = poller.wait().await.into_result()?;
//! println!("ready after {} attempts", report.attempts);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod policy;
pub mod poller;
pub mod probe;
pub mod target;

pub use error::{ProbeError, ReadinessError};
pub use policy::PollPolicy;
pub use poller::{
    Attempt, AttemptOutcome, PollOutcome, PollReport, PollState, ReadinessPoller,
};
pub use probe::{HttpProbe, Probe, ProbeSuccess, TcpProbe};
pub use target::{ProbeScheme, ProbeTarget};
