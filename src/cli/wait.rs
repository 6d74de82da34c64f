//! `dockwait wait`: poll one address until it answers.

use clap::Args;

use crate::cli::{OutputFormat, shutdown_signal};
use crate::config::ReadinessConfig;
use crate::readiness::{ProbeTarget, ReadinessPoller};

/// Readiness timing flags shared by `wait` and `run`.
#[derive(Args, Debug, Clone, Default)]
pub struct TimingArgs {
    /// Total time budget in seconds [env: READY_TIMEOUT_SECS]
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Delay between attempts in milliseconds [env: READY_INTERVAL_MS]
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Per-attempt connect timeout in milliseconds, 0 for none
    #[arg(long, value_name = "MS")]
    pub connect_timeout: Option<u64>,

    /// Per-attempt response timeout in milliseconds, 0 for none
    #[arg(long, value_name = "MS")]
    pub response_timeout: Option<u64>,

    /// Only count 2xx responses as ready
    #[arg(long)]
    pub require_2xx: bool,
}

impl TimingArgs {
    /// Layer these flags over the resolved readiness config.
    pub fn apply(&self, config: &mut ReadinessConfig) {
        if let Some(secs) = self.timeout {
            config.timeout_secs = secs;
        }
        if let Some(ms) = self.interval {
            config.interval_ms = ms;
        }
        if let Some(ms) = self.connect_timeout {
            config.connect_timeout_ms = ms;
        }
        if let Some(ms) = self.response_timeout {
            config.response_timeout_ms = ms;
        }
        if self.require_2xx {
            config.require_2xx = true;
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct WaitCommand {
    /// Address to poll: http://host:port/path, https://..., tcp://host:port, or host:port
    pub target: String,

    #[command(flatten)]
    pub timing: TimingArgs,

    /// Result format on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,
}

/// Returns whether the target became ready.
pub async fn run_wait_command(cmd: WaitCommand, mut config: ReadinessConfig) -> anyhow::Result<bool> {
    cmd.timing.apply(&mut config);

    let target: ProbeTarget = cmd.target.parse()?;
    let policy = config.policy()?;
    let poller = ReadinessPoller::new(target.probe(&policy, config.require_2xx), policy);

    tracing::info!(
        "Waiting up to {:?} for {} (every {:?})",
        policy.total_timeout(),
        target,
        policy.interval()
    );

    let Some(report) = poller.wait_until(shutdown_signal()).await else {
        anyhow::bail!("interrupted while waiting for {target}");
    };

    cmd.output.print(&report)?;
    Ok(report.is_ready())
}
