//! Run a container, wait for it to answer, smoke test it, clean up.
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────┐   ┌───────────────┐
//! │ Ping       │──▶│ Ensure image │──▶│ Run       │──▶│ Resolve port  │
//! │ engine     │   │ (pull?)      │   │ container │   │               │
//! └────────────┘   └──────────────┘   └───────────┘   └───────────────┘
//!                                                             │
//!        ┌───────────────┐   ┌──────────────┐   ┌─────────────▼──┐
//!        │ Remove        │◀──│ Smoke checks │◀──│ Wait for ready │
//!        │ (unless kept) │   │ or logs      │   │                │
//!        └───────────────┘   └──────────────┘   └────────────────┘
//! ```
//!
//! Shutdown cancels the image pull, the readiness wait, or the smoke checks,
//! whichever is running. Container creation and cleanup are not
//! interrupted: cleanup runs whatever happened before it, so a container that
//! was started is always removed (unless kept).

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::Config;
use crate::container::{ContainerEngine, ContainerError, ContainerHandle, ContainerSpec};
use crate::error::ConfigError;
use crate::readiness::{HttpProbe, PollPolicy, PollReport, ProbeTarget, ReadinessPoller};
use crate::smoke::{SmokeResult, SmokeSuite};
use crate::util::duration_millis;

/// Final status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Ready and every smoke check passed.
    Passed,
    /// Deadline passed before the service answered.
    NotReady,
    /// Service answered but a smoke check failed.
    SmokeFailed,
    /// Shutdown was requested during the wait.
    Cancelled,
    /// Container engine not reachable.
    EngineUnavailable,
    /// Image, run, or port inspection failed.
    Failed,
}

impl WorkflowStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, WorkflowStatus::Passed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Passed => "passed",
            WorkflowStatus::NotReady => "not ready",
            WorkflowStatus::SmokeFailed => "smoke checks failed",
            WorkflowStatus::Cancelled => "cancelled",
            WorkflowStatus::EngineUnavailable => "container engine unavailable",
            WorkflowStatus::Failed => "failed",
        }
    }
}

/// Everything a workflow run found out.
#[derive(Debug, Clone, Serialize)]
pub struct WorkflowReport {
    pub status: WorkflowStatus,
    pub image: String,
    pub container: String,
    pub container_id: Option<String>,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "duration_ms", with = "duration_millis")]
    pub duration: Duration,
    pub host_port: Option<u16>,
    pub readiness: Option<PollReport>,
    pub smoke: Vec<SmokeResult>,
    /// Container log tail, collected when the run did not pass.
    pub logs: Vec<String>,
    pub error: Option<String>,
    /// Container left running on purpose.
    pub kept: bool,
}

impl WorkflowReport {
    fn new(spec: &ContainerSpec) -> Self {
        Self {
            status: WorkflowStatus::Failed,
            image: spec.image.clone(),
            container: spec.name.clone(),
            container_id: None,
            started_at: Utc::now(),
            duration: Duration::ZERO,
            host_port: None,
            readiness: None,
            smoke: Vec::new(),
            logs: Vec::new(),
            error: None,
            kept: false,
        }
    }

    fn fail(&mut self, status: WorkflowStatus, error: impl fmt::Display) {
        tracing::error!("{}: {}", status.as_str(), error);
        self.status = status;
        self.error = Some(error.to_string());
    }
}

impl fmt::Display for WorkflowReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Workflow: {}", self.status.as_str())?;
        writeln!(f, "  Image:     {}", self.image)?;
        writeln!(f, "  Container: {}", self.container)?;
        if let Some(port) = self.host_port {
            writeln!(f, "  Port:      127.0.0.1:{port}")?;
        }
        if let Some(readiness) = &self.readiness {
            writeln!(f, "  Readiness: {readiness}")?;
        }
        for result in &self.smoke {
            let mark = if result.passed { "PASS" } else { "FAIL" };
            writeln!(f, "  [{mark}] {} ({})", result.name, result.detail)?;
        }
        if let Some(error) = &self.error {
            writeln!(f, "  Error:     {error}")?;
        }
        if !self.logs.is_empty() {
            writeln!(f, "  Logs (last {} lines):", self.logs.len())?;
            for line in &self.logs {
                writeln!(f, "    {line}")?;
            }
        }
        if self.kept {
            writeln!(f, "  Container kept running")?;
        }
        write!(f, "  Took {:?}", self.duration)
    }
}

/// Options that do not belong to the container spec itself.
#[derive(Debug, Clone)]
pub struct WorkflowOptions {
    pub policy: PollPolicy,
    pub require_2xx: bool,
    pub path: String,
    pub auto_pull: bool,
    pub keep_container: bool,
    pub log_tail: usize,
}

/// A single smoke workflow against one container.
pub struct Workflow<E> {
    engine: E,
    spec: ContainerSpec,
    options: WorkflowOptions,
    smoke: SmokeSuite,
}

impl<E: ContainerEngine> Workflow<E> {
    pub fn new(engine: E, spec: ContainerSpec, options: WorkflowOptions, smoke: SmokeSuite) -> Self {
        Self {
            engine,
            spec,
            options,
            smoke,
        }
    }

    /// Build from resolved configuration.
    pub fn from_config(engine: E, config: &Config) -> Result<Self, ConfigError> {
        let policy = config.readiness.policy()?;
        let spec = config.container.to_spec()?;
        let smoke = SmokeSuite::from_config(
            &config.smoke,
            policy.attempt_budget().unwrap_or(Duration::from_secs(30)),
        );
        let options = WorkflowOptions {
            policy,
            require_2xx: config.readiness.require_2xx,
            path: config.smoke.path.clone(),
            auto_pull: config.container.auto_pull,
            keep_container: config.container.keep,
            log_tail: config.container.log_tail,
        };
        Ok(Self::new(engine, spec, options, smoke))
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run to completion.
    pub async fn run(&self) -> WorkflowReport {
        self.run_until(std::future::pending()).await
    }

    /// Run to completion, abandoning the current step if `shutdown`
    /// completes first. The container is still cleaned up.
    pub async fn run_until<F>(&self, shutdown: F) -> WorkflowReport
    where
        F: Future<Output = ()>,
    {
        let clock = Instant::now();
        let mut report = WorkflowReport::new(&self.spec);
        tokio::pin!(shutdown);

        let handle = self.execute(&mut report, shutdown.as_mut()).await;

        if let Some(handle) = handle {
            if !report.status.is_success() {
                report.logs = self.collect_logs(&handle).await;
            }
            self.cleanup(&handle, &mut report).await;
        }

        report.duration = clock.elapsed();
        report
    }

    /// Every step up to the smoke checks. Returns the container if one was
    /// started, so the caller can clean it up.
    async fn execute<F>(
        &self,
        report: &mut WorkflowReport,
        mut shutdown: Pin<&mut F>,
    ) -> Option<ContainerHandle>
    where
        F: Future<Output = ()>,
    {
        if let Err(e) = self.engine.ping().await {
            report.fail(WorkflowStatus::EngineUnavailable, e);
            return None;
        }

        let image = tokio::select! {
            result = self.ensure_image() => result,
            () = shutdown.as_mut() => {
                report.fail(
                    WorkflowStatus::Cancelled,
                    "shutdown requested while preparing the image",
                );
                return None;
            }
        };
        if let Err(e) = image {
            report.fail(WorkflowStatus::Failed, e);
            return None;
        }

        let handle = match self.engine.run(&self.spec).await {
            Ok(handle) => handle,
            Err(e) => {
                report.fail(WorkflowStatus::Failed, e);
                return None;
            }
        };
        report.container_id = Some(handle.id.clone());

        let host_port = match self.resolve_host_port(&handle).await {
            Ok(port) => port,
            Err(e) => {
                report.fail(WorkflowStatus::Failed, e);
                return Some(handle);
            }
        };
        report.host_port = Some(host_port);

        let target = ProbeTarget::http("127.0.0.1", host_port, self.options.path.as_str());
        let url = target.to_string();
        let probe = HttpProbe::new(url.clone(), &self.options.policy)
            .require_success_status(self.options.require_2xx);
        let poller = ReadinessPoller::new(probe, self.options.policy);

        tracing::info!("Waiting for {} to answer", url);
        let Some(readiness) = poller.wait_until(shutdown.as_mut()).await else {
            report.fail(WorkflowStatus::Cancelled, "shutdown requested during readiness wait");
            return Some(handle);
        };

        let ready = readiness.is_ready();
        report.readiness = Some(readiness);
        if !ready {
            report.status = WorkflowStatus::NotReady;
            return Some(handle);
        }

        let smoke = tokio::select! {
            results = self.smoke.run(&url, &self.engine, Some(&handle)) => results,
            () = shutdown.as_mut() => {
                report.fail(
                    WorkflowStatus::Cancelled,
                    "shutdown requested during smoke checks",
                );
                return Some(handle);
            }
        };
        report.smoke = smoke;
        report.status = if report.smoke.iter().all(|r| r.passed) {
            WorkflowStatus::Passed
        } else {
            WorkflowStatus::SmokeFailed
        };

        Some(handle)
    }

    async fn ensure_image(&self) -> Result<(), ContainerError> {
        if self.engine.image_present(&self.spec.image).await? {
            tracing::debug!("Image '{}' exists locally", self.spec.image);
            return Ok(());
        }
        if !self.options.auto_pull {
            return Err(ContainerError::ImageMissing {
                image: self.spec.image.clone(),
            });
        }
        self.engine.pull_image(&self.spec.image).await
    }

    async fn resolve_host_port(&self, handle: &ContainerHandle) -> Result<u16, ContainerError> {
        if self.spec.host_port != 0 {
            return Ok(self.spec.host_port);
        }
        self.engine
            .host_port(&handle.id, self.spec.container_port)
            .await?
            .ok_or_else(|| ContainerError::InspectFailed {
                id: handle.id.clone(),
                reason: format!("no host port bound to {}", self.spec.port_key()),
            })
    }

    async fn collect_logs(&self, handle: &ContainerHandle) -> Vec<String> {
        if self.options.log_tail == 0 {
            return Vec::new();
        }
        match self.engine.logs(&handle.id, self.options.log_tail).await {
            Ok(lines) => lines,
            Err(e) => {
                tracing::warn!("Could not collect logs for {}: {}", handle, e);
                Vec::new()
            }
        }
    }

    async fn cleanup(&self, handle: &ContainerHandle, report: &mut WorkflowReport) {
        if self.options.keep_container {
            tracing::info!("Keeping container running (keep_container=true): {}", handle);
            report.kept = true;
            return;
        }
        if let Err(e) = self.engine.remove(&handle.id).await {
            tracing::warn!("Cleanup of {} failed: {}", handle, e);
            if report.error.is_none() {
                report.error = Some(e.to_string());
            }
        }
    }
}
