//! Smoke checks run once a service is reachable.
//!
//! Readiness only says "something answered". These checks look at what
//! answered: the HTTP status, the response body, and whether the container
//! is still running. Every check runs even if an earlier one failed, so the
//! report shows the full picture.

use std::time::Duration;

use serde::Serialize;

use crate::config::SmokeConfig;
use crate::container::{ContainerEngine, ContainerHandle};

/// A single post-readiness check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmokeCheck {
    /// Response status is 2xx.
    SuccessStatus,
    /// Response body contains the given text.
    BodyContains(String),
    /// The engine reports the container as running.
    ContainerRunning,
}

impl SmokeCheck {
    pub fn name(&self) -> String {
        match self {
            SmokeCheck::SuccessStatus => "http status is 2xx".to_string(),
            SmokeCheck::BodyContains(marker) => format!("body contains {marker:?}"),
            SmokeCheck::ContainerRunning => "container is running".to_string(),
        }
    }

    fn needs_response(&self) -> bool {
        matches!(self, SmokeCheck::SuccessStatus | SmokeCheck::BodyContains(_))
    }
}

/// Outcome of one check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SmokeResult {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

impl SmokeResult {
    fn pass(check: &SmokeCheck, detail: impl Into<String>) -> Self {
        Self {
            name: check.name(),
            passed: true,
            detail: detail.into(),
        }
    }

    fn fail(check: &SmokeCheck, detail: impl Into<String>) -> Self {
        Self {
            name: check.name(),
            passed: false,
            detail: detail.into(),
        }
    }
}

/// Response fetched once and shared by all HTTP checks.
struct Fetched {
    status: u16,
    body: String,
}

/// An ordered set of smoke checks.
#[derive(Debug, Clone)]
pub struct SmokeSuite {
    checks: Vec<SmokeCheck>,
    client: reqwest::Client,
}

impl SmokeSuite {
    pub fn new(checks: Vec<SmokeCheck>, request_timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .no_proxy()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { checks, client }
    }

    /// Status check, marker check if a marker is configured, container check.
    pub fn from_config(config: &SmokeConfig, request_timeout: Duration) -> Self {
        let mut checks = vec![SmokeCheck::SuccessStatus];
        if let Some(marker) = config.marker.as_ref().filter(|m| !m.is_empty()) {
            checks.push(SmokeCheck::BodyContains(marker.clone()));
        }
        checks.push(SmokeCheck::ContainerRunning);
        Self::new(checks, request_timeout)
    }

    pub fn checks(&self) -> &[SmokeCheck] {
        &self.checks
    }

    /// Run every check against `url` and `container`.
    pub async fn run(
        &self,
        url: &str,
        engine: &dyn ContainerEngine,
        container: Option<&ContainerHandle>,
    ) -> Vec<SmokeResult> {
        let fetched = if self.checks.iter().any(SmokeCheck::needs_response) {
            Some(self.fetch(url).await)
        } else {
            None
        };

        let mut results = Vec::with_capacity(self.checks.len());
        for check in &self.checks {
            let result = match (check, &fetched) {
                (SmokeCheck::SuccessStatus | SmokeCheck::BodyContains(_), Some(Err(e))) => {
                    SmokeResult::fail(check, e.clone())
                }
                (SmokeCheck::SuccessStatus, Some(Ok(resp))) => {
                    if (200..300).contains(&resp.status) {
                        SmokeResult::pass(check, format!("status {}", resp.status))
                    } else {
                        SmokeResult::fail(check, format!("status {}", resp.status))
                    }
                }
                (SmokeCheck::BodyContains(marker), Some(Ok(resp))) => {
                    if resp.body.contains(marker.as_str()) {
                        SmokeResult::pass(check, "marker found")
                    } else {
                        SmokeResult::fail(
                            check,
                            format!("marker not found in {} byte body", resp.body.len()),
                        )
                    }
                }
                (SmokeCheck::ContainerRunning, _) => match container {
                    None => SmokeResult::fail(check, "no container to inspect"),
                    Some(handle) => match engine.is_running(&handle.id).await {
                        Ok(true) => SmokeResult::pass(check, "running"),
                        Ok(false) => SmokeResult::fail(check, "not running"),
                        Err(e) => SmokeResult::fail(check, e.to_string()),
                    },
                },
                (SmokeCheck::SuccessStatus | SmokeCheck::BodyContains(_), None) => {
                    SmokeResult::fail(check, "response not fetched")
                }
            };

            if result.passed {
                tracing::info!("Smoke check passed: {}", result.name);
            } else {
                tracing::warn!("Smoke check failed: {} ({})", result.name, result.detail);
            }
            results.push(result);
        }
        results
    }

    async fn fetch(&self, url: &str) -> Result<Fetched, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("request to {url} failed: {e}"))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| format!("reading body from {url} failed: {e}"))?;
        Ok(Fetched { status, body })
    }
}
