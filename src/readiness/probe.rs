//! Single-shot connectivity checks.

use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;

use crate::readiness::error::ProbeError;
use crate::readiness::policy::PollPolicy;

/// Successful check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeSuccess {
    /// HTTP status if the probe speaks HTTP. Informational only.
    pub status: Option<u16>,
}

/// One connectivity check against a target.
///
/// Implementations must bound their own running time using the per-attempt
/// timeouts they were built with. They must not retry; retrying is the
/// poller's job.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Run the check once.
    async fn check(&self) -> Result<ProbeSuccess, ProbeError>;

    /// Human-readable target, used in logs and reports.
    fn target(&self) -> String;
}

#[async_trait]
impl<P: Probe + ?Sized> Probe for Box<P> {
    async fn check(&self) -> Result<ProbeSuccess, ProbeError> {
        (**self).check().await
    }

    fn target(&self) -> String {
        (**self).target()
    }
}

/// HTTP GET reachability probe.
///
/// By default any HTTP response counts as reachable. Use
/// [`HttpProbe::require_success_status`] to also demand a 2xx status.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    url: String,
    connect_timeout: Duration,
    response_timeout: Duration,
    require_success: bool,
    client: reqwest::Client,
}

impl HttpProbe {
    /// Create a probe for `url` using the per-attempt timeouts in `policy`.
    ///
    /// The connect phase is bounded by the connect timeout and the wait for
    /// the response by the response timeout, each only when non-zero.
    pub fn new(url: impl Into<String>, policy: &PollPolicy) -> Self {
        // Readiness is about the target itself, not whatever proxy sits in front.
        let mut builder = reqwest::Client::builder().no_proxy();
        if !policy.connect_timeout().is_zero() {
            builder = builder.connect_timeout(policy.connect_timeout());
        }
        if !policy.response_timeout().is_zero() {
            builder = builder.read_timeout(policy.response_timeout());
        }
        if let Some(budget) = policy.attempt_budget() {
            builder = builder.timeout(budget);
        }
        let client = builder.build().unwrap_or_else(|_| reqwest::Client::new());

        Self {
            url: url.into(),
            connect_timeout: policy.connect_timeout(),
            response_timeout: policy.response_timeout(),
            require_success: false,
            client,
        }
    }

    /// Treat non-2xx responses as "not ready".
    pub fn require_success_status(mut self, require: bool) -> Self {
        self.require_success = require;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Probe for HttpProbe {
    async fn check(&self) -> Result<ProbeSuccess, ProbeError> {
        tracing::trace!("HTTP probe requesting {}", self.url);

        let resp = self.client.get(&self.url).send().await.map_err(|e| {
            if e.is_connect() && e.is_timeout() {
                ProbeError::Timeout {
                    target: self.url.clone(),
                    after: self.connect_timeout,
                }
            } else if e.is_connect() {
                ProbeError::Connect {
                    target: self.url.clone(),
                    reason: e.to_string(),
                }
            } else if e.is_timeout() {
                ProbeError::Timeout {
                    target: self.url.clone(),
                    after: self.response_timeout,
                }
            } else {
                ProbeError::Request {
                    target: self.url.clone(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if self.require_success && !status.is_success() {
            return Err(ProbeError::UnexpectedStatus {
                target: self.url.clone(),
                status: status.as_u16(),
            });
        }

        Ok(ProbeSuccess {
            status: Some(status.as_u16()),
        })
    }

    fn target(&self) -> String {
        self.url.clone()
    }
}

/// TCP connect probe. The connection is dropped as soon as it is established.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    address: String,
    connect_timeout: Duration,
}

impl TcpProbe {
    /// A zero `connect_timeout` leaves the connect unbounded.
    pub fn new(address: impl Into<String>, connect_timeout: Duration) -> Self {
        Self {
            address: address.into(),
            connect_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn check(&self) -> Result<ProbeSuccess, ProbeError> {
        tracing::trace!("TCP probe connecting to {}", self.address);

        let connect = TcpStream::connect(&self.address);
        let result = if self.connect_timeout.is_zero() {
            connect.await
        } else {
            match tokio::time::timeout(self.connect_timeout, connect).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(ProbeError::Timeout {
                        target: self.target(),
                        after: self.connect_timeout,
                    });
                }
            }
        };

        match result {
            Ok(_stream) => Ok(ProbeSuccess::default()),
            Err(e) => Err(ProbeError::Connect {
                target: self.target(),
                reason: e.to_string(),
            }),
        }
    }

    fn target(&self) -> String {
        format!("tcp://{}", self.address)
    }
}
