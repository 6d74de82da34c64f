//! Network address a readiness poll is aimed at.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::ConfigError;
use crate::readiness::policy::PollPolicy;
use crate::readiness::probe::{HttpProbe, Probe, TcpProbe};

/// Protocol used to probe a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeScheme {
    Http,
    Https,
    /// Plain TCP connect, no request is sent.
    Tcp,
}

impl ProbeScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProbeScheme::Http => "http",
            ProbeScheme::Https => "https",
            ProbeScheme::Tcp => "tcp",
        }
    }
}

/// Host, port and path to check for readiness.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub scheme: ProbeScheme,
    pub host: String,
    pub port: u16,
    /// Request path including any query string. Always `/` for TCP targets.
    pub path: String,
}

impl ProbeTarget {
    /// HTTP target on the given host and port.
    pub fn http(host: impl Into<String>, port: u16, path: impl Into<String>) -> Self {
        Self {
            scheme: ProbeScheme::Http,
            host: host.into(),
            port,
            path: normalize_path(&path.into()),
        }
    }

    /// TCP target on the given host and port.
    pub fn tcp(host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: ProbeScheme::Tcp,
            host: host.into(),
            port,
            path: "/".to_string(),
        }
    }

    /// `host:port` form used for socket connects.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Build the probe matching this target's scheme.
    ///
    /// `require_success_status` only affects HTTP(S) targets.
    pub fn probe(&self, policy: &PollPolicy, require_success_status: bool) -> Box<dyn Probe> {
        match self.scheme {
            ProbeScheme::Http | ProbeScheme::Https => Box::new(
                HttpProbe::new(self.to_string(), policy)
                    .require_success_status(require_success_status),
            ),
            ProbeScheme::Tcp => Box::new(TcpProbe::new(self.address(), policy.connect_timeout())),
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scheme {
            ProbeScheme::Tcp => write!(f, "tcp://{}:{}", self.host, self.port),
            scheme => write!(
                f,
                "{}://{}:{}{}",
                scheme.as_str(),
                self.host,
                self.port,
                self.path
            ),
        }
    }
}

impl FromStr for ProbeTarget {
    type Err = ConfigError;

    /// Parse `http://host:port/path`, `https://...`, `tcp://host:port`, or a
    /// bare `host:port` (treated as HTTP).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: "target".to_string(),
            message,
        };

        let raw = s.trim();
        let with_scheme = if raw.contains("://") {
            raw.to_string()
        } else {
            format!("http://{raw}")
        };

        let url = Url::parse(&with_scheme).map_err(|e| invalid(format!("'{raw}': {e}")))?;

        let scheme = match url.scheme() {
            "http" => ProbeScheme::Http,
            "https" => ProbeScheme::Https,
            "tcp" => ProbeScheme::Tcp,
            other => return Err(invalid(format!("unsupported scheme '{other}'"))),
        };

        let host = url
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| invalid(format!("'{raw}' has no host")))?
            .to_string();

        let port = url
            .port_or_known_default()
            .ok_or_else(|| invalid(format!("'{raw}' has no port")))?;

        let path = match url.query() {
            Some(q) => format!("{}?{}", url.path(), q),
            None => url.path().to_string(),
        };

        Ok(Self {
            scheme,
            host,
            port,
            path: if scheme == ProbeScheme::Tcp {
                "/".to_string()
            } else {
                normalize_path(&path)
            },
        })
    }
}

fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_http_url() {
        let target: ProbeTarget = "http://localhost:8080/health".parse().unwrap();
        assert_eq!(target, ProbeTarget::http("localhost", 8080, "/health"));
    }

    #[test]
    fn test_parse_bare_host_port_defaults_to_http() {
        let target: ProbeTarget = "127.0.0.1:3000".parse().unwrap();
        assert_eq!(target.scheme, ProbeScheme::Http);
        assert_eq!(target.port, 3000);
        assert_eq!(target.path, "/");
    }

    #[test]
    fn test_parse_default_ports() {
        let http: ProbeTarget = "http://example.com".parse().unwrap();
        assert_eq!(http.port, 80);
        let https: ProbeTarget = "https://example.com/status".parse().unwrap();
        assert_eq!(https.port, 443);
        assert_eq!(https.scheme, ProbeScheme::Https);
    }

    #[test]
    fn test_parse_tcp() {
        let target: ProbeTarget = "tcp://db:5432".parse().unwrap();
        assert_eq!(target, ProbeTarget::tcp("db", 5432));
        assert_eq!(target.to_string(), "tcp://db:5432");
    }

    #[test]
    fn test_parse_tcp_without_port_fails() {
        assert!("tcp://db".parse::<ProbeTarget>().is_err());
    }

    #[test]
    fn test_parse_keeps_query() {
        let target: ProbeTarget = "http://h:1/ready?deep=1".parse().unwrap();
        assert_eq!(target.path, "/ready?deep=1");
        assert_eq!(target.to_string(), "http://h:1/ready?deep=1");
    }

    #[test]
    fn test_parse_rejects_unknown_scheme() {
        let err = "ftp://h:21".parse::<ProbeTarget>().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn test_probe_matches_scheme() {
        let policy = PollPolicy::default();
        let http = ProbeTarget::http("127.0.0.1", 8080, "/").probe(&policy, false);
        assert_eq!(http.target(), "http://127.0.0.1:8080/");
        let tcp = ProbeTarget::tcp("127.0.0.1", 5432).probe(&policy, true);
        assert_eq!(tcp.target(), "tcp://127.0.0.1:5432");
    }

    #[test]
    fn test_http_constructor_normalizes_path() {
        let target = ProbeTarget::http("127.0.0.1", 8080, "health");
        assert_eq!(target.to_string(), "http://127.0.0.1:8080/health");
        assert_eq!(target.address(), "127.0.0.1:8080");
    }
}
