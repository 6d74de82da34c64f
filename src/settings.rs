//! File-backed settings.
//!
//! Settings are read from an optional TOML file and sit below environment
//! variables in precedence. Every key is optional; missing keys fall back to
//! the defaults in the `config` module.
//!
//! ```toml
//! [readiness]
//! timeout_secs = 30
//! interval_ms = 2000
//!
//! [container]
//! image = "demo-web:latest"
//! name = "demo-web"
//! host_port = 8080
//! container_port = 80
//!
//! [container.env]
//! GREETING = "hello"
//!
//! [smoke]
//! path = "/"
//! marker = "Hello"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub readiness: ReadinessSettings,
    pub container: ContainerSettings,
    pub smoke: SmokeSettings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReadinessSettings {
    pub timeout_secs: Option<u64>,
    pub interval_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub response_timeout_ms: Option<u64>,
    pub require_2xx: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContainerSettings {
    pub image: Option<String>,
    pub name: Option<String>,
    pub host_port: Option<u16>,
    pub container_port: Option<u16>,
    pub auto_pull: Option<bool>,
    pub keep: Option<bool>,
    pub log_tail: Option<usize>,
    pub env: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmokeSettings {
    pub path: Option<String>,
    pub marker: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from `path` if given, otherwise use empty settings.
    pub fn load_optional(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_load_full_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[readiness]
timeout_secs = 45
interval_ms = 500

[container]
image = "demo-web:latest"
host_port = 0

[container.env]
GREETING = "hi"

[smoke]
marker = "Hello"
"#
        )
        .unwrap();

        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings.readiness.timeout_secs, Some(45));
        assert_eq!(settings.readiness.interval_ms, Some(500));
        assert_eq!(settings.readiness.connect_timeout_ms, None);
        assert_eq!(settings.container.image.as_deref(), Some("demo-web:latest"));
        assert_eq!(settings.container.host_port, Some(0));
        assert_eq!(
            settings.container.env.get("GREETING").map(String::as_str),
            Some("hi")
        );
        assert_eq!(settings.smoke.marker.as_deref(), Some("Hello"));
    }

    #[test]
    fn test_load_empty_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let settings = Settings::load(file.path()).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unknown_key_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[readiness]\ntimeout = 3\n").unwrap();
        assert!(matches!(
            Settings::load(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Settings::load(&missing),
            Err(ConfigError::Io { .. })
        ));
        assert_eq!(Settings::load_optional(None).unwrap(), Settings::default());
    }
}
