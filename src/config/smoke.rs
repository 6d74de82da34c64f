use crate::config::helpers::optional_env;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Smoke test configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmokeConfig {
    /// Path probed for readiness and smoke checks.
    pub path: String,
    /// Text the response body must contain, if set.
    pub marker: Option<String>,
}

impl Default for SmokeConfig {
    fn default() -> Self {
        Self {
            path: "/".to_string(),
            marker: None,
        }
    }
}

impl SmokeConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let file = &settings.smoke;
        Ok(Self {
            path: optional_env("SMOKE_PATH")?
                .or_else(|| file.path.clone())
                .unwrap_or_else(|| Self::default().path),
            marker: optional_env("SMOKE_MARKER")?.or_else(|| file.marker.clone()),
        })
    }
}
