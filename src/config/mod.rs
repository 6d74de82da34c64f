//! Configuration resolution.
//!
//! Precedence, highest first: CLI flags (applied by the caller), environment
//! variables, the TOML settings file, built-in defaults.

mod container;
pub(crate) mod helpers;
mod readiness;
mod smoke;

pub use container::ContainerConfig;
pub use readiness::ReadinessConfig;
pub use smoke::SmokeConfig;

use std::path::Path;

use crate::error::ConfigError;
use crate::settings::Settings;

/// Fully resolved configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    pub readiness: ReadinessConfig,
    pub container: ContainerConfig,
    pub smoke: SmokeConfig,
}

impl Config {
    /// Resolve from env vars layered over `settings`.
    pub fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        Ok(Self {
            readiness: ReadinessConfig::resolve(settings)?,
            container: ContainerConfig::resolve(settings)?,
            smoke: SmokeConfig::resolve(settings)?,
        })
    }

    /// Load the optional settings file, then resolve.
    pub fn load(settings_path: Option<&Path>) -> Result<Self, ConfigError> {
        let settings = Settings::load_optional(settings_path)?;
        Self::resolve(&settings)
    }

    /// Load the optional settings file and resolve only the readiness area.
    ///
    /// Container and smoke settings are not read, so a bad `APP_*` or
    /// `SMOKE_*` variable does not affect a plain wait.
    pub fn load_readiness(settings_path: Option<&Path>) -> Result<ReadinessConfig, ConfigError> {
        let settings = Settings::load_optional(settings_path)?;
        ReadinessConfig::resolve(&settings)
    }
}
