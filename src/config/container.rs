use crate::config::helpers::{optional_env, parse_bool_env, parse_env};
use crate::container::ContainerSpec;
use crate::error::ConfigError;
use crate::settings::Settings;

/// Container to run for the smoke workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerConfig {
    /// Image to run. Required by `run`, unused by `wait`.
    pub image: Option<String>,
    /// Container name. A stale container with this name is replaced.
    pub name: String,
    /// Port on 127.0.0.1. 0 lets the engine pick one.
    pub host_port: u16,
    /// Port the app listens on inside the container.
    pub container_port: u16,
    /// Pull the image when it is not present locally.
    pub auto_pull: bool,
    /// Leave the container running after the workflow (for debugging).
    pub keep: bool,
    /// Log lines to collect when the workflow fails.
    pub log_tail: usize,
    /// Environment passed to the container.
    pub env: Vec<(String, String)>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            image: None,
            name: "dockwait-app".to_string(),
            host_port: 8080,
            container_port: 80,
            auto_pull: true,
            keep: false,
            log_tail: 50,
            env: Vec::new(),
        }
    }
}

impl ContainerConfig {
    pub(crate) fn resolve(settings: &Settings) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let file = &settings.container;

        Ok(Self {
            image: optional_env("APP_IMAGE")?.or_else(|| file.image.clone()),
            name: optional_env("APP_CONTAINER_NAME")?
                .or_else(|| file.name.clone())
                .unwrap_or(defaults.name),
            host_port: parse_env("APP_HOST_PORT", "a port number")?
                .or(file.host_port)
                .unwrap_or(defaults.host_port),
            container_port: parse_env("APP_CONTAINER_PORT", "a port number")?
                .or(file.container_port)
                .unwrap_or(defaults.container_port),
            auto_pull: parse_bool_env("APP_AUTO_PULL")?
                .or(file.auto_pull)
                .unwrap_or(defaults.auto_pull),
            keep: parse_bool_env("APP_KEEP_CONTAINER")?
                .or(file.keep)
                .unwrap_or(defaults.keep),
            log_tail: parse_env("APP_LOG_TAIL", "a non-negative integer")?
                .or(file.log_tail)
                .unwrap_or(defaults.log_tail),
            env: file
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        })
    }

    /// Container spec handed to the engine.
    pub fn to_spec(&self) -> Result<ContainerSpec, ConfigError> {
        let image = self
            .image
            .clone()
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                key: "APP_IMAGE".to_string(),
            })?;

        if self.container_port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "APP_CONTAINER_PORT".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(ContainerSpec {
            name: self.name.clone(),
            image,
            host_port: self.host_port,
            container_port: self.container_port,
            env: self.env.clone(),
        })
    }
}
