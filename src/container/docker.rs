//! Docker implementation of [`ContainerEngine`] using bollard.

use std::collections::HashMap;

use async_trait::async_trait;
use bollard::Docker;
use bollard::container::{
    Config, CreateContainerOptions, LogsOptions, RemoveContainerOptions, StartContainerOptions,
};
use bollard::errors::Error as BollardError;
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use futures::StreamExt;

use crate::container::config::{ContainerHandle, ContainerSpec};
use crate::container::engine::ContainerEngine;
use crate::container::error::{ContainerError, Result};

/// Connect to the Docker daemon.
///
/// Tries bollard's local defaults first (which honour `DOCKER_HOST`), then on
/// unix the Docker Desktop socket under `$HOME` and the rootless socket under
/// `$XDG_RUNTIME_DIR`.
pub async fn connect_docker() -> Result<Docker> {
    let mut last_error = match Docker::connect_with_local_defaults() {
        Ok(docker) => match docker.ping().await {
            Ok(_) => return Ok(docker),
            Err(e) => e.to_string(),
        },
        Err(e) => e.to_string(),
    };

    #[cfg(unix)]
    for socket in fallback_sockets() {
        if !std::path::Path::new(&socket).exists() {
            continue;
        }
        match Docker::connect_with_unix(&socket, 120, bollard::API_DEFAULT_VERSION) {
            Ok(docker) => match docker.ping().await {
                Ok(_) => {
                    tracing::debug!("Connected to Docker via {}", socket);
                    return Ok(docker);
                }
                Err(e) => last_error = format!("{socket}: {e}"),
            },
            Err(e) => last_error = format!("{socket}: {e}"),
        }
    }

    Err(ContainerError::EngineNotAvailable { reason: last_error })
}

#[cfg(unix)]
fn fallback_sockets() -> Vec<String> {
    let mut sockets = Vec::new();
    if let Some(home) = std::env::var_os("HOME") {
        sockets.push(format!("{}/.docker/run/docker.sock", home.to_string_lossy()));
    }
    if let Some(runtime_dir) = std::env::var_os("XDG_RUNTIME_DIR") {
        sockets.push(format!("{}/docker.sock", runtime_dir.to_string_lossy()));
    }
    sockets
}

fn is_not_found(e: &BollardError) -> bool {
    matches!(
        e,
        BollardError::DockerResponseServerError {
            status_code: 404,
            ..
        }
    )
}

/// Container engine backed by a Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connect using [`connect_docker`].
    pub async fn connect() -> Result<Self> {
        Ok(Self {
            docker: connect_docker().await?,
        })
    }

    pub fn from_docker(docker: Docker) -> Self {
        Self { docker }
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| ContainerError::EngineNotAvailable {
                reason: e.to_string(),
            })
    }

    async fn image_present(&self, image: &str) -> Result<bool> {
        match self.docker.inspect_image(image).await {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(ContainerError::InspectFailed {
                id: image.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        tracing::info!("Pulling image: {}", image);

        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(status) = info.status {
                        tracing::trace!("Pull status: {}", status);
                    }
                }
                Err(e) => {
                    return Err(ContainerError::ImagePullFailed {
                        image: image.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        tracing::info!("Pulled image: {}", image);
        Ok(())
    }

    async fn run(&self, spec: &ContainerSpec) -> Result<ContainerHandle> {
        // Replace a leftover container from a previous run
        let _ = self
            .docker
            .remove_container(
                &spec.name,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await;

        let port_key = spec.port_key();
        let mut port_bindings = HashMap::new();
        port_bindings.insert(
            port_key.clone(),
            Some(vec![PortBinding {
                host_ip: Some("127.0.0.1".to_string()),
                // None asks the engine to pick a free port
                host_port: (spec.host_port != 0).then(|| spec.host_port.to_string()),
            }]),
        );

        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        exposed_ports.insert(port_key, HashMap::new());

        let env = spec.env_pairs();
        let config = Config {
            image: Some(spec.image.clone()),
            env: if env.is_empty() { None } else { Some(env) },
            exposed_ports: Some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: Some(port_bindings),
                auto_remove: Some(false),
                ..Default::default()
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| ContainerError::CreateFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        self.docker
            .start_container(&response.id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| ContainerError::StartFailed {
                name: spec.name.clone(),
                reason: e.to_string(),
            })?;

        let handle = ContainerHandle {
            id: response.id,
            name: spec.name.clone(),
        };
        tracing::info!("Started container {} from {}", handle, spec.image);
        Ok(handle)
    }

    async fn is_running(&self, id: &str) -> Result<bool> {
        let info = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(|e| ContainerError::InspectFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
        Ok(info.state.and_then(|s| s.running).unwrap_or(false))
    }

    async fn host_port(&self, id: &str, container_port: u16) -> Result<Option<u16>> {
        let info = self
            .docker
            .inspect_container(id, None)
            .await
            .map_err(|e| ContainerError::InspectFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;

        let key = format!("{container_port}/tcp");
        let port = info
            .network_settings
            .and_then(|n| n.ports)
            .and_then(|mut ports| ports.remove(&key))
            .flatten()
            .unwrap_or_default()
            .into_iter()
            .find_map(|binding| binding.host_port.and_then(|p| p.parse().ok()));
        Ok(port)
    }

    async fn logs(&self, id: &str, tail: usize) -> Result<Vec<String>> {
        let options = LogsOptions::<String> {
            stdout: true,
            stderr: true,
            tail: tail.to_string(),
            ..Default::default()
        };

        let mut stream = self.docker.logs(id, Some(options));
        let mut lines = Vec::new();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ContainerError::LogsFailed {
                id: id.to_string(),
                reason: e.to_string(),
            })?;
            lines.extend(chunk.to_string().lines().map(str::to_string));
        }
        Ok(lines)
    }

    async fn remove(&self, id: &str) -> Result<()> {
        match self
            .docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await
        {
            Ok(()) => {
                tracing::info!("Removed container {}", id);
                Ok(())
            }
            Err(e) if is_not_found(&e) => Ok(()),
            Err(e) => Err(ContainerError::RemoveFailed {
                id: id.to_string(),
                reason: e.to_string(),
            }),
        }
    }
}
