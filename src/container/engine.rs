//! The container engine seam.

use async_trait::async_trait;

use crate::container::config::{ContainerHandle, ContainerSpec};
use crate::container::error::Result;

/// Operations the workflow delegates to a container runtime.
///
/// Implementations pass these straight through to the engine; they do not
/// add retry or policy of their own.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Check the engine is reachable.
    async fn ping(&self) -> Result<()>;

    /// Whether `image` is present locally.
    async fn image_present(&self, image: &str) -> Result<bool>;

    /// Pull `image` from its registry.
    async fn pull_image(&self, image: &str) -> Result<()>;

    /// Replace any container with the same name, then create and start one.
    async fn run(&self, spec: &ContainerSpec) -> Result<ContainerHandle>;

    /// Whether the container's main process is running.
    async fn is_running(&self, id: &str) -> Result<bool>;

    /// Host port bound to `container_port`, if any.
    async fn host_port(&self, id: &str, container_port: u16) -> Result<Option<u16>>;

    /// Last `tail` log lines, stdout and stderr interleaved.
    async fn logs(&self, id: &str, tail: usize) -> Result<Vec<String>>;

    /// Stop and remove the container.
    async fn remove(&self, id: &str) -> Result<()>;
}
