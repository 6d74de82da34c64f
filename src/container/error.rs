//! Error types for the container collaborator.

use thiserror::Error;

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, ContainerError>;

/// Errors raised by a container engine.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// The engine could not be reached.
    #[error("Container engine not available: {reason}")]
    EngineNotAvailable {
        /// Reason why the engine is unavailable.
        reason: String,
    },

    /// Image is not present and pulling is disabled.
    #[error("Image '{image}' not present locally and auto-pull is disabled")]
    ImageMissing {
        /// Image name.
        image: String,
    },

    /// Failed to pull the image.
    #[error("Failed to pull image '{image}': {reason}")]
    ImagePullFailed {
        /// Image name.
        image: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to create the container.
    #[error("Failed to create container '{name}': {reason}")]
    CreateFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to start the container.
    #[error("Failed to start container '{name}': {reason}")]
    StartFailed {
        /// Container name.
        name: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to inspect the container.
    #[error("Failed to inspect container '{id}': {reason}")]
    InspectFailed {
        /// Container id or name.
        id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to read container logs.
    #[error("Failed to read logs of container '{id}': {reason}")]
    LogsFailed {
        /// Container id or name.
        id: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to remove the container.
    #[error("Failed to remove container '{id}': {reason}")]
    RemoveFailed {
        /// Container id or name.
        id: String,
        /// Reason for failure.
        reason: String,
    },
}
