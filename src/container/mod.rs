//! Container engine collaborator.
//!
//! Everything the smoke workflow needs from a container runtime (run, port
//! inspection, status, logs, removal) goes through the [`ContainerEngine`]
//! trait. [`DockerEngine`] passes those calls to a Docker daemon via bollard;
//! tests substitute a scripted engine.
//!
//! # Example
//!
//! ```rust,no_run
//! use dockwait::container::{ContainerEngine, ContainerSpec, DockerEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let engine = DockerEngine::connect().await?;
//! let handle = engine
//!     .run(&ContainerSpec {
//!         name: "demo-web".to_string(),
//!         image: "nginx:alpine".to_string(),
//!         host_port: 0,
//!         container_port: 80,
//!         env: Vec::new(),
//!     })
//!     .await?;
//!
//! let port = engine.host_port(&handle.id, 80).await?;
//! println!("{} listening on {:?}", handle, port);
//!
//! engine.remove(&handle.id).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod detect;
pub mod docker;
pub mod engine;
pub mod error;

pub use config::{ContainerHandle, ContainerSpec};
pub use detect::{EngineDetection, EngineStatus, Platform, check_engine};
pub use docker::{DockerEngine, connect_docker};
pub use engine::ContainerEngine;
pub use error::{ContainerError, Result};
