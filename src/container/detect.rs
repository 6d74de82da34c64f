//! Container engine detection with per-platform guidance.
//!
//! Checks whether the `docker` CLI is on PATH and whether the daemon answers
//! a ping, so that `run` can fail early with an actionable hint instead of a
//! socket error.

use std::fmt;

use crate::container::docker::connect_docker;

/// Engine availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// Daemon responding to ping.
    Available,
    /// No `docker` binary on PATH and no reachable daemon.
    NotInstalled,
    /// Binary found but the daemon is not answering.
    NotRunning,
}

impl EngineStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, EngineStatus::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineStatus::Available => "available",
            EngineStatus::NotInstalled => "not installed",
            EngineStatus::NotRunning => "not running",
        }
    }
}

/// Host platform, used to pick hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOS,
    Linux,
    Windows,
}

impl Platform {
    pub fn current() -> Self {
        match std::env::consts::OS {
            "macos" => Platform::MacOS,
            "windows" => Platform::Windows,
            _ => Platform::Linux,
        }
    }

    pub fn install_hint(&self) -> &'static str {
        match self {
            Platform::MacOS => {
                "Install Docker Desktop: https://docs.docker.com/desktop/install/mac-install/"
            }
            Platform::Linux => "Install Docker Engine: https://docs.docker.com/engine/install/",
            Platform::Windows => {
                "Install Docker Desktop: https://docs.docker.com/desktop/install/windows-install/"
            }
        }
    }

    pub fn start_hint(&self) -> &'static str {
        match self {
            Platform::MacOS => "Start Docker Desktop from Applications, or run: open -a Docker",
            Platform::Linux => "Start the Docker daemon: sudo systemctl start docker",
            Platform::Windows => "Start Docker Desktop from the Start menu",
        }
    }
}

/// Result of [`check_engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineDetection {
    pub status: EngineStatus,
    pub platform: Platform,
}

impl EngineDetection {
    /// What the user should do next, if anything.
    pub fn hint(&self) -> Option<&'static str> {
        match self.status {
            EngineStatus::Available => None,
            EngineStatus::NotInstalled => Some(self.platform.install_hint()),
            EngineStatus::NotRunning => Some(self.platform.start_hint()),
        }
    }
}

impl fmt::Display for EngineDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "docker: {}", self.status.as_str())?;
        if let Some(hint) = self.hint() {
            write!(f, "\n  {hint}")?;
        }
        Ok(())
    }
}

/// Check whether the container engine is reachable.
///
/// A reachable daemon wins even without a local CLI (e.g. `DOCKER_HOST`
/// pointing at a remote engine).
pub async fn check_engine() -> EngineDetection {
    let platform = Platform::current();

    let reachable = match connect_docker().await {
        Ok(docker) => docker.ping().await.is_ok(),
        Err(_) => false,
    };

    let status = if reachable {
        EngineStatus::Available
    } else if binary_on_path("docker") {
        EngineStatus::NotRunning
    } else {
        EngineStatus::NotInstalled
    };

    tracing::debug!("Container engine {}", status.as_str());
    EngineDetection { status, platform }
}

fn binary_on_path(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        dir.join(name).is_file() || (cfg!(windows) && dir.join(format!("{name}.exe")).is_file())
    })
}
