//! Value types passed to a container engine.

use std::fmt;

/// What to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    /// Container name. An existing container with this name is replaced.
    pub name: String,
    /// Image reference.
    pub image: String,
    /// Port on 127.0.0.1. 0 lets the engine assign one.
    pub host_port: u16,
    /// Port inside the container.
    pub container_port: u16,
    /// Environment variables: (name, value).
    pub env: Vec<(String, String)>,
}

impl ContainerSpec {
    /// Port key in the engine's `port/proto` notation.
    pub fn port_key(&self) -> String {
        format!("{}/tcp", self.container_port)
    }

    /// `NAME=value` pairs as the engine expects them.
    pub fn env_pairs(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

/// A container the engine has started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerHandle {
    pub id: String,
    pub name: String,
}

impl ContainerHandle {
    /// Shortened id, as `docker ps` prints it.
    pub fn short_id(&self) -> &str {
        let end = self.id.len().min(12);
        self.id.get(..end).unwrap_or(&self.id)
    }
}

impl fmt::Display for ContainerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.short_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_key_and_env() {
        let spec = ContainerSpec {
            name: "demo".to_string(),
            image: "demo:latest".to_string(),
            host_port: 8080,
            container_port: 80,
            env: vec![("A".to_string(), "1".to_string())],
        };
        assert_eq!(spec.port_key(), "80/tcp");
        assert_eq!(spec.env_pairs(), vec!["A=1".to_string()]);
    }

    #[test]
    fn test_handle_display() {
        let handle = ContainerHandle {
            id: "0123456789abcdef0123".to_string(),
            name: "demo".to_string(),
        };
        assert_eq!(handle.short_id(), "0123456789ab");
        assert_eq!(handle.to_string(), "demo (0123456789ab)");

        let short = ContainerHandle {
            id: "abc".to_string(),
            name: "x".to_string(),
        };
        assert_eq!(short.short_id(), "abc");
    }
}
