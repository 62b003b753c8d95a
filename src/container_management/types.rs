//! Core types used by the container management subsystem.

use std::collections::HashMap;
use std::fmt;

/// Key under which the engine reports the SSH port mapping.
pub const SSH_PORT_KEY: &str = "22/tcp";

/// Container port (`"<port>/<proto>"`) to the host ports it is published on.
pub type PortMap = HashMap<String, Vec<String>>;

/// One row of a container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSummary {
    /// Engine-assigned identifier.
    pub id: String,
    /// Names as reported by the engine (Docker prefixes them with `/`).
    pub names: Vec<String>,
}

/// Parameters for a container creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    /// Publish every exposed container port on a dynamically assigned host port.
    pub publish_all_ports: bool,
}

/// Handle describing a specific container instance on one endpoint.
///
/// Handles are deliberately not `Clone`: removing a container consumes its
/// handle, so a removed container cannot be addressed again through it.
#[derive(Debug, PartialEq, Eq)]
pub struct ContainerHandle {
    /// Identifier assigned by the container engine.
    pub id: String,
    /// Name the container was created (or found) with.
    pub name: String,
}

impl ContainerHandle {
    /// Wraps a container this run did not create, e.g. one found by the reaper.
    pub fn existing(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Resolved address of the SSH service inside a provisioned container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTarget {
    pub host: String,
    pub port: u16,
}

impl SessionTarget {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for SessionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
