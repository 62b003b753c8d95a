//! Container engine client seam.
//!
//! [`ContainerEngine`] is the narrow request/response surface the rest of the
//! crate needs from an engine endpoint. [`EngineConnector`] turns an endpoint
//! address into a client. The production implementation talks to the Docker
//! Engine API through `bollard`.

use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, InspectContainerOptions, ListContainersOptions,
    RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::models::HostConfig;
use bollard::{Docker, API_DEFAULT_VERSION};
use log::debug;

use crate::container_management::types::{ContainerSpec, ContainerSummary, PortMap};
use crate::error_handling::types::EngineError;

/// Seconds bollard waits on a single engine request.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

/// Operations consumed from a container engine endpoint.
///
/// Each call is a single request with no retries; errors carry the engine's
/// message.
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    /// Lists containers; `all = false` restricts the listing to running ones.
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError>;

    /// Creates a container and returns its engine-assigned id.
    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError>;

    async fn start_container(&self, id: &str) -> Result<(), EngineError>;

    /// Returns the published port mappings of a container.
    async fn inspect_ports(&self, id: &str) -> Result<PortMap, EngineError>;

    /// Stops a container, killing it after `timeout_secs`.
    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<(), EngineError>;

    async fn remove_container(&self, id: &str, remove_volumes: bool) -> Result<(), EngineError>;
}

/// Builds an engine client for an endpoint address.
pub trait EngineConnector: Send + Sync {
    fn connect(&self, endpoint: &str) -> Result<Box<dyn ContainerEngine>, EngineError>;
}

/// Connects to Docker Engine endpoints.
///
/// `http://` and `tcp://` addresses use plain HTTP, `unix://` addresses a
/// local socket.
#[derive(Debug, Clone)]
pub struct DockerConnector {
    timeout_secs: u64,
}

impl DockerConnector {
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for DockerConnector {
    fn default() -> Self {
        Self::new(DEFAULT_REQUEST_TIMEOUT_SECS)
    }
}

impl EngineConnector for DockerConnector {
    fn connect(&self, endpoint: &str) -> Result<Box<dyn ContainerEngine>, EngineError> {
        debug!("Connecting to engine endpoint {}", endpoint);

        let docker = match endpoint.strip_prefix("unix://") {
            #[cfg(unix)]
            Some(path) => Docker::connect_with_unix(path, self.timeout_secs, API_DEFAULT_VERSION),
            _ => Docker::connect_with_http(endpoint, self.timeout_secs, API_DEFAULT_VERSION),
        }
        .map_err(|e| EngineError::ConnectionFailed(format!("{}: {}", endpoint, e)))?;
        Ok(Box::new(DockerEngine { docker }))
    }
}

/// [`ContainerEngine`] backed by a `bollard` Docker client.
pub struct DockerEngine {
    docker: Docker,
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError> {
        let options = ListContainersOptions::<String> {
            all,
            ..Default::default()
        };
        let containers = self
            .docker
            .list_containers(Some(options))
            .await
            .map_err(|e| EngineError::ListFailed(e.to_string()))?;

        Ok(containers
            .into_iter()
            .map(|c| ContainerSummary {
                id: c.id.unwrap_or_default(),
                names: c.names.unwrap_or_default(),
            })
            .collect())
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        let options = CreateContainerOptions {
            name: spec.name.clone(),
            ..Default::default()
        };

        // Modern engines only accept port publishing at create time.
        let host_config = HostConfig {
            publish_all_ports: Some(spec.publish_all_ports),
            ..Default::default()
        };

        let config = Config {
            image: Some(spec.image.clone()),
            host_config: Some(host_config),
            ..Default::default()
        };

        let response = self
            .docker
            .create_container(Some(options), config)
            .await
            .map_err(|e| EngineError::CreationFailed(e.to_string()))?;

        for warning in &response.warnings {
            debug!("Engine warning while creating {}: {}", spec.name, warning);
        }
        Ok(response.id)
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.docker
            .start_container(id, None::<StartContainerOptions<String>>)
            .await
            .map_err(|e| EngineError::StartFailed(e.to_string()))
    }

    async fn inspect_ports(&self, id: &str) -> Result<PortMap, EngineError> {
        let info = self
            .docker
            .inspect_container(id, None::<InspectContainerOptions>)
            .await
            .map_err(|e| EngineError::InspectFailed(e.to_string()))?;

        let ports = info
            .network_settings
            .and_then(|settings| settings.ports)
            .unwrap_or_default();

        Ok(ports
            .into_iter()
            .map(|(container_port, bindings)| {
                let host_ports = bindings
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|binding| binding.host_port)
                    .collect();
                (container_port, host_ports)
            })
            .collect())
    }

    async fn stop_container(&self, id: &str, timeout_secs: i64) -> Result<(), EngineError> {
        self.docker
            .stop_container(id, Some(StopContainerOptions { t: timeout_secs }))
            .await
            .map_err(|e| EngineError::StopFailed(e.to_string()))
    }

    async fn remove_container(&self, id: &str, remove_volumes: bool) -> Result<(), EngineError> {
        let options = RemoveContainerOptions {
            v: remove_volumes,
            ..Default::default()
        };
        self.docker
            .remove_container(id, Some(options))
            .await
            .map_err(|e| EngineError::RemoveFailed(e.to_string()))
    }
}
