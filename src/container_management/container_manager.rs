use log::{debug, error, info, warn};

use crate::container_management::engine::ContainerEngine;
use crate::container_management::naming::ContainerName;
use crate::container_management::types::{
    ContainerHandle, ContainerSpec, ContainerSummary, SSH_PORT_KEY,
};
use crate::error_handling::types::EngineError;

/// Grace period given to a container on stop; it is killed right away.
pub const STOP_TIMEOUT_SECS: i64 = 0;

/// Drives the lifecycle of containers on a single engine endpoint.
///
/// Every operation is a single engine request with no retries. None of them
/// are idempotent: stopping or removing a container twice is reported as an
/// error.
pub struct ContainerManager {
    engine: Box<dyn ContainerEngine>,
    endpoint: String,
}

impl ContainerManager {
    pub fn new(engine: Box<dyn ContainerEngine>, endpoint: impl Into<String>) -> Self {
        Self {
            engine,
            endpoint: endpoint.into(),
        }
    }

    /// Address of the endpoint this manager talks to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Lists running containers on the endpoint.
    pub async fn list_running(&self) -> Result<Vec<ContainerSummary>, EngineError> {
        debug!("Listing running containers on {}", self.endpoint);
        self.engine.list_containers(false).await
    }

    /// Creates a container named `name` from `image` with all ports published.
    pub async fn create(
        &self,
        name: &ContainerName,
        image: &str,
    ) -> Result<ContainerHandle, EngineError> {
        let spec = ContainerSpec {
            name: name.to_string(),
            image: image.to_string(),
            publish_all_ports: true,
        };

        info!(
            "Creating container {} from image {} on {}",
            spec.name, spec.image, self.endpoint
        );
        let id = self.engine.create_container(&spec).await.map_err(|e| {
            error!("Failed to create container {}: {}", spec.name, e);
            e
        })?;

        debug!("Container {} has id {}", spec.name, id);
        Ok(ContainerHandle { id, name: spec.name })
    }

    pub async fn start(&self, handle: &ContainerHandle) -> Result<(), EngineError> {
        debug!("Starting container {}", handle.name);
        self.engine.start_container(&handle.id).await.map_err(|e| {
            error!("Failed to start container {}: {}", handle.name, e);
            e
        })?;
        info!("Started container {}", handle.name);
        Ok(())
    }

    /// Looks up the host port published for the container's `22/tcp`.
    ///
    /// Fails when inspection fails or the mapping is absent, since the session
    /// cannot proceed without it.
    pub async fn resolve_ssh_port(&self, handle: &ContainerHandle) -> Result<u16, EngineError> {
        debug!("Inspecting port mappings of {}", handle.name);
        let ports = self.engine.inspect_ports(&handle.id).await.map_err(|e| {
            error!("Failed to inspect container {}: {}", handle.name, e);
            e
        })?;

        let host_port = ports
            .get(SSH_PORT_KEY)
            .and_then(|bindings| bindings.first())
            .ok_or_else(|| {
                EngineError::PortNotPublished(format!(
                    "container {} has no host binding for {}",
                    handle.name, SSH_PORT_KEY
                ))
            })?;

        let port = host_port.parse::<u16>().map_err(|e| {
            EngineError::InspectFailed(format!(
                "invalid host port {:?} for {}: {}",
                host_port, handle.name, e
            ))
        })?;

        debug!("Container {} publishes {} on {}", handle.name, SSH_PORT_KEY, port);
        Ok(port)
    }

    pub async fn stop(&self, handle: &ContainerHandle) -> Result<(), EngineError> {
        debug!("Stopping container {}", handle.name);
        self.engine
            .stop_container(&handle.id, STOP_TIMEOUT_SECS)
            .await
            .map_err(|e| {
                error!("Failed to stop container {}: {}", handle.name, e);
                e
            })
    }

    /// Removes the container, keeping its volumes. Consumes the handle.
    pub async fn remove(&self, handle: ContainerHandle) -> Result<(), EngineError> {
        debug!("Removing container {}", handle.name);
        self.engine
            .remove_container(&handle.id, false)
            .await
            .map_err(|e| {
                error!("Failed to remove container {}: {}", handle.name, e);
                e
            })?;
        info!("Removed container {}", handle.name);
        Ok(())
    }

    /// Stops then removes the container.
    ///
    /// Removal is attempted even when stopping fails. Every failure is
    /// returned; an empty vector means the container is gone.
    pub async fn teardown(&self, handle: ContainerHandle) -> Vec<EngineError> {
        let mut failures = Vec::new();
        if let Err(e) = self.stop(&handle).await {
            warn!("Continuing teardown of {} after stop failure", handle.name);
            failures.push(e);
        }
        if let Err(e) = self.remove(handle).await {
            failures.push(e);
        }
        failures
    }
}
