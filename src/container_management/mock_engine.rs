//! In-memory engine used by unit tests.
//!
//! A [`MockCluster`] is a connector over a set of fake endpoints. Every call
//! that reaches an endpoint is appended to a shared call log so tests can
//! assert which endpoints were queried and in which order.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::container_management::engine::{ContainerEngine, EngineConnector};
use crate::container_management::types::{ContainerSpec, ContainerSummary, PortMap};
use crate::error_handling::types::EngineError;

#[derive(Debug, Clone)]
pub struct MockContainer {
    pub id: String,
    pub names: Vec<String>,
    pub running: bool,
}

/// Behaviour and state of one fake endpoint.
#[derive(Debug, Clone, Default)]
pub struct MockEndpoint {
    pub unreachable: bool,
    pub fail_list: bool,
    pub fail_create: bool,
    pub fail_start: bool,
    pub fail_inspect: bool,
    pub fail_stop: bool,
    pub fail_remove: bool,
    /// Mappings reported by `inspect_ports` for any container.
    pub ports: PortMap,
    pub containers: Vec<MockContainer>,
}

impl MockEndpoint {
    /// An endpoint already running `count` anonymous containers.
    pub fn with_running(count: usize) -> Self {
        let containers = (0..count)
            .map(|i| MockContainer {
                id: format!("existing-{}", i),
                names: vec![format!("/existing_{}", i)],
                running: true,
            })
            .collect();
        Self {
            containers,
            ..Default::default()
        }
    }

    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Default::default()
        }
    }

    pub fn failing_list() -> Self {
        Self {
            fail_list: true,
            ..Default::default()
        }
    }

    /// Adds a running container carrying a single `name`.
    pub fn add_named(mut self, id: &str, name: &str) -> Self {
        self.containers.push(MockContainer {
            id: id.to_string(),
            names: vec![format!("/{}", name)],
            running: true,
        });
        self
    }

    pub fn publish_ssh_on(mut self, host_port: &str) -> Self {
        self.ports
            .insert("22/tcp".to_string(), vec![host_port.to_string()]);
        self
    }
}

#[derive(Debug, Default)]
struct ClusterState {
    endpoints: HashMap<String, MockEndpoint>,
    calls: Vec<String>,
    next_id: usize,
}

#[derive(Debug, Clone, Default)]
pub struct MockCluster {
    state: Arc<Mutex<ClusterState>>,
}

impl MockCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_endpoint(self, address: &str, endpoint: MockEndpoint) -> Self {
        self.state
            .lock()
            .unwrap()
            .endpoints
            .insert(address.to_string(), endpoint);
        self
    }

    /// Every call recorded so far, formatted as `"<op> <endpoint>[ <arg>]"`.
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Whether any call at all reached `address`.
    pub fn touched(&self, address: &str) -> bool {
        self.calls()
            .iter()
            .any(|c| c.split(' ').nth(1) == Some(address))
    }

    /// Ids of the containers currently present on `address`.
    pub fn container_ids(&self, address: &str) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .endpoints
            .get(address)
            .map(|e| e.containers.iter().map(|c| c.id.clone()).collect())
            .unwrap_or_default()
    }

    /// Mutates an endpoint after construction, e.g. to flip a failure flag.
    pub fn update(&self, address: &str, f: impl FnOnce(&mut MockEndpoint)) {
        if let Some(endpoint) = self.state.lock().unwrap().endpoints.get_mut(address) {
            f(endpoint);
        }
    }
}

impl EngineConnector for MockCluster {
    fn connect(&self, endpoint: &str) -> Result<Box<dyn ContainerEngine>, EngineError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("connect {}", endpoint));
        match state.endpoints.get(endpoint) {
            Some(e) if !e.unreachable => Ok(Box::new(MockEngine {
                state: Arc::clone(&self.state),
                endpoint: endpoint.to_string(),
            })),
            _ => Err(EngineError::ConnectionFailed(format!(
                "{}: connection refused",
                endpoint
            ))),
        }
    }
}

pub struct MockEngine {
    state: Arc<Mutex<ClusterState>>,
    endpoint: String,
}

impl MockEngine {
    fn with_endpoint<T>(
        &self,
        call: String,
        f: impl FnOnce(&mut MockEndpoint, &mut usize) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.calls.push(call);
        let endpoint = state
            .endpoints
            .get_mut(&self.endpoint)
            .ok_or_else(|| EngineError::ConnectionFailed(self.endpoint.clone()))?;
        f(endpoint, &mut state.next_id)
    }
}

#[async_trait]
impl ContainerEngine for MockEngine {
    async fn list_containers(&self, all: bool) -> Result<Vec<ContainerSummary>, EngineError> {
        self.with_endpoint(format!("list {}", self.endpoint), |e, _| {
            if e.fail_list {
                return Err(EngineError::ListFailed("listing refused".into()));
            }
            Ok(e.containers
                .iter()
                .filter(|c| all || c.running)
                .map(|c| ContainerSummary {
                    id: c.id.clone(),
                    names: c.names.clone(),
                })
                .collect())
        })
    }

    async fn create_container(&self, spec: &ContainerSpec) -> Result<String, EngineError> {
        self.with_endpoint(
            format!("create {} {}", self.endpoint, spec.name),
            |e, next_id| {
                if e.fail_create {
                    return Err(EngineError::CreationFailed(format!(
                        "No such image: {}",
                        spec.image
                    )));
                }
                if e.containers
                    .iter()
                    .any(|c| c.names.iter().any(|n| n == &format!("/{}", spec.name)))
                {
                    return Err(EngineError::CreationFailed(format!(
                        "Conflict. The container name \"/{}\" is already in use",
                        spec.name
                    )));
                }
                *next_id += 1;
                let id = format!("mock-{}", next_id);
                e.containers.push(MockContainer {
                    id: id.clone(),
                    names: vec![format!("/{}", spec.name)],
                    running: false,
                });
                Ok(id)
            },
        )
    }

    async fn start_container(&self, id: &str) -> Result<(), EngineError> {
        self.with_endpoint(format!("start {} {}", self.endpoint, id), |e, _| {
            if e.fail_start {
                return Err(EngineError::StartFailed("start refused".into()));
            }
            let container = e
                .containers
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| EngineError::StartFailed(format!("No such container: {}", id)))?;
            container.running = true;
            Ok(())
        })
    }

    async fn inspect_ports(&self, id: &str) -> Result<PortMap, EngineError> {
        self.with_endpoint(format!("inspect {} {}", self.endpoint, id), |e, _| {
            if e.fail_inspect || !e.containers.iter().any(|c| c.id == id) {
                return Err(EngineError::InspectFailed(format!(
                    "No such container: {}",
                    id
                )));
            }
            Ok(e.ports.clone())
        })
    }

    async fn stop_container(&self, id: &str, _timeout_secs: i64) -> Result<(), EngineError> {
        self.with_endpoint(format!("stop {} {}", self.endpoint, id), |e, _| {
            if e.fail_stop {
                return Err(EngineError::StopFailed("stop refused".into()));
            }
            match e.containers.iter_mut().find(|c| c.id == id) {
                Some(c) if c.running => {
                    c.running = false;
                    Ok(())
                }
                Some(_) => Err(EngineError::StopFailed(format!(
                    "container {} is not running",
                    id
                ))),
                None => Err(EngineError::StopFailed(format!("No such container: {}", id))),
            }
        })
    }

    async fn remove_container(&self, id: &str, _remove_volumes: bool) -> Result<(), EngineError> {
        self.with_endpoint(format!("remove {} {}", self.endpoint, id), |e, _| {
            if e.fail_remove {
                return Err(EngineError::RemoveFailed("remove refused".into()));
            }
            let index = e
                .containers
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| EngineError::RemoveFailed(format!("No such container: {}", id)))?;
            if e.containers[index].running {
                return Err(EngineError::RemoveFailed(format!(
                    "container {} is running, stop it first",
                    id
                )));
            }
            e.containers.remove(index);
            Ok(())
        })
    }
}
