//! Container management subsystem.
//!
//! This module exposes the lifecycle operations run against a container engine
//! endpoint: create, start, resolve the published SSH port, stop and remove.
//! The engine itself sits behind the [`ContainerEngine`] trait; production
//! code reaches Docker through [`DockerConnector`].
//!
//! Re-exports:
//! - [`ContainerManager`]: lifecycle operations on one endpoint.
//! - [`ContainerHandle`], [`ContainerName`], [`SessionTarget`]: core types.
//!
//! Example (non-running):
//! ```ignore
//! use dshell::container_management::{ContainerManager, ContainerName, DockerConnector, EngineConnector};
//!
//! let engine = DockerConnector::default().connect("http://127.0.0.1:4243")?;
//! let manager = ContainerManager::new(engine, "http://127.0.0.1:4243");
//! let handle = manager.create(&ContainerName::new("ubuntu", 1_700_000_000), "ssh").await?;
//! manager.start(&handle).await?;
//! let port = manager.resolve_ssh_port(&handle).await?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod container_manager;
pub mod engine;
#[cfg(test)]
pub mod mock_engine;
pub mod naming;
pub mod types;

pub use container_manager::ContainerManager;
pub use engine::{ContainerEngine, DockerConnector, EngineConnector};
pub use naming::ContainerName;
pub use types::{ContainerHandle, ContainerSpec, ContainerSummary, PortMap, SessionTarget};
