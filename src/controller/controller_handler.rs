use chrono::Utc;
use log::{error, info, warn};

use crate::configuration::Config;
use crate::container_management::container_manager::ContainerManager;
use crate::container_management::engine::EngineConnector;
use crate::container_management::naming::ContainerName;
use crate::container_management::types::{ContainerHandle, SessionTarget};
use crate::endpoint_selection::{endpoint_host, EndpointSelector};
use crate::error_handling::types::{ControllerError, ReapError};
use crate::maintenance::{ReapReport, Reaper};
use crate::network::ReadinessWaiter;
use crate::session_management::SshSession;

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Provision a container, open an ssh session to it, tear it down.
    Interactive,
    /// Reap expired containers across the pool.
    Clean,
}

/// Drives one invocation from configuration to exit.
pub struct Controller {
    config: Config,
    connector: Box<dyn EngineConnector>,
    invoking_user: String,
}

impl Controller {
    pub fn new(
        config: Config,
        connector: Box<dyn EngineConnector>,
        invoking_user: impl Into<String>,
    ) -> Self {
        Self {
            config,
            connector,
            invoking_user: invoking_user.into(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn run(&self, mode: Mode) -> Result<(), ControllerError> {
        match mode {
            Mode::Interactive => self.run_session().await.map(|_| ()),
            Mode::Clean => self.run_reaper().await.map(|_| ()),
        }
    }

    /// Provisions a container on the least loaded endpoint and connects to it.
    ///
    /// Once the container exists it is always torn down, whatever happens in
    /// between. Returns the remote session's exit status.
    pub async fn run_session(&self) -> Result<i32, ControllerError> {
        let selected = EndpointSelector::new(self.connector.as_ref())
            .select(&self.config.endpoints)
            .await?;
        let host = endpoint_host(&selected.address)?;

        let manager = ContainerManager::new(selected.engine, selected.address);
        let name = ContainerName::new(&self.config.user, Utc::now().timestamp());
        let handle = manager.create(&name, &self.config.image).await?;

        let outcome = self.connect(&manager, &handle, &host).await;
        if let Err(e) = &outcome {
            error!("{}, tearing down {}", e, handle.name);
        }

        let container = handle.name.clone();
        let failures = manager.teardown(handle).await;
        if failures.is_empty() {
            info!("Container {} torn down", container);
            return outcome;
        }

        for failure in &failures {
            error!("Teardown of {}: {}", container, failure);
        }
        Err(ControllerError::TeardownFailed {
            cause: outcome.err().map(Box::new),
            teardown: failures,
        })
    }

    async fn connect(
        &self,
        manager: &ContainerManager,
        handle: &ContainerHandle,
        host: &str,
    ) -> Result<i32, ControllerError> {
        manager.start(handle).await?;
        let port = manager.resolve_ssh_port(handle).await?;
        let target = SessionTarget::new(host, port);

        ReadinessWaiter::from_config(&self.config)
            .wait(&target)
            .await?;

        let status = SshSession::from_config(&self.config, self.invoking_user.as_str())
            .run(&target)
            .await?;
        info!("Session on {} ended with status {}", target, status);
        Ok(status)
    }

    /// Runs one reaping pass; fails if any expired container survived it.
    pub async fn run_reaper(&self) -> Result<ReapReport, ControllerError> {
        if !self.config.reaping_enabled() {
            warn!("max_age is 0, nothing will be reaped");
        }
        let report = Reaper::new(self.connector.as_ref(), self.config.max_age)
            .reap(&self.config.endpoints, Utc::now().timestamp())
            .await;

        if report.failed > 0 {
            return Err(ReapError::Incomplete {
                failed: report.failed,
            }
            .into());
        }
        Ok(report)
    }
}
