use log::{debug, info, warn};

use crate::container_management::container_manager::ContainerManager;
use crate::container_management::engine::EngineConnector;
use crate::container_management::naming::ContainerName;
use crate::container_management::types::{ContainerHandle, ContainerSummary};

/// Outcome of a reaping pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Endpoints that were reached and listed.
    pub endpoints_scanned: usize,
    /// Endpoints skipped because they could not be reached or listed.
    pub endpoints_skipped: usize,
    /// Running containers carrying a parseable `<user>-<timestamp>` name.
    pub examined: usize,
    /// Expired containers stopped and removed.
    pub reaped: usize,
    /// Expired containers that could not be stopped or removed.
    pub failed: usize,
}

/// Removes containers older than a maximum age across an endpoint pool.
///
/// Only running containers with exactly one name of the form
/// `<user>-<timestamp>` are considered; everything else is left untouched.
/// A failure on one container is logged and the pass moves on, so a single
/// stuck container does not block the rest; the report counts failures.
pub struct Reaper<'a> {
    connector: &'a dyn EngineConnector,
    max_age: u64,
}

impl<'a> Reaper<'a> {
    /// `max_age` of `0` disables reaping.
    pub fn new(connector: &'a dyn EngineConnector, max_age: u64) -> Self {
        Self { connector, max_age }
    }

    /// Runs one pass over `endpoints`, using `now` (Unix seconds) as the clock.
    pub async fn reap(&self, endpoints: &[String], now: i64) -> ReapReport {
        let mut report = ReapReport::default();

        if self.max_age == 0 {
            info!("Reaping is disabled (max_age = 0)");
            return report;
        }

        for address in endpoints {
            let engine = match self.connector.connect(address) {
                Ok(engine) => engine,
                Err(e) => {
                    warn!("Skipping endpoint {}: {}", address, e);
                    report.endpoints_skipped += 1;
                    continue;
                }
            };
            let manager = ContainerManager::new(engine, address.as_str());

            let containers = match manager.list_running().await {
                Ok(containers) => containers,
                Err(e) => {
                    warn!("Skipping endpoint {}: {}", address, e);
                    report.endpoints_skipped += 1;
                    continue;
                }
            };
            report.endpoints_scanned += 1;

            for container in containers {
                self.reap_container(&manager, container, now, &mut report)
                    .await;
            }
        }

        info!(
            "Reaped {} of {} examined containers across {} endpoints ({} failures, {} endpoints skipped)",
            report.reaped,
            report.examined,
            report.endpoints_scanned,
            report.failed,
            report.endpoints_skipped
        );
        report
    }

    async fn reap_container(
        &self,
        manager: &ContainerManager,
        container: ContainerSummary,
        now: i64,
        report: &mut ReapReport,
    ) {
        let [raw_name] = container.names.as_slice() else {
            debug!(
                "Ignoring container {} with {} names",
                container.id,
                container.names.len()
            );
            return;
        };
        let Some(name) = ContainerName::parse(raw_name) else {
            debug!("Ignoring container {} named {}", container.id, raw_name);
            return;
        };
        report.examined += 1;

        if !is_expired(&name, now, self.max_age) {
            debug!(
                "Keeping {} on {} (age {}s)",
                name,
                manager.endpoint(),
                name.age_at(now)
            );
            return;
        }

        info!(
            "Reaping {} on {} (age {}s > {}s)",
            name,
            manager.endpoint(),
            name.age_at(now),
            self.max_age
        );
        let handle = ContainerHandle::existing(container.id, name.to_string());
        if let Err(e) = manager.stop(&handle).await {
            warn!("Leaving {} in place: {}", handle.name, e);
            report.failed += 1;
            return;
        }
        match manager.remove(handle).await {
            Ok(()) => report.reaped += 1,
            Err(_) => report.failed += 1,
        }
    }
}

/// Whether a container created at `name.created()` is strictly older than
/// `max_age` seconds at `now`. Always false when `max_age` is `0`.
pub fn is_expired(name: &ContainerName, now: i64, max_age: u64) -> bool {
    if max_age == 0 {
        return false;
    }
    i128::from(name.age_at(now)) > i128::from(max_age)
}
