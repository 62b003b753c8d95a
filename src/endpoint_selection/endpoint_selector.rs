use log::{debug, info, warn};
use url::Url;

use crate::container_management::engine::{ContainerEngine, EngineConnector};
use crate::error_handling::types::SelectionError;

/// Host used for endpoints reached over a local socket.
pub const LOCAL_SOCKET_HOST: &str = "127.0.0.1";

/// The endpoint chosen by [`EndpointSelector::select`], with the client that
/// was used to query it.
pub struct SelectedEndpoint {
    pub address: String,
    /// Running containers counted during selection.
    pub containers: usize,
    pub engine: Box<dyn ContainerEngine>,
}

/// Picks the least loaded endpoint of a pool.
///
/// Endpoints are scanned in pool order. One that cannot be reached or listed
/// is skipped. The first endpoint with no running containers wins on the spot
/// and the rest of the pool is not queried; otherwise the endpoint with the
/// fewest running containers wins, earlier endpoints winning ties.
///
/// The count is a snapshot: concurrent invocations may pick the same endpoint.
pub struct EndpointSelector<'a> {
    connector: &'a dyn EngineConnector,
}

impl<'a> EndpointSelector<'a> {
    pub fn new(connector: &'a dyn EngineConnector) -> Self {
        Self { connector }
    }

    pub async fn select(&self, endpoints: &[String]) -> Result<SelectedEndpoint, SelectionError> {
        let mut best: Option<SelectedEndpoint> = None;

        for address in endpoints {
            let engine = match self.connector.connect(address) {
                Ok(engine) => engine,
                Err(e) => {
                    warn!("Skipping endpoint {}: {}", address, e);
                    continue;
                }
            };

            let count = match engine.list_containers(false).await {
                Ok(containers) => containers.len(),
                Err(e) => {
                    warn!("Skipping endpoint {}: {}", address, e);
                    continue;
                }
            };
            debug!("Endpoint {} runs {} containers", address, count);

            let candidate = SelectedEndpoint {
                address: address.clone(),
                containers: count,
                engine,
            };

            if count == 0 {
                best = Some(candidate);
                break;
            }
            if best.as_ref().map_or(true, |b| count < b.containers) {
                best = Some(candidate);
            }
        }

        let selected = best.ok_or(SelectionError::NoAcceptableEndpoints)?;
        info!(
            "Selected endpoint {} ({} running containers)",
            selected.address, selected.containers
        );
        Ok(selected)
    }
}

/// Extracts the host a container's published ports are reachable on.
///
/// For `unix://` endpoints the engine is local, so [`LOCAL_SOCKET_HOST`] is
/// used.
pub fn endpoint_host(endpoint: &str) -> Result<String, SelectionError> {
    let url = Url::parse(endpoint)
        .map_err(|e| SelectionError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

    if url.scheme() == "unix" {
        return Ok(LOCAL_SOCKET_HOST.to_string());
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => {
            Ok(host.trim_start_matches('[').trim_end_matches(']').to_string())
        }
        _ => Err(SelectionError::NoHost(endpoint.to_string())),
    }
}
