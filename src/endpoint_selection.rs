//! Endpoint selection across the configured pool of container engines.

pub mod endpoint_selector;

pub use endpoint_selector::{endpoint_host, EndpointSelector, SelectedEndpoint};
