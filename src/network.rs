//! Network probing of provisioned containers.

pub mod readiness;

pub use readiness::ReadinessWaiter;
