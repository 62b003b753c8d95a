//! Maintenance mode: removal of expired containers across the endpoint pool.

pub mod reaper;

pub use reaper::{is_expired, ReapReport, Reaper};
