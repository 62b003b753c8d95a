pub mod configuration;
pub mod container_management;
pub mod controller;
pub mod endpoint_selection;
pub mod error_handling;
pub mod maintenance;
pub mod network;
pub mod session_management;
