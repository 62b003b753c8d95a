//! Interactive session handling.
//!
//! The session itself is delegated to the local ssh client; this module only
//! builds its command line and interprets its exit status.

pub mod ssh_session;

pub use ssh_session::{invoking_user, SshSession};
