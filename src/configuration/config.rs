use crate::error_handling::types::ConfigError;
use log::{debug, info, warn};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Location of the configuration file when none is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/dshell.toml";

pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:4243";
pub const DEFAULT_IMAGE: &str = "ssh";
pub const DEFAULT_USER: &str = "ubuntu";
pub const DEFAULT_MAX_AGE_SECS: u64 = 86400;
pub const DEFAULT_SSH_BINARY: &str = "ssh";
pub const DEFAULT_READY_ATTEMPTS: u32 = 60;
pub const DEFAULT_READY_INTERVAL_MS: u64 = 500;

/// Runtime configuration for a single invocation.
///
/// Every key is optional in the TOML file and falls back to its own default,
/// so a file that only sets `endpoints` still gets the default image, user and
/// reaping threshold.
///
/// # Examples
///
/// ```
/// use dshell::configuration::config::Config;
///
/// let config = Config::from_toml_str("endpoints = ['http://10.0.0.2:4243']").unwrap();
/// assert_eq!(config.endpoints, vec!["http://10.0.0.2:4243".to_string()]);
/// assert_eq!(config.image, "ssh");
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Container engine endpoints, scanned in order by the endpoint selector.
    pub endpoints: Vec<String>,

    /// Image the throwaway container is created from.
    pub image: String,

    /// Remote login user passed to `ssh -l`.
    pub user: String,

    /// Age in seconds after which the reaper removes a container.
    ///
    /// `0` disables reaping.
    pub max_age: u64,

    /// ssh client executable, resolved through `PATH` when not absolute.
    pub ssh_binary: String,

    /// Require the first bytes from the mapped port to contain `SSH`.
    pub banner_check: bool,

    /// Number of readiness polls before giving up.
    pub ready_attempts: u32,

    /// Delay between readiness polls, in milliseconds.
    pub ready_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoints: vec![DEFAULT_ENDPOINT.to_string()],
            image: DEFAULT_IMAGE.to_string(),
            user: DEFAULT_USER.to_string(),
            max_age: DEFAULT_MAX_AGE_SECS,
            ssh_binary: DEFAULT_SSH_BINARY.to_string(),
            banner_check: true,
            ready_attempts: DEFAULT_READY_ATTEMPTS,
            ready_interval_ms: DEFAULT_READY_INTERVAL_MS,
        }
    }
}

impl Config {
    /// Reads and parses the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads `path`, substituting the built-in defaults when the file is
    /// missing or malformed. Never fails.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::from_file(path) {
            Ok(config) => {
                info!("Configuration imported from {}", path.display());
                config
            }
            Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!(
                    "Unable to import configuration from {}: {}, using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Whether the reaper should remove anything at all.
    pub fn reaping_enabled(&self) -> bool {
        self.max_age != 0
    }

    pub fn ready_interval(&self) -> Duration {
        Duration::from_millis(self.ready_interval_ms)
    }
}
