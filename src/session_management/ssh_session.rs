use log::{debug, info, warn};
use std::process::Stdio;
use tokio::process::Command;

use crate::configuration::Config;
use crate::container_management::types::SessionTarget;
use crate::error_handling::types::SessionError;

/// Variable carrying the invoking user's name into the ssh client's environment.
pub const INVOKING_USER_ENV: &str = "DSSHUSER";

/// Exit status ssh uses for its own failures, as opposed to the remote command's.
pub const SSH_CLIENT_FAILURE: i32 = 255;

/// Runs the local ssh client against a provisioned container.
///
/// The client inherits this process's standard streams, so terminal handling
/// (raw mode, resizing, control characters) is entirely up to ssh.
#[derive(Debug, Clone)]
pub struct SshSession {
    binary: String,
    login_user: String,
    invoking_user: String,
}

impl SshSession {
    pub fn new(
        binary: impl Into<String>,
        login_user: impl Into<String>,
        invoking_user: impl Into<String>,
    ) -> Self {
        Self {
            binary: binary.into(),
            login_user: login_user.into(),
            invoking_user: invoking_user.into(),
        }
    }

    pub fn from_config(config: &Config, invoking_user: impl Into<String>) -> Self {
        Self::new(&config.ssh_binary, &config.user, invoking_user)
    }

    /// Builds `ssh -q -p <port> -l <user> <host>` with inherited stdio.
    pub fn command(&self, target: &SessionTarget) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-q")
            .arg("-p")
            .arg(target.port.to_string())
            .arg("-l")
            .arg(&self.login_user)
            .arg(&target.host)
            .env(INVOKING_USER_ENV, &self.invoking_user)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }

    /// Runs the session to completion and returns the remote exit status.
    ///
    /// Fails when the client cannot be spawned, reports its own failure
    /// (status 255) or is killed by a signal.
    pub async fn run(&self, target: &SessionTarget) -> Result<i32, SessionError> {
        info!(
            "Opening ssh session to {} as {}",
            target, self.login_user
        );
        let status = self
            .command(target)
            .status()
            .await
            .map_err(SessionError::SpawnFailed)?;
        debug!("ssh client exited with {}", status);

        match status.code() {
            Some(SSH_CLIENT_FAILURE) => Err(SessionError::ConnectionFailed(format!(
                "ssh to {} exited with status {}",
                target, SSH_CLIENT_FAILURE
            ))),
            Some(code) => {
                if code != 0 {
                    warn!("Remote session ended with status {}", code);
                }
                Ok(code)
            }
            None => Err(SessionError::Terminated),
        }
    }
}

/// Name of the user running this process: `USER`, then `LOGNAME`, then
/// `"unknown"`.
pub fn invoking_user() -> String {
    ["USER", "LOGNAME"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
