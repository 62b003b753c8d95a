use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    TomlError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::TomlError(e) => write!(f, "TOML parsing error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::TomlError(err.to_string())
    }
}

/// Failures reported by a container engine or while talking to one.
#[derive(Debug)]
pub enum EngineError {
    ConnectionFailed(String),
    ListFailed(String),
    CreationFailed(String),
    StartFailed(String),
    InspectFailed(String),
    PortNotPublished(String),
    StopFailed(String),
    RemoveFailed(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ConnectionFailed(e) => write!(f, "Unable to communicate: {}", e),
            EngineError::ListFailed(e) => write!(f, "Unable to list containers: {}", e),
            EngineError::CreationFailed(e) => write!(f, "Unable to create container: {}", e),
            EngineError::StartFailed(e) => write!(f, "Unable to start container: {}", e),
            EngineError::InspectFailed(e) => {
                write!(f, "Unable to get port information for container: {}", e)
            }
            EngineError::PortNotPublished(e) => write!(f, "SSH port is not published: {}", e),
            EngineError::StopFailed(e) => write!(f, "Unable to stop container: {}", e),
            EngineError::RemoveFailed(e) => write!(f, "Unable to remove container: {}", e),
        }
    }
}

impl std::error::Error for EngineError {}

#[derive(Debug)]
pub enum SelectionError {
    NoAcceptableEndpoints,
    InvalidEndpoint(String),
    NoHost(String),
}

impl fmt::Display for SelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionError::NoAcceptableEndpoints => write!(f, "No acceptable endpoints found"),
            SelectionError::InvalidEndpoint(e) => {
                write!(f, "Unable to parse endpoint URL: {}", e)
            }
            SelectionError::NoHost(e) => write!(f, "No host found in endpoint: {}", e),
        }
    }
}

impl std::error::Error for SelectionError {}

#[derive(Debug)]
pub enum ReadinessError {
    /// The target never accepted a connection (or never sent a banner) within the budget.
    Timeout { target: String, attempts: u32 },
}

impl fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadinessError::Timeout { target, attempts } => write!(
                f,
                "{} never became available after {} attempts",
                target, attempts
            ),
        }
    }
}

impl std::error::Error for ReadinessError {}

#[derive(Debug)]
pub enum SessionError {
    SpawnFailed(std::io::Error),
    ConnectionFailed(String),
    Terminated,
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::SpawnFailed(e) => {
                write!(f, "Unable to initiate ssh connection: {}", e)
            }
            SessionError::ConnectionFailed(e) => write!(f, "ssh connection failed: {}", e),
            SessionError::Terminated => write!(f, "ssh client was terminated by a signal"),
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug)]
pub enum ReapError {
    /// Some containers could not be stopped or removed.
    Incomplete { failed: usize },
}

impl fmt::Display for ReapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReapError::Incomplete { failed } => {
                write!(f, "Failed to reap {} expired container(s)", failed)
            }
        }
    }
}

impl std::error::Error for ReapError {}

#[derive(Debug)]
pub enum ControllerError {
    SelectionError(SelectionError),
    EngineError(EngineError),
    ReadinessError(ReadinessError),
    SessionError(SessionError),
    ReapError(ReapError),
    /// A failure that happened first, followed by failures during teardown.
    TeardownFailed {
        cause: Option<Box<ControllerError>>,
        teardown: Vec<EngineError>,
    },
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::SelectionError(e) => write!(f, "Endpoint selection error: {}", e),
            ControllerError::EngineError(e) => write!(f, "Container engine error: {}", e),
            ControllerError::ReadinessError(e) => write!(f, "Readiness error: {}", e),
            ControllerError::SessionError(e) => write!(f, "Session error: {}", e),
            ControllerError::ReapError(e) => write!(f, "Reaper error: {}", e),
            ControllerError::TeardownFailed { cause, teardown } => {
                write!(f, "Teardown failed: ")?;
                for (i, e) in teardown.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", e)?;
                }
                if let Some(cause) = cause {
                    write!(f, " (after: {})", cause)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<SelectionError> for ControllerError {
    fn from(err: SelectionError) -> Self {
        ControllerError::SelectionError(err)
    }
}

impl From<EngineError> for ControllerError {
    fn from(err: EngineError) -> Self {
        ControllerError::EngineError(err)
    }
}

impl From<ReadinessError> for ControllerError {
    fn from(err: ReadinessError) -> Self {
        ControllerError::ReadinessError(err)
    }
}

impl From<SessionError> for ControllerError {
    fn from(err: SessionError) -> Self {
        ControllerError::SessionError(err)
    }
}

impl From<ReapError> for ControllerError {
    fn from(err: ReapError) -> Self {
        ControllerError::ReapError(err)
    }
}
