use camino::Utf8PathBuf;
use daemon_utils::paths::PathsError;
use std::fmt;
use system_command::SystemCommandError;

/// Why a service action could not be performed.
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("{message}")]
    PrivilegesRequired { message: String },

    #[error("{description} already installed")]
    AlreadyInstalled { description: String },

    #[error("{description} is not installed")]
    NotInstalled { description: String },

    #[error("service already running")]
    AlreadyRunning,

    #[error("service already stopped")]
    AlreadyStopped,

    #[error("target is not executable: {path}")]
    NotExecutable { path: Utf8PathBuf },

    #[error("Failed to {action} '{path}'")]
    FileOperationFailed {
        action: &'static str,
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Paths(#[from] PathsError),

    #[error("Failed to reload the {init_system} configuration")]
    ReloadFailed {
        init_system: &'static str,
        #[source]
        source: Box<ServiceError>,
    },

    #[error("Service command <{service_command}> failed with code: {code:?}. {output}")]
    ServiceCommandFailed {
        service_command: String,
        code: Option<i32>,
        output: String,
    },

    #[error(transparent)]
    CommandExecutionFailed(#[from] SystemCommandError),

    #[error("Unexpected output of <{service_command}>: {output}")]
    UnknownOutput {
        service_command: String,
        output: String,
    },
}

/// A failed action: the message to display along with the cause.
///
/// The message is the action label followed by the failure marker, ready to be printed.
#[derive(Debug)]
pub struct ActionError {
    pub message: String,
    pub error: ServiceError,
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for ActionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        std::error::Error::source(&self.error)
    }
}

/// The outcome of an action: the message to display, or the failure.
pub type ActionResult = Result<String, ActionError>;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Toml syntax error in the system config file '{path}': {reason}")]
    InvalidToml { path: Utf8PathBuf, reason: String },

    #[error("Failed to read the system config file '{path}'")]
    ReadFailed {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid log level: {name:?}, supported levels are info, warn, error and debug")]
    InvalidLogLevel { name: String },
}
