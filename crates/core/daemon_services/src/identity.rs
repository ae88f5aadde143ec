use camino::Utf8Path;
use camino::Utf8PathBuf;

/// The service a `ServiceControl` handle acts upon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceIdentity {
    name: String,
    description: String,
    executable: Option<Utf8PathBuf>,
}

impl ServiceIdentity {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            executable: None,
        }
    }

    /// Uses `executable` on install, instead of looking the service name up on `PATH`.
    pub fn with_executable(self, executable: impl Into<Utf8PathBuf>) -> Self {
        Self {
            executable: Some(executable.into()),
            ..self
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn executable(&self) -> Option<&Utf8Path> {
        self.executable.as_deref()
    }
}
