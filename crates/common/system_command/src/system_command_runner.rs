use crate::*;
use std::fmt::Debug;

/// What a command reported once it terminated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// The exit code, `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn new(code: i32, stdout: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn with_stderr(self, stderr: impl Into<String>) -> Self {
        Self {
            stderr: stderr.into(),
            ..self
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Standard output followed by standard error.
    ///
    /// This is the text the service managers match their patterns against,
    /// as init tools are not consistent about the stream they report on.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs a `SystemCommand` to completion, blocking the calling thread.
///
/// No timeout is applied: a command that never terminates blocks the caller forever.
pub trait SystemCommandRunner: Debug + Send + Sync {
    fn run(&self, system_command: SystemCommand) -> Result<CommandOutput, SystemCommandError>;
}
