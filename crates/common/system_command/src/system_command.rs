use std::fmt;

/// Representation of a system command to be run by a `SystemCommandRunner`.
///
/// The `SystemCommand` does not allow for very complex pipeline constructions by purpose.
///
/// Note: We are using `String`s here and not `OsString`. We want the `SystemCommand` to be easily
/// inspectable and comparable in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemCommand {
    /// The binary to be executed.
    pub program: String,

    /// The arguments to the binary.
    pub args: Vec<String>,
}

impl SystemCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// The program followed by its arguments, as it would be typed in a shell.
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SystemCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}
