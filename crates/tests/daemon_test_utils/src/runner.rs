use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use system_command::CommandOutput;
use system_command::SystemCommand;
use system_command::SystemCommandError;
use system_command::SystemCommandRunner;

/// A command runner answering from canned outputs, keyed by command line.
///
/// Outputs registered for the same command line are returned in order;
/// the last one keeps being returned once the others are consumed.
/// Commands without any registered output fail to execute, as a missing program would.
#[derive(Debug, Default)]
pub struct FakeCommandRunner {
    responses: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers `id -u` as the root user would.
    pub fn as_root(self) -> Self {
        self.on("id -u", CommandOutput::new(0, "0\n"))
    }

    /// Answers `id -u` as an unprivileged user would.
    pub fn as_user(self) -> Self {
        self.on("id -u", CommandOutput::new(0, "1000\n"))
    }

    pub fn on(self, command_line: &str, output: CommandOutput) -> Self {
        self.respond(command_line, output);
        self
    }

    /// Registers one more output for `command_line` on an already shared runner.
    pub fn respond(&self, command_line: &str, output: CommandOutput) {
        self.responses
            .lock()
            .unwrap()
            .entry(command_line.to_string())
            .or_default()
            .push_back(output);
    }

    /// All the command lines run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// The command lines run so far, ignoring the privilege checks.
    pub fn service_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|call| call != "id -u")
            .collect()
    }
}

impl SystemCommandRunner for FakeCommandRunner {
    fn run(&self, system_command: SystemCommand) -> Result<CommandOutput, SystemCommandError> {
        let command_line = system_command.command_line();
        self.calls.lock().unwrap().push(command_line.clone());

        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&command_line).filter(|queue| !queue.is_empty());
        match queue {
            Some(queue) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
            Some(queue) => Ok(queue.front().cloned().unwrap()),
            None => Err(SystemCommandError::CommandExecutionFailed {
                command: command_line,
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }),
        }
    }
}
