use crate::*;
use std::process::*;
use tracing::debug;

/// Runs commands with `std::process`, capturing both output streams.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixSystemCommandRunner;

impl SystemCommandRunner for UnixSystemCommandRunner {
    fn run(&self, system_command: SystemCommand) -> Result<CommandOutput, SystemCommandError> {
        let command_line = system_command.command_line();
        debug!(command = %command_line, "running command");

        let output = into_command(system_command)
            .output()
            .map_err(|source| SystemCommandError::CommandExecutionFailed {
                command: command_line.clone(),
                source,
            })?;

        let output = CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        debug!(command = %command_line, code = ?output.code, "command terminated");

        Ok(output)
    }
}

fn into_command(system_command: SystemCommand) -> Command {
    let SystemCommand { program, args } = system_command;

    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    command
}
