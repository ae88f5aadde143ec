use crate::*;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use daemon_utils::paths::executable_path;
use daemon_utils::paths::is_executable;
use std::fmt::Debug;
use std::fs;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use system_command::CommandOutput;
use system_command::SystemCommand;
use system_command::SystemCommandRunner;
use tracing::debug;
use tracing::info;

const STATUS_UNDEFINED: &str = "Status could not defined";

/// Whether the service is currently active, as reported by its init system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunningState {
    Running { pid: Option<u32> },
    Stopped,
}

impl RunningState {
    pub fn is_running(&self) -> bool {
        matches!(self, RunningState::Running { .. })
    }
}

impl std::fmt::Display for RunningState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunningState::Running { pid: Some(pid) } => {
                write!(f, "Service (pid  {pid}) is running...")
            }
            RunningState::Running { pid: None } => write!(f, "Service is running..."),
            RunningState::Stopped => write!(f, "Service is stopped"),
        }
    }
}

/// What every service control handle needs besides the service identity:
/// a way to run commands and the texts to report with.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    runner: Arc<dyn SystemCommandRunner>,
    messages: Messages,
}

impl ServiceContext {
    pub fn new(runner: Arc<dyn SystemCommandRunner>, messages: Messages) -> Self {
        Self { runner, messages }
    }

    pub fn messages(&self) -> &Messages {
        &self.messages
    }

    /// Checks the process runs as root, asking `id -u`.
    ///
    /// Failing to run `id` or to parse its output means no privileges.
    pub fn has_privileges(&self) -> bool {
        match self.runner.run(SystemCommand::new("id").arg("-u")) {
            Ok(output) if output.success() => output.stdout.trim() == "0",
            Ok(output) => {
                debug!(code = ?output.code, "failed to check the user id");
                false
            }
            Err(err) => {
                debug!("failed to check the user id: {err}");
                false
            }
        }
    }

    /// Runs the command, whatever its exit code.
    pub fn run(&self, command: SystemCommand) -> Result<CommandOutput, ServiceError> {
        Ok(self.runner.run(command)?)
    }

    /// Runs the command, failing unless it exits with code 0.
    pub fn run_and_check(&self, command: SystemCommand) -> Result<CommandOutput, ServiceError> {
        let service_command = command.command_line();
        let output = self.run(command)?;
        if output.success() {
            Ok(output)
        } else {
            Err(command_failed(service_command, &output))
        }
    }
}

pub(crate) fn command_failed(service_command: String, output: &CommandOutput) -> ServiceError {
    ServiceError::ServiceCommandFailed {
        service_command,
        code: output.code,
        output: output.combined().trim().to_string(),
    }
}

/// Controls the life-cycle of one service with the init system of the host.
///
/// An implementation provides the init-system specific pieces: where the service definition
/// lives, what it contains, and how to start, stop and probe the service. The life-cycle
/// actions themselves ([`install`](Self::install), [`remove`](Self::remove),
/// [`start`](Self::start), [`stop`](Self::stop), [`status`](Self::status)) are provided and
/// re-check the installed and running states before doing anything.
pub trait ServiceControl: Debug {
    /// The init system this handle drives.
    fn init_system(&self) -> InitSystem;

    fn identity(&self) -> &ServiceIdentity;

    fn context(&self) -> &ServiceContext;

    /// Where the service definition is written to.
    fn definition_path(&self) -> Utf8PathBuf;

    /// The content of the service definition for the given executable.
    fn render_definition(&self, executable: &Utf8Path) -> String;

    /// The permission mode of the service definition file.
    fn definition_mode(&self) -> u32 {
        0o644
    }

    /// Makes the init system take definition changes into account.
    fn reload_configuration(&self) -> Result<(), ServiceError>;

    /// Queries the init system for the current state of the service.
    fn probe_running(&self) -> Result<RunningState, ServiceError>;

    fn start_service(&self) -> Result<(), ServiceError>;

    fn stop_service(&self) -> Result<(), ServiceError>;

    /// Stops a running service that is about to be removed.
    ///
    /// Init systems that may have already forgotten the service tolerate that here.
    fn stop_before_removal(&self) -> Result<(), ServiceError> {
        self.stop_service()
    }

    /// Called once the definition has been written, before the configuration is reloaded.
    fn after_install(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Called once the service is stopped, just before its definition is deleted.
    fn before_delete(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.definition_path().exists()
    }

    /// Installs the service, looking its executable up if not given by the identity.
    fn install(&self) -> ActionResult {
        let label = format!("Install {}:", self.identity().description());
        let executable = match self.identity().executable() {
            Some(executable) => executable.to_owned(),
            None => executable_path(self.identity().name())
                .map_err(|err| failure(self, &label, err.into()))?,
        };
        self.install_from_path(&executable)
    }

    fn install_from_path(&self, executable: &Utf8Path) -> ActionResult {
        let label = format!("Install {}:", self.identity().description());
        report(self, label, install_definition(self, executable))
    }

    fn remove(&self) -> ActionResult {
        let label = format!("Removing {}:", self.identity().description());
        report(self, label, remove_definition(self))
    }

    fn start(&self) -> ActionResult {
        let label = format!("Starting {}:", self.identity().description());
        let outcome = check_installed(self).and_then(|()| {
            if self.probe_running()?.is_running() {
                return Err(ServiceError::AlreadyRunning);
            }
            self.start_service()
        });
        report(self, label, outcome)
    }

    fn stop(&self) -> ActionResult {
        let label = format!("Stopping {}:", self.identity().description());
        let outcome = check_installed(self).and_then(|()| {
            if !self.probe_running()?.is_running() {
                return Err(ServiceError::AlreadyStopped);
            }
            self.stop_service()
        });
        report(self, label, outcome)
    }

    /// The current state of the service, e.g. `Service is stopped`.
    fn status(&self) -> ActionResult {
        if let Err(error) = check_privileges(self) {
            return Err(ActionError {
                message: String::new(),
                error,
            });
        }

        let state = check_installed(self)
            .and_then(|()| self.probe_running())
            .map_err(|error| ActionError {
                message: STATUS_UNDEFINED.to_string(),
                error,
            })?;
        Ok(state.to_string())
    }
}

fn check_privileges<C: ServiceControl + ?Sized>(control: &C) -> Result<(), ServiceError> {
    if control.context().has_privileges() {
        Ok(())
    } else {
        Err(ServiceError::PrivilegesRequired {
            message: control.context().messages().root_privileges.clone(),
        })
    }
}

fn check_installed<C: ServiceControl + ?Sized>(control: &C) -> Result<(), ServiceError> {
    check_privileges(control)?;
    if control.is_installed() {
        Ok(())
    } else {
        Err(ServiceError::NotInstalled {
            description: control.identity().description().to_string(),
        })
    }
}

fn install_definition<C: ServiceControl + ?Sized>(
    control: &C,
    executable: &Utf8Path,
) -> Result<(), ServiceError> {
    check_privileges(control)?;

    if control.is_installed() {
        return Err(ServiceError::AlreadyInstalled {
            description: control.identity().description().to_string(),
        });
    }

    if !is_executable(executable)? {
        return Err(ServiceError::NotExecutable {
            path: executable.to_owned(),
        });
    }

    let path = control.definition_path();
    let content = control.render_definition(executable);
    debug!(path = %path, "writing service definition");
    let mode = Permissions::from_mode(control.definition_mode());
    fs::write(&path, content)
        .and_then(|()| fs::set_permissions(&path, mode))
        .map_err(|source| ServiceError::FileOperationFailed {
            action: "create",
            path: path.clone(),
            source,
        })?;

    control.after_install()?;
    reload(control)
}

fn remove_definition<C: ServiceControl + ?Sized>(control: &C) -> Result<(), ServiceError> {
    check_installed(control)?;

    if control.probe_running()?.is_running() {
        control.stop_before_removal()?;
    }
    control.before_delete()?;

    let path = control.definition_path();
    debug!(path = %path, "deleting service definition");
    fs::remove_file(&path).map_err(|source| ServiceError::FileOperationFailed {
        action: "remove",
        path: path.clone(),
        source,
    })?;

    reload(control)
}

fn reload<C: ServiceControl + ?Sized>(control: &C) -> Result<(), ServiceError> {
    control
        .reload_configuration()
        .map_err(|err| ServiceError::ReloadFailed {
            init_system: control.init_system().name(),
            source: Box::new(err),
        })
}

fn failure<C: ServiceControl + ?Sized>(
    control: &C,
    label: &str,
    error: ServiceError,
) -> ActionError {
    ActionError {
        message: format!("{label}{}", control.context().messages().failed),
        error,
    }
}

fn report<C: ServiceControl + ?Sized>(
    control: &C,
    label: String,
    outcome: Result<(), ServiceError>,
) -> ActionResult {
    match outcome {
        Ok(()) => {
            info!(
                service = control.identity().name(),
                init = %control.init_system(),
                "{label} done"
            );
            Ok(format!("{label}{}", control.context().messages().success))
        }
        Err(error) => {
            debug!(service = control.identity().name(), "{label} failed: {error}");
            Err(failure(control, &label, error))
        }
    }
}
