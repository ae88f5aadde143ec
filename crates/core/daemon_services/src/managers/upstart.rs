use crate::control::command_failed;
use crate::template::render;
use crate::*;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use regex::Regex;
use std::sync::LazyLock;
use system_command::CommandOutput;
use system_command::SystemCommand;
use tracing::debug;
use tracing::warn;

const INITCTL_BIN: &str = "initctl";

const JOB_TEMPLATE: &str = "
description \"{name}, {description}\"

start on runlevel [2345]
stop on runlevel [!2345]

respawn
pre-start exec sleep 1
exec {path}
";

static PROCESS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"process ([0-9]+)").expect("valid pattern"));

/// Service control that uses [Upstart][1] job files and `initctl`.
///
/// [1]: https://upstart.ubuntu.com
#[derive(Debug)]
pub struct UpstartServiceControl {
    identity: ServiceIdentity,
    context: ServiceContext,
    conf_dir: Utf8PathBuf,
}

impl UpstartServiceControl {
    pub fn new(identity: ServiceIdentity, context: ServiceContext, paths: &HostPaths) -> Self {
        Self {
            identity,
            context,
            conf_dir: paths.upstart_conf_dir.clone(),
        }
    }

    fn initctl(&self, cmd: InitCtlCmd) -> SystemCommand {
        let command = SystemCommand::new(INITCTL_BIN).arg(cmd.as_str());
        match cmd {
            InitCtlCmd::ReloadConfiguration => command,
            _ => command.arg(self.identity.name()),
        }
    }
}

impl ServiceControl for UpstartServiceControl {
    fn init_system(&self) -> InitSystem {
        InitSystem::Upstart
    }

    fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn definition_path(&self) -> Utf8PathBuf {
        self.conf_dir.join(format!("{}.conf", self.identity.name()))
    }

    fn render_definition(&self, executable: &Utf8Path) -> String {
        render(JOB_TEMPLATE, &self.identity, executable)
    }

    fn reload_configuration(&self) -> Result<(), ServiceError> {
        self.context
            .run_and_check(self.initctl(InitCtlCmd::ReloadConfiguration))?;
        Ok(())
    }

    fn probe_running(&self) -> Result<RunningState, ServiceError> {
        let output = self.context.run(self.initctl(InitCtlCmd::Status))?;
        let state = parse_initctl_status(&output);
        debug!(service = self.identity.name(), %state, "probed upstart job");
        Ok(state)
    }

    fn start_service(&self) -> Result<(), ServiceError> {
        self.context.run_and_check(self.initctl(InitCtlCmd::Start))?;
        Ok(())
    }

    fn stop_service(&self) -> Result<(), ServiceError> {
        self.context.run_and_check(self.initctl(InitCtlCmd::Stop))?;
        Ok(())
    }

    fn stop_before_removal(&self) -> Result<(), ServiceError> {
        let command = self.initctl(InitCtlCmd::Stop);
        let service_command = command.command_line();
        let output = self.context.run(command)?;
        parse_initctl_stop(&service_command, &output)
    }
}

/// Reads the state of a job from `initctl status <name>`.
///
/// A failing status command means the job is not known to Upstart, hence not running.
pub fn parse_initctl_status(output: &CommandOutput) -> RunningState {
    if !output.success() {
        return RunningState::Stopped;
    }

    let stdout = &output.stdout;
    if !stdout.contains("start/running") {
        return RunningState::Stopped;
    }

    let pid = PROCESS_ID
        .captures(stdout)
        .and_then(|captures| captures.get(1))
        .and_then(|pid| pid.as_str().parse::<u32>().ok());
    RunningState::Running { pid }
}

/// Checks the outcome of `initctl stop <name>` issued before removing the job.
///
/// Upstart forgets about instances it has already reaped, so `Unknown instance` is not an error.
pub fn parse_initctl_stop(
    service_command: &str,
    output: &CommandOutput,
) -> Result<(), ServiceError> {
    let combined = output.combined();
    if !output.success() {
        if combined.contains("Unknown instance") {
            warn!("{service_command}: job instance already gone");
            return Ok(());
        }
        return Err(command_failed(service_command.to_string(), output));
    }

    if combined.contains("stop/waiting") {
        Ok(())
    } else {
        Err(ServiceError::UnknownOutput {
            service_command: service_command.to_string(),
            output: combined.trim().to_string(),
        })
    }
}

#[derive(Debug, Copy, Clone)]
enum InitCtlCmd {
    ReloadConfiguration,
    Start,
    Stop,
    Status,
}

impl InitCtlCmd {
    fn as_str(&self) -> &'static str {
        match self {
            InitCtlCmd::ReloadConfiguration => "reload-configuration",
            InitCtlCmd::Start => "start",
            InitCtlCmd::Stop => "stop",
            InitCtlCmd::Status => "status",
        }
    }
}
