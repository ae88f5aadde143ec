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

const SYSTEMCTL_BIN: &str = "systemctl";

const UNIT_TEMPLATE: &str = "[Unit]
Description={description}
After=network.target

[Service]
PIDFile=/var/run/{name}.pid
ExecStartPre=/bin/rm -f /var/run/{name}.pid
ExecStart={path}
Restart=on-failure

[Install]
WantedBy=multi-user.target
";

static ACTIVE_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ActiveState=(\S*)\s*$").expect("valid pattern"));
static MAIN_PID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^MainPID=([0-9]+)\s*$").expect("valid pattern"));

/// Service control that uses [systemd][1] unit files and `systemctl`.
///
/// [1]: https://systemd.io
#[derive(Debug)]
pub struct SystemdServiceControl {
    identity: ServiceIdentity,
    context: ServiceContext,
    unit_dir: Utf8PathBuf,
}

impl SystemdServiceControl {
    pub fn new(identity: ServiceIdentity, context: ServiceContext, paths: &HostPaths) -> Self {
        Self {
            identity,
            context,
            unit_dir: paths.systemd_unit_dir.clone(),
        }
    }

    fn unit_name(&self) -> String {
        format!("{}.service", self.identity.name())
    }

    fn systemctl(&self, cmd: SystemCtlCmd) -> SystemCommand {
        let command = SystemCommand::new(SYSTEMCTL_BIN).arg(cmd.as_str());
        match cmd {
            SystemCtlCmd::DaemonReload => command,
            SystemCtlCmd::Show => command
                .arg(self.unit_name())
                .arg("--property=ActiveState")
                .arg("--property=MainPID"),
            _ => command.arg(self.unit_name()),
        }
    }
}

impl ServiceControl for SystemdServiceControl {
    fn init_system(&self) -> InitSystem {
        InitSystem::Systemd
    }

    fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn definition_path(&self) -> Utf8PathBuf {
        self.unit_dir.join(self.unit_name())
    }

    fn render_definition(&self, executable: &Utf8Path) -> String {
        render(UNIT_TEMPLATE, &self.identity, executable)
    }

    fn reload_configuration(&self) -> Result<(), ServiceError> {
        self.context
            .run_and_check(self.systemctl(SystemCtlCmd::DaemonReload))?;
        Ok(())
    }

    fn probe_running(&self) -> Result<RunningState, ServiceError> {
        let command = self.systemctl(SystemCtlCmd::Show);
        let service_command = command.command_line();
        let output = self.context.run(command)?;
        let state = parse_systemctl_show(&service_command, &output)?;
        debug!(service = self.identity.name(), %state, "probed systemd unit");
        Ok(state)
    }

    fn start_service(&self) -> Result<(), ServiceError> {
        self.context
            .run_and_check(self.systemctl(SystemCtlCmd::Enable))?;
        self.context
            .run_and_check(self.systemctl(SystemCtlCmd::Start))?;
        Ok(())
    }

    fn stop_service(&self) -> Result<(), ServiceError> {
        self.context.run_and_check(self.systemctl(SystemCtlCmd::Stop))?;
        Ok(())
    }

    fn stop_before_removal(&self) -> Result<(), ServiceError> {
        let command = self.systemctl(SystemCtlCmd::Stop);
        let service_command = command.command_line();
        let output = self.context.run(command)?;
        if output.success() {
            return Ok(());
        }

        if output.combined().contains("not loaded") {
            warn!(service = self.identity.name(), "unit already unloaded by systemd");
            Ok(())
        } else {
            Err(command_failed(service_command, &output))
        }
    }

    // Drops the links created by `enable`, which would otherwise dangle once the unit is gone.
    fn before_delete(&self) -> Result<(), ServiceError> {
        self.context
            .run_and_check(self.systemctl(SystemCtlCmd::Disable))?;
        Ok(())
    }
}

/// Reads the state of a unit from `systemctl show --property=ActiveState --property=MainPID`.
pub fn parse_systemctl_show(
    service_command: &str,
    output: &CommandOutput,
) -> Result<RunningState, ServiceError> {
    let stdout = &output.stdout;
    let active_state = ACTIVE_STATE
        .captures(stdout)
        .and_then(|captures| captures.get(1))
        .map(|state| state.as_str())
        .ok_or_else(|| ServiceError::UnknownOutput {
            service_command: service_command.to_string(),
            output: output.combined().trim().to_string(),
        })?;

    // A unit reloading its configuration keeps its main process.
    if !matches!(active_state, "active" | "reloading") {
        return Ok(RunningState::Stopped);
    }

    let pid = MAIN_PID
        .captures(stdout)
        .and_then(|captures| captures.get(1))
        .and_then(|pid| pid.as_str().parse::<u32>().ok())
        .filter(|pid| *pid > 0);
    Ok(RunningState::Running { pid })
}

#[derive(Debug, Copy, Clone)]
enum SystemCtlCmd {
    DaemonReload,
    Enable,
    Disable,
    Start,
    Stop,
    Show,
}

impl SystemCtlCmd {
    fn as_str(&self) -> &'static str {
        match self {
            SystemCtlCmd::DaemonReload => "daemon-reload",
            SystemCtlCmd::Enable => "enable",
            SystemCtlCmd::Disable => "disable",
            SystemCtlCmd::Start => "start",
            SystemCtlCmd::Stop => "stop",
            SystemCtlCmd::Show => "show",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use daemon_test_utils::FakeCommandRunner;
    use daemon_test_utils::TempHostDir;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use test_case::test_case;

    const SHOW: &str = "systemctl show demo.service --property=ActiveState --property=MainPID";

    fn active(pid: u32) -> CommandOutput {
        CommandOutput::new(0, format!("MainPID={pid}\nActiveState=active\n"))
    }

    fn inactive() -> CommandOutput {
        CommandOutput::new(0, "MainPID=0\nActiveState=inactive\n")
    }

    fn ok() -> CommandOutput {
        CommandOutput::new(0, "")
    }

    struct Fixture {
        host: TempHostDir,
        runner: Arc<FakeCommandRunner>,
        control: SystemdServiceControl,
        executable: Utf8PathBuf,
    }

    fn fixture(runner: FakeCommandRunner) -> Fixture {
        let host = TempHostDir::new();
        host.dir("etc/systemd/system");
        let executable = host.dir("usr/local/bin").file("demo", "#!/bin/sh\n", 0o755);
        let runner = Arc::new(runner);
        let context = ServiceContext::new(runner.clone(), Messages::default());
        let control = SystemdServiceControl::new(
            ServiceIdentity::new("demo", "Demo Service"),
            context,
            &HostPaths::rooted_at(host.utf8_path()),
        );
        Fixture {
            host,
            runner,
            control,
            executable,
        }
    }

    #[test_case("MainPID=812\nActiveState=active\n", RunningState::Running { pid: Some(812) } ; "active with pid")]
    #[test_case("ActiveState=active\nMainPID=0\n", RunningState::Running { pid: None } ; "active without pid")]
    #[test_case("MainPID=812\nActiveState=reloading\n", RunningState::Running { pid: Some(812) } ; "reloading")]
    #[test_case("MainPID=0\nActiveState=inactive\n", RunningState::Stopped ; "inactive")]
    #[test_case("MainPID=0\nActiveState=failed\n", RunningState::Stopped ; "failed")]
    #[test_case("ActiveState=activating\nMainPID=77\n", RunningState::Stopped ; "activating")]
    fn parse_show(stdout: &str, expected: RunningState) {
        let state = parse_systemctl_show(SHOW, &CommandOutput::new(0, stdout)).unwrap();
        assert_eq!(state, expected);
    }

    #[test]
    fn show_without_active_state_is_unknown() {
        let output = CommandOutput::new(1, "").with_stderr("Failed to connect to bus");
        let error = parse_systemctl_show(SHOW, &output).unwrap_err();
        assert_matches!(error, ServiceError::UnknownOutput { .. });
    }

    #[test]
    fn render_unit_file() {
        let fixture = fixture(FakeCommandRunner::new());
        let unit = fixture
            .control
            .render_definition(Utf8Path::new("/usr/local/bin/demo"));

        assert_eq!(
            unit,
            "[Unit]
Description=Demo Service
After=network.target

[Service]
PIDFile=/var/run/demo.pid
ExecStartPre=/bin/rm -f /var/run/demo.pid
ExecStart=/usr/local/bin/demo
Restart=on-failure

[Install]
WantedBy=multi-user.target
"
        );
    }

    #[test]
    fn install_writes_the_unit_and_reloads() {
        let fixture =
            fixture(FakeCommandRunner::new().as_root().on("systemctl daemon-reload", ok()));

        let message = fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        assert_eq!(message, format!("Install Demo Service:{}", Messages::default().success));
        let unit = std::fs::read_to_string(fixture.host.join("etc/systemd/system/demo.service"))
            .unwrap();
        assert!(unit.contains(&format!("ExecStart={}\n", fixture.executable)));
        assert_eq!(fixture.runner.service_calls(), vec!["systemctl daemon-reload"]);
    }

    #[test]
    fn failed_reload_is_reported() {
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", CommandOutput::new(1, "")),
        );

        let error = fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap_err();

        assert_eq!(
            error.message,
            format!("Install Demo Service:{}", Messages::default().failed)
        );
        assert_matches!(error.error, ServiceError::ReloadFailed { .. });
    }

    #[test]
    fn start_enables_then_starts_once() {
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", ok())
                .on(SHOW, inactive())
                .on(SHOW, active(812))
                .on("systemctl enable demo.service", ok())
                .on("systemctl start demo.service", ok()),
        );
        fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        fixture.control.start().unwrap();
        let error = fixture.control.start().unwrap_err();

        assert_matches!(error.error, ServiceError::AlreadyRunning);
        assert_eq!(
            fixture.runner.service_calls(),
            vec![
                "systemctl daemon-reload",
                SHOW,
                "systemctl enable demo.service",
                "systemctl start demo.service",
                SHOW,
            ]
        );
    }

    #[test]
    fn a_reloading_unit_is_stopped_then_removed() {
        let reloading = CommandOutput::new(0, "MainPID=812\nActiveState=reloading\n");
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", ok())
                .on(SHOW, reloading)
                .on("systemctl stop demo.service", ok())
                .on("systemctl disable demo.service", ok()),
        );
        fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        fixture.control.stop().unwrap();
        fixture.control.remove().unwrap();

        assert_eq!(
            fixture.runner.service_calls(),
            vec![
                "systemctl daemon-reload",
                SHOW,
                "systemctl stop demo.service",
                SHOW,
                "systemctl stop demo.service",
                "systemctl disable demo.service",
                "systemctl daemon-reload",
            ]
        );
    }

    #[test]
    fn remove_stops_disables_and_reloads() {
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", ok())
                .on(SHOW, active(812))
                .on("systemctl stop demo.service", ok())
                .on("systemctl disable demo.service", ok()),
        );
        fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        fixture.control.remove().unwrap();

        assert!(!fixture.control.is_installed());
        assert_eq!(
            fixture.runner.service_calls(),
            vec![
                "systemctl daemon-reload",
                SHOW,
                "systemctl stop demo.service",
                "systemctl disable demo.service",
                "systemctl daemon-reload",
            ]
        );
    }

    #[test]
    fn remove_tolerates_units_systemd_no_longer_knows() {
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", ok())
                .on(SHOW, active(812))
                .on(
                    "systemctl stop demo.service",
                    CommandOutput::new(5, "")
                        .with_stderr("Failed to stop demo.service: Unit demo.service not loaded.\n"),
                )
                .on("systemctl disable demo.service", ok()),
        );
        fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        assert!(fixture.control.remove().is_ok());
        assert!(!fixture.control.is_installed());
    }

    #[test]
    fn remove_fails_when_the_stop_fails() {
        let fixture = fixture(
            FakeCommandRunner::new()
                .as_root()
                .on("systemctl daemon-reload", ok())
                .on(SHOW, active(812))
                .on(
                    "systemctl stop demo.service",
                    CommandOutput::new(1, "").with_stderr("Access denied\n"),
                ),
        );
        fixture
            .control
            .install_from_path(&fixture.executable)
            .unwrap();

        let error = fixture.control.remove().unwrap_err();

        assert_matches!(
            error.error,
            ServiceError::ServiceCommandFailed { code: Some(1), .. }
        );
        assert!(fixture.control.is_installed());
    }
}
