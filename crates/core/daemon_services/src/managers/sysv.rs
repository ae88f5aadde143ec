use crate::control::command_failed;
use crate::template::render;
use crate::*;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use daemon_utils::paths::ok_if_not_found;
use regex::Regex;
use std::sync::LazyLock;
use system_command::CommandOutput;
use system_command::SystemCommand;
use tracing::debug;
use tracing::warn;

const START_RUN_LEVELS: [u8; 4] = [2, 3, 4, 5];
const STOP_RUN_LEVELS: [u8; 3] = [0, 1, 6];
const START_PRIORITY: &str = "S87";
const STOP_PRIORITY: &str = "K17";

const SCRIPT_TEMPLATE: &str = r#"#! /bin/sh
#
#       /etc/init.d/{name}
#
#       {description}
#
### BEGIN INIT INFO
# Provides:          {name}
# Required-Start:    $remote_fs $syslog
# Required-Stop:     $remote_fs $syslog
# Default-Start:     2 3 4 5
# Default-Stop:      0 1 6
# Short-Description: {description}
# Description:       {description}
### END INIT INFO

proc="{name}"
cmd="{path}"
pidfile="/var/run/$proc.pid"
stdoutlog="/var/log/$proc.log"
stderrlog="/var/log/$proc.err"

[ -d "/var/log" ] || mkdir -p "/var/log"

get_pid() {
    cat "$pidfile"
}

is_running() {
    [ -f "$pidfile" ] && kill -0 "$(get_pid)" > /dev/null 2>&1
}

case "$1" in
    start)
        if is_running; then
            echo "Already started"
        else
            echo "Starting $proc"
            "$cmd" >> "$stdoutlog" 2>> "$stderrlog" &
            echo $! > "$pidfile"
            if ! is_running; then
                echo "Unable to start, see $stdoutlog and $stderrlog"
                exit 1
            fi
        fi
    ;;
    stop)
        if is_running; then
            echo -n "Stopping $proc.."
            kill "$(get_pid)"
            for i in 1 2 3 4 5 6 7 8 9 10; do
                if ! is_running; then
                    break
                fi
                echo -n "."
                sleep 1
            done
            echo
            if is_running; then
                echo "Not stopped; may still be shutting down or shutdown may have failed"
                exit 1
            else
                echo "Stopped"
                rm -f "$pidfile"
            fi
        else
            echo "Not running"
        fi
    ;;
    restart)
        $0 stop
        if is_running; then
            echo "Unable to stop, will not attempt to start"
            exit 1
        fi
        $0 start
    ;;
    status)
        if is_running; then
            echo "Service (pid  $(get_pid)) is running..."
        elif [ -f "$pidfile" ]; then
            echo "Service is stopped"
            exit 1
        else
            echo "Service is stopped"
            exit 3
        fi
    ;;
    *)
        echo "Usage: $0 {start|stop|restart|status}"
        exit 2
    ;;
esac

exit 0
"#;

static PROCESS_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"pid\s+([0-9]+)").expect("valid pattern"));

/// Service control that uses a SysV init script, enabled with run-level links.
#[derive(Debug)]
pub struct SysVServiceControl {
    identity: ServiceIdentity,
    context: ServiceContext,
    init_dir: Utf8PathBuf,
    rc_root: Utf8PathBuf,
}

impl SysVServiceControl {
    pub fn new(identity: ServiceIdentity, context: ServiceContext, paths: &HostPaths) -> Self {
        Self {
            identity,
            context,
            init_dir: paths.sysv_init_dir.clone(),
            rc_root: paths.sysv_rc_root.clone(),
        }
    }

    fn script(&self, action: &str) -> SystemCommand {
        SystemCommand::new(self.definition_path().as_str()).arg(action)
    }

    /// The run-level links to the init script, whose run-level directory exists.
    fn rc_links(&self) -> Vec<Utf8PathBuf> {
        let name = self.identity.name();
        let start_links = START_RUN_LEVELS
            .iter()
            .map(|level| (level, format!("{START_PRIORITY}{name}")));
        let stop_links = STOP_RUN_LEVELS
            .iter()
            .map(|level| (level, format!("{STOP_PRIORITY}{name}")));

        start_links
            .chain(stop_links)
            .filter_map(|(level, link)| {
                let rc_dir = self.rc_root.join(format!("rc{level}.d"));
                if rc_dir.is_dir() {
                    Some(rc_dir.join(link))
                } else {
                    debug!(dir = %rc_dir, "skipping missing run-level directory");
                    None
                }
            })
            .collect()
    }
}

impl ServiceControl for SysVServiceControl {
    fn init_system(&self) -> InitSystem {
        InitSystem::SysV
    }

    fn identity(&self) -> &ServiceIdentity {
        &self.identity
    }

    fn context(&self) -> &ServiceContext {
        &self.context
    }

    fn definition_path(&self) -> Utf8PathBuf {
        self.init_dir.join(self.identity.name())
    }

    fn render_definition(&self, executable: &Utf8Path) -> String {
        render(SCRIPT_TEMPLATE, &self.identity, executable)
    }

    fn definition_mode(&self) -> u32 {
        0o755
    }

    // Init scripts are picked up as soon as they are linked.
    fn reload_configuration(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    fn probe_running(&self) -> Result<RunningState, ServiceError> {
        let command = self.script("status");
        let service_command = command.command_line();
        let output = self.context.run(command)?;
        let state = parse_init_script_status(&service_command, &output)?;
        debug!(service = self.identity.name(), %state, "probed init script");
        Ok(state)
    }

    fn start_service(&self) -> Result<(), ServiceError> {
        self.context.run_and_check(self.script("start"))?;
        Ok(())
    }

    fn stop_service(&self) -> Result<(), ServiceError> {
        self.context.run_and_check(self.script("stop"))?;
        Ok(())
    }

    fn stop_before_removal(&self) -> Result<(), ServiceError> {
        let command = self.script("stop");
        let service_command = command.command_line();
        let output = self.context.run(command)?;
        if output.success() {
            return Ok(());
        }

        if output.combined().contains("Not running") {
            warn!(service = self.identity.name(), "service already stopped");
            Ok(())
        } else {
            Err(command_failed(service_command, &output))
        }
    }

    fn after_install(&self) -> Result<(), ServiceError> {
        let script = self.definition_path();
        for link in self.rc_links() {
            debug!(link = %link, "linking init script");
            std::fs::remove_file(&link)
                .or_else(ok_if_not_found)
                .and_then(|()| std::os::unix::fs::symlink(&script, &link))
                .map_err(|source| ServiceError::FileOperationFailed {
                    action: "link",
                    path: link.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    fn before_delete(&self) -> Result<(), ServiceError> {
        for link in self.rc_links() {
            debug!(link = %link, "unlinking init script");
            std::fs::remove_file(&link)
                .or_else(ok_if_not_found)
                .map_err(|source| ServiceError::FileOperationFailed {
                    action: "unlink",
                    path: link.clone(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Reads the state of a service from the exit code of `<script> status`,
/// as defined by the LSB for init scripts.
pub fn parse_init_script_status(
    service_command: &str,
    output: &CommandOutput,
) -> Result<RunningState, ServiceError> {
    match output.code {
        Some(0) => {
            let pid = PROCESS_ID
                .captures(&output.stdout)
                .and_then(|captures| captures.get(1))
                .and_then(|pid| pid.as_str().parse::<u32>().ok());
            Ok(RunningState::Running { pid })
        }
        Some(1..=3) => Ok(RunningState::Stopped),
        _ => Err(ServiceError::UnknownOutput {
            service_command: service_command.to_string(),
            output: output.combined().trim().to_string(),
        }),
    }
}
