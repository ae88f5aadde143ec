use anyhow::Context;
use camino::Utf8PathBuf;
use clap::Parser;
use clap::Subcommand;
use daemon_services::get_log_level;
use daemon_services::service_control;
use daemon_services::ActionResult;
use daemon_services::ServiceIdentity;
use daemon_services::SystemConfig;
use daemon_services::DEFAULT_CONFIG_DIR;
use daemon_utils::logging::initialise_tracing_subscriber;
use std::sync::Arc;
use system_command::SystemCommandRunner;
use system_command::UnixSystemCommandRunner;
use tracing::debug;

/// Controls a service with the init system of the host: systemd, Upstart or SysV init.
///
/// Every action but `status` requires root privileges.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = clap::crate_name!(), about, version, long_about)]
pub struct Args {
    /// Directory of the `system.toml` file.
    #[arg(long = "config-dir", default_value = DEFAULT_CONFIG_DIR)]
    pub config_dir: Utf8PathBuf,

    /// Turn-on the debug log level.
    ///
    /// If off only reports ERROR, WARN, and INFO, unless set in `system.toml`.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Name of the service, as registered with the init system.
    #[arg(long, env = "DAEMONCTL_NAME")]
    pub name: String,

    /// Human readable description of the service. Defaults to its name.
    #[arg(long)]
    pub description: Option<String>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Action {
    /// Register the service with the init system.
    Install {
        /// Executable to run as the service.
        ///
        /// Defaults to the program named after the service on `PATH`,
        /// or to this very executable if there is none.
        #[arg(long)]
        path: Option<Utf8PathBuf>,
    },

    /// Stop the service if running and unregister it.
    Remove,

    /// Start the installed service.
    Start,

    /// Stop the running service.
    Stop,

    /// Report whether the service is running.
    Status,
}

impl Action {
    fn as_str(&self) -> &'static str {
        match self {
            Action::Install { .. } => "install",
            Action::Remove => "remove",
            Action::Start => "start",
            Action::Stop => "stop",
            Action::Status => "query the status of",
        }
    }
}

impl Args {
    fn identity(&self) -> ServiceIdentity {
        let description = self.description.as_deref().unwrap_or(&self.name);
        let identity = ServiceIdentity::new(&self.name, description);
        match &self.action {
            Action::Install { path: Some(path) } => identity.with_executable(path.clone()),
            _ => identity,
        }
    }
}

pub fn run(args: Args) -> anyhow::Result<()> {
    let config = SystemConfig::try_new(&args.config_dir)?;

    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        get_log_level(clap::crate_name!(), &config)?
    };
    initialise_tracing_subscriber(log_level);
    debug!(config_dir = %args.config_dir, "loaded the system configuration");

    let runner: Arc<dyn SystemCommandRunner> = Arc::new(UnixSystemCommandRunner);
    match execute(&args, &config, runner) {
        Ok(message) => {
            println!("{message}");
            Ok(())
        }
        Err(err) => {
            if !err.message.is_empty() {
                println!("{}", err.message);
            }
            Err(err).with_context(|| format!("failed to {} {}", args.action.as_str(), args.name))
        }
    }
}

/// Performs the requested action, returning the message to display.
pub fn execute(
    args: &Args,
    config: &SystemConfig,
    runner: Arc<dyn SystemCommandRunner>,
) -> ActionResult {
    let control = service_control(args.identity(), config, runner);
    match args.action {
        Action::Install { .. } => control.install(),
        Action::Remove => control.remove(),
        Action::Start => control.start(),
        Action::Stop => control.stop(),
        Action::Status => control.status(),
    }
}
