use crate::*;
use std::sync::Arc;
use system_command::SystemCommandRunner;
use tracing::info;

/// Builds the handle controlling `identity` with the init system of the host.
///
/// The init system is the one pinned by `[init] name` in the system config, if any.
/// Otherwise it is detected from the markers found on the host, once and for all.
pub fn service_control(
    identity: ServiceIdentity,
    config: &SystemConfig,
    runner: Arc<dyn SystemCommandRunner>,
) -> Box<dyn ServiceControl> {
    let init_system = config
        .init
        .name
        .unwrap_or_else(|| InitSystem::detect(&config.paths));
    info!(service = identity.name(), init = %init_system, "using {init_system} to control the service");

    let context = ServiceContext::new(runner, config.messages.clone());
    match init_system {
        InitSystem::Systemd => Box::new(SystemdServiceControl::new(
            identity,
            context,
            &config.paths,
        )),
        InitSystem::Upstart => Box::new(UpstartServiceControl::new(
            identity,
            context,
            &config.paths,
        )),
        InitSystem::SysV => Box::new(SysVServiceControl::new(identity, context, &config.paths)),
    }
}
