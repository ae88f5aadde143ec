use crate::HostPaths;
use serde::Deserialize;
use tracing::debug;

/// The init systems a service can be registered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitSystem {
    /// A systemd service manager.
    Systemd,
    /// Upstart, controlled with `initctl`.
    Upstart,
    /// SysV init scripts enabled with run-level links.
    SysV,
}

impl InitSystem {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Systemd => "systemd",
            Self::Upstart => "upstart",
            Self::SysV => "sysv",
        }
    }

    /// Detects the init system of the host from its file system markers.
    ///
    /// The first match wins, so a host upgraded to systemd that still carries
    /// Upstart markers is controlled with systemd. Without any marker, SysV is assumed.
    pub fn detect(paths: &HostPaths) -> InitSystem {
        if paths.systemd_marker.is_dir() {
            debug!(marker = %paths.systemd_marker, "found systemd marker");
            return InitSystem::Systemd;
        }

        if paths.upstart_marker.is_dir() && paths.initctl.exists() {
            debug!(marker = %paths.upstart_marker, initctl = %paths.initctl, "found upstart markers");
            return InitSystem::Upstart;
        }

        debug!("no init system marker found, falling back to sysv");
        InitSystem::SysV
    }
}

impl std::fmt::Display for InitSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
