use crate::InitSystem;
use crate::SettingsError;
use camino::Utf8Path;
use camino::Utf8PathBuf;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

pub const SYSTEM_CONFIG_FILE: &str = "system.toml";
pub const DEFAULT_CONFIG_DIR: &str = "/etc/daemonctl";

const ROOT_PRIVILEGES: &str =
    "You must have root user privileges. Possibly using 'sudo' command should help";
const SUCCESS_MARKER: &str = "\t\t\t\t\t[  \x1b[32mOK\x1b[0m  ]";
const FAILED_MARKER: &str = "\t\t\t\t\t[\x1b[31mFAILED\x1b[0m]";

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct SystemConfig {
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default)]
    pub paths: HostPaths,
    #[serde(default)]
    pub messages: Messages,
    #[serde(default)]
    pub log: HashMap<String, String>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct InitConfig {
    /// Use this init system instead of detecting the one of the host.
    pub name: Option<InitSystem>,
}

/// Where the init systems keep their markers and service definitions.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct HostPaths {
    pub systemd_marker: Utf8PathBuf,
    pub upstart_marker: Utf8PathBuf,
    pub initctl: Utf8PathBuf,
    pub systemd_unit_dir: Utf8PathBuf,
    pub upstart_conf_dir: Utf8PathBuf,
    pub sysv_init_dir: Utf8PathBuf,
    pub sysv_rc_root: Utf8PathBuf,
}

impl Default for HostPaths {
    fn default() -> Self {
        Self {
            systemd_marker: "/run/systemd/system".into(),
            upstart_marker: "/etc/init".into(),
            initctl: "/sbin/initctl".into(),
            systemd_unit_dir: "/etc/systemd/system".into(),
            upstart_conf_dir: "/etc/init".into(),
            sysv_init_dir: "/etc/init.d".into(),
            sysv_rc_root: "/etc".into(),
        }
    }
}

impl HostPaths {
    /// The default paths, relocated under `root`.
    pub fn rooted_at(root: &Utf8Path) -> Self {
        let relocate =
            |path: Utf8PathBuf| root.join(path.strip_prefix("/").unwrap_or(path.as_path()));
        let defaults = Self::default();
        Self {
            systemd_marker: relocate(defaults.systemd_marker),
            upstart_marker: relocate(defaults.upstart_marker),
            initctl: relocate(defaults.initctl),
            systemd_unit_dir: relocate(defaults.systemd_unit_dir),
            upstart_conf_dir: relocate(defaults.upstart_conf_dir),
            sysv_init_dir: relocate(defaults.sysv_init_dir),
            sysv_rc_root: relocate(defaults.sysv_rc_root),
        }
    }
}

/// The texts displayed to the user.
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Messages {
    pub root_privileges: String,
    pub success: String,
    pub failed: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            root_privileges: ROOT_PRIVILEGES.to_string(),
            success: SUCCESS_MARKER.to_string(),
            failed: FAILED_MARKER.to_string(),
        }
    }
}

impl SystemConfig {
    /// Reads `system.toml` from `config_root`, falling back to the defaults if there is none.
    pub fn try_new(config_root: &Utf8Path) -> Result<Self, SettingsError> {
        let config_path = config_root.join(SYSTEM_CONFIG_FILE);

        match fs::read_to_string(&config_path) {
            Ok(contents) => {
                toml::from_str(&contents).map_err(|e| SettingsError::InvalidToml {
                    path: config_path,
                    reason: e.to_string(),
                })
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(SettingsError::ReadFailed {
                path: config_path,
                source,
            }),
        }
    }
}
