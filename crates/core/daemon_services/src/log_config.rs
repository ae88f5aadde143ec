use crate::SettingsError;
use crate::SystemConfig;
use std::str::FromStr;

/// The log level configured for `sname` in the `[log]` table, `INFO` if none.
pub fn get_log_level(sname: &str, config: &SystemConfig) -> Result<tracing::Level, SettingsError> {
    match config.log.get(sname) {
        Some(ll) => tracing::Level::from_str(&ll.to_uppercase()).map_err(|_| {
            SettingsError::InvalidLogLevel {
                name: ll.to_string(),
            }
        }),
        None => Ok(tracing::Level::INFO),
    }
}
