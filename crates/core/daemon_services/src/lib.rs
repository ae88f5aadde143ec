//! Common interface to the init system of the host, to install, remove, start, stop
//! or query the status of a single named service.
//!
//! Supported init systems:
//!
//! * systemd
//! * Upstart (`initctl`)
//! * SysV init scripts with run-level links
//!
//! The init system is detected once, when the [`ServiceControl`] handle is built
//! with [`service_control`], and never re-evaluated afterwards.

mod control;
mod detect;
mod error;
mod identity;
mod log_config;
mod manager;
mod managers;
mod settings;
mod template;

pub use self::{
    control::*, detect::*, error::*, identity::*, log_config::*, manager::*, managers::*,
    settings::*,
};
