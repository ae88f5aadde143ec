//! SystemCommand runner facility.
//!
//! Service managers never spawn processes themselves: they describe the command to run as a
//! [`SystemCommand`] and hand it to a [`SystemCommandRunner`], which returns the captured
//! [`CommandOutput`]. This keeps the output-parsing logic testable without touching the host.

mod error;
mod system_command;
mod system_command_runner;

#[cfg(target_family = "unix")]
mod unix_system_command_runner;

pub use self::{error::*, system_command::*, system_command_runner::*};

#[cfg(target_family = "unix")]
pub use self::unix_system_command_runner::*;
