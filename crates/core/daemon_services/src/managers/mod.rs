mod systemd;
mod sysv;
mod upstart;

pub use self::{systemd::*, sysv::*, upstart::*};
