//! Command line front-end to [`daemon_services`]: controls one named service
//! with the init system of the host.

pub mod bin;
