/// Initialize a `tracing_subscriber` writing to stderr.
///
/// Reports all the log events sent either with the `log` crate or the `tracing` crate.
/// Standard output is kept for the action messages printed by the CLI.
pub fn initialise_tracing_subscriber(log_level: tracing::Level) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_max_level(log_level)
        .init();
}
