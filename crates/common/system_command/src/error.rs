#[derive(thiserror::Error, Debug)]
pub enum SystemCommandError {
    #[error("Failed to execute command <{command}>")]
    CommandExecutionFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },
}
