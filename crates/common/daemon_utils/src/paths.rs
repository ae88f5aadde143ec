use camino::Utf8Path;
use camino::Utf8PathBuf;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum PathsError {
    #[error("Cannot access {path}")]
    NotAccessible {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot determine the path of the running executable")]
    CurrentExeUnknown(#[source] std::io::Error),

    #[error("Path conversion to UTF-8 failed: {path:?}")]
    PathToStringFailed { path: PathBuf },
}

/// Checks whether any of the executable permission bits of `path` are set.
///
/// Symlinks are followed. A missing or unreadable target is an error, not a `false`.
#[cfg(unix)]
pub fn is_executable(path: &Utf8Path) -> Result<bool, PathsError> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path).map_err(|source| PathsError::NotAccessible {
        path: path.to_owned(),
        source,
    })?;
    Ok(metadata.is_file() && metadata.permissions().mode() & 0o111 != 0)
}

/// Resolves the executable that should be registered for the service `name`.
///
/// The program is first looked up on `PATH`. When it cannot be found there,
/// the executable of the current process is used instead.
pub fn executable_path(name: &str) -> Result<Utf8PathBuf, PathsError> {
    match which::which(name) {
        Ok(path) if path.exists() => utf8_path(path),
        _ => current_exe(),
    }
}

fn current_exe() -> Result<Utf8PathBuf, PathsError> {
    let path = std::env::current_exe().map_err(PathsError::CurrentExeUnknown)?;
    utf8_path(path)
}

fn utf8_path(path: PathBuf) -> Result<Utf8PathBuf, PathsError> {
    Utf8PathBuf::from_path_buf(path).map_err(|path| PathsError::PathToStringFailed { path })
}

pub fn ok_if_not_found(err: std::io::Error) -> std::io::Result<()> {
    match err.kind() {
        std::io::ErrorKind::NotFound => Ok(()),
        _ => Err(err),
    }
}
