use camino::Utf8Path;
use camino::Utf8PathBuf;
use std::fs;
use std::fs::Permissions;
use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use tempfile::TempDir;

/// A scratch directory tree, deleted when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct TempHostDir {
    pub temp_dir: Arc<TempDir>,
    current_path: Utf8PathBuf,
}

impl Default for TempHostDir {
    fn default() -> Self {
        let temp_dir = if let Ok(dir) = std::env::var("TEMP_DIR_ROOT") {
            TempDir::new_in(dir).unwrap()
        } else {
            TempDir::new().unwrap()
        };
        let current_path = Utf8Path::from_path(temp_dir.path()).unwrap().to_owned();
        TempHostDir {
            temp_dir: Arc::new(temp_dir),
            current_path,
        }
    }
}

impl TempHostDir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the sub-directory `relative_path`, creating it and its parents when missing.
    pub fn dir(&self, relative_path: &str) -> TempHostDir {
        let path = self.current_path.join(relative_path);
        if !path.exists() {
            fs::create_dir_all(&path).unwrap();
        }

        TempHostDir {
            temp_dir: self.temp_dir.clone(),
            current_path: path,
        }
    }

    /// Creates (or overwrites) the file `file_name` with the given content and mode.
    pub fn file(&self, file_name: &str, content: &str, mode: u32) -> Utf8PathBuf {
        let path = self.current_path.join(file_name);
        fs::write(&path, content).unwrap();
        fs::set_permissions(&path, Permissions::from_mode(mode)).unwrap();
        path
    }

    pub fn utf8_path(&self) -> &Utf8Path {
        self.current_path.as_path()
    }

    pub fn join(&self, relative_path: &str) -> Utf8PathBuf {
        self.current_path.join(relative_path)
    }
}
