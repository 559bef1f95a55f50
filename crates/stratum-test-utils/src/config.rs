//! [`ConfigDir`] for tests that read configuration files.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// A temporary directory of configuration files, removed on drop.
///
/// # Example
///
/// ```rust
/// use stratum_test_utils::ConfigDir;
///
/// let dir = ConfigDir::new();
/// let path = dir.write("app.cfg", "[app]\nname = ann\n");
/// dir.assert_file_exists("app.cfg");
/// assert!(path.ends_with("app.cfg"));
/// ```
pub struct ConfigDir {
    temp_dir: TempDir,
}

impl Default for ConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigDir {
    /// Create an empty temporary directory.
    ///
    /// # Panics
    /// Panics if the directory cannot be created.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new()
                .unwrap_or_else(|e| panic!("ConfigDir::new: failed to create temp dir: {e}")),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` (relative to the root), creating parent
    /// directories, and return the full path.
    ///
    /// # Panics
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap_or_else(|e| {
                panic!("ConfigDir::write: failed to create {}: {e}", parent.display())
            });
        }
        fs::write(&path, content)
            .unwrap_or_else(|e| panic!("ConfigDir::write: failed to write {}: {e}", path.display()));
        path
    }

    /// Assert that `name` (relative to the root) exists.
    ///
    /// # Panics
    /// Panics with a descriptive message if it does not.
    pub fn assert_file_exists(&self, name: &str) {
        let path = self.root().join(name);
        assert!(path.exists(), "Expected file to exist: {}", path.display());
    }
}
