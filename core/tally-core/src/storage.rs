//! Storage configuration and path management for Tally.
//!
//! Centralizes every file path the daemon touches. Production code uses
//! `StorageConfig::default()` (rooted at `~/.tally`); tests inject a temp
//! directory via `StorageConfig::with_root()`.

use std::path::{Path, PathBuf};

/// Central configuration for all Tally storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all Tally data (default: ~/.tally)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self {
            root: home.join(".tally"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the single JSON slot holding the persisted track set.
    pub fn tracks_file(&self) -> PathBuf {
        self.root.join("tracks.json")
    }

    /// Path to the daemon's unix socket.
    pub fn socket_file(&self) -> PathBuf {
        self.root.join("daemon.sock")
    }

    /// Ensures the root directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_root_is_tally() {
        let config = StorageConfig::default();
        assert!(config.root().ends_with(".tally"));
    }

    #[test]
    fn with_root_sets_custom_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/test-tally"));
        assert_eq!(config.root(), Path::new("/tmp/test-tally"));
    }

    #[test]
    fn tracks_file_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/tally"));
        assert_eq!(config.tracks_file(), PathBuf::from("/tmp/tally/tracks.json"));
    }

    #[test]
    fn socket_file_path() {
        let config = StorageConfig::with_root(PathBuf::from("/tmp/tally"));
        assert_eq!(config.socket_file(), PathBuf::from("/tmp/tally/daemon.sock"));
    }

    #[test]
    fn ensure_dirs_creates_root() {
        let temp = TempDir::new().unwrap();
        let config = StorageConfig::with_root(temp.path().join("data"));

        config.ensure_dirs().unwrap();
        assert!(config.root().exists());
    }
}
