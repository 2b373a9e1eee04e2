use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// The ordered list of watched directory roots. Passed explicitly to the
/// sync engine; never held as ambient global state.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryConfig {
    pub directories: Vec<String>,
}

impl LibraryConfig {
    /// Appends a directory, preserving order and ignoring duplicates.
    /// Returns whether the list changed.
    pub fn add_directory(&mut self, dir: &str) -> bool {
        if self.directories.iter().any(|d| d == dir) {
            return false;
        }
        self.directories.push(dir.to_string());
        true
    }

    /// Removes a directory. Returns whether the list changed.
    pub fn remove_directory(&mut self, dir: &str) -> bool {
        let before = self.directories.len();
        self.directories.retain(|d| d != dir);
        self.directories.len() != before
    }
}

/// Owns the on-disk config file. Last writer wins; the file is rewritten
/// whole on every save.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the watched-directory list. A missing file is the empty config,
    /// not an error.
    pub fn load(&self) -> Result<LibraryConfig, AppError> {
        if !self.path.exists() {
            return Ok(LibraryConfig::default());
        }
        let raw = fs::read_to_string(&self.path)?;
        let config = serde_json::from_str(&raw)
            .map_err(|e| AppError::Config(format!("invalid config file: {e}")))?;
        Ok(config)
    }

    pub fn save(&self, config: &LibraryConfig) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(config)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        let config = store.load().unwrap();
        assert!(config.directories.is_empty());
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));

        let mut config = LibraryConfig::default();
        config.add_directory("/photos/2023");
        config.add_directory("/photos/2024");
        store.save(&config).unwrap();

        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_add_directory_dedupes_and_keeps_order() {
        let mut config = LibraryConfig::default();
        assert!(config.add_directory("/a"));
        assert!(config.add_directory("/b"));
        assert!(!config.add_directory("/a"));
        assert_eq!(config.directories, vec!["/a", "/b"]);
    }

    #[test]
    fn test_remove_directory() {
        let mut config = LibraryConfig::default();
        config.add_directory("/a");
        config.add_directory("/b");

        assert!(config.remove_directory("/a"));
        assert!(!config.remove_directory("/a"));
        assert_eq!(config.directories, vec!["/b"]);
    }

    #[test]
    fn test_invalid_config_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let store = ConfigStore::new(&path);
        assert!(matches!(store.load(), Err(AppError::Config(_))));
    }
}
