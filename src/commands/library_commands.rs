use std::path::Path;

use crate::data::repository;
use crate::error::AppError;
use crate::services::config_service::LibraryConfig;
use crate::services::scan_service::ScanStatus;
use crate::state::AppState;

fn validate_directory(directory: &str) -> Result<(), AppError> {
    if !Path::new(directory).is_dir() {
        return Err(AppError::Config(format!(
            "not a valid directory: {directory}"
        )));
    }
    Ok(())
}

fn save_and_collect(state: &AppState, config: &LibraryConfig) -> Result<Vec<String>, AppError> {
    state.config_store.save(config)?;
    Ok(config.directories.clone())
}

/// First-run setup: replaces the watch list with a single directory and
/// kicks off the initial scan in the background.
pub fn setup_library(state: &AppState, directory: &str) -> Result<(), AppError> {
    validate_directory(directory)?;
    let dirs = {
        let mut config = state
            .config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        config.directories = vec![directory.to_string()];
        save_and_collect(state, &config)?
    };
    state.scan_worker.request_scan(dirs)
}

/// Adds a directory to the watch list and triggers a scan of the full
/// updated list. Fire-and-forget: the caller polls `scan_status`.
pub fn add_directory(state: &AppState, directory: &str) -> Result<(), AppError> {
    validate_directory(directory)?;
    let dirs = {
        let mut config = state
            .config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        config.add_directory(directory);
        save_and_collect(state, &config)?
    };
    state.scan_worker.request_scan(dirs)
}

/// Removes a directory from the watch list and synchronously bulk-deletes
/// its records, so the removal is visible before this returns even if a
/// scan is running. Returns the number of records deleted.
pub fn remove_directory(state: &AppState, directory: &str) -> Result<usize, AppError> {
    {
        let mut config = state
            .config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if config.remove_directory(directory) {
            state.config_store.save(&config)?;
        }
    }
    let conn = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    repository::delete_by_prefix(&conn, directory)
}

/// Triggers a full rescan of the current watch list.
pub fn rescan(state: &AppState) -> Result<(), AppError> {
    state.scan_worker.request_scan(state.watched_directories())
}

pub fn scan_status(state: &AppState) -> ScanStatus {
    state.scan_worker.status()
}
