use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::services::config_service::{ConfigStore, LibraryConfig};
use crate::services::enrichment_service::EnrichmentWorker;
use crate::services::scan_service::{ScanStatus, ScanWorker};

/// Shared application state handed to the commands layer. The catalog
/// connection behind `db` serves interactive queries; the background workers
/// each own a separate connection to the same WAL database.
pub struct AppState {
    pub db: Mutex<rusqlite::Connection>,
    pub db_path: PathBuf,
    pub thumbnail_dir: PathBuf,
    pub config_store: ConfigStore,
    pub config: Mutex<LibraryConfig>,
    pub scan_status: Arc<Mutex<ScanStatus>>,
    pub scan_worker: ScanWorker,
    pub enrichment_worker: Option<EnrichmentWorker>,
}

impl AppState {
    pub fn watched_directories(&self) -> Vec<String> {
        self.config
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .directories
            .clone()
    }
}
