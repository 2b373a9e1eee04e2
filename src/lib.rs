pub mod commands;
pub mod data;
pub mod error;
pub mod models;
pub mod services;
pub mod state;

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub use error::AppError;
pub use models::image::ImageRecord;
pub use models::sync_report::{FailureKind, SyncFailure, SyncReport};
pub use services::enrichment_service::{MockTagger, Tagger};
pub use services::scan_service::ScanStatus;
pub use state::AppState;

use services::config_service::ConfigStore;
use services::enrichment_service::{EnrichmentWorker, DEFAULT_IDLE_INTERVAL};
use services::scan_service::ScanWorker;

/// Assembly knobs. The defaults match production behavior; tests shorten the
/// enrichment poll interval.
pub struct LibraryOptions {
    pub enrichment_enabled: bool,
    pub enrichment_idle_interval: Duration,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            enrichment_enabled: true,
            enrichment_idle_interval: DEFAULT_IDLE_INTERVAL,
        }
    }
}

/// An opened photo library: catalog database, config, and both background
/// workers. Dropping it joins the workers.
pub struct Library {
    pub state: AppState,
}

impl Library {
    pub fn open(data_dir: &Path, tagger: Arc<dyn Tagger>) -> Result<Self, AppError> {
        Self::open_with_options(data_dir, tagger, LibraryOptions::default())
    }

    pub fn open_with_options(
        data_dir: &Path,
        tagger: Arc<dyn Tagger>,
        options: LibraryOptions,
    ) -> Result<Self, AppError> {
        std::fs::create_dir_all(data_dir)?;
        let db_path = data_dir.join("photoshelf.db");
        let conn = data::open_catalog(&db_path)?;

        let config_store = ConfigStore::new(data_dir.join("config.json"));
        let config = config_store.load()?;

        let scan_status = Arc::new(Mutex::new(ScanStatus::default()));
        let scan_worker = ScanWorker::spawn(db_path.clone(), scan_status.clone())?;

        let enrichment_worker = if options.enrichment_enabled {
            Some(EnrichmentWorker::spawn(
                db_path.clone(),
                tagger,
                options.enrichment_idle_interval,
            )?)
        } else {
            None
        };

        Ok(Self {
            state: AppState {
                db: Mutex::new(conn),
                db_path,
                thumbnail_dir: data_dir.join("thumbnails"),
                config_store,
                config: Mutex::new(config),
                scan_status,
                scan_worker,
                enrichment_worker,
            },
        })
    }

    /// Opens the library in the platform data directory.
    pub fn open_default(tagger: Arc<dyn Tagger>) -> Result<Self, AppError> {
        let dirs = directories::ProjectDirs::from("", "", "photoshelf")
            .ok_or_else(|| AppError::Config("could not resolve a data directory".to_string()))?;
        Self::open(dirs.data_dir(), tagger)
    }
}
