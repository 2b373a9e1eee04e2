use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::data::{self, repository};
use crate::error::AppError;
use crate::models::sync_report::{FailureKind, SyncReport};
use crate::services::metadata_service::{self, ExtractError};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp"];

fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| SUPPORTED_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Enumerates every supported image file under the watched roots. Walk
/// failures (permission-denied subtrees, broken links, missing roots) are
/// recorded per path and never abort the enumeration. Symlinks are not
/// followed, so link cycles cannot trap the walk.
fn collect_disk_paths(directories: &[String], report: &mut SyncReport) -> HashSet<String> {
    let mut disk = HashSet::new();
    for dir in directories {
        for entry in walkdir::WalkDir::new(dir).follow_links(false) {
            match entry {
                Ok(e) => {
                    if e.file_type().is_file() && is_supported_image(e.path()) {
                        disk.insert(e.path().to_string_lossy().to_string());
                    }
                }
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_else(|| dir.clone());
                    warn!(path = %path, error = %err, "skipping inaccessible path");
                    report.record_failure(path, FailureKind::Inaccessible);
                }
            }
        }
    }
    disk
}

/// One sync pass: reconciles the catalog against the files currently on disk
/// under `directories`.
///
/// The argument is the complete authoritative watch list. Any catalogued path
/// not found under it is removed, which is also how a de-registered directory
/// drains out of the catalog. Per-file extraction failures are reported and
/// skipped; only a store failure aborts the run. Running twice with no
/// filesystem change makes the second pass a no-op.
pub fn reconcile(conn: &Connection, directories: &[String]) -> Result<SyncReport, AppError> {
    let mut report = SyncReport::default();

    let disk_set = collect_disk_paths(directories, &mut report);
    let catalog_set = repository::all_paths(conn)?;
    info!(
        directories = directories.len(),
        on_disk = disk_set.len(),
        catalogued = catalog_set.len(),
        "reconcile started"
    );

    for path in disk_set.difference(&catalog_set) {
        match metadata_service::extract(Path::new(path)) {
            Ok(meta) => {
                if repository::insert_image(conn, &meta)? {
                    report.added += 1;
                }
            }
            Err(ExtractError::Unreadable(p)) => {
                warn!(path = %p, "could not decode image, skipping");
                report.record_failure(p, FailureKind::Unreadable);
            }
            Err(ExtractError::Vanished(p)) => {
                debug!(path = %p, "file vanished before extraction");
                report.record_failure(p, FailureKind::Vanished);
            }
        }
    }

    for path in catalog_set.difference(&disk_set) {
        report.removed += repository::delete_by_path(conn, path)?;
    }

    info!(
        added = report.added,
        removed = report.removed,
        failed = report.failed.len(),
        "reconcile finished"
    );
    Ok(report)
}

/// The only synchronization signal exposed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanStatus {
    pub is_scanning: bool,
    pub message: String,
}

impl Default for ScanStatus {
    fn default() -> Self {
        Self {
            is_scanning: false,
            message: "idle".to_string(),
        }
    }
}

fn set_status(status: &Arc<Mutex<ScanStatus>>, is_scanning: bool, message: impl Into<String>) {
    let mut guard = status.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.is_scanning = is_scanning;
    guard.message = message.into();
}

enum ScanRequest {
    Reconcile(Vec<String>),
}

/// Single-worker queue for scan requests. One long-lived thread owns its own
/// catalog connection and runs reconciles strictly one at a time, so at most
/// one sync pass is ever active. Requests are fire-and-forget; progress is
/// visible only through the shared `ScanStatus`.
pub struct ScanWorker {
    tx: Option<mpsc::Sender<ScanRequest>>,
    handle: Option<JoinHandle<()>>,
    status: Arc<Mutex<ScanStatus>>,
}

impl ScanWorker {
    pub fn spawn(db_path: PathBuf, status: Arc<Mutex<ScanStatus>>) -> Result<Self, AppError> {
        let (tx, rx) = mpsc::channel::<ScanRequest>();
        let worker_status = status.clone();

        let handle = std::thread::Builder::new()
            .name("photoshelf-scan".to_string())
            .spawn(move || {
                while let Ok(ScanRequest::Reconcile(dirs)) = rx.recv() {
                    set_status(&worker_status, true, "scan in progress");
                    let message = match data::open_catalog(&db_path)
                        .and_then(|conn| reconcile(&conn, &dirs))
                    {
                        Ok(report) => format!("scan finished: {}", report.summary()),
                        Err(e) => {
                            warn!(error = %e, "scan run failed");
                            format!("scan failed: {e}")
                        }
                    };
                    set_status(&worker_status, false, message);
                }
            })?;

        Ok(Self {
            tx: Some(tx),
            handle: Some(handle),
            status,
        })
    }

    /// Enqueues a reconcile over the given watch list. Returns as soon as the
    /// request is queued; the run itself happens on the worker thread.
    pub fn request_scan(&self, directories: Vec<String>) -> Result<(), AppError> {
        match &self.tx {
            Some(tx) => tx
                .send(ScanRequest::Reconcile(directories))
                .map_err(|_| AppError::General("scan worker has stopped".to_string())),
            None => Err(AppError::General("scan worker has stopped".to_string())),
        }
    }

    pub fn status(&self) -> ScanStatus {
        self.status
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Finishes any queued scans, then stops the worker thread.
    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for ScanWorker {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
