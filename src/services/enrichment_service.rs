use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::data::{self, repository};
use crate::error::AppError;

/// How long the worker sleeps after a cycle that found nothing to tag.
pub const DEFAULT_IDLE_INTERVAL: Duration = Duration::from_secs(60);

/// External tagging capability: filepath in, ordered tags out. The production
/// implementation is expected to call a remote inference service; the core
/// depends only on this signature and its fallibility.
pub trait Tagger: Send + Sync {
    fn tag(&self, filepath: &str) -> Result<Vec<String>, AppError>;
}

/// Placeholder tagger with no real inference: returns canned tags keyed off
/// the filename, optionally simulating remote-call latency.
#[derive(Debug, Default)]
pub struct MockTagger {
    pub delay: Duration,
}

impl Tagger for MockTagger {
    fn tag(&self, filepath: &str) -> Result<Vec<String>, AppError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let tags: &[&str] = if filepath.contains('1') {
            &["cat", "indoor", "table"]
        } else if filepath.contains('2') {
            &["dog", "outdoor", "grass"]
        } else {
            &["car", "road", "city"]
        };
        Ok(tags.iter().map(|s| s.to_string()).collect())
    }
}

/// One polling cycle: tags every record still pending enrichment. A failure
/// on one record is logged and skipped; the record stays untagged and is
/// re-selected next cycle, with no retry cap. Returns the number tagged.
pub fn run_enrichment_cycle(conn: &Connection, tagger: &dyn Tagger) -> Result<usize, AppError> {
    let pending = repository::untagged_images(conn)?;
    if pending.is_empty() {
        return Ok(0);
    }

    info!(pending = pending.len(), "enrichment batch started");
    let mut tagged = 0;
    for record in pending {
        match tagger.tag(&record.filepath) {
            Ok(tags) => {
                repository::update_tags(conn, record.id, &tags)?;
                debug!(id = record.id, ?tags, "tagged image");
                tagged += 1;
            }
            Err(e) => {
                warn!(id = record.id, path = %record.filepath, error = %e,
                    "tagging failed, will retry next cycle");
            }
        }
    }
    info!(tagged, "enrichment batch finished");
    Ok(tagged)
}

fn sleep_interruptible(stop: &AtomicBool, interval: Duration) {
    let start = std::time::Instant::now();
    while start.elapsed() < interval && !stop.load(Ordering::Relaxed) {
        std::thread::sleep(Duration::from_millis(100).min(interval));
    }
}

/// Long-lived background worker polling the catalog for untagged records.
/// Owns its own connection; a store failure is retried on the next cycle
/// rather than killing the worker.
pub struct EnrichmentWorker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl EnrichmentWorker {
    pub fn spawn(
        db_path: PathBuf,
        tagger: Arc<dyn Tagger>,
        idle_interval: Duration,
    ) -> Result<Self, AppError> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();

        let handle = std::thread::Builder::new()
            .name("photoshelf-enrich".to_string())
            .spawn(move || {
                while !stop_flag.load(Ordering::Relaxed) {
                    let idle = match data::open_catalog(&db_path)
                        .and_then(|conn| run_enrichment_cycle(&conn, tagger.as_ref()))
                    {
                        Ok(0) => true,
                        Ok(_) => false,
                        Err(e) => {
                            warn!(error = %e, "enrichment cycle failed, retrying next cycle");
                            true
                        }
                    };
                    if idle {
                        sleep_interruptible(&stop_flag, idle_interval);
                    }
                }
            })?;

        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    pub fn shutdown(self) {
        drop(self);
    }
}

impl Drop for EnrichmentWorker {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::run_migrations;
    use crate::models::image::ImageMeta;
    use std::time::Instant;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn insert(conn: &Connection, path: &str) {
        repository::insert_image(
            conn,
            &ImageMeta {
                filepath: path.to_string(),
                filename: path.rsplit('/').next().unwrap().to_string(),
                date_taken: "2024-06-01T09:00:00".to_string(),
                date_modified: "2024-06-01T09:00:00".to_string(),
                filesize: 100,
                width: 10,
                height: 10,
            },
        )
        .unwrap();
    }

    struct FixedTagger;

    impl Tagger for FixedTagger {
        fn tag(&self, _filepath: &str) -> Result<Vec<String>, AppError> {
            Ok(vec!["test".to_string()])
        }
    }

    struct FailingOn(&'static str);

    impl Tagger for FailingOn {
        fn tag(&self, filepath: &str) -> Result<Vec<String>, AppError> {
            if filepath.contains(self.0) {
                Err(AppError::Tagging("inference timed out".to_string()))
            } else {
                Ok(vec!["ok".to_string()])
            }
        }
    }

    #[test]
    fn test_cycle_tags_all_pending_once() {
        let conn = setup_db();
        insert(&conn, "/lib/a.jpg");
        insert(&conn, "/lib/b.png");

        assert_eq!(run_enrichment_cycle(&conn, &FixedTagger).unwrap(), 2);
        assert!(repository::untagged_images(&conn).unwrap().is_empty());

        // Tag monotonicity: nothing is re-selected.
        assert_eq!(run_enrichment_cycle(&conn, &FixedTagger).unwrap(), 0);
    }

    #[test]
    fn test_one_failure_does_not_stop_the_batch() {
        let conn = setup_db();
        insert(&conn, "/lib/bad.jpg");
        insert(&conn, "/lib/fine.png");

        let tagger = FailingOn("bad");
        assert_eq!(run_enrichment_cycle(&conn, &tagger).unwrap(), 1);

        let pending = repository::untagged_images(&conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert!(pending[0].filepath.contains("bad"));

        // The failed record is retried on the next cycle, indefinitely.
        assert_eq!(run_enrichment_cycle(&conn, &tagger).unwrap(), 0);
        assert_eq!(repository::untagged_images(&conn).unwrap().len(), 1);
    }

    #[test]
    fn test_mock_tagger_filename_buckets() {
        let tagger = MockTagger::default();
        assert_eq!(
            tagger.tag("/lib/img1.jpg").unwrap(),
            vec!["cat", "indoor", "table"]
        );
        assert_eq!(
            tagger.tag("/lib/img2.jpg").unwrap(),
            vec!["dog", "outdoor", "grass"]
        );
        assert_eq!(
            tagger.tag("/lib/sunset.jpg").unwrap(),
            vec!["car", "road", "city"]
        );
    }

    #[test]
    fn test_worker_tags_in_background_and_shuts_down() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("catalog.db");
        {
            let conn = data::open_catalog(&db_path).unwrap();
            insert(&conn, "/lib/a.jpg");
        }

        let worker = EnrichmentWorker::spawn(
            db_path.clone(),
            Arc::new(FixedTagger),
            Duration::from_millis(50),
        )
        .unwrap();

        let start = Instant::now();
        let mut done = false;
        while start.elapsed() < Duration::from_secs(10) {
            let conn = data::open_catalog(&db_path).unwrap();
            if repository::untagged_images(&conn).unwrap().is_empty() {
                done = true;
                break;
            }
            std::thread::sleep(Duration::from_millis(50));
        }
        assert!(done, "worker should tag pending records");

        worker.shutdown();
    }
}
