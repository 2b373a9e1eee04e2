use std::path::PathBuf;

use crate::data::repository;
use crate::error::AppError;
use crate::models::image::ImageRecord;
use crate::services::thumbnail_service;
use crate::state::AppState;

fn with_conn<T>(
    state: &AppState,
    f: impl FnOnce(&rusqlite::Connection) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let conn = state.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    f(&conn)
}

pub fn get_image(state: &AppState, id: i64) -> Result<Option<ImageRecord>, AppError> {
    with_conn(state, |conn| repository::get_by_id(conn, id))
}

pub fn list_images(
    state: &AppState,
    sort_by: &str,
    order: &str,
) -> Result<Vec<ImageRecord>, AppError> {
    with_conn(state, |conn| repository::list_all(conn, sort_by, order))
}

pub fn images_by_year(state: &AppState, year: &str) -> Result<Vec<ImageRecord>, AppError> {
    with_conn(state, |conn| repository::list_by_year(conn, year))
}

pub fn images_by_year_month(
    state: &AppState,
    year: &str,
    month: &str,
) -> Result<Vec<ImageRecord>, AppError> {
    with_conn(state, |conn| repository::list_by_year_month(conn, year, month))
}

pub fn search_by_tag(state: &AppState, query: &str) -> Result<Vec<ImageRecord>, AppError> {
    with_conn(state, |conn| repository::search_by_tag(conn, query))
}

pub fn list_years(state: &AppState) -> Result<Vec<String>, AppError> {
    with_conn(state, |conn| repository::available_years(conn))
}

/// Lazily generated, cached thumbnail for a record. `None` when no record
/// with that id exists. The record lookup and the generation do not hold the
/// connection lock at the same time, so slow image work never blocks the
/// store.
pub fn get_thumbnail(state: &AppState, id: i64) -> Result<Option<PathBuf>, AppError> {
    let Some(record) = get_image(state, id)? else {
        return Ok(None);
    };
    let path = thumbnail_service::ensure_thumbnail(&state.thumbnail_dir, id, &record.filepath)?;
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use crate::models::image::ImageMeta;
    use crate::services::config_service::{ConfigStore, LibraryConfig};
    use crate::services::scan_service::{ScanStatus, ScanWorker};
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    fn test_state(data_dir: &Path) -> AppState {
        let db_path = data_dir.join("catalog.db");
        let conn = data::open_catalog(&db_path).unwrap();
        let scan_status = Arc::new(Mutex::new(ScanStatus::default()));
        let scan_worker = ScanWorker::spawn(db_path.clone(), scan_status.clone()).unwrap();
        AppState {
            db: Mutex::new(conn),
            db_path,
            thumbnail_dir: data_dir.join("thumbnails"),
            config_store: ConfigStore::new(data_dir.join("config.json")),
            config: Mutex::new(LibraryConfig::default()),
            scan_status,
            scan_worker,
            enrichment_worker: None,
        }
    }

    fn insert(state: &AppState, path: &str, taken: &str) -> i64 {
        let conn = state.db.lock().unwrap();
        repository::insert_image(
            &conn,
            &ImageMeta {
                filepath: path.to_string(),
                filename: path.rsplit('/').next().unwrap().to_string(),
                date_taken: taken.to_string(),
                date_modified: taken.to_string(),
                filesize: 10,
                width: 1,
                height: 1,
            },
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_query_surface() {
        let data_dir = tempfile::tempdir().unwrap();
        let state = test_state(data_dir.path());
        let id_a = insert(&state, "/lib/a.jpg", "2023-05-01T10:00:00");
        insert(&state, "/lib/b.jpg", "2024-02-01T10:00:00");

        assert_eq!(
            get_image(&state, id_a).unwrap().unwrap().filename,
            "a.jpg"
        );
        assert!(get_image(&state, 999).unwrap().is_none());

        let listing = list_images(&state, "date_taken", "desc").unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].filename, "b.jpg");

        assert_eq!(images_by_year(&state, "2023").unwrap().len(), 1);
        assert_eq!(images_by_year_month(&state, "2024", "02").unwrap().len(), 1);
        assert_eq!(list_years(&state).unwrap(), vec!["2024", "2023"]);

        {
            let conn = state.db.lock().unwrap();
            repository::update_tags(&conn, id_a, &["cat".to_string()]).unwrap();
        }
        assert_eq!(search_by_tag(&state, "cat").unwrap().len(), 1);
    }

    #[test]
    fn test_get_thumbnail_for_missing_record() {
        let data_dir = tempfile::tempdir().unwrap();
        let state = test_state(data_dir.path());
        assert!(get_thumbnail(&state, 5).unwrap().is_none());
    }

    #[test]
    fn test_get_thumbnail_with_absent_source_uses_placeholder() {
        let data_dir = tempfile::tempdir().unwrap();
        let state = test_state(data_dir.path());
        let id = insert(&state, "/gone/away.jpg", "2024-01-01T00:00:00");

        let thumb = get_thumbnail(&state, id).unwrap().unwrap();
        assert!(thumb.exists());
        assert_eq!(thumb, state.thumbnail_dir.join(format!("{id}.jpg")));
    }
}
