use std::collections::HashSet;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;
use crate::models::image::{ImageMeta, ImageRecord};

fn map_record(row: &Row) -> rusqlite::Result<ImageRecord> {
    Ok(ImageRecord {
        id: row.get(0)?,
        filepath: row.get(1)?,
        filename: row.get(2)?,
        date_taken: row.get(3)?,
        date_modified: row.get(4)?,
        filesize: row.get(5)?,
        width: row.get(6)?,
        height: row.get(7)?,
        llm_tags: row.get(8)?,
    })
}

const RECORD_COLUMNS: &str =
    "id, filepath, filename, date_taken, date_modified, filesize, width, height, llm_tags";

/// Inserts a new image record. Re-inserting an existing filepath is a no-op
/// and never touches the stored row (including its tags). Returns whether a
/// row was actually inserted.
pub fn insert_image(conn: &Connection, meta: &ImageMeta) -> Result<bool, AppError> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO images (filepath, filename, date_taken, date_modified, filesize, width, height)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            meta.filepath,
            meta.filename,
            meta.date_taken,
            meta.date_modified,
            meta.filesize,
            meta.width,
            meta.height,
        ],
    )?;
    Ok(changed > 0)
}

pub fn delete_by_path(conn: &Connection, path: &str) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM images WHERE filepath = ?1", params![path])?;
    Ok(count)
}

/// Removes every record whose filepath starts with `folder` as a literal
/// string prefix. LIKE wildcards inside the prefix are escaped so a folder
/// named `100%_originals` cannot match unrelated rows.
pub fn delete_by_prefix(conn: &Connection, folder: &str) -> Result<usize, AppError> {
    let escaped = folder
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let count = conn.execute(
        "DELETE FROM images WHERE filepath LIKE ?1 ESCAPE '\\'",
        params![format!("{escaped}%")],
    )?;
    Ok(count)
}

/// Point-in-time snapshot of every catalogued filepath, used for diffing
/// against the on-disk file set.
pub fn all_paths(conn: &Connection) -> Result<HashSet<String>, AppError> {
    let mut stmt = conn.prepare("SELECT filepath FROM images")?;
    let paths = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(paths)
}

/// Sets `llm_tags` for a record, comma-joined. Silently a no-op when the id
/// no longer exists (record deleted mid-enrichment).
pub fn update_tags(conn: &Connection, id: i64, tags: &[String]) -> Result<(), AppError> {
    let joined = tags.join(",");
    conn.execute(
        "UPDATE images SET llm_tags = ?1 WHERE id = ?2",
        params![joined, id],
    )?;
    Ok(())
}

pub fn untagged_images(conn: &Connection) -> Result<Vec<ImageRecord>, AppError> {
    let mut stmt =
        conn.prepare(&format!("SELECT {RECORD_COLUMNS} FROM images WHERE llm_tags IS NULL"))?;
    let records = stmt
        .query_map([], map_record)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(records)
}

pub fn get_by_id(conn: &Connection, id: i64) -> Result<Option<ImageRecord>, AppError> {
    let record = conn
        .query_row(
            &format!("SELECT {RECORD_COLUMNS} FROM images WHERE id = ?1"),
            params![id],
            map_record,
        )
        .optional()?;
    Ok(record)
}

/// Full listing with sorting. Column and direction are whitelisted; anything
/// else falls back to newest-first by capture date.
pub fn list_all(conn: &Connection, sort_by: &str, order: &str) -> Result<Vec<ImageRecord>, AppError> {
    let sort_by = match sort_by {
        "date_taken" | "filename" => sort_by,
        _ => "date_taken",
    };
    let order = match order {
        "asc" | "desc" => order,
        _ => "desc",
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM images ORDER BY {sort_by} {order}"
    ))?;
    let records = stmt
        .query_map([], map_record)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(records)
}

/// Chronological listing for one year. Relies on stored timestamps being
/// ISO-8601, so a `YYYY` prefix match is a year match.
pub fn list_by_year(conn: &Connection, year: &str) -> Result<Vec<ImageRecord>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM images WHERE date_taken LIKE ?1 ORDER BY date_taken ASC"
    ))?;
    let records = stmt
        .query_map(params![format!("{year}%")], map_record)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(records)
}

/// Chronological listing for one calendar month. `month` must be
/// zero-padded to two digits ("06", not "6") to line up with the stored
/// ISO-8601 prefix; a bare digit matches nothing.
pub fn list_by_year_month(
    conn: &Connection,
    year: &str,
    month: &str,
) -> Result<Vec<ImageRecord>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM images WHERE date_taken LIKE ?1 ORDER BY date_taken ASC"
    ))?;
    let records = stmt
        .query_map(params![format!("{year}-{month}%")], map_record)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(records)
}

/// Substring search over the comma-joined tag column. SQLite LIKE is
/// case-insensitive for ASCII, so "Cat" finds "cat".
pub fn search_by_tag(conn: &Connection, query: &str) -> Result<Vec<ImageRecord>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {RECORD_COLUMNS} FROM images WHERE llm_tags LIKE ?1 ORDER BY date_taken DESC"
    ))?;
    let records = stmt
        .query_map(params![format!("%{query}%")], map_record)?
        .filter_map(|r| r.ok())
        .collect();
    Ok(records)
}

pub fn available_years(conn: &Connection) -> Result<Vec<String>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT SUBSTR(date_taken, 1, 4) AS year FROM images ORDER BY year DESC",
    )?;
    let years = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .filter_map(|r| r.ok())
        .collect();
    Ok(years)
}
