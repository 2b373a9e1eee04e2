use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, NaiveDateTime, Utc};
use exif::{In, Tag, Value};

use crate::models::image::ImageMeta;

/// A file that could not be turned into a catalog record. These are report
/// data for the sync engine, not propagated errors.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("unreadable image: {0}")]
    Unreadable(String),

    #[error("file vanished: {0}")]
    Vanished(String),
}

/// All stored timestamps use this naive ISO-8601 shape so that lexicographic
/// order is chronological and year/month prefix queries work.
fn to_iso(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

/// Converts the EXIF `YYYY:MM:DD HH:MM:SS` form to ISO-8601.
pub fn parse_exif_datetime(raw: &str) -> Option<String> {
    NaiveDateTime::parse_from_str(raw.trim(), "%Y:%m:%d %H:%M:%S")
        .ok()
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn exif_date_taken(path: &Path) -> Option<String> {
    let file = File::open(path).ok()?;
    let exif = exif::Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .ok()?;
    let field = exif.get_field(Tag::DateTimeOriginal, In::PRIMARY)?;
    let raw = match &field.value {
        Value::Ascii(parts) if !parts.is_empty() => String::from_utf8_lossy(&parts[0]).into_owned(),
        _ => return None,
    };
    parse_exif_datetime(&raw)
}

/// Extracts a catalog record from a file on disk. Never touches the store.
///
/// Filesystem metadata failures are `Vanished` (the file disappeared between
/// enumeration and extraction); decode failures are `Unreadable`. A missing
/// or malformed capture date is normal operation and silently falls back to
/// the file's modification time.
pub fn extract(path: &Path) -> Result<ImageMeta, ExtractError> {
    let display_path = path.to_string_lossy().to_string();

    let fs_meta = std::fs::metadata(path).map_err(|_| ExtractError::Vanished(display_path.clone()))?;
    let modified = fs_meta
        .modified()
        .map_err(|_| ExtractError::Vanished(display_path.clone()))?;
    let date_modified = to_iso(modified);

    let (width, height) = image::ImageReader::open(path)
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ExtractError::Vanished(display_path.clone()),
            _ => ExtractError::Unreadable(display_path.clone()),
        })?
        .with_guessed_format()
        .map_err(|_| ExtractError::Unreadable(display_path.clone()))?
        .into_dimensions()
        .map_err(|_| ExtractError::Unreadable(display_path.clone()))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| ExtractError::Unreadable(display_path.clone()))?;

    let date_taken = match exif_date_taken(path) {
        Some(taken) => taken,
        None => {
            tracing::debug!(path = %display_path, "no EXIF capture date, using mtime");
            date_modified.clone()
        }
    };

    Ok(ImageMeta {
        filepath: display_path,
        filename,
        date_taken,
        date_modified,
        filesize: fs_meta.len() as i64,
        width: i64::from(width),
        height: i64::from(height),
    })
}
