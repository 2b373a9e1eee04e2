use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageError, Rgb, RgbImage};
use tracing::debug;

use crate::error::AppError;

pub const THUMBNAIL_WIDTH: u32 = 200;
pub const THUMBNAIL_HEIGHT: u32 = 150;

pub fn thumbnail_path(cache_dir: &Path, id: i64) -> PathBuf {
    cache_dir.join(format!("{id}.jpg"))
}

fn is_missing_source(err: &ImageError) -> bool {
    matches!(err, ImageError::IoError(e) if e.kind() == std::io::ErrorKind::NotFound)
}

/// Returns the cached thumbnail for a record, generating it on first request.
/// Cache files are keyed by record id and reused until deleted externally.
/// When the source file has gone missing a gray placeholder is written
/// instead, so the viewer always has something to show.
///
/// Concurrent generation of the same thumbnail is benign: both writers
/// produce the same content and the last write wins.
pub fn ensure_thumbnail(cache_dir: &Path, id: i64, source: &str) -> Result<PathBuf, AppError> {
    let path = thumbnail_path(cache_dir, id);
    if path.exists() {
        return Ok(path);
    }
    fs::create_dir_all(cache_dir)?;

    match image::open(source) {
        Ok(img) => {
            // to_rgb8 drops any alpha channel so JPEG encoding accepts it.
            img.thumbnail(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT)
                .to_rgb8()
                .save(&path)?;
        }
        Err(e) if is_missing_source(&e) => {
            debug!(id, source, "source missing, writing placeholder thumbnail");
            RgbImage::from_pixel(THUMBNAIL_WIDTH, THUMBNAIL_HEIGHT, Rgb([128, 128, 128]))
                .save(&path)?;
        }
        Err(e) => return Err(e.into()),
    }
    Ok(path)
}
