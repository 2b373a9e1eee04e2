use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::AppError;

pub mod migrations;
pub mod repository;

/// Opens a connection to the catalog database with the settings every caller
/// needs: a busy timeout (workers and commands share one WAL database) and an
/// up-to-date schema.
pub fn open_catalog(db_path: &Path) -> Result<Connection, AppError> {
    let conn = Connection::open(db_path)?;
    conn.busy_timeout(Duration::from_secs(5))?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}
