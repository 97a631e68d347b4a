//! SQLite vote store utilities.
//!
//! Runtime defaults:
//! - `journal_mode = WAL` so results reads never block vote writers
//! - `busy_timeout = 5s` so concurrent writers queue instead of failing
//! - `foreign_keys = ON` so no vote can reference an item outside the catalog

pub mod migrations;
pub mod rebuild;
pub mod schema;

use rusqlite::Connection;
use std::{path::Path, time::Duration};

use crate::error::{BallotError, BallotResult};

/// Busy timeout used for vote store connections.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Open (or create) the vote store, apply runtime pragmas, and migrate the
/// schema to the latest version.
///
/// # Errors
///
/// Returns [`BallotError::SchemaTooNew`] if the file was written by a newer
/// binary, or [`BallotError::StorageUnavailable`] if opening, configuring, or
/// migrating fails.
pub fn open_store(path: &Path, busy_timeout: Duration) -> BallotResult<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|err| {
            tracing::error!(path = %parent.display(), error = %err, "create store directory");
            BallotError::StorageUnavailable(rusqlite::Error::InvalidPath(parent.to_path_buf()))
        })?;
    }

    let mut conn = Connection::open(path)?;
    configure_connection(&conn, busy_timeout)?;

    let found = migrations::current_schema_version(&conn)?;
    if found > migrations::LATEST_SCHEMA_VERSION {
        return Err(BallotError::SchemaTooNew {
            found,
            supported: migrations::LATEST_SCHEMA_VERSION,
        });
    }
    migrations::migrate(&mut conn)?;

    Ok(conn)
}

fn configure_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.busy_timeout(busy_timeout)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    let _journal_mode: String =
        conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    Ok(())
}
