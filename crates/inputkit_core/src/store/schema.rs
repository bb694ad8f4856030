//! Schema bootstrap for [`SqliteObjectStore`](super::SqliteObjectStore).
//!
//! # Invariants
//! - The schema version lives in `PRAGMA user_version`.
//! - Pending migrations apply oldest first inside one transaction.
//! - A database written by a newer build is refused, never downgraded.

use super::{StoreError, StoreResult};
use log::{error, info};
use rusqlite::Connection;
use std::path::Path;
use std::time::{Duration, Instant};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// `(version, sql)` steps in ascending version order.
const MIGRATIONS: &[(u32, &str)] = &[(1, include_str!("migrations/0001_stored_objects.sql"))];

/// Schema version this build writes and expects.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |(version, _)| *version)
}

/// Reads the schema version recorded on `conn`.
pub fn schema_version(conn: &Connection) -> StoreResult<u32> {
    let version = conn.query_row("PRAGMA user_version;", [], |row| row.get::<_, u32>(0))?;
    Ok(version)
}

/// Opens or creates an object database file with the schema migrated.
///
/// # Side effects
/// - Emits one `object_db_open` event with status and duration.
pub fn open_object_db(path: impl AsRef<Path>) -> StoreResult<Connection> {
    let path = path.as_ref();
    open_with(&path.display().to_string(), || Connection::open(path))
}

/// Opens a private in-memory object database with the schema migrated.
pub fn open_object_db_in_memory() -> StoreResult<Connection> {
    open_with(":memory:", Connection::open_in_memory)
}

fn open_with(
    location: &str,
    connect: impl FnOnce() -> rusqlite::Result<Connection>,
) -> StoreResult<Connection> {
    let started_at = Instant::now();
    let opened = connect().map_err(StoreError::from).and_then(|mut conn| {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        migrate(&mut conn)?;
        Ok(conn)
    });

    match &opened {
        Ok(_) => info!(
            "event=object_db_open module=store status=ok location={} duration_ms={}",
            location,
            started_at.elapsed().as_millis()
        ),
        Err(err) => error!(
            "event=object_db_open module=store status=error location={} duration_ms={} error={}",
            location,
            started_at.elapsed().as_millis(),
            err
        ),
    }
    opened
}

/// Brings `conn` up to [`latest_version`].
///
/// # Errors
/// - [`StoreError::SchemaTooNew`] when the file was written by a newer build.
/// - [`StoreError::Sqlite`] when a migration step fails; nothing is applied.
pub fn migrate(conn: &mut Connection) -> StoreResult<()> {
    let from = schema_version(conn)?;
    let latest = latest_version();
    if from > latest {
        return Err(StoreError::SchemaTooNew {
            db_version: from,
            latest_supported: latest,
        });
    }
    if from == latest {
        return Ok(());
    }

    let tx = conn.transaction()?;
    for (version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > from) {
        tx.execute_batch(sql)?;
        tx.pragma_update(None, "user_version", *version)?;
    }
    tx.commit()?;

    info!("event=object_db_migrate module=store status=ok from_version={from} to_version={latest}");
    Ok(())
}
