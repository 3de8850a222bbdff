pub mod bans_service;
pub mod metrics_service;
pub mod models;
pub mod tasks;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use thiserror::Error;
use tracing::{error, info};

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("Duplicate row for key: {0}")]
    Duplicate(String),
}

pub type DbPool = r2d2::Pool<SqliteConnectionManager>;

/// Second-granularity wall-clock format used as the natural ordering key in
/// both tables. Lexicographic order equals chronological order.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Per-connection pragmas. WAL keeps readers unblocked while the scheduler
/// holds a write transaction; the busy timeout bounds the wait on the rare
/// collision.
pub const CONNECTION_PRAGMAS: &str = "PRAGMA journal_mode=WAL; \
     PRAGMA synchronous=NORMAL; \
     PRAGMA temp_store=MEMORY; \
     PRAGMA busy_timeout=5000;";

/// Applied to every pooled connection before first use.
pub fn apply_connection_pragmas(conn: &mut Connection) -> rusqlite::Result<()> {
    conn.execute_batch(CONNECTION_PRAGMAS)
}

/// Creates tables and indices if absent. Safe to call on every start.
pub fn init_db(conn: &Connection) -> Result<(), Error> {
    info!("Running SQLite migrations...");
    let migrations = include_str!("../../migrations/20251102000000_create_initial_tables.sql");
    conn.execute_batch(migrations).map_err(|e| {
        error!("Failed to execute SQLite migrations: {}", e);
        e
    })?;
    info!("SQLite migrations completed: tables and indices ready.");
    Ok(())
}

pub(crate) fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}


#[cfg(test)]
mod tests {
    use super::test_support::test_pool;
    use super::*;

    #[test]
    fn init_db_is_idempotent() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        init_db(&conn).unwrap();
        init_db(&conn).unwrap();
    }

    #[test]
    fn wal_mode_is_active() {
        let (_dir, pool) = test_pool();
        let conn = pool.get().unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");
    }
}
