//! The correlation store's SQLite pool.
//!
//! Every pooled connection is put in WAL mode with `synchronous = NORMAL`, so
//! the poller's point reads never wait behind an ingress write, and carries
//! the configured busy timeout for the rare write-write overlap.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use std::time::Duration;
use thiserror::Error;

pub type DbPool = Pool<SqliteConnectionManager>;

/// Runtime tunables for the store's connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a connection waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    /// Upper bound on open connections.
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

impl DbRuntimeSettings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("database pool size must be at least 1")]
    EmptyPool,

    #[error("failed to open result store: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Applies the per-connection settings. Fails if SQLite refuses WAL mode,
/// which happens for paths it cannot journal (e.g. `:memory:`).
fn configure(conn: &mut Connection, settings: DbRuntimeSettings) -> rusqlite::Result<()> {
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    if !mode.eq_ignore_ascii_case("wal") {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
            Some(format!("journal_mode is {mode}, expected wal")),
        ));
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(settings.busy_timeout())
}

/// Opens the result store at `db_path`, creating the file if needed.
///
/// The first connection is opened eagerly, so a bad path or a database that
/// cannot switch to WAL fails here rather than on the first request.
///
/// # Errors
///
/// Returns `PoolError::EmptyPool` for a zero pool size and
/// `PoolError::PoolInit` if no connection can be established.
pub fn create_pool(db_path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    if settings.pool_max_size == 0 {
        return Err(PoolError::EmptyPool);
    }

    let manager =
        SqliteConnectionManager::file(db_path).with_init(move |conn| configure(conn, settings));
    let pool = Pool::builder()
        .max_size(settings.pool_max_size)
        .connection_timeout(settings.busy_timeout().max(Duration::from_secs(1)))
        .build(manager)?;

    tracing::debug!(
        path = db_path,
        max_size = settings.pool_max_size,
        "opened result store"
    );
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_pool(settings: DbRuntimeSettings) -> (tempfile::TempDir, DbPool) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.db");
        let pool = create_pool(path.to_str().unwrap(), settings).unwrap();
        (dir, pool)
    }

    #[test]
    fn connections_use_wal_and_configured_timeout() {
        let (_dir, pool) = temp_pool(DbRuntimeSettings {
            busy_timeout_ms: 2_500,
            pool_max_size: 3,
        });
        let conn = pool.get().unwrap();

        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();
        assert_eq!(mode, "wal");

        let synchronous: i64 = conn
            .query_row("PRAGMA synchronous", [], |row| row.get(0))
            .unwrap();
        assert_eq!(synchronous, 1, "NORMAL");

        let busy: i64 = conn
            .query_row("PRAGMA busy_timeout", [], |row| row.get(0))
            .unwrap();
        assert_eq!(busy, 2_500);
        assert_eq!(pool.max_size(), 3);
    }

    #[test]
    fn zero_sized_pool_is_rejected() {
        let settings = DbRuntimeSettings {
            pool_max_size: 0,
            ..DbRuntimeSettings::default()
        };
        assert!(matches!(
            create_pool("unused.db", settings),
            Err(PoolError::EmptyPool)
        ));
    }

    #[test]
    fn unwritable_path_fails_at_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("results.db");
        let settings = DbRuntimeSettings {
            busy_timeout_ms: 0,
            pool_max_size: 1,
        };
        assert!(matches!(
            create_pool(path.to_str().unwrap(), settings),
            Err(PoolError::PoolInit(_))
        ));
    }
}
