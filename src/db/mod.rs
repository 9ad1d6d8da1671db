//! Database layer for the todo API.

pub mod schema;
pub mod store;
pub mod tasks;

pub use store::TaskStore;

use crate::error::{StoreError, StoreResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

/// Number of SQLite VM instructions between cancellation checks.
const PROGRESS_OPS: i32 = 1_000;

/// Database handle wrapping a SQLite connection.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        let conn = Connection::open(path)?;

        // WAL lets readers proceed while a completion transaction holds the write lock
        conn.execute_batch(
            "PRAGMA busy_timeout=5000;
             PRAGMA journal_mode=WAL;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.run_migrations()?;

        Ok(db)
    }

    /// Run database migrations.
    fn run_migrations(&self) -> StoreResult<()> {
        let mut conn = self.lock()?;
        embedded::migrations::runner().run(&mut *conn)?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Execute a function with exclusive access to the connection.
    pub fn with_conn<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Connection) -> StoreResult<T>,
    {
        let conn = self.lock()?;
        f(&conn)
    }

    /// Execute a function with mutable access to the connection (for transactions).
    pub fn with_conn_mut<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.lock()?;
        f(&mut conn)
    }

    /// Execute a function that aborts as soon as `cancel` is raised.
    ///
    /// A progress handler polls the flag while statements run, so a long query
    /// stops with `SQLITE_INTERRUPT` and any open transaction rolls back. The
    /// handler is removed before the lock is released; it never sees another
    /// caller's statements.
    pub fn with_interrupt<F, T>(&self, cancel: &CancelFlag, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut Connection) -> StoreResult<T>,
    {
        let mut conn = self.lock()?;
        if cancel.is_canceled() {
            return Err(StoreError::Canceled);
        }

        let flag = cancel.clone();
        conn.progress_handler(PROGRESS_OPS, Some(move || flag.is_canceled()));
        let result = f(&mut conn);
        conn.progress_handler(0, None::<fn() -> bool>);

        match result {
            Err(_) if cancel.is_canceled() => Err(StoreError::Canceled),
            other => other,
        }
    }

    /// Close the connection if this is the last handle to it.
    ///
    /// Returns `false` when other clones are still alive; the connection then
    /// closes when the last of them is dropped.
    pub fn close(self) -> StoreResult<bool> {
        match Arc::try_unwrap(self.conn) {
            Ok(mutex) => {
                let conn = mutex.into_inner().map_err(|_| StoreError::Poisoned)?;
                conn.close().map_err(|(_, e)| StoreError::Sqlite(e))?;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }
}

/// Shared flag used to abandon an in-flight store operation.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Current time truncated to the persisted precision.
pub fn now() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Format a timestamp for persistence: RFC 3339, UTC, milliseconds, `Z`.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse a persisted timestamp. Accepts any RFC 3339 offset, including the
/// second-precision form written by the schema default.
pub fn parse_timestamp(column: &'static str, value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| StoreError::Timestamp {
            column,
            value: value.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_are_sortable_text() {
        let early: DateTime<Utc> = "2024-05-01T09:00:00Z".parse().unwrap();
        let late: DateTime<Utc> = "2024-05-01T10:00:00.250Z".parse().unwrap();
        let (a, b) = (format_timestamp(early), format_timestamp(late));
        assert_eq!(a, "2024-05-01T09:00:00.000Z");
        assert!(a < b);
    }

    #[test]
    fn parse_accepts_schema_default_format() {
        let ts = parse_timestamp("time_of_create", "2024-05-01T12:00:00Z").unwrap();
        assert_eq!(format_timestamp(ts), "2024-05-01T12:00:00.000Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_timestamp("time_of_complete", "not a time").unwrap_err();
        assert!(matches!(
            err,
            StoreError::Timestamp {
                column: "time_of_complete",
                ..
            }
        ));
    }

    #[test]
    fn now_survives_round_trip() {
        let ts = now();
        assert_eq!(parse_timestamp("now", &format_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn canceled_flag_short_circuits() {
        let db = Database::open_in_memory().unwrap();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let result = db.with_interrupt(&cancel, |_| Ok(()));
        assert!(matches!(result, Err(StoreError::Canceled)));
    }

    #[test]
    fn close_reports_shared_handles() {
        let db = Database::open_in_memory().unwrap();
        let other = db.clone();
        assert!(!db.close().unwrap());
        assert!(other.close().unwrap());
    }
}
