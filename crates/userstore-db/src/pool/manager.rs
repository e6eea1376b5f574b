//! Connection factory shared by the warm and overflow tiers.
//!
//! [`RecyclingManager`] wraps `r2d2_sqlite`'s manager and stamps every
//! connection with its creation time. r2d2 checks connections on checkout
//! and on return; an expired connection fails both checks, so it is closed
//! and replaced instead of being handed out again.

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use r2d2::event::{AcquireEvent, CheckinEvent, CheckoutEvent, ReleaseEvent, TimeoutEvent};
use r2d2::{HandleError, HandleEvent, ManageConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;

use crate::config::DatabaseLocation;

/// Errors raised while opening or checking a connection.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("connection exceeded recycle age of {0:?}")]
    Expired(Duration),
}

/// Concrete place the engine opens, with unnamed in-memory databases already
/// given a unique name.
///
/// In-memory databases go through the `memdb` VFS rather than shared cache:
/// memdb uses ordinary file locking, so concurrent writers wait on the busy
/// timeout instead of failing with `SQLITE_LOCKED`.
#[derive(Debug, Clone)]
pub(crate) enum Target {
    File(PathBuf),
    Memory(String),
}

impl Target {
    pub(crate) fn resolve(location: &DatabaseLocation) -> Self {
        static ANONYMOUS: AtomicU64 = AtomicU64::new(0);

        match location {
            DatabaseLocation::File(path) => Self::File(path.clone()),
            DatabaseLocation::Memory(Some(name)) => {
                Self::Memory(format!("file:/userstore_{name}?vfs=memdb"))
            }
            DatabaseLocation::Memory(None) => {
                let n = ANONYMOUS.fetch_add(1, Ordering::Relaxed);
                Self::Memory(format!(
                    "file:/userstore_anon_{}_{n}?vfs=memdb",
                    std::process::id()
                ))
            }
        }
    }
}

/// A SQLite connection together with the instant it was opened.
#[derive(Debug)]
pub struct AgedConnection {
    conn: Connection,
    born: Instant,
}

impl AgedConnection {
    /// Time since the connection was opened.
    pub fn age(&self) -> Duration {
        self.born.elapsed()
    }

    fn is_expired(&self, recycle_age: Duration) -> bool {
        self.age() >= recycle_age
    }
}

impl Deref for AgedConnection {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

/// r2d2 manager that opens SQLite connections and retires them once they
/// reach the recycle age.
pub struct RecyclingManager {
    inner: SqliteConnectionManager,
    recycle_age: Duration,
}

impl RecyclingManager {
    pub(crate) fn new(target: &Target, busy_timeout: Duration, recycle_age: Duration) -> Self {
        let (manager, wal) = match target {
            Target::File(path) => (SqliteConnectionManager::file(path), true),
            Target::Memory(uri) => (SqliteConnectionManager::file(uri), false),
        };

        let inner = manager.with_init(move |conn| {
            conn.busy_timeout(busy_timeout)?;
            conn.execute_batch("PRAGMA foreign_keys = ON;")?;
            if wal {
                conn.execute_batch("PRAGMA journal_mode = WAL;")?;
            }
            Ok(())
        });

        Self { inner, recycle_age }
    }
}

impl std::fmt::Debug for RecyclingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecyclingManager")
            .field("recycle_age", &self.recycle_age)
            .finish_non_exhaustive()
    }
}

impl ManageConnection for RecyclingManager {
    type Connection = AgedConnection;
    type Error = ConnectError;

    fn connect(&self) -> Result<AgedConnection, ConnectError> {
        let conn = self.inner.connect()?;
        Ok(AgedConnection {
            conn,
            born: Instant::now(),
        })
    }

    fn is_valid(&self, conn: &mut AgedConnection) -> Result<(), ConnectError> {
        if conn.is_expired(self.recycle_age) {
            tracing::debug!(age = ?conn.age(), "Recycling expired connection");
            return Err(ConnectError::Expired(self.recycle_age));
        }
        self.inner.is_valid(&mut conn.conn)?;
        Ok(())
    }

    fn has_broken(&self, conn: &mut AgedConnection) -> bool {
        conn.is_expired(self.recycle_age) || self.inner.has_broken(&mut conn.conn)
    }
}

/// Routes r2d2's connection errors into tracing instead of the `log` crate.
#[derive(Debug)]
pub(crate) struct TracingErrorHandler;

impl HandleError<ConnectError> for TracingErrorHandler {
    fn handle_error(&self, error: ConnectError) {
        match error {
            ConnectError::Expired(_) => tracing::trace!(error = %error, "Pooled connection retired"),
            ConnectError::Sqlite(_) => tracing::warn!(error = %error, "Pooled connection failed"),
        }
    }
}

/// Traces the warm tier's connection lifecycle.
#[derive(Debug)]
pub(crate) struct TracingEventHandler;

impl HandleEvent for TracingEventHandler {
    fn handle_acquire(&self, event: AcquireEvent) {
        tracing::debug!(connection = event.connection_id(), "Opened warm connection");
    }

    fn handle_release(&self, event: ReleaseEvent) {
        tracing::debug!(
            connection = event.connection_id(),
            age = ?event.age(),
            "Closed warm connection"
        );
    }

    fn handle_checkout(&self, event: CheckoutEvent) {
        tracing::trace!(
            connection = event.connection_id(),
            waited = ?event.duration(),
            "Checked out warm connection"
        );
    }

    fn handle_timeout(&self, event: TimeoutEvent) {
        tracing::trace!(timeout = ?event.timeout(), "Timed out waiting for warm connection");
    }

    fn handle_checkin(&self, event: CheckinEvent) {
        tracing::trace!(
            connection = event.connection_id(),
            held = ?event.duration(),
            "Returned warm connection"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_manager(recycle_age: Duration) -> RecyclingManager {
        let target = Target::resolve(&DatabaseLocation::Memory(None));
        RecyclingManager::new(&target, Duration::from_secs(1), recycle_age)
    }

    #[test]
    fn test_connections_are_initialised() {
        let manager = memory_manager(Duration::from_secs(60));
        let conn = manager.connect().unwrap();

        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_expired_connection_is_rejected() {
        let manager = memory_manager(Duration::from_millis(20));
        let mut conn = manager.connect().unwrap();
        assert!(manager.is_valid(&mut conn).is_ok());
        assert!(!manager.has_broken(&mut conn));

        std::thread::sleep(Duration::from_millis(40));

        assert!(matches!(
            manager.is_valid(&mut conn),
            Err(ConnectError::Expired(_))
        ));
        assert!(manager.has_broken(&mut conn));
    }

    #[test]
    fn test_unnamed_memory_targets_are_distinct() {
        let a = Target::resolve(&DatabaseLocation::Memory(None));
        let b = Target::resolve(&DatabaseLocation::Memory(None));
        match (a, b) {
            (Target::Memory(a), Target::Memory(b)) => assert_ne!(a, b),
            other => panic!("unexpected targets: {other:?}"),
        }
    }

    #[test]
    fn test_memory_connections_share_one_database() {
        let manager = memory_manager(Duration::from_secs(60));
        let first = manager.connect().unwrap();
        let second = manager.connect().unwrap();

        first
            .execute_batch("CREATE TABLE t (v INTEGER); INSERT INTO t VALUES (1);")
            .unwrap();
        let v: i64 = second
            .query_row("SELECT v FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(v, 1);
    }

    #[test]
    fn test_memory_writer_waits_for_lock_holder() {
        let manager = std::sync::Arc::new(memory_manager(Duration::from_secs(60)));
        let holder = manager.connect().unwrap();
        holder
            .execute_batch("CREATE TABLE t (v INTEGER); BEGIN IMMEDIATE; INSERT INTO t VALUES (1);")
            .unwrap();

        let waiter = {
            let manager = std::sync::Arc::clone(&manager);
            std::thread::spawn(move || {
                let conn = manager.connect().unwrap();
                conn.execute("INSERT INTO t VALUES (2)", [])
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        holder.execute_batch("COMMIT;").unwrap();

        assert!(waiter.join().unwrap().is_ok());
        let count: i64 = holder
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }
}
