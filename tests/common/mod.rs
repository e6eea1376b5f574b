//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which opens a pool and store over either a
//! private in-memory database or a database file in a temporary directory,
//! and [`capture_logs`] for asserting on emitted `tracing` events.

#![allow(dead_code)]

use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

use userstore_db::config::{DatabaseLocation, PoolConfiguration};
use userstore_db::pool::ConnectionPool;
use userstore_db::schema::ensure_schema;
use userstore_db::store::RecordStore;

/// A store with the `users` table already in place.
pub struct TestHarness {
    pub store: RecordStore,
    pub pool: Arc<ConnectionPool>,
    dir: Option<TempDir>,
}

impl TestHarness {
    /// Default-sized pool over a private in-memory database.
    pub fn new() -> Self {
        Self::with_config(PoolConfiguration::new(DatabaseLocation::Memory(None)), None)
    }

    /// Pool over a fresh database file in a temporary directory.
    pub fn on_disk(tune: impl FnOnce(PoolConfiguration) -> PoolConfiguration) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let config = tune(PoolConfiguration::new(DatabaseLocation::file(
            dir.path().join("users.db"),
        )));
        Self::with_config(config, Some(dir))
    }

    /// In-memory pool with one warm connection, no overflow and a short timeout.
    pub fn single_connection(timeout: Duration) -> Self {
        Self::with_config(
            PoolConfiguration::new(DatabaseLocation::Memory(None))
                .with_max_pool_size(1)
                .with_max_overflow(0)
                .with_acquisition_timeout(timeout),
            None,
        )
    }

    fn with_config(config: PoolConfiguration, dir: Option<TempDir>) -> Self {
        let pool = Arc::new(ConnectionPool::open(config).expect("failed to open pool"));
        {
            let handle = pool.acquire().expect("failed to acquire connection");
            ensure_schema(handle.connection().unwrap()).expect("failed to create schema");
        }
        let store = RecordStore::new(Arc::clone(&pool));
        Self { store, pool, dir }
    }

    pub fn db_path(&self) -> Option<PathBuf> {
        self.dir.as_ref().map(|d| d.path().join("users.db"))
    }
}

/// In-memory sink for a `fmt` subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a scoped subscriber and return what it logged.
///
/// The subscriber only sees events from the current thread.
pub fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}
