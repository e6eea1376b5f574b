//! Database connection pool management.
//!
//! The pool has two tiers. Up to `max_pool_size` warm connections are managed
//! by r2d2 and reused indefinitely, subject to recycling. When every warm
//! connection is checked out, up to `max_overflow` transient connections are
//! opened on demand and closed as soon as they are released.
//!
//! # Example
//!
//! ```
//! use userstore_db::config::PoolConfiguration;
//! use userstore_db::pool::ConnectionPool;
//!
//! let config = PoolConfiguration::from_url("sqlite::memory:").unwrap();
//! let pool = ConnectionPool::open(config).unwrap();
//! assert!(pool.probe());
//!
//! let handle = pool.acquire().unwrap();
//! let one: i64 = handle
//!     .connection()
//!     .unwrap()
//!     .query_row("SELECT 1", [], |row| row.get(0))
//!     .unwrap();
//! assert_eq!(one, 1);
//! ```

mod handle;
mod manager;

pub use handle::{ConnectionHandle, LeaseKind};
pub use manager::{AgedConnection, ConnectError, RecyclingManager};

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use r2d2::{ManageConnection, Pool};
use userstore_common::{Error, Result};

use crate::config::PoolConfiguration;
use handle::OverflowSlot;
use manager::{Target, TracingErrorHandler, TracingEventHandler};

/// How long an acquirer waits on the warm tier before rechecking whether an
/// overflow slot has freed up.
const OVERFLOW_RECHECK_INTERVAL: Duration = Duration::from_millis(25);

/// Point-in-time view of pool occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolState {
    /// Warm connections currently open, idle or checked out.
    pub warm_connections: u32,
    /// Warm connections sitting idle.
    pub warm_idle: u32,
    /// Overflow connections currently checked out.
    pub overflow_in_use: u32,
    pub max_pool_size: u32,
    pub max_overflow: u32,
}

/// A bounded, thread-safe pool of SQLite connections.
pub struct ConnectionPool {
    config: PoolConfiguration,
    warm: Pool<RecyclingManager>,
    overflow_manager: RecyclingManager,
    overflow_in_use: Arc<AtomicU32>,
    // keeps a shared in-memory database alive while warm connections recycle
    _anchor: Option<Mutex<AgedConnection>>,
}

impl ConnectionPool {
    /// Validate `config` and build the pool.
    ///
    /// Warm connections are opened lazily on first use. In-memory databases
    /// additionally get one anchor connection, opened here, so the database
    /// outlives any individual pooled connection.
    pub fn open(config: PoolConfiguration) -> Result<Self> {
        config.validate()?;

        let target = Target::resolve(config.location());
        let warm_manager =
            RecyclingManager::new(&target, config.busy_timeout(), config.recycle_age());
        let overflow_manager =
            RecyclingManager::new(&target, config.busy_timeout(), config.recycle_age());

        let anchor = if config.location().is_memory() {
            let conn = overflow_manager.connect().map_err(|e| {
                Error::configuration(format!("Failed to open in-memory database: {e}"))
            })?;
            Some(Mutex::new(conn))
        } else {
            None
        };

        let warm = Pool::<RecyclingManager>::builder()
            .max_size(config.max_pool_size())
            .min_idle(Some(0))
            .idle_timeout(None)
            .max_lifetime(Some(config.recycle_age()))
            .connection_timeout(config.acquisition_timeout())
            .test_on_check_out(true)
            .error_handler(Box::new(TracingErrorHandler))
            .event_handler(Box::new(TracingEventHandler))
            .build(warm_manager)
            .map_err(|e| Error::configuration(format!("Failed to create connection pool: {e}")))?;

        tracing::info!(
            database = %config.location(),
            max_pool_size = config.max_pool_size(),
            max_overflow = config.max_overflow(),
            acquisition_timeout = ?config.acquisition_timeout(),
            recycle_age = ?config.recycle_age(),
            "Opened connection pool"
        );

        Ok(Self {
            config,
            warm,
            overflow_manager,
            overflow_in_use: Arc::new(AtomicU32::new(0)),
            _anchor: anchor,
        })
    }

    /// Open a pool over a fresh private in-memory database with default
    /// sizing. Handy for tests and demos.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(PoolConfiguration::from_url("sqlite::memory:")?)
    }

    /// Lease a connection, blocking for at most the acquisition timeout.
    ///
    /// Idle warm connections are preferred. An overflow connection is opened
    /// only while every warm connection is checked out. Fails with
    /// `PoolExhausted` when the timeout elapses first.
    pub fn acquire(&self) -> Result<ConnectionHandle> {
        let timeout = self.config.acquisition_timeout();
        let deadline = Instant::now().checked_add(timeout).ok_or_else(|| {
            Error::configuration(format!("acquisition timeout {timeout:?} is out of range"))
        })?;
        let mut last_error = None;

        loop {
            if self.warm_saturated() {
                if let Some(handle) = self.try_overflow()? {
                    return Ok(handle);
                }
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(timeout = ?timeout, "Connection pool exhausted");
                return Err(match last_error {
                    Some(e) => Error::pool_exhausted(timeout, e),
                    None => Error::pool_exhausted(timeout, "no connection became available"),
                });
            }

            let wait = if self.config.max_overflow() > 0 {
                remaining.min(OVERFLOW_RECHECK_INTERVAL)
            } else {
                remaining
            };

            match self.warm.get_timeout(wait) {
                Ok(conn) => return Ok(ConnectionHandle::warm(conn)),
                Err(e) => last_error = Some(e),
            }
        }
    }

    /// Return `handle`'s connection to the pool. Idempotent.
    pub fn release(&self, handle: &mut ConnectionHandle) {
        handle.release();
    }

    /// Check that the database answers a trivial query.
    ///
    /// Never fails; problems are logged and reported as `false`.
    pub fn probe(&self) -> bool {
        let result = self.acquire().and_then(|handle| {
            let version: String = handle
                .connection()?
                .query_row("SELECT sqlite_version()", [], |row| row.get(0))
                .map_err(|e| Error::execution("probe", e))?;
            Ok(version)
        });

        match result {
            Ok(version) => {
                tracing::info!(version = %version, "Database connection OK");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Database probe failed");
                false
            }
        }
    }

    /// Snapshot of pool occupancy.
    pub fn state(&self) -> PoolState {
        let warm = self.warm.state();
        PoolState {
            warm_connections: warm.connections,
            warm_idle: warm.idle_connections,
            overflow_in_use: self.overflow_in_use.load(Ordering::Acquire),
            max_pool_size: self.config.max_pool_size(),
            max_overflow: self.config.max_overflow(),
        }
    }

    pub fn config(&self) -> &PoolConfiguration {
        &self.config
    }

    /// Every warm connection exists and is checked out.
    fn warm_saturated(&self) -> bool {
        let state = self.warm.state();
        state.connections >= self.config.max_pool_size() && state.idle_connections == 0
    }

    fn try_overflow(&self) -> Result<Option<ConnectionHandle>> {
        let Some(slot) = OverflowSlot::reserve(&self.overflow_in_use, self.config.max_overflow())
        else {
            return Ok(None);
        };

        // the slot is freed by its Drop if connecting fails
        let conn = self
            .overflow_manager
            .connect()
            .map_err(|e| Error::execution("open overflow connection", e))?;

        tracing::debug!(
            in_use = self.overflow_in_use.load(Ordering::Acquire),
            max_overflow = self.config.max_overflow(),
            "Opened overflow connection"
        );
        Ok(Some(ConnectionHandle::overflow(conn, slot)))
    }
}

impl std::fmt::Debug for ConnectionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
