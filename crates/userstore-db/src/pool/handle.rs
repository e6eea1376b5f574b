//! Leased connections.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rusqlite::Connection;
use userstore_common::{Error, Result};

use super::manager::{AgedConnection, RecyclingManager};

/// Which tier a handle's connection came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaseKind {
    /// A reusable connection from the warm set.
    Warm,
    /// A transient burst connection, closed on release.
    Overflow,
}

/// Holds one of the pool's overflow slots and frees it when dropped.
#[derive(Debug)]
pub(crate) struct OverflowSlot(Arc<AtomicU32>);

impl OverflowSlot {
    /// Reserve a slot if fewer than `max` are in use.
    pub(crate) fn reserve(counter: &Arc<AtomicU32>, max: u32) -> Option<Self> {
        counter
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |in_use| {
                (in_use < max).then_some(in_use + 1)
            })
            .ok()
            .map(|_| Self(Arc::clone(counter)))
    }
}

impl Drop for OverflowSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

enum Lease {
    Warm(r2d2::PooledConnection<RecyclingManager>),
    // field order matters: the connection closes before the slot frees
    Overflow {
        conn: AgedConnection,
        _slot: OverflowSlot,
    },
}

/// An exclusively owned connection leased from a
/// [`ConnectionPool`](super::ConnectionPool).
///
/// The connection goes back to the pool when the handle is released or
/// dropped, whichever happens first, so every exit path (including `?` and
/// panics) returns it. Warm connections rejoin the warm set; overflow
/// connections are closed.
pub struct ConnectionHandle {
    lease: Option<Lease>,
}

impl ConnectionHandle {
    pub(crate) fn warm(conn: r2d2::PooledConnection<RecyclingManager>) -> Self {
        Self {
            lease: Some(Lease::Warm(conn)),
        }
    }

    pub(crate) fn overflow(conn: AgedConnection, slot: OverflowSlot) -> Self {
        Self {
            lease: Some(Lease::Overflow { conn, _slot: slot }),
        }
    }

    /// The leased connection.
    ///
    /// Fails with `InvalidArgument` once the handle has been released.
    pub fn connection(&self) -> Result<&Connection> {
        self.aged()
            .map(|aged| &**aged)
            .ok_or_else(|| Error::invalid_argument("connection handle has already been released"))
    }

    /// Which tier the connection came from, or `None` after release.
    pub fn kind(&self) -> Option<LeaseKind> {
        match self.lease.as_ref()? {
            Lease::Warm(_) => Some(LeaseKind::Warm),
            Lease::Overflow { .. } => Some(LeaseKind::Overflow),
        }
    }

    /// Age of the underlying connection, or `None` after release.
    pub fn age(&self) -> Option<Duration> {
        self.aged().map(AgedConnection::age)
    }

    pub fn is_released(&self) -> bool {
        self.lease.is_none()
    }

    /// Return the connection to the pool. Releasing twice is a no-op.
    pub fn release(&mut self) {
        if let Some(lease) = self.lease.take() {
            match lease {
                Lease::Warm(_) => tracing::trace!("Released warm connection"),
                Lease::Overflow { .. } => tracing::debug!("Closed overflow connection"),
            }
        }
    }

    fn aged(&self) -> Option<&AgedConnection> {
        match self.lease.as_ref()? {
            Lease::Warm(conn) => Some(&**conn),
            Lease::Overflow { conn, .. } => Some(conn),
        }
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("kind", &self.kind())
            .field("age", &self.age())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_slots_are_bounded() {
        let counter = Arc::new(AtomicU32::new(0));

        let first = OverflowSlot::reserve(&counter, 2).unwrap();
        let second = OverflowSlot::reserve(&counter, 2).unwrap();
        assert!(OverflowSlot::reserve(&counter, 2).is_none());
        assert_eq!(counter.load(Ordering::Acquire), 2);

        drop(first);
        assert_eq!(counter.load(Ordering::Acquire), 1);
        assert!(OverflowSlot::reserve(&counter, 2).is_some());

        drop(second);
        assert_eq!(counter.load(Ordering::Acquire), 0);
    }

    #[test]
    fn test_zero_overflow_never_reserves() {
        let counter = Arc::new(AtomicU32::new(0));
        assert!(OverflowSlot::reserve(&counter, 0).is_none());
    }
}
