//! Pool configuration types.
//!
//! A [`PoolConfiguration`] is an immutable value: it is assembled with the
//! `with_*` builders, checked once by [`PoolConfiguration::validate`] (which
//! [`ConnectionPool::open`](crate::pool::ConnectionPool::open) calls for you),
//! and never changes afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use userstore_common::{Error, Result};

/// Where the database lives.
///
/// Parsed from a URL:
///
/// - `sqlite://data/users.db`, `sqlite:///var/lib/users.db` or
///   `sqlite:users.db` for a file on disk
/// - `sqlite::memory:` for an in-memory database private to one pool
/// - `sqlite::memory:<name>` for an in-memory database shared by every pool in
///   the process that opens the same name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A database file, created on first connect if missing.
    File(PathBuf),
    /// An in-memory database, optionally named.
    Memory(Option<String>),
}

impl DatabaseLocation {
    /// Parse a database URL.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        let rest = url.strip_prefix("sqlite:").ok_or_else(|| {
            Error::configuration(format!(
                "Unsupported database URL '{url}': expected a sqlite: URL"
            ))
        })?;

        if let Some(name) = rest.strip_prefix(":memory:") {
            if name.is_empty() {
                return Ok(Self::Memory(None));
            }
            let valid = name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
            if !valid {
                return Err(Error::configuration(format!(
                    "Invalid in-memory database name '{name}': use letters, digits, '_' or '-'"
                )));
            }
            return Ok(Self::Memory(Some(name.to_string())));
        }

        let path = rest.strip_prefix("//").unwrap_or(rest);
        if path.is_empty() {
            return Err(Error::configuration(format!(
                "Database URL '{url}' has no file path"
            )));
        }
        if path.contains('?') {
            return Err(Error::configuration(format!(
                "Database URL '{url}' must not carry query parameters"
            )));
        }

        Ok(Self::File(PathBuf::from(path)))
    }

    /// Shorthand for a file location.
    pub fn file(path: impl AsRef<Path>) -> Self {
        Self::File(path.as_ref().to_path_buf())
    }

    /// Whether the database lives in memory.
    pub fn is_memory(&self) -> bool {
        matches!(self, Self::Memory(_))
    }
}

impl FromStr for DatabaseLocation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "sqlite://{}", path.display()),
            Self::Memory(None) => write!(f, "sqlite::memory:"),
            Self::Memory(Some(name)) => write!(f, "sqlite::memory:{name}"),
        }
    }
}

/// Upper bound for `acquisition_timeout` and `busy_timeout`.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Sizing and timing parameters for a [`ConnectionPool`](crate::pool::ConnectionPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfiguration {
    location: DatabaseLocation,
    /// Warm connections kept open for reuse
    max_pool_size: u32,
    /// Transient connections allowed while every warm one is checked out
    max_overflow: u32,
    /// How long `acquire` may block before giving up
    acquisition_timeout: Duration,
    /// Connections older than this are closed instead of handed out
    recycle_age: Duration,
    /// How long a statement waits on an engine lock before failing
    busy_timeout: Duration,
}

impl PoolConfiguration {
    /// Create a configuration for `location` with default sizing.
    ///
    /// Defaults:
    /// - max_pool_size: 10
    /// - max_overflow: 20
    /// - acquisition_timeout: 30 seconds
    /// - recycle_age: 1 hour
    /// - busy_timeout: 5 seconds
    pub fn new(location: DatabaseLocation) -> Self {
        Self {
            location,
            max_pool_size: 10,
            max_overflow: 20,
            acquisition_timeout: Duration::from_secs(30),
            recycle_age: Duration::from_secs(3600),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Parse `url` and create a configuration with default sizing.
    pub fn from_url(url: &str) -> Result<Self> {
        Ok(Self::new(DatabaseLocation::parse(url)?))
    }

    /// Set the number of warm connections.
    pub fn with_max_pool_size(mut self, size: u32) -> Self {
        self.max_pool_size = size;
        self
    }

    /// Set the number of burst connections allowed beyond the warm set.
    pub fn with_max_overflow(mut self, overflow: u32) -> Self {
        self.max_overflow = overflow;
        self
    }

    /// Set the acquisition timeout.
    pub fn with_acquisition_timeout(mut self, timeout: Duration) -> Self {
        self.acquisition_timeout = timeout;
        self
    }

    /// Set the connection recycle age.
    pub fn with_recycle_age(mut self, age: Duration) -> Self {
        self.recycle_age = age;
        self
    }

    /// Set the engine busy timeout.
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Check the sizing invariants.
    pub fn validate(&self) -> Result<()> {
        if self.max_pool_size == 0 {
            return Err(Error::configuration(
                "max_pool_size must be greater than 0",
            ));
        }
        if self.acquisition_timeout.is_zero() {
            return Err(Error::configuration(
                "acquisition_timeout must be greater than 0",
            ));
        }
        if self.acquisition_timeout > MAX_TIMEOUT {
            return Err(Error::configuration(format!(
                "acquisition_timeout must be at most {MAX_TIMEOUT:?}"
            )));
        }
        if self.busy_timeout > MAX_TIMEOUT {
            return Err(Error::configuration(format!(
                "busy_timeout must be at most {MAX_TIMEOUT:?}"
            )));
        }
        if self.recycle_age.is_zero() {
            return Err(Error::configuration("recycle_age must be greater than 0"));
        }
        if let DatabaseLocation::File(path) = &self.location {
            if path.as_os_str().is_empty() {
                return Err(Error::configuration("database path must not be empty"));
            }
        }
        Ok(())
    }

    pub fn location(&self) -> &DatabaseLocation {
        &self.location
    }

    pub fn max_pool_size(&self) -> u32 {
        self.max_pool_size
    }

    pub fn max_overflow(&self) -> u32 {
        self.max_overflow
    }

    pub fn acquisition_timeout(&self) -> Duration {
        self.acquisition_timeout
    }

    pub fn recycle_age(&self) -> Duration {
        self.recycle_age
    }

    pub fn busy_timeout(&self) -> Duration {
        self.busy_timeout
    }
}
