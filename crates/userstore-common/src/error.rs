//! Common error types used throughout userstore.
//!
//! Failures fall into four classes. Configuration problems are fatal at
//! startup, pool exhaustion is transient and may be retried, execution
//! failures come from the engine, and invalid arguments are rejected before
//! any I/O happens. "Not found" and "zero rows affected" are not errors; the
//! store reports them through `Option` and `bool` results.

use std::time::Duration;

/// Boxed underlying cause carried by wrapping variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Common error type for userstore.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Pool settings are malformed or out of range.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// No connection became available within the acquisition timeout.
    #[error("Connection pool exhausted after {timeout:?}: {source}")]
    PoolExhausted {
        /// The acquisition timeout that elapsed.
        timeout: Duration,
        /// Why the pool could not hand out a connection.
        source: BoxError,
    },

    /// A statement failed at the engine. The transaction, if any, has
    /// already been rolled back and the connection released.
    #[error("Execution error in {operation}: {source}")]
    Execution {
        /// The store operation that was running.
        operation: &'static str,
        /// The underlying engine error.
        source: BoxError,
    },

    /// The caller supplied an argument the operation cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// Create a new Configuration error.
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new PoolExhausted error.
    pub fn pool_exhausted<E: Into<BoxError>>(timeout: Duration, source: E) -> Self {
        Self::PoolExhausted {
            timeout,
            source: source.into(),
        }
    }

    /// Create a new Execution error.
    pub fn execution<E: Into<BoxError>>(operation: &'static str, source: E) -> Self {
        Self::Execution {
            operation,
            source: source.into(),
        }
    }

    /// Create a new InvalidArgument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Whether retrying the same call later may succeed.
    ///
    /// Only pool exhaustion is transient; the store never retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::PoolExhausted { .. })
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::configuration("max_pool_size must be greater than 0");
        assert_eq!(
            err.to_string(),
            "Configuration error: max_pool_size must be greater than 0"
        );

        let err = Error::pool_exhausted(Duration::from_millis(100), "timed out");
        assert_eq!(
            err.to_string(),
            "Connection pool exhausted after 100ms: timed out"
        );

        let err = Error::execution("create", "UNIQUE constraint failed");
        assert_eq!(
            err.to_string(),
            "Execution error in create: UNIQUE constraint failed"
        );

        let err = Error::invalid_argument("empty field set");
        assert_eq!(err.to_string(), "Invalid argument: empty field set");
    }

    #[test]
    fn test_only_pool_exhaustion_is_retryable() {
        assert!(Error::pool_exhausted(Duration::from_secs(1), "busy").is_retryable());
        assert!(!Error::execution("delete", "disk I/O error").is_retryable());
        assert!(!Error::configuration("bad url").is_retryable());
        assert!(!Error::invalid_argument("empty").is_retryable());
    }

    #[test]
    fn test_source_is_preserved() {
        let cause = std::io::Error::other("engine went away");
        let err = Error::execution("read", cause);

        let source = err.source().expect("execution errors carry a cause");
        assert_eq!(source.to_string(), "engine went away");
        assert!(matches!(err, Error::Execution { operation: "read", .. }));
    }

    #[test]
    fn test_result_type() {
        fn ok_fn() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(ok_fn().unwrap(), 42);

        fn err_fn() -> Result<i32> {
            Err(Error::invalid_argument("nope"))
        }
        assert!(err_fn().is_err());
    }
}
