//! Userstore-Common: shared error taxonomy and identifiers.
//!
//! - **Error Handling**: the [`Error`] taxonomy every userstore crate reports
//!   through, plus the [`Result`] alias
//! - **Typed IDs**: [`RecordId`], the engine-assigned key of a stored record
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use userstore_common::{Error, RecordId, Result};
//!
//! let id = RecordId::from(7);
//! assert_eq!(id.as_i64(), 7);
//!
//! fn lookup() -> Result<()> {
//!     Err(Error::pool_exhausted(Duration::from_millis(100), "timed out"))
//! }
//! assert!(lookup().unwrap_err().is_retryable());
//! ```

pub mod error;
pub mod ids;

pub use error::{BoxError, Error, Result};
pub use ids::RecordId;
