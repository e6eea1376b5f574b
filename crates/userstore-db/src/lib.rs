//! Userstore-DB: connection pooling and transactional access to user records
//!
//! This crate provides a bounded two-tier connection pool over SQLite
//! (rusqlite with r2d2) and a record store that runs every write inside its
//! own transaction.
//!
//! # Modules
//!
//! - `config` - Database location and pool tuning
//! - `pool` - Connection pool with overflow and recycling
//! - `models` - Rust models matching database schema
//! - `update` - Sparse field sets for partial updates
//! - `queries` - Database query operations
//! - `schema` - Table bootstrap for demos and tests
//! - `store` - Transactional CRUD operations
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use userstore_db::config::PoolConfiguration;
//! use userstore_db::pool::ConnectionPool;
//! use userstore_db::store::RecordStore;
//!
//! let config = PoolConfiguration::from_url("sqlite:///var/lib/userstore/users.db").unwrap();
//! let store = RecordStore::new(Arc::new(ConnectionPool::open(config).unwrap()));
//!
//! let id = store.create("Juan Pérez", "juan@email.com", Some(30)).unwrap();
//! println!("Created user: {id}");
//! ```

pub mod config;
pub mod models;
pub mod pool;
pub mod queries;
pub mod schema;
pub mod store;
pub mod update;

pub use config::{DatabaseLocation, PoolConfiguration};
pub use models::Record;
pub use pool::{ConnectionHandle, ConnectionPool, PoolState};
pub use store::RecordStore;
pub use update::{RecordField, UpdateFieldSet};
