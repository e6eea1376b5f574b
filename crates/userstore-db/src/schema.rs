//! Table bootstrap for demos and tests.
//!
//! The store assumes the `users` table already exists. This module creates it
//! when missing so a fresh database can be exercised; it does not track
//! versions or alter existing tables.

use rusqlite::Connection;
use userstore_common::{Error, Result};

const USERS_TABLE: &str = "
CREATE TABLE IF NOT EXISTS users (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL,
    email TEXT NOT NULL,
    age   INTEGER CHECK (age IS NULL OR age >= 0)
);
";

/// Create the `users` table if it does not exist.
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(USERS_TABLE)
        .map_err(|e| Error::execution("ensure_schema", e))
}

/// Whether the `users` table exists.
pub fn users_table_exists(conn: &Connection) -> Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type = 'table' AND name = 'users'",
        [],
        |row| row.get(0),
    )
    .map_err(|e| Error::execution("ensure_schema", e))
}
