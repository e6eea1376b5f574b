//! User record queries.
//!
//! Each function runs exactly one parameterized statement on the connection
//! it is given. Transaction boundaries belong to the caller (normally
//! [`RecordStore`](crate::store::RecordStore)).

use rusqlite::Connection;
use userstore_common::{Error, RecordId, Result};

use crate::models::{Record, RECORD_COLUMNS};
use crate::update::UpdateFieldSet;

/// Insert a user and return the id the engine assigned.
///
/// # Arguments
///
/// * `conn` - Database connection
/// * `name` - Display name
/// * `email` - Email address
/// * `age` - Age, or `None` to store NULL
pub fn insert_user(
    conn: &Connection,
    name: &str,
    email: &str,
    age: Option<i64>,
) -> Result<RecordId> {
    let id: i64 = conn
        .query_row(
            "INSERT INTO users (name, email, age)
             VALUES (:name, :email, :age)
             RETURNING id",
            rusqlite::named_params! {
                ":name": name,
                ":email": email,
                ":age": age,
            },
            |row| row.get(0),
        )
        .map_err(|e| Error::execution("create", e))?;

    Ok(RecordId::from(id))
}

/// Get a user by ID.
///
/// # Returns
///
/// * `Ok(Some(Record))` - The user if found
/// * `Ok(None)` - If the user does not exist
/// * `Err(Error)` - If a database error occurs
pub fn get_user(conn: &Connection, id: RecordId) -> Result<Option<Record>> {
    let q = format!("SELECT {RECORD_COLUMNS} FROM users WHERE id = :id");
    let result = conn.query_row(
        &q,
        rusqlite::named_params! { ":id": id.as_i64() },
        Record::from_row,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::execution("read", e)),
    }
}

/// List all users ordered by ascending id.
pub fn list_users(conn: &Connection) -> Result<Vec<Record>> {
    let q = format!("SELECT {RECORD_COLUMNS} FROM users ORDER BY id ASC");
    let mut stmt = conn
        .prepare(&q)
        .map_err(|e| Error::execution("read_all", e))?;

    let records = stmt
        .query_map([], Record::from_row)
        .map_err(|e| Error::execution("read_all", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::execution("read_all", e))?;

    Ok(records)
}

/// Apply the supplied fields to one user.
///
/// Only the columns present in `fields` appear in the statement. An empty
/// set is rejected without touching the connection.
///
/// # Returns
///
/// * `Ok(n)` - Number of rows matched (0 when the id does not exist)
/// * `Err(Error)` - If `fields` is empty or a database error occurs
pub fn update_user(conn: &Connection, id: RecordId, fields: &UpdateFieldSet) -> Result<usize> {
    if fields.is_empty() {
        return Err(Error::invalid_argument("no fields supplied to update"));
    }

    let q = format!("UPDATE users SET {} WHERE id = :id", fields.assignments());
    let id = id.as_i64();
    let mut params = fields.named_params();
    params.push((":id", &id as &dyn rusqlite::ToSql));

    conn.execute(&q, params.as_slice())
        .map_err(|e| Error::execution("update", e))
}

/// Delete a user.
///
/// # Returns
///
/// * `Ok(true)` - If the user was deleted
/// * `Ok(false)` - If the user did not exist
/// * `Err(Error)` - If a database error occurs
pub fn delete_user(conn: &Connection, id: RecordId) -> Result<bool> {
    let rows_affected = conn
        .execute(
            "DELETE FROM users WHERE id = :id",
            rusqlite::named_params! { ":id": id.as_i64() },
        )
        .map_err(|e| Error::execution("delete", e))?;

    Ok(rows_affected > 0)
}

/// Count all users.
pub fn count_users(conn: &Connection) -> Result<u64> {
    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
        .map_err(|e| Error::execution("count", e))?;

    Ok(u64::try_from(count).unwrap_or_default())
}
