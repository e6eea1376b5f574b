//! Transactional record operations.
//!
//! Every [`RecordStore`] call leases its own connection, runs one statement
//! and gives the connection back before returning. Writes run inside an
//! immediate transaction that is committed on success and rolled back on any
//! failure, always before the connection is released. The lease and the
//! transaction are both guards, so a panic takes the same path.

use std::sync::Arc;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use userstore_common::{Error, RecordId, Result};

use crate::models::Record;
use crate::pool::ConnectionPool;
use crate::queries::users;
use crate::update::UpdateFieldSet;

/// CRUD access to the `users` table through a shared [`ConnectionPool`].
///
/// The store holds no record state between calls; cloning it only clones
/// the pool reference.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use userstore_db::pool::ConnectionPool;
/// use userstore_db::schema::ensure_schema;
/// use userstore_db::store::RecordStore;
/// use userstore_db::update::UpdateFieldSet;
///
/// let pool = Arc::new(ConnectionPool::open_in_memory().unwrap());
/// ensure_schema(pool.acquire().unwrap().connection().unwrap()).unwrap();
///
/// let store = RecordStore::new(pool);
/// let id = store.create("Juan Pérez", "juan@email.com", Some(30)).unwrap();
/// assert!(store.update(id, &UpdateFieldSet::new().age(31)).unwrap());
/// assert_eq!(store.read(id).unwrap().unwrap().age, Some(31));
/// ```
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: Arc<ConnectionPool>,
}

impl RecordStore {
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    /// Insert a record and return its engine-assigned id.
    pub fn create(&self, name: &str, email: &str, age: Option<i64>) -> Result<RecordId> {
        let id = self.in_transaction("create", |conn| users::insert_user(conn, name, email, age))?;
        tracing::info!(id = %id, "Created record");
        Ok(id)
    }

    /// Fetch one record. A missing id is `Ok(None)`, not an error.
    pub fn read(&self, id: RecordId) -> Result<Option<Record>> {
        let record = self.with_connection(|conn| users::get_user(conn, id))?;
        match &record {
            Some(_) => tracing::debug!(id = %id, "Found record"),
            None => tracing::info!(id = %id, "Record not found"),
        }
        Ok(record)
    }

    /// Fetch every record, ordered by ascending id.
    pub fn read_all(&self) -> Result<Vec<Record>> {
        let records = self.with_connection(users::list_users)?;
        tracing::info!(count = records.len(), "Listed records");
        Ok(records)
    }

    /// Change the supplied fields of one record.
    ///
    /// Returns `Ok(false)` when no record has that id. An empty field set is
    /// rejected with `InvalidArgument` before a connection is leased.
    pub fn update(&self, id: RecordId, fields: &UpdateFieldSet) -> Result<bool> {
        if fields.is_empty() {
            tracing::warn!(id = %id, "No fields supplied to update");
            return Err(Error::invalid_argument(format!(
                "no fields supplied to update record {id}"
            )));
        }

        let matched = self.in_transaction("update", |conn| users::update_user(conn, id, fields))?;
        if matched > 0 {
            tracing::info!(id = %id, fields = %fields.assignments(), "Updated record");
        } else {
            tracing::info!(id = %id, "Record not found for update");
        }
        Ok(matched > 0)
    }

    /// Remove one record. Returns `Ok(false)` when no record has that id.
    pub fn delete(&self, id: RecordId) -> Result<bool> {
        let deleted = self.in_transaction("delete", |conn| users::delete_user(conn, id))?;
        if deleted {
            tracing::info!(id = %id, "Deleted record");
        } else {
            tracing::info!(id = %id, "Record not found for delete");
        }
        Ok(deleted)
    }

    /// Number of stored records.
    pub fn count(&self) -> Result<u64> {
        self.with_connection(users::count_users)
    }

    /// Liveness check; see [`ConnectionPool::probe`].
    pub fn probe(&self) -> bool {
        self.pool.probe()
    }

    fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let handle = self.pool.acquire()?;
        f(handle.connection()?)
    }

    fn in_transaction<T>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&Connection) -> Result<T>,
    ) -> Result<T> {
        let handle = self.pool.acquire()?;
        let tx = Transaction::new_unchecked(handle.connection()?, TransactionBehavior::Immediate)
            .map_err(|e| Error::execution(operation, e))?;

        match f(&tx) {
            Ok(value) => {
                tx.commit().map_err(|e| Error::execution(operation, e))?;
                Ok(value)
            }
            Err(err) => {
                if let Err(e) = tx.rollback() {
                    tracing::error!(operation, error = %e, "Rollback failed");
                }
                tracing::warn!(operation, error = %err, "Rolled back transaction");
                Err(err)
            }
        }
    }
}
