//! Rust models matching the database schema.

use serde::{Deserialize, Serialize};
use userstore_common::RecordId;

/// Columns selected for every [`Record`], in `from_row` order.
pub(crate) const RECORD_COLUMNS: &str = "id, name, email, age";

/// A row of the `users` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub id: RecordId,
    pub name: String,
    pub email: String,
    pub age: Option<i64>,
}

impl Record {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: RecordId::from(row.get::<_, i64>(0)?),
            name: row.get(1)?,
            email: row.get(2)?,
            age: row.get(3)?,
        })
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{} {} <{}>", self.id, self.name, self.email)?;
        if let Some(age) = self.age {
            write!(f, ", age {age}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(age: Option<i64>) -> Record {
        Record {
            id: RecordId::from(2),
            name: "María Fernández".to_string(),
            email: "maria@email.com".to_string(),
            age,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            record(Some(26)).to_string(),
            "#2 María Fernández <maria@email.com>, age 26"
        );
        assert_eq!(record(None).to_string(), "#2 María Fernández <maria@email.com>");
    }

    #[test]
    fn test_json_shape() {
        let json = serde_json::to_value(record(None)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "id": 2,
                "name": "María Fernández",
                "email": "maria@email.com",
                "age": null,
            })
        );
    }
}
