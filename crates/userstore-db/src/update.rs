//! Sparse field sets for partial updates.
//!
//! An [`UpdateFieldSet`] holds only the fields a caller actually supplied.
//! Column names come from the closed [`RecordField`] enum and values are
//! always bound as named parameters, so nothing the caller passes is ever
//! spliced into statement text.

use std::collections::BTreeMap;

use rusqlite::types::{ToSql, Value};

/// An updatable column of the `users` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordField {
    Name,
    Email,
    Age,
}

impl RecordField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Age => "age",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Name => ":name",
            Self::Email => ":email",
            Self::Age => ":age",
        }
    }
}

/// Fields to change in an update, keyed by column.
///
/// ```
/// use userstore_db::update::{RecordField, UpdateFieldSet};
///
/// let fields = UpdateFieldSet::new().name("María Fernández").age(26);
/// assert_eq!(fields.len(), 2);
/// assert!(!fields.contains(RecordField::Email));
/// assert_eq!(fields.assignments(), "name = :name, age = :age");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateFieldSet {
    fields: BTreeMap<RecordField, Value>,
}

impl UpdateFieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from optional arguments, keeping only the present ones.
    pub fn from_options(name: Option<String>, email: Option<String>, age: Option<i64>) -> Self {
        let mut fields = Self::new();
        if let Some(name) = name {
            fields = fields.name(name);
        }
        if let Some(email) = email {
            fields = fields.email(email);
        }
        if let Some(age) = age {
            fields = fields.age(age);
        }
        fields
    }

    pub fn name(self, name: impl Into<String>) -> Self {
        self.with(RecordField::Name, Value::Text(name.into()))
    }

    pub fn email(self, email: impl Into<String>) -> Self {
        self.with(RecordField::Email, Value::Text(email.into()))
    }

    pub fn age(self, age: i64) -> Self {
        self.with(RecordField::Age, Value::Integer(age))
    }

    fn with(mut self, field: RecordField, value: Value) -> Self {
        self.fields.insert(field, value);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn contains(&self, field: RecordField) -> bool {
        self.fields.contains_key(&field)
    }

    /// Supplied fields in column order.
    pub fn fields(&self) -> impl Iterator<Item = RecordField> + '_ {
        self.fields.keys().copied()
    }

    /// The `SET` clause body, e.g. `name = :name, age = :age`.
    pub fn assignments(&self) -> String {
        self.fields
            .keys()
            .map(|field| format!("{} = {}", field.column(), field.placeholder()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Named parameters matching [`assignments`](Self::assignments).
    pub(crate) fn named_params(&self) -> Vec<(&'static str, &dyn ToSql)> {
        self.fields
            .iter()
            .map(|(field, value)| (field.placeholder(), value as &dyn ToSql))
            .collect()
    }
}
