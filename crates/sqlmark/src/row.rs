//! Result materialization.
//!
//! Driver rows become plain ordered records ([`Record`]), the associative
//! form. Typed values come from [`Rows::into_typed`] (serde) or
//! [`Rows::decode`] ([`FromRecord`]). An empty result is always an empty list.

use crate::driver::DriverRow;
use crate::error::{SqlError, SqlResult};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;

/// A column-name → value map in select order.
pub type Record = serde_json::Map<String, JsonValue>;

/// Convert driver rows into records.
///
/// A column name repeated in one row keeps its last value.
pub fn materialize(rows: Vec<DriverRow>) -> Rows {
    Rows(
        rows.into_iter()
            .map(|row| row.into_columns().into_iter().collect::<Record>())
            .collect(),
    )
}

/// Materialized rows of one statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rows(Vec<Record>);

impl Rows {
    pub fn new(records: Vec<Record>) -> Self {
        Self(records)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn first(&self) -> Option<&Record> {
        self.0.first()
    }

    pub fn last(&self) -> Option<&Record> {
        self.0.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[Record] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Record> {
        self.0
    }

    /// Deserialize every row with serde.
    pub fn into_typed<T: DeserializeOwned>(self) -> SqlResult<Vec<T>> {
        self.0
            .into_iter()
            .map(|record| {
                serde_json::from_value(JsonValue::Object(record))
                    .map_err(|e| SqlError::decode("*", e.to_string()))
            })
            .collect()
    }

    /// Map every row through [`FromRecord`].
    pub fn decode<T: FromRecord>(&self) -> SqlResult<Vec<T>> {
        self.0.iter().map(T::from_record).collect()
    }
}

impl IntoIterator for Rows {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Rows {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<Record>> for Rows {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

/// Trait for converting a record into a Rust type.
///
/// # Example
///
/// ```ignore
/// use sqlmark::{FromRecord, Record, RecordExt, SqlResult};
///
/// struct User {
///     id: i64,
///     username: String,
/// }
///
/// impl FromRecord for User {
///     fn from_record(record: &Record) -> SqlResult<Self> {
///         Ok(Self {
///             id: record.try_get("id")?,
///             username: record.try_get("username")?,
///         })
///     }
/// }
/// ```
pub trait FromRecord: Sized {
    fn from_record(record: &Record) -> SqlResult<Self>;
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> SqlResult<Self> {
        Ok(record.clone())
    }
}

/// Typed column access on a [`Record`].
pub trait RecordExt {
    /// Get a column value, returning `SqlError::Decode` on failure.
    fn try_get<T: DeserializeOwned>(&self, column: &str) -> SqlResult<T>;
}

impl RecordExt for Record {
    fn try_get<T: DeserializeOwned>(&self, column: &str) -> SqlResult<T> {
        let value = self
            .get(column)
            .ok_or_else(|| SqlError::decode(column, "column not found"))?;
        T::deserialize(value).map_err(|e| SqlError::decode(column, e.to_string()))
    }
}
