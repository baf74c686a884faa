//! Database driver seam.
//!
//! The runner never talks to a database directly. Anything that can execute a
//! MySQL statement, and a `;`-joined batch of them, plugs in by implementing
//! [`Driver`]. Calls are blocking; a runner owns its driver exclusively.

use crate::error::SqlResult;
use crate::quote::{Escape, escape_mysql};
use serde_json::Value as JsonValue;

/// One row as returned by the driver, columns in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriverRow {
    columns: Vec<(String, JsonValue)>,
}

impl DriverRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column value.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.columns.push((column.into(), value.into()));
        self
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<JsonValue>) {
        self.columns.push((column.into(), value.into()));
    }

    /// First value stored under `column`.
    pub fn get(&self, column: &str) -> Option<&JsonValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> &[(String, JsonValue)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn into_columns(self) -> Vec<(String, JsonValue)> {
        self.columns
    }
}

impl<K: Into<String>, V: Into<JsonValue>> FromIterator<(K, V)> for DriverRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Outcome of one executed statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultHandle {
    /// A row-producing statement (possibly with zero rows).
    Rows(Vec<DriverRow>),
    /// A mutation and the number of rows it touched.
    Affected(u64),
    /// The statement produced no result set (DDL, `SET`, ...).
    Empty,
}

/// A blocking MySQL-compatible connection.
///
/// Errors returned from [`Driver::execute`] and [`Driver::execute_batch`]
/// should be [`SqlError::Query`](crate::SqlError::Query) or
/// [`SqlError::Connection`](crate::SqlError::Connection); the runner
/// attaches the failing SQL before propagating them.
pub trait Driver {
    /// Escape a string for use inside a single-quoted literal.
    ///
    /// The default follows `mysql_real_escape_string` for utf8 connections.
    fn escape_string(&self, value: &str) -> String {
        escape_mysql(value)
    }

    /// Execute a single statement.
    fn execute(&mut self, sql: &str) -> SqlResult<ResultHandle>;

    /// Execute a `;`-joined batch and return one handle per completed statement.
    ///
    /// Execution stops at the first failing statement. Its message must then be
    /// available from [`Driver::last_error`], and no handles are returned for
    /// it or anything after it.
    fn execute_batch(&mut self, sql: &str) -> SqlResult<Vec<ResultHandle>>;

    /// `LAST_INSERT_ID()` of the most recent insert on this connection.
    fn last_insert_id(&self) -> u64;

    /// Rows affected (or returned) by the most recent statement.
    fn affected_rows(&self) -> u64;

    /// Message of the most recent failure; empty when the last call succeeded.
    fn last_error(&self) -> String;

    fn begin(&mut self) -> SqlResult<()> {
        self.execute("START TRANSACTION").map(|_| ())
    }

    fn commit(&mut self) -> SqlResult<()> {
        self.execute("COMMIT").map(|_| ())
    }

    fn rollback(&mut self) -> SqlResult<()> {
        self.execute("ROLLBACK").map(|_| ())
    }

    /// Close the underlying connection.
    fn close(&mut self) -> SqlResult<()> {
        Ok(())
    }
}

impl<D: Driver + ?Sized> Escape for D {
    fn escape(&self, value: &str) -> String {
        self.escape_string(value)
    }
}
