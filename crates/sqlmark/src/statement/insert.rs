use super::{BuildStatement, CompiledStatement, StatementKind, apply_policy, table_sql};
use crate::compile::Compiler;
use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use crate::quote::Escape;
use crate::spec::token_from_json;
use serde_json::Value as JsonValue;

/// INSERT statement builder for one or many rows.
///
/// The column list comes from the first row. Every later row must supply the
/// same columns; values are matched by column name, not position.
#[derive(Debug, Clone)]
pub struct Insert {
    table: Token,
    rows: Vec<Vec<(String, Token)>>,
}

impl Insert {
    pub fn new(table: &str) -> Self {
        Self {
            table: Token::column(table),
            rows: Vec::new(),
        }
    }

    /// Set a column on the current row, starting the first row if needed.
    pub fn set(mut self, column: &str, value: impl Into<Token>) -> Self {
        if self.rows.is_empty() {
            self.rows.push(Vec::new());
        }
        if let Some(row) = self.rows.last_mut() {
            row.push((column.to_string(), value.into()));
        }
        self
    }

    /// Append a full row.
    pub fn row<I, K, V>(mut self, row: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Token>,
    {
        self.rows.push(
            row.into_iter()
                .map(|(k, v)| (k.as_ref().to_string(), v.into()))
                .collect(),
        );
        self
    }

    /// Append rows from a JSON object, or an array of objects.
    pub fn json_rows(mut self, value: &JsonValue) -> SqlResult<Self> {
        let objects: Vec<&JsonValue> = match value {
            JsonValue::Array(items) => items.iter().collect(),
            other => vec![other],
        };
        for object in objects {
            let map = object
                .as_object()
                .ok_or_else(|| SqlError::validation("Insert row must be a JSON object"))?;
            let row = map
                .iter()
                .map(|(k, v)| token_from_json(v).map(|t| (k.clone(), t)))
                .collect::<SqlResult<Vec<_>>>()?;
            self.rows.push(row);
        }
        Ok(self)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn build_sql<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        let table = table_sql(compiler, &self.table)?;
        let first = self
            .rows
            .first()
            .filter(|row| !row.is_empty())
            .ok_or_else(|| SqlError::validation("INSERT requires at least one column"))?;

        let mut columns = Vec::with_capacity(first.len());
        for (name, _) in first {
            columns.push(compiler.render(&Token::column(name))?);
        }

        let mut tuples = Vec::with_capacity(self.rows.len());
        for (idx, row) in self.rows.iter().enumerate() {
            if row.len() != first.len() {
                return Err(SqlError::validation(format!(
                    "Insert row {idx} has {} column(s), expected {}",
                    row.len(),
                    first.len()
                )));
            }
            let mut values = Vec::with_capacity(first.len());
            for (name, _) in first {
                let value = row
                    .iter()
                    .find(|(column, _)| column == name)
                    .map(|(_, value)| value)
                    .ok_or_else(|| {
                        SqlError::validation(format!("Insert row {idx} is missing column '{name}'"))
                    })?;
                values.push(compiler.render(value)?);
            }
            tuples.push(format!("({})", values.join(", ")));
        }

        let sql = format!(
            "INSERT INTO {table} ({}) VALUES {}",
            columns.join(", "),
            tuples.join(", ")
        );
        Ok(CompiledStatement::with_kind(sql, StatementKind::Insert))
    }
}

impl BuildStatement for Insert {
    fn build<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        apply_policy(compiler, StatementKind::Insert, self.build_sql(compiler))
    }
}
