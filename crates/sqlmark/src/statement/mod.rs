//! Statement assembly.
//!
//! Builders produce a [`CompiledStatement`] through a [`Compiler`], so the
//! statement text is escaped with the same routine the runner's driver uses.
//!
//! ```ignore
//! use sqlmark::{Select, WhereSpec, BuildStatement};
//!
//! let stmt = Select::new("users")
//!     .columns(["id", "username"])
//!     .filter(WhereSpec::new().eq("status", 1))
//!     .order_by_desc("created_at")
//!     .limit(10)
//!     .to_statement()?;
//! assert_eq!(
//!     stmt.sql(),
//!     "SELECT `id`, `username` FROM `users` WHERE `status` = '1' ORDER BY `created_at` DESC LIMIT 10"
//! );
//! ```

mod delete;
mod insert;
mod select;
mod update;

#[cfg(test)]
mod tests;

pub use delete::Delete;
pub use insert::Insert;
pub use select::{Select, SortDir};
pub use update::Update;

use crate::compile::{Compiler, InjectionPolicy};
use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use crate::quote::{Escape, MysqlEscape};
use std::fmt;

/// The kind of SQL statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    /// Anything else (DDL, `SET`, batches, ...).
    #[default]
    Raw,
}

impl StatementKind {
    /// Detect the statement kind from SQL text.
    ///
    /// Leading whitespace, comments and opening parentheses are skipped.
    pub fn from_sql(sql: &str) -> Self {
        let trimmed = strip_sql_prefix(sql);
        if starts_with_keyword(trimmed, "SELECT") {
            StatementKind::Select
        } else if starts_with_keyword(trimmed, "INSERT") || starts_with_keyword(trimmed, "REPLACE") {
            StatementKind::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            StatementKind::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Raw
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Raw => "RAW",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn strip_sql_prefix(sql: &str) -> &str {
    let mut s = sql;
    loop {
        let before = s;
        s = s.trim_start();
        if s.starts_with("--") || s.starts_with('#') {
            match s.find('\n') {
                Some(pos) => {
                    s = &s[pos + 1..];
                    continue;
                }
                None => return "",
            }
        }
        if s.starts_with("/*") {
            match s.find("*/") {
                Some(pos) => {
                    s = &s[pos + 2..];
                    continue;
                }
                None => return "",
            }
        }
        if let Some(rest) = s.strip_prefix('(') {
            s = rest;
            continue;
        }
        if s == before {
            return s;
        }
    }
}

fn starts_with_keyword(s: &str, keyword: &str) -> bool {
    s.get(..keyword.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(keyword))
        && s[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'))
}

/// A batch result label: a caller-supplied name or a 0-based position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Label {
    Name(String),
    Index(usize),
}

impl Label {
    /// Whether this is an empty name (stripped from the tail of a batch).
    pub fn is_empty(&self) -> bool {
        matches!(self, Label::Name(name) if name.trim().is_empty())
    }
}

impl From<&str> for Label {
    fn from(value: &str) -> Self {
        Label::Name(value.to_string())
    }
}

impl From<String> for Label {
    fn from(value: String) -> Self {
        Label::Name(value)
    }
}

impl From<usize> for Label {
    fn from(value: usize) -> Self {
        Label::Index(value)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Name(name) => f.write_str(name),
            Label::Index(idx) => write!(f, "{idx}"),
        }
    }
}

/// A finished statement, owned by whoever runs it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStatement {
    sql: String,
    kind: StatementKind,
    labels: Vec<Label>,
    voided: bool,
}

impl CompiledStatement {
    /// Wrap SQL text, detecting its kind.
    pub fn new(sql: impl Into<String>) -> Self {
        let sql = sql.into();
        let kind = StatementKind::from_sql(&sql);
        Self::with_kind(sql, kind)
    }

    pub fn with_kind(sql: impl Into<String>, kind: StatementKind) -> Self {
        Self {
            sql: sql.into(),
            kind,
            labels: Vec::new(),
            voided: false,
        }
    }

    /// A `;`-joined batch with its result labels.
    pub fn batch<S: AsRef<str>>(statements: &[S], labels: Vec<Label>) -> Self {
        let sql = statements
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(";");
        Self {
            sql,
            kind: StatementKind::Raw,
            labels,
            voided: false,
        }
    }

    /// A statement whose predicates were voided; it must not run.
    pub fn voided(kind: StatementKind) -> Self {
        Self {
            sql: String::new(),
            kind,
            labels: Vec::new(),
            voided: true,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn kind(&self) -> StatementKind {
        self.kind
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn is_voided(&self) -> bool {
        self.voided
    }

    pub fn into_sql(self) -> String {
        self.sql
    }
}

impl fmt::Display for CompiledStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Trait for statement builders.
pub trait BuildStatement {
    /// Build the statement with `compiler`'s escaping and injection policy.
    fn build<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement>;

    /// Build with MySQL escaping and the default policy.
    fn to_statement(&self) -> SqlResult<CompiledStatement> {
        self.build(&Compiler::new(&MysqlEscape))
    }

    /// Debug helper: the SQL text, or the error message.
    fn to_sql(&self) -> String {
        match self.to_statement() {
            Ok(stmt) => stmt.into_sql(),
            Err(e) => format!("/* {e} */"),
        }
    }
}

/// Render a table name, which must not be blank.
fn table_sql<E: Escape + ?Sized>(compiler: &Compiler<'_, E>, table: &Token) -> SqlResult<String> {
    if table.is_blank() || table.text().trim().is_empty() {
        return Err(SqlError::validation("Table name cannot be empty"));
    }
    compiler.render(table)
}

/// Void a statement whose build tripped the injection guard, when the
/// compiler's policy says so.
fn apply_policy<E: Escape + ?Sized>(
    compiler: &Compiler<'_, E>,
    kind: StatementKind,
    built: SqlResult<CompiledStatement>,
) -> SqlResult<CompiledStatement> {
    match built {
        Err(SqlError::InjectionSuspected(fragment))
            if compiler.policy() == InjectionPolicy::VoidQuery =>
        {
            tracing::warn!(
                target: "sqlmark.sql",
                kind = %kind,
                fragment = %fragment,
                "unescaped quote in fragment, statement voided"
            );
            Ok(CompiledStatement::voided(kind))
        }
        other => other,
    }
}
