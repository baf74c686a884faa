use super::{BuildStatement, CompiledStatement, StatementKind, apply_policy, table_sql};
use crate::compile::Compiler;
use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use crate::quote::Escape;
use crate::spec::WhereSpec;

/// UPDATE statement builder.
///
/// `SET` values built with [`Token::value`] follow the marker rules:
/// `Token::value("hits + 1|q")` is raw SQL and `Token::value("other.col|c")`
/// is a column reference. Plain strings are always literals.
#[derive(Debug, Clone)]
pub struct Update {
    table: Token,
    assignments: Vec<(Token, Token)>,
    filter: WhereSpec,
}

impl Update {
    pub fn new(table: &str) -> Self {
        Self {
            table: Token::column(table),
            assignments: Vec::new(),
            filter: WhereSpec::new(),
        }
    }

    /// Add a `column = value` assignment.
    pub fn set(mut self, column: &str, value: impl Into<Token>) -> Self {
        self.assignments.push((Token::column(column), value.into()));
        self
    }

    /// Set the WHERE spec.
    pub fn filter(mut self, spec: WhereSpec) -> Self {
        self.filter = spec;
        self
    }

    fn build_sql<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        let table = table_sql(compiler, &self.table)?;
        if self.assignments.is_empty() {
            return Err(SqlError::validation("UPDATE requires at least one SET"));
        }

        let mut sets = Vec::with_capacity(self.assignments.len());
        for (column, value) in &self.assignments {
            sets.push(format!(
                "{} = {}",
                compiler.render(column)?,
                compiler.render(value)?
            ));
        }

        let group = compiler.compile_where(&self.filter)?;
        if group.is_voided() {
            return Ok(CompiledStatement::voided(StatementKind::Update));
        }

        let mut sql = format!("UPDATE {table} SET {}", sets.join(", "));
        let clause = group.to_where_clause();
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }
        Ok(CompiledStatement::with_kind(sql, StatementKind::Update))
    }
}

impl BuildStatement for Update {
    fn build<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        apply_policy(compiler, StatementKind::Update, self.build_sql(compiler))
    }
}
