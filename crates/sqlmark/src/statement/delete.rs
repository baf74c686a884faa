use super::{BuildStatement, CompiledStatement, StatementKind, apply_policy, table_sql};
use crate::compile::Compiler;
use crate::error::SqlResult;
use crate::marker::Token;
use crate::quote::Escape;
use crate::spec::WhereSpec;

/// DELETE statement builder.
///
/// Without a WHERE spec the statement is a safe no-op (`WHERE 1=0`) unless
/// [`Delete::allow_all`] was called.
#[derive(Debug, Clone)]
pub struct Delete {
    table: Token,
    filter: WhereSpec,
    allow_delete_all: bool,
}

impl Delete {
    pub fn new(table: &str) -> Self {
        Self {
            table: Token::column(table),
            filter: WhereSpec::new(),
            allow_delete_all: false,
        }
    }

    /// Set the WHERE spec.
    pub fn filter(mut self, spec: WhereSpec) -> Self {
        self.filter = spec;
        self
    }

    /// Allow deleting every row when no predicate is given.
    pub fn allow_all(mut self) -> Self {
        self.allow_delete_all = true;
        self
    }

    fn build_sql<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        let table = table_sql(compiler, &self.table)?;
        let group = compiler.compile_where(&self.filter)?;
        if group.is_voided() {
            return Ok(CompiledStatement::voided(StatementKind::Delete));
        }

        let sql = if !group.is_empty() {
            format!("DELETE FROM {table} {}", group.to_where_clause())
        } else if self.allow_delete_all {
            format!("DELETE FROM {table}")
        } else {
            format!("DELETE FROM {table} WHERE 1=0")
        };
        Ok(CompiledStatement::with_kind(sql, StatementKind::Delete))
    }
}

impl BuildStatement for Delete {
    fn build<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        apply_policy(compiler, StatementKind::Delete, self.build_sql(compiler))
    }
}
