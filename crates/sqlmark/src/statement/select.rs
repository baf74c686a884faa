use super::{BuildStatement, CompiledStatement, StatementKind, apply_policy, table_sql};
use crate::compile::Compiler;
use crate::error::SqlResult;
use crate::marker::Token;
use crate::quote::Escape;
use crate::spec::WhereSpec;

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl SortDir {
    pub fn keyword(self) -> &'static str {
        match self {
            SortDir::Asc => "ASC",
            SortDir::Desc => "DESC",
        }
    }
}

/// SELECT statement builder.
///
/// Column and table strings accept markers: `"COUNT(*) AS n|q"` is emitted
/// verbatim, `"u.name"` becomes `` `u`.`name` ``.
#[derive(Debug, Clone)]
pub struct Select {
    table: Token,
    columns: Vec<Token>,
    filter: WhereSpec,
    order_by: Vec<(Token, SortDir)>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Select {
    pub fn new(table: &str) -> Self {
        Self {
            table: Token::column(table),
            columns: Vec::new(),
            filter: WhereSpec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Replace the column list. An empty list selects `*`.
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.columns = columns
            .into_iter()
            .map(|c| Token::column(c.as_ref()))
            .collect();
        self
    }

    /// Append one column.
    pub fn column(mut self, column: Token) -> Self {
        self.columns.push(column);
        self
    }

    /// Set the WHERE spec.
    pub fn filter(mut self, spec: WhereSpec) -> Self {
        self.filter = spec;
        self
    }

    pub fn order_by(mut self, column: &str) -> Self {
        self.order_by.push((Token::column(column), SortDir::Asc));
        self
    }

    pub fn order_by_desc(mut self, column: &str) -> Self {
        self.order_by.push((Token::column(column), SortDir::Desc));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn where_spec(&self) -> &WhereSpec {
        &self.filter
    }

    fn build_sql<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        let table = table_sql(compiler, &self.table)?;
        let group = compiler.compile_where(&self.filter)?;
        if group.is_voided() {
            return Ok(CompiledStatement::voided(StatementKind::Select));
        }

        let mut columns = Vec::with_capacity(self.columns.len());
        for column in self.columns.iter().filter(|c| !c.is_blank()) {
            columns.push(compiler.render(column)?);
        }

        let mut sql = String::from("SELECT ");
        if columns.is_empty() {
            sql.push('*');
        } else {
            sql.push_str(&columns.join(", "));
        }
        sql.push_str(" FROM ");
        sql.push_str(&table);

        let clause = group.to_where_clause();
        if !clause.is_empty() {
            sql.push(' ');
            sql.push_str(&clause);
        }

        if !self.order_by.is_empty() {
            let mut parts = Vec::with_capacity(self.order_by.len());
            for (column, dir) in &self.order_by {
                parts.push(format!("{} {}", compiler.render(column)?, dir.keyword()));
            }
            sql.push_str(" ORDER BY ");
            sql.push_str(&parts.join(", "));
        }

        match (self.limit, self.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // MySQL has no OFFSET without LIMIT.
            (None, Some(offset)) => {
                sql.push_str(&format!(" LIMIT 18446744073709551615 OFFSET {offset}"))
            }
            (None, None) => {}
        }

        Ok(CompiledStatement::with_kind(sql, StatementKind::Select))
    }
}

impl BuildStatement for Select {
    fn build<E: Escape + ?Sized>(&self, compiler: &Compiler<'_, E>) -> SqlResult<CompiledStatement> {
        apply_policy(compiler, StatementKind::Select, self.build_sql(compiler))
    }
}
