//! Statement runner.
//!
//! A [`Runner`] owns one [`Driver`] and runs compiled statements on it, one at
//! a time. Runners share nothing; use one per connection.
//!
//! # Example
//!
//! ```ignore
//! use sqlmark::{Runner, RunnerConfig, WhereSpec};
//!
//! let mut runner = Runner::with_config(driver, RunnerConfig::new().max_batch_results(5));
//!
//! let users = runner.select("users", &WhereSpec::new().eq("status", 1))?;
//! for user in users.rows.iter() {
//!     println!("{}", user["username"]);
//! }
//!
//! let result = runner.run_batch(&["SELECT 1", "SELECT 2"], &["a".into(), "b".into()], true)?;
//! assert!(result.per_label.contains_key(&"a".into()));
//! ```

mod batch;
mod config;

#[cfg(test)]
mod tests;

pub use batch::BatchOutcome;
pub use config::{DEFAULT_MAX_BATCH_RESULTS, FailurePolicy, FallbackHandler, RunnerConfig};

use crate::compile::Compiler;
use crate::driver::{Driver, ResultHandle};
use crate::error::{SqlError, SqlResult};
use crate::marker::Token;
use crate::monitor::{QueryContext, QueryMonitor, QueryOutcome, TracingMonitor};
use crate::row::{Record, Rows, materialize};
use crate::spec::WhereSpec;
use crate::statement::{
    BuildStatement, CompiledStatement, Delete, Insert, Label, Select, StatementKind, Update,
};
use crate::unique_id::try_generate_unique_id;
use indexmap::IndexMap;
use std::sync::Arc;
use std::time::Instant;

/// What a statement (or batch) produced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionResult {
    /// Rows affected, or returned for row-producing statements.
    pub affected_rows: u64,
    /// Rows of a single row-producing statement; empty for batches.
    pub rows: Rows,
    /// Batch results keyed by label, in statement order (correlated batches only).
    pub per_label: IndexMap<Label, BatchOutcome>,
    /// Row or affected count per statement (uncorrelated batches only).
    pub per_statement: Vec<u64>,
    /// `LAST_INSERT_ID()` after an INSERT.
    pub last_insert_id: Option<u64>,
    /// The statement was voided by the injection guard and never executed.
    pub voided: bool,
}

impl ExecutionResult {
    fn voided() -> Self {
        Self {
            voided: true,
            ..Self::default()
        }
    }

    /// First row, if any.
    pub fn first(&self) -> Option<&Record> {
        self.rows.first()
    }

    /// Last row, if any.
    pub fn last(&self) -> Option<&Record> {
        self.rows.last()
    }

    /// Outcome stored under `label` in a correlated batch.
    pub fn label(&self, label: impl Into<Label>) -> Option<&BatchOutcome> {
        self.per_label.get(&label.into())
    }
}

/// Runs statements on a single owned driver.
pub struct Runner<D: Driver> {
    driver: D,
    config: RunnerConfig,
    monitor: Arc<dyn QueryMonitor>,
}

impl<D: Driver> Runner<D> {
    /// Create a runner with the default configuration.
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, RunnerConfig::default())
    }

    pub fn with_config(driver: D, config: RunnerConfig) -> Self {
        let monitor = Arc::new(TracingMonitor::new().max_sql_length(config.max_sql_log_length));
        Self {
            driver,
            config,
            monitor,
        }
    }

    /// Replace the monitor.
    pub fn with_monitor(mut self, monitor: Arc<dyn QueryMonitor>) -> Self {
        self.monitor = monitor;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// A compiler that escapes with this runner's driver.
    pub fn compiler(&self) -> Compiler<'_, D> {
        Compiler::new(&self.driver).with_policy(self.config.injection_policy)
    }

    /// Build a statement with this runner's compiler.
    pub fn compile<B: BuildStatement>(&self, builder: &B) -> SqlResult<CompiledStatement> {
        builder.build(&self.compiler())
    }

    /// Execute one SQL statement.
    ///
    /// Driver errors surface as [`SqlError::Query`] carrying `sql`. Nothing is retried.
    pub fn run_single(&mut self, sql: &str) -> SqlResult<ExecutionResult> {
        let kind = StatementKind::from_sql(sql);
        self.execute_one(sql, kind)
    }

    /// Execute a compiled statement. Voided statements are skipped.
    pub fn run_statement(&mut self, stmt: &CompiledStatement) -> SqlResult<ExecutionResult> {
        if stmt.is_voided() {
            let ctx = QueryContext::new(stmt.sql(), stmt.kind());
            self.monitor
                .on_query_complete(&ctx, Default::default(), &QueryOutcome::Voided);
            return Ok(ExecutionResult::voided());
        }
        self.execute_one(stmt.sql(), stmt.kind())
    }

    /// Build and execute a statement.
    pub fn execute<B: BuildStatement>(&mut self, builder: &B) -> SqlResult<ExecutionResult> {
        let stmt = self.compile(builder)?;
        self.run_statement(&stmt)
    }

    /// `SELECT * FROM table WHERE spec`.
    pub fn select(&mut self, table: &str, spec: &WhereSpec) -> SqlResult<ExecutionResult> {
        self.execute(&Select::new(table).filter(spec.clone()))
    }

    /// First matching row, fetched with `LIMIT 1`.
    pub fn select_first(&mut self, table: &str, spec: &WhereSpec) -> SqlResult<Option<Record>> {
        let result = self.execute(&Select::new(table).filter(spec.clone()).limit(1))?;
        Ok(result.rows.into_vec().into_iter().next())
    }

    /// Insert one row given as `(column, value)` pairs.
    pub fn insert<I, K, V>(&mut self, table: &str, row: I) -> SqlResult<ExecutionResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Token>,
    {
        self.execute(&Insert::new(table).row(row))
    }

    /// `UPDATE table SET values WHERE spec`.
    pub fn update<I, K, V>(
        &mut self,
        table: &str,
        values: I,
        spec: &WhereSpec,
    ) -> SqlResult<ExecutionResult>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Token>,
    {
        let update = values
            .into_iter()
            .fold(Update::new(table), |update, (k, v)| update.set(k.as_ref(), v))
            .filter(spec.clone());
        self.execute(&update)
    }

    /// `DELETE FROM table WHERE spec`; an empty spec deletes nothing.
    pub fn delete(&mut self, table: &str, spec: &WhereSpec) -> SqlResult<ExecutionResult> {
        self.execute(&Delete::new(table).filter(spec.clone()))
    }

    /// Allocate an id for `table.column` that is not taken yet.
    ///
    /// Existence is checked with `SELECT 1 ... LIMIT 1` per candidate. Returns
    /// `None` when every attempt collides.
    ///
    /// The failure policy does not apply here: a failed or voided existence
    /// check is an error, never a free id.
    pub fn unique_id(&mut self, table: &str, column: &str, seed: &str) -> SqlResult<Option<String>> {
        let config = self.config.unique_id;
        try_generate_unique_id(
            seed,
            config.length,
            |candidate| {
                let probe = self.compile(
                    &Select::new(table)
                        .column(Token::raw("1"))
                        .filter(WhereSpec::new().eq(column, Token::literal(candidate)))
                        .limit(1),
                )?;
                if probe.is_voided() {
                    return Err(SqlError::InjectionSuspected(format!("{table}.{column}")));
                }
                let result = self.try_execute_one(probe.sql(), probe.kind())?;
                Ok(!result.rows.is_empty())
            },
            config.max_attempts,
        )
    }

    /// Close the driver connection.
    pub fn close(&mut self) -> SqlResult<()> {
        self.driver.close()
    }

    fn execute_one(&mut self, sql: &str, kind: StatementKind) -> SqlResult<ExecutionResult> {
        self.try_execute_one(sql, kind).or_else(|err| self.fail(err))
    }

    /// Run one statement without applying the failure policy.
    fn try_execute_one(&mut self, sql: &str, kind: StatementKind) -> SqlResult<ExecutionResult> {
        let ctx = QueryContext::new(sql, kind);
        self.monitor.on_query_start(&ctx);
        let start = Instant::now();

        match self.driver.execute(sql) {
            Ok(handle) => {
                let result = self.result_from_handle(handle, kind);
                let outcome = if result.rows.is_empty() && kind != StatementKind::Select {
                    QueryOutcome::Affected(result.affected_rows)
                } else {
                    QueryOutcome::Rows(result.rows.len())
                };
                self.monitor
                    .on_query_complete(&ctx, start.elapsed(), &outcome);
                Ok(result)
            }
            Err(err) => {
                let err = attach_sql(err, sql);
                self.monitor.on_query_complete(
                    &ctx,
                    start.elapsed(),
                    &QueryOutcome::error(err.to_string()),
                );
                Err(err)
            }
        }
    }

    fn result_from_handle(&self, handle: ResultHandle, kind: StatementKind) -> ExecutionResult {
        let mut result = ExecutionResult::default();
        match handle {
            ResultHandle::Rows(rows) => {
                result.rows = materialize(rows);
                result.affected_rows = result.rows.len() as u64;
            }
            ResultHandle::Affected(n) => result.affected_rows = n,
            ResultHandle::Empty => result.affected_rows = self.driver.affected_rows(),
        }
        if kind == StatementKind::Insert {
            result.last_insert_id = Some(self.driver.last_insert_id());
        }
        result
    }

    /// Apply the failure policy to an error.
    fn fail(&self, err: SqlError) -> SqlResult<ExecutionResult> {
        match &self.config.failure_policy {
            FailurePolicy::Fallback(handler) if err.is_driver_error() => Ok(handler(&err)),
            _ => Err(err),
        }
    }
}

/// Make sure a driver error names the statement that failed.
fn attach_sql(err: SqlError, sql: &str) -> SqlError {
    match err {
        SqlError::Query { message, .. } => SqlError::query(sql, message),
        other => other,
    }
}
