//! Multi-statement execution with label correlation.

use super::{ExecutionResult, Runner, attach_sql};
use crate::driver::{Driver, ResultHandle};
use crate::error::{SqlError, SqlResult};
use crate::monitor::{QueryContext, QueryOutcome};
use crate::row::{Record, materialize};
use crate::statement::{CompiledStatement, Label};
use std::time::Instant;

/// Result of one statement inside a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    /// Rows of a row-producing statement.
    Rows(Vec<Record>),
    /// Rows affected by a mutation.
    Count(u64),
    /// The statement completed without a result set.
    Done,
}

impl BatchOutcome {
    /// Row count, affected count, or 0.
    pub fn count(&self) -> u64 {
        match self {
            BatchOutcome::Rows(rows) => rows.len() as u64,
            BatchOutcome::Count(n) => *n,
            BatchOutcome::Done => 0,
        }
    }

    pub fn rows(&self) -> Option<&[Record]> {
        match self {
            BatchOutcome::Rows(rows) => Some(rows),
            _ => None,
        }
    }
}

impl From<ResultHandle> for BatchOutcome {
    fn from(handle: ResultHandle) -> Self {
        match handle {
            ResultHandle::Rows(rows) => BatchOutcome::Rows(materialize(rows).into_vec()),
            ResultHandle::Affected(n) => BatchOutcome::Count(n),
            ResultHandle::Empty => BatchOutcome::Done,
        }
    }
}

impl<D: Driver> Runner<D> {
    /// Execute `statements` joined with `;` as one multi-statement call.
    ///
    /// - Trailing empty statements and labels are dropped first.
    /// - With `correlate` and a non-empty `labels`, the two lists must have
    ///   the same length, else [`SqlError::LabelCountMismatch`] is raised
    ///   before anything runs.
    /// - More statements than
    ///   [`max_batch_results`](crate::runner::RunnerConfig::max_batch_results)
    ///   fail with [`SqlError::Validation`] before anything runs; the limit
    ///   defaults to [`DEFAULT_MAX_BATCH_RESULTS`](crate::runner::DEFAULT_MAX_BATCH_RESULTS).
    /// - With `correlate`, each result is stored under its label (or its
    ///   0-based index when no labels are given) in
    ///   [`ExecutionResult::per_label`]; otherwise only per-statement counts
    ///   are kept.
    pub fn run_batch<S: AsRef<str>>(
        &mut self,
        statements: &[S],
        labels: &[Label],
        correlate: bool,
    ) -> SqlResult<ExecutionResult> {
        let statements = trim_statements(statements);
        let labels = trim_labels(labels);

        if correlate && !labels.is_empty() && labels.len() != statements.len() {
            return Err(SqlError::LabelCountMismatch {
                labels: labels.len(),
                statements: statements.len(),
            });
        }
        if statements.is_empty() {
            return Ok(ExecutionResult::default());
        }
        if statements.len() > self.config.max_batch_results {
            return Err(SqlError::validation(format!(
                "Batch of {} statements exceeds the limit of {} result sets",
                statements.len(),
                self.config.max_batch_results
            )));
        }

        let batch = CompiledStatement::batch(statements, labels.to_vec());
        let ctx = QueryContext::batch(batch.sql(), statements.len(), batch.labels());
        self.monitor.on_query_start(&ctx);
        let start = Instant::now();

        let handles = match self.driver.execute_batch(batch.sql()) {
            Ok(handles) => handles,
            Err(err) => {
                let err = attach_sql(err, batch.sql());
                self.monitor.on_query_complete(
                    &ctx,
                    start.elapsed(),
                    &QueryOutcome::error(err.to_string()),
                );
                return self.fail(err);
            }
        };

        let received = handles.len().min(statements.len());
        let mut handles = handles.into_iter();
        let mut result = ExecutionResult::default();
        for (idx, statement) in statements.iter().enumerate() {
            let outcome = match handles.next() {
                Some(handle) => BatchOutcome::from(handle),
                None => {
                    let message = self.driver.last_error();
                    if !message.is_empty() {
                        let err = SqlError::query(statement.as_ref(), message);
                        self.monitor.on_query_complete(
                            &ctx,
                            start.elapsed(),
                            &QueryOutcome::error(err.to_string()),
                        );
                        return self.fail(err);
                    }
                    BatchOutcome::Done
                }
            };

            result.affected_rows += outcome.count();
            if correlate {
                let label = labels.get(idx).cloned().unwrap_or(Label::Index(idx));
                result.per_label.insert(label, outcome);
            } else {
                result.per_statement.push(outcome.count());
            }
        }

        self.monitor
            .on_query_complete(&ctx, start.elapsed(), &QueryOutcome::Batch(received));
        Ok(result)
    }
}

fn trim_statements<S: AsRef<str>>(statements: &[S]) -> &[S] {
    let len = statements
        .iter()
        .rposition(|s| !s.as_ref().trim().is_empty())
        .map_or(0, |pos| pos + 1);
    &statements[..len]
}

fn trim_labels(labels: &[Label]) -> &[Label] {
    let len = labels
        .iter()
        .rposition(|l| !l.is_empty())
        .map_or(0, |pos| pos + 1);
    &labels[..len]
}
