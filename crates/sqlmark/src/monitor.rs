//! Statement observability.
//!
//! The runner reports every statement it sends (and every statement it
//! refuses to send) to a [`QueryMonitor`]. [`TracingMonitor`] is the default
//! and emits `tracing` events at target `sqlmark.sql`; [`StatsMonitor`]
//! keeps counters.
//!
//! ```ignore
//! use sqlmark::{Runner, StatsMonitor};
//! use std::sync::Arc;
//!
//! let stats = Arc::new(StatsMonitor::new());
//! let mut runner = Runner::new(driver).with_monitor(stats.clone());
//! runner.run_single("SELECT 1")?;
//! assert_eq!(stats.stats().select_count, 1);
//! ```

use crate::statement::{Label, StatementKind};
use std::fmt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Maximum length for error messages in [`QueryOutcome::Error`].
const MAX_ERROR_LEN: usize = 512;

/// Context of one statement (or batch) handed to the driver.
#[derive(Debug, Clone)]
pub struct QueryContext {
    pub sql: String,
    pub kind: StatementKind,
    /// Number of statements in a batch; 1 for single statements.
    pub statement_count: usize,
    pub labels: Vec<Label>,
}

impl QueryContext {
    pub fn new(sql: &str, kind: StatementKind) -> Self {
        Self {
            sql: sql.to_string(),
            kind,
            statement_count: 1,
            labels: Vec::new(),
        }
    }

    pub fn batch(sql: &str, statement_count: usize, labels: &[Label]) -> Self {
        Self {
            sql: sql.to_string(),
            kind: StatementKind::Raw,
            statement_count,
            labels: labels.to_vec(),
        }
    }

    pub fn is_batch(&self) -> bool {
        self.statement_count > 1 || !self.labels.is_empty()
    }
}

/// What happened to a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// Rows returned.
    Rows(usize),
    /// Rows affected by a mutation.
    Affected(u64),
    /// Result sets received from a batch.
    Batch(usize),
    /// The statement was voided by the injection guard and never sent.
    Voided,
    /// Failure, message truncated to 512 bytes.
    Error(String),
}

impl QueryOutcome {
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        if msg.len() > MAX_ERROR_LEN {
            Self::Error(format!("{}...", truncate_sql_bytes(&msg, MAX_ERROR_LEN)))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryOutcome::Error(_))
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryOutcome::Rows(n) => write!(f, "{n} rows"),
            QueryOutcome::Affected(n) => write!(f, "{n} affected"),
            QueryOutcome::Batch(n) => write!(f, "{n} result sets"),
            QueryOutcome::Voided => f.write_str("voided"),
            QueryOutcome::Error(e) => write!(f, "error: {e}"),
        }
    }
}

/// Trait for observing statement execution.
pub trait QueryMonitor: Send + Sync {
    /// Called before the driver is invoked.
    fn on_query_start(&self, _ctx: &QueryContext) {}

    /// Called after the driver returns, or when a statement is voided.
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome);
}

/// A no-op monitor.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMonitor;

impl QueryMonitor for NoopMonitor {
    fn on_query_complete(&self, _ctx: &QueryContext, _duration: Duration, _outcome: &QueryOutcome) {}
}

/// Emits one `tracing` event per statement at target `sqlmark.sql`.
///
/// Successful statements log at DEBUG, voided ones at WARN, failures at ERROR.
#[derive(Debug, Clone)]
pub struct TracingMonitor {
    /// Truncate long SQL strings (in bytes). `None` means no truncation.
    pub max_sql_length: Option<usize>,
}

impl Default for TracingMonitor {
    fn default() -> Self {
        Self {
            max_sql_length: Some(200),
        }
    }
}

impl TracingMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set maximum SQL length to display.
    pub fn max_sql_length(mut self, len: Option<usize>) -> Self {
        self.max_sql_length = len;
        self
    }

    fn truncate_sql(&self, sql: &str) -> String {
        match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
            _ => sql.to_string(),
        }
    }
}

impl QueryMonitor for TracingMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        let sql = self.truncate_sql(&ctx.sql);
        let elapsed_ms = duration.as_secs_f64() * 1000.0;
        let labels = tracing::field::debug(&ctx.labels);
        match outcome {
            QueryOutcome::Rows(rows) => tracing::debug!(
                target: "sqlmark.sql",
                kind = %ctx.kind,
                rows,
                elapsed_ms,
                sql = %sql,
            ),
            QueryOutcome::Affected(affected) => tracing::debug!(
                target: "sqlmark.sql",
                kind = %ctx.kind,
                affected,
                elapsed_ms,
                sql = %sql,
            ),
            QueryOutcome::Batch(results) => tracing::debug!(
                target: "sqlmark.sql",
                statements = ctx.statement_count,
                results,
                label = labels,
                elapsed_ms,
                sql = %sql,
            ),
            QueryOutcome::Voided => tracing::warn!(
                target: "sqlmark.sql",
                kind = %ctx.kind,
                "statement voided by injection guard, not executed"
            ),
            QueryOutcome::Error(error) => tracing::error!(
                target: "sqlmark.sql",
                kind = %ctx.kind,
                error = %error,
                elapsed_ms,
                sql = %sql,
            ),
        }
    }
}

/// A monitor that counts statements.
#[derive(Debug, Default)]
pub struct StatsMonitor {
    total_queries: AtomicU64,
    failed_queries: AtomicU64,
    voided_queries: AtomicU64,
    batch_count: AtomicU64,
    select_count: AtomicU64,
    insert_count: AtomicU64,
    update_count: AtomicU64,
    delete_count: AtomicU64,
    total_duration_nanos: AtomicU64,
    slowest: Mutex<Option<(Duration, String)>>,
}

/// Snapshot of [`StatsMonitor`] counters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub voided_queries: u64,
    pub batch_count: u64,
    pub select_count: u64,
    pub insert_count: u64,
    pub update_count: u64,
    pub delete_count: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
    pub slowest_query: Option<String>,
}

impl StatsMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of current statistics.
    pub fn stats(&self) -> QueryStats {
        let slowest = self
            .slowest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        QueryStats {
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            voided_queries: self.voided_queries.load(Ordering::Relaxed),
            batch_count: self.batch_count.load(Ordering::Relaxed),
            select_count: self.select_count.load(Ordering::Relaxed),
            insert_count: self.insert_count.load(Ordering::Relaxed),
            update_count: self.update_count.load(Ordering::Relaxed),
            delete_count: self.delete_count.load(Ordering::Relaxed),
            total_duration: Duration::from_nanos(self.total_duration_nanos.load(Ordering::Relaxed)),
            max_duration: slowest.as_ref().map(|(d, _)| *d).unwrap_or_default(),
            slowest_query: slowest.map(|(_, sql)| sql),
        }
    }

    /// Reset all statistics.
    pub fn reset(&self) {
        for counter in [
            &self.total_queries,
            &self.failed_queries,
            &self.voided_queries,
            &self.batch_count,
            &self.select_count,
            &self.insert_count,
            &self.update_count,
            &self.delete_count,
            &self.total_duration_nanos,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        *self
            .slowest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

impl QueryMonitor for StatsMonitor {
    fn on_query_complete(&self, ctx: &QueryContext, duration: Duration, outcome: &QueryOutcome) {
        if matches!(outcome, QueryOutcome::Voided) {
            self.voided_queries.fetch_add(1, Ordering::Relaxed);
            return;
        }

        self.total_queries.fetch_add(1, Ordering::Relaxed);
        let nanos = u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX);
        let prev = self.total_duration_nanos.fetch_add(nanos, Ordering::Relaxed);
        if prev.checked_add(nanos).is_none() {
            self.total_duration_nanos.store(u64::MAX, Ordering::Relaxed);
        }

        let counter = if ctx.is_batch() {
            Some(&self.batch_count)
        } else {
            match ctx.kind {
                StatementKind::Select => Some(&self.select_count),
                StatementKind::Insert => Some(&self.insert_count),
                StatementKind::Update => Some(&self.update_count),
                StatementKind::Delete => Some(&self.delete_count),
                StatementKind::Raw => None,
            }
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        if outcome.is_error() {
            self.failed_queries.fetch_add(1, Ordering::Relaxed);
        }

        let mut slowest = self
            .slowest
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if slowest.as_ref().is_none_or(|(max, _)| duration > *max) {
            *slowest = Some((duration, ctx.sql.clone()));
        }
    }
}

/// Cut `sql` to at most `max_bytes`, on a char boundary.
pub(crate) fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}
