//! Recording driver shared by the integration tests.

#![allow(dead_code)]

use sqlmark::{Driver, DriverRow, ResultHandle, SqlError, SqlResult};
use std::collections::VecDeque;

/// A scripted in-memory driver that records every call.
///
/// `execute` pops from `responses` (default: no rows); `execute_batch` pops
/// from `batch_responses` (default: one empty result set per statement).
#[derive(Debug, Default)]
pub struct MockDriver {
    pub executed: Vec<String>,
    pub batches: Vec<String>,
    pub responses: VecDeque<SqlResult<ResultHandle>>,
    pub batch_responses: VecDeque<SqlResult<Vec<ResultHandle>>>,
    pub error_after_batch: String,
    pub insert_id: u64,
    pub begins: usize,
    pub commits: usize,
    pub rollbacks: usize,
    pub closes: usize,
    pub fail_rollback: bool,
    last_error: String,
}

impl MockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, response: SqlResult<ResultHandle>) -> Self {
        self.responses.push_back(response);
        self
    }

    pub fn respond_rows(self, rows: Vec<DriverRow>) -> Self {
        self.respond(Ok(ResultHandle::Rows(rows)))
    }

    pub fn respond_batch(mut self, response: SqlResult<Vec<ResultHandle>>) -> Self {
        self.batch_responses.push_back(response);
        self
    }

    /// Total number of calls that reached the database.
    pub fn calls(&self) -> usize {
        self.executed.len() + self.batches.len() + self.begins + self.commits + self.rollbacks
    }
}

pub fn row(pairs: &[(&str, serde_json::Value)]) -> DriverRow {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

impl Driver for MockDriver {
    fn execute(&mut self, sql: &str) -> SqlResult<ResultHandle> {
        self.executed.push(sql.to_string());
        let response = self
            .responses
            .pop_front()
            .unwrap_or(Ok(ResultHandle::Rows(Vec::new())));
        self.last_error = match &response {
            Err(e) => e.to_string(),
            Ok(_) => String::new(),
        };
        response
    }

    fn execute_batch(&mut self, sql: &str) -> SqlResult<Vec<ResultHandle>> {
        self.batches.push(sql.to_string());
        self.last_error = self.error_after_batch.clone();
        self.batch_responses
            .pop_front()
            .unwrap_or_else(|| Ok(sql.split(';').map(|_| ResultHandle::Empty).collect()))
    }

    fn last_insert_id(&self) -> u64 {
        self.insert_id
    }

    fn affected_rows(&self) -> u64 {
        0
    }

    fn last_error(&self) -> String {
        self.last_error.clone()
    }

    fn begin(&mut self) -> SqlResult<()> {
        self.begins += 1;
        Ok(())
    }

    fn commit(&mut self) -> SqlResult<()> {
        self.commits += 1;
        Ok(())
    }

    fn rollback(&mut self) -> SqlResult<()> {
        self.rollbacks += 1;
        if self.fail_rollback {
            return Err(SqlError::Connection("server has gone away".into()));
        }
        Ok(())
    }

    fn close(&mut self) -> SqlResult<()> {
        self.closes += 1;
        Ok(())
    }
}
