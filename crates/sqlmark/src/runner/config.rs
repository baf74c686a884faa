use super::ExecutionResult;
use crate::compile::InjectionPolicy;
use crate::error::SqlError;
use crate::unique_id::UniqueIdConfig;
use std::fmt;
use std::sync::Arc;

/// Upper bound on result sets read from one batch.
pub const DEFAULT_MAX_BATCH_RESULTS: usize = 10;

/// Handler that turns a driver error into a substitute result.
pub type FallbackHandler = Arc<dyn Fn(&SqlError) -> ExecutionResult + Send + Sync>;

/// What the runner does with driver-level errors.
///
/// Compile-time errors (bad operators, label mismatches, ...) are always
/// raised; only [`SqlError::Query`] and [`SqlError::Connection`] are
/// routed through a fallback.
#[derive(Clone, Default)]
pub enum FailurePolicy {
    #[default]
    Raise,
    Fallback(FallbackHandler),
}

impl FailurePolicy {
    pub fn fallback<F>(handler: F) -> Self
    where
        F: Fn(&SqlError) -> ExecutionResult + Send + Sync + 'static,
    {
        FailurePolicy::Fallback(Arc::new(handler))
    }
}

impl fmt::Debug for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Raise => f.write_str("Raise"),
            FailurePolicy::Fallback(_) => f.write_str("Fallback(..)"),
        }
    }
}

/// Configuration for [`Runner`](super::Runner).
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// What to do with fragments that fail the injection guard.
    pub injection_policy: InjectionPolicy,
    /// Batches with more statements than this are rejected before execution.
    pub max_batch_results: usize,
    /// Close the connection after every transaction.
    pub close_after_transaction: bool,
    pub failure_policy: FailurePolicy,
    /// Truncate SQL in log events (bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
    pub unique_id: UniqueIdConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            injection_policy: InjectionPolicy::Raise,
            max_batch_results: DEFAULT_MAX_BATCH_RESULTS,
            close_after_transaction: false,
            failure_policy: FailurePolicy::Raise,
            max_sql_log_length: Some(200),
            unique_id: UniqueIdConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn injection_policy(mut self, policy: InjectionPolicy) -> Self {
        self.injection_policy = policy;
        self
    }

    /// Void suspicious statements instead of raising.
    pub fn void_on_injection(mut self) -> Self {
        self.injection_policy = InjectionPolicy::VoidQuery;
        self
    }

    pub fn max_batch_results(mut self, max: usize) -> Self {
        self.max_batch_results = max;
        self
    }

    pub fn close_after_transaction(mut self, close: bool) -> Self {
        self.close_after_transaction = close;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Replace driver errors with the handler's result.
    pub fn on_failure<F>(mut self, handler: F) -> Self
    where
        F: Fn(&SqlError) -> ExecutionResult + Send + Sync + 'static,
    {
        self.failure_policy = FailurePolicy::fallback(handler);
        self
    }

    pub fn max_sql_log_length(mut self, len: Option<usize>) -> Self {
        self.max_sql_log_length = len;
        self
    }

    pub fn unique_id(mut self, config: UniqueIdConfig) -> Self {
        self.unique_id = config;
        self
    }
}
