//! # sqlmark
//!
//! A marker-annotated SQL predicate compiler and statement runner for
//! MySQL-compatible drivers.
//!
//! ## Features
//!
//! - **Markers**: a `|` suffix decides how a token is emitted (`|c` column,
//!   `|q` raw SQL, `|v` literal, `|b` blank column)
//! - **Declarative predicates**: ordered `WHERE` specs with operators, OR
//!   groups and `?` templates, buildable in code or read from JSON
//! - **Injection guard**: raw fragments with an open string literal are
//!   rejected, or the statement is voided and never sent
//! - **Batches**: several statements in one call, results correlated by label
//! - **Transactions**: commit on `Ok`, rollback on `Err`
//! - **Monitoring**: statement timing and outcomes through `tracing`
//!
//! ## Example
//!
//! ```ignore
//! use sqlmark::{OrSpec, Runner, Token, WhereSpec};
//!
//! let mut runner = Runner::new(driver);
//!
//! // SELECT * FROM `users` WHERE `status` = '1' AND (`username` = 'ann' OR `email` = 'ann')
//! let users = runner.select(
//!     "users",
//!     &WhereSpec::new()
//!         .eq("status", 1)
//!         .or_group(OrSpec::new().any("username", ["ann"]).any("email", ["ann"])),
//! )?;
//!
//! runner.update(
//!     "users",
//!     [("last_seen", Token::value("NOW()|q"))],
//!     &WhereSpec::new().eq("id", 7),
//! )?;
//! ```

pub mod compile;
pub mod driver;
pub mod error;
pub mod marker;
pub mod monitor;
pub mod operator;
pub mod prelude;
pub mod quote;
pub mod row;
pub mod runner;
pub mod spec;
pub mod statement;
pub mod transaction;
pub mod unique_id;

pub use compile::{
    Compiler, InjectionPolicy, Node, Predicate, PredicateGroup, compile_or_group, compile_where,
};
pub use driver::{Driver, DriverRow, ResultHandle};
pub use error::{SqlError, SqlResult};
pub use marker::{Classification, Marker, Position, Token, classify};
pub use monitor::{
    NoopMonitor, QueryContext, QueryMonitor, QueryOutcome, QueryStats, StatsMonitor,
    TracingMonitor,
};
pub use operator::Op;
pub use quote::{Escape, MysqlEscape, escape_mysql, quote_identifier, quote_literal};
pub use row::{FromRecord, Record, RecordExt, Rows, materialize};
pub use runner::{
    BatchOutcome, DEFAULT_MAX_BATCH_RESULTS, ExecutionResult, FailurePolicy, FallbackHandler,
    Runner, RunnerConfig,
};
pub use spec::{Join, Operand, OrEntry, OrItem, OrSpec, SpecValue, WhereSpec};
pub use statement::{
    BuildStatement, CompiledStatement, Delete, Insert, Label, Select, SortDir, StatementKind,
    Update,
};
pub use transaction::TransactionOptions;
pub use unique_id::{
    DEFAULT_MAX_ID_ATTEMPTS, UniqueIdConfig, generate_unique_id, try_generate_unique_id,
};
