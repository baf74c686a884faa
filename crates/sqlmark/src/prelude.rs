//! Convenient imports for typical `sqlmark` usage.
//!
//! ```ignore
//! use sqlmark::prelude::*;
//! ```

pub use crate::{
    BuildStatement, Delete, Driver, ExecutionResult, Insert, Label, OrSpec, RecordExt, Rows,
    Runner, RunnerConfig, Select, SqlError, SqlResult, Token, Update, WhereSpec,
};
