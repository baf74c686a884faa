//! Transaction wrapper.
//!
//! [`Runner::with_transaction`] runs a closure between `BEGIN` and
//! `COMMIT`/`ROLLBACK`:
//!
//! - `Ok(_)` commits exactly once;
//! - `Err(_)` rolls back and returns the closure's error unchanged;
//! - a failing rollback is reported as [`SqlError::Transaction`] carrying
//!   both messages.
//!
//! # Example
//!
//! ```ignore
//! use sqlmark::{SqlError, Token, WhereSpec};
//!
//! let order_id = runner.with_transaction(|tx| {
//!     let order = tx.insert("orders", [("user_id", 7)])?;
//!     tx.update(
//!         "users",
//!         [("order_count", Token::value("`order_count` + 1|q"))],
//!         &WhereSpec::new().eq("id", 7),
//!     )?;
//!     Ok::<_, SqlError>(order.last_insert_id)
//! })?;
//! ```

use crate::driver::Driver;
use crate::error::SqlError;
use crate::runner::Runner;
use std::fmt::Display;

/// Options for [`Runner::with_transaction_opts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionOptions {
    /// Close the connection once the transaction has finished.
    pub close_after: bool,
}

impl TransactionOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn close_after(mut self, close: bool) -> Self {
        self.close_after = close;
        self
    }
}

impl<D: Driver> Runner<D> {
    /// Run `f` inside a transaction, using the runner's configured options.
    pub fn with_transaction<T, E, F>(&mut self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<SqlError> + Display,
    {
        let opts = TransactionOptions::new().close_after(self.config().close_after_transaction);
        self.with_transaction_opts(opts, f)
    }

    /// Run `f` inside a transaction with explicit options.
    pub fn with_transaction_opts<T, E, F>(&mut self, opts: TransactionOptions, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<SqlError> + Display,
    {
        self.driver_mut().begin()?;
        tracing::debug!(target: "sqlmark.sql", "transaction started");

        let outcome = match f(self) {
            Ok(value) => self.driver_mut().commit().map(|()| value).map_err(E::from),
            Err(error) => match self.driver_mut().rollback() {
                Ok(()) => {
                    tracing::debug!(target: "sqlmark.sql", error = %error, "transaction rolled back");
                    Err(error)
                }
                Err(rollback_err) => Err(E::from(SqlError::Transaction(format!(
                    "{error} (rollback failed: {rollback_err})"
                )))),
            },
        };

        if opts.close_after {
            if let Err(e) = self.close() {
                tracing::warn!(target: "sqlmark.sql", error = %e, "closing connection after transaction failed");
            }
        }
        outcome
    }
}
