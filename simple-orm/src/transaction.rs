//! # Transaction Module
//!
//! Nestable transactions over one dedicated connector.
//!
//! A [`Transaction`] counts how deeply it is entered. `BEGIN` is sent only
//! when the depth goes from 0 to 1, and `COMMIT` or `ROLLBACK` only when it
//! returns to 0, so helpers that open their own transaction compose with
//! callers that already did. A failure at any depth makes the outermost end
//! roll back.
//!
//! Transactions are connectors, so they can be handed to any operation as
//! its `transaction` option.
//!
//! ## Example
//!
//! ```rust,ignore
//! db.perform_transaction(|tx| async move {
//!     let users = schema.model("users")?;
//!     users.insert(InsertOptions::row(row).transaction(tx.clone())).await?;
//!     users.update(UpdateOptions::new().set("name", "x").transaction(tx)).await?;
//!     Ok(())
//! })
//! .await?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{fmt, future::Future, sync::Arc};

use async_trait::async_trait;
use futures::lock::Mutex;
use log::info;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    connector::{Connector, ExecResult},
    errors::{Error, Result},
    format::Dialect,
    query::ControlStatement,
    value::Row,
};

#[derive(Debug, Default)]
struct State {
    depth: usize,
    failed: bool,
}

/// A transaction on a dedicated connector.
pub struct Transaction {
    connector: Arc<dyn Connector>,
    state: Mutex<State>,
}

impl Transaction {
    /// Wraps a connector that no other caller uses concurrently.
    pub fn new(connector: Arc<dyn Connector>) -> Arc<Self> {
        Arc::new(Self {
            connector,
            state: Mutex::new(State::default()),
        })
    }

    pub async fn depth(&self) -> usize {
        self.state.lock().await.depth
    }

    /// Enters the transaction, sending `BEGIN` on the first entry.
    pub async fn begin(&self) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.depth == 0 {
            self.connector.control(ControlStatement::Begin).await?;
            state.failed = false;
            info!("transaction started");
        }
        state.depth += 1;
        Ok(())
    }

    /// Leaves the transaction. On the last exit, sends `ROLLBACK` if this
    /// or any nested level failed, `COMMIT` otherwise.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgument`] when the transaction was not entered.
    pub async fn end(&self, failed: bool) -> Result<()> {
        let mut state = self.state.lock().await;
        if state.depth == 0 {
            return Err(Error::invalid_argument("transaction ended more times than it began"));
        }

        state.failed |= failed;
        state.depth -= 1;
        if state.depth == 0 {
            if state.failed {
                self.connector.control(ControlStatement::Rollback).await?;
                info!("transaction rolled back");
            } else {
                self.connector.control(ControlStatement::Commit).await?;
                info!("transaction committed");
            }
        }
        Ok(())
    }

    /// Runs `op` inside the transaction.
    ///
    /// The operation's error is returned after the transaction was ended as
    /// failed.
    pub async fn perform<F, Fut, T>(self: &Arc<Self>, op: F) -> Result<T>
    where
        F: FnOnce(Arc<Transaction>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.begin().await?;
        match op(Arc::clone(self)).await {
            Ok(value) => {
                self.end(false).await?;
                Ok(value)
            }
            Err(e) => {
                self.end(true).await?;
                Err(e)
            }
        }
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction").finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for Transaction {
    fn dialect(&self) -> &dyn Dialect {
        self.connector.dialect()
    }

    async fn fetch_sql(&self, sql: &str) -> Result<Vec<Row>> {
        self.connector.fetch_sql(sql).await
    }

    async fn execute_sql(&self, sql: &str) -> Result<ExecResult> {
        self.connector.execute_sql(sql).await
    }
}
