//! # Connector Module
//!
//! The seam between statement building and execution. A [`Connector`] only
//! has to run raw SQL; formatting statements through its dialect and logging
//! the SQL are provided.
//!
//! [`crate::Database`] implements it over a sqlx pool and
//! [`crate::Transaction`] over one dedicated connection. Tests implement it
//! with an in-memory recorder.

// ============================================================================
// External Crate Imports
// ============================================================================

use async_trait::async_trait;
use log::debug;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    errors::Result,
    format::{Dialect, Formatter},
    query::{ControlStatement, DeleteStatement, InsertStatement, Query, Statement, UpdateStatement},
    value::Row,
};

/// Log target of every statement sent to a database.
pub const SQL_LOG_TARGET: &str = "simple_orm::sql";

/// Outcome of a statement that returns no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub affected_rows: u64,
    pub last_insert_id: u64,
}

/// Something able to run SQL.
#[async_trait]
pub trait Connector: Send + Sync {
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a statement returning rows.
    async fn fetch_sql(&self, sql: &str) -> Result<Vec<Row>>;

    /// Runs a statement returning no rows.
    async fn execute_sql(&self, sql: &str) -> Result<ExecResult>;

    fn formatter(&self) -> Formatter<'_> {
        Formatter::new(self.dialect())
    }

    async fn query(&self, query: &Query) -> Result<Vec<Row>> {
        let sql = self.formatter().query(query);
        debug!(target: SQL_LOG_TARGET, "{}", sql);
        self.fetch_sql(&sql).await
    }

    async fn insert(&self, insert: &InsertStatement) -> Result<ExecResult> {
        let sql = self.formatter().insert(insert);
        debug!(target: SQL_LOG_TARGET, "{}", sql);
        self.execute_sql(&sql).await
    }

    async fn update(&self, update: &UpdateStatement) -> Result<ExecResult> {
        let sql = self.formatter().update(update);
        debug!(target: SQL_LOG_TARGET, "{}", sql);
        self.execute_sql(&sql).await
    }

    async fn delete(&self, delete: &DeleteStatement) -> Result<ExecResult> {
        let sql = self.formatter().delete(delete);
        debug!(target: SQL_LOG_TARGET, "{}", sql);
        self.execute_sql(&sql).await
    }

    async fn control(&self, control: ControlStatement) -> Result<ExecResult> {
        let sql = self.formatter().control(control);
        debug!(target: SQL_LOG_TARGET, "{}", sql);
        self.execute_sql(&sql).await
    }

    /// Runs any statement. Rows are returned for queries only.
    async fn exec(&self, statement: &Statement) -> Result<Vec<Row>> {
        match statement {
            Statement::Query(query) => self.query(query).await,
            Statement::Insert(insert) => self.insert(insert).await.map(|_| Vec::new()),
            Statement::Update(update) => self.update(update).await.map(|_| Vec::new()),
            Statement::Delete(delete) => self.delete(delete).await.map(|_| Vec::new()),
            Statement::Control(control) => self.control(*control).await.map(|_| Vec::new()),
        }
    }
}
