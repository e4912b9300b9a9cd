//! # Database Module
//!
//! The production [`Connector`]: a sqlx MySQL pool.
//!
//! Statements are sent as raw SQL already rendered by the
//! [`crate::format::Formatter`], and result rows are decoded into [`Row`]s
//! from the column types the server reports.
//!
//! ## Example
//!
//! ```rust,ignore
//! use simple_orm::{ConnectionConfig, Database};
//!
//! let db = Database::from_config(&ConnectionConfig::from_env()?).await?;
//! // or
//! let db = Database::builder().max_connections(5).connect("mysql://root@localhost/app").await?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use futures::lock::Mutex;
use log::{debug, info};
use sqlx::{
    Column, MySql, Row as _, TypeInfo,
    mysql::{MySqlPool, MySqlPoolOptions, MySqlQueryResult, MySqlRow},
    pool::PoolConnection,
};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    config::ConnectionConfig,
    connector::{Connector, ExecResult},
    errors::{Error, Result},
    format::{Dialect, Formatter},
    mysql::MysqlDialect,
    snapshot::ModelSchema,
    transaction::Transaction,
    value::{Row, Value},
};

// ============================================================================
// Row Decoding
// ============================================================================

/// Decodes column `index` according to the type the server reported.
fn decode_column(row: &MySqlRow, index: usize) -> Result<Value> {
    let column = &row.columns()[index];
    let type_name = column.type_info().name().to_ascii_uppercase();

    let value = match type_name.as_str() {
        "NULL" => Value::Null,
        "BOOLEAN" => row.try_get::<Option<bool>, _>(index)?.into(),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            row.try_get::<Option<i64>, _>(index)?.into()
        }
        t if t.ends_with("UNSIGNED") => row.try_get::<Option<u64>, _>(index)?.into(),
        "FLOAT" | "DOUBLE" => row.try_get::<Option<f64>, _>(index)?.into(),
        "DATETIME" | "TIMESTAMP" => row.try_get::<Option<NaiveDateTime>, _>(index)?.into(),
        "DATE" => row.try_get::<Option<NaiveDate>, _>(index)?.into(),
        "CHAR" | "VARCHAR" | "TEXT" | "TINYTEXT" | "MEDIUMTEXT" | "LONGTEXT" | "ENUM" | "SET" => {
            row.try_get::<Option<String>, _>(index)?.into()
        }
        // DECIMAL, TIME, JSON and friends arrive as text
        _ => row
            .try_get_unchecked::<Option<String>, _>(index)
            .map_err(|e| {
                Error::conversion(format!(
                    "cannot decode column {} of type {}: {}",
                    column.name(),
                    type_name,
                    e
                ))
            })?
            .into(),
    };

    Ok(value)
}

/// Decodes a whole result row, preserving column order.
pub fn decode_row(row: &MySqlRow) -> Result<Row> {
    let mut decoded = Row::with_capacity(row.len());
    for (index, column) in row.columns().iter().enumerate() {
        decoded.insert(column.name().to_string(), decode_column(row, index)?);
    }
    Ok(decoded)
}

fn exec_result(result: MySqlQueryResult) -> ExecResult {
    ExecResult {
        affected_rows: result.rows_affected(),
        last_insert_id: result.last_insert_id(),
    }
}

// ============================================================================
// Database
// ============================================================================

/// Builds a [`Database`].
#[derive(Debug, Clone)]
pub struct DatabaseBuilder {
    max_connections: u32,
    acquire_timeout: Duration,
}

impl Default for DatabaseBuilder {
    fn default() -> Self {
        Self {
            max_connections: 5,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

impl DatabaseBuilder {
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    fn pool_options(&self) -> MySqlPoolOptions {
        MySqlPoolOptions::new()
            .max_connections(self.max_connections)
            .acquire_timeout(self.acquire_timeout)
    }

    /// Connects with a `mysql://` URL.
    pub async fn connect(self, url: &str) -> Result<Database> {
        let pool = self.pool_options().connect(url).await?;
        info!("connected to {}", url.split('@').next_back().unwrap_or(url));
        Ok(Database::from_pool(pool))
    }

    /// Connects with structured settings. Pool size and timeout come from
    /// `config`.
    pub async fn connect_with(self, config: &ConnectionConfig) -> Result<Database> {
        let pool = self
            .max_connections(config.max_connections())
            .acquire_timeout(config.timeout())
            .pool_options()
            .connect_with(config.connect_options())
            .await?;
        info!("connected to {}:{}", config.host, config.port);
        Ok(Database::from_pool(pool))
    }
}

/// A MySQL connection pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: MySqlPool,
}

impl Database {
    pub fn builder() -> DatabaseBuilder {
        DatabaseBuilder::default()
    }

    /// Connects with default pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::builder().connect(url).await
    }

    pub async fn from_config(config: &ConnectionConfig) -> Result<Self> {
        Self::builder().connect_with(config).await
    }

    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    /// Runs `op` inside a transaction on a connection taken from the pool
    /// for the duration of the call.
    pub async fn perform_transaction<F, Fut, T>(&self, op: F) -> Result<T>
    where
        F: FnOnce(Arc<Transaction>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let connection = self.pool.acquire().await?;
        let dedicated: Arc<dyn Connector> = Arc::new(DedicatedConnection {
            connection: Mutex::new(connection),
        });
        Transaction::new(dedicated).perform(op).await
    }

    /// The `CREATE TABLE` statement of a model snapshot.
    pub fn show_create_model(&self, model: &ModelSchema) -> String {
        Formatter::new(&MysqlDialect).create_table(model)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl Connector for Database {
    fn dialect(&self) -> &dyn Dialect {
        &MysqlDialect
    }

    async fn fetch_sql(&self, sql: &str) -> Result<Vec<Row>> {
        let rows = sqlx::raw_sql(sql).fetch_all(&self.pool).await?;
        debug!("fetched {} rows", rows.len());
        rows.iter().map(decode_row).collect()
    }

    async fn execute_sql(&self, sql: &str) -> Result<ExecResult> {
        let result = sqlx::raw_sql(sql).execute(&self.pool).await?;
        Ok(exec_result(result))
    }
}

/// One pooled connection, serialized behind a lock.
struct DedicatedConnection {
    connection: Mutex<PoolConnection<MySql>>,
}

#[async_trait]
impl Connector for DedicatedConnection {
    fn dialect(&self) -> &dyn Dialect {
        &MysqlDialect
    }

    async fn fetch_sql(&self, sql: &str) -> Result<Vec<Row>> {
        let mut connection = self.connection.lock().await;
        let rows = sqlx::Executor::fetch_all(&mut **connection, sqlx::raw_sql(sql)).await?;
        rows.iter().map(decode_row).collect()
    }

    async fn execute_sql(&self, sql: &str) -> Result<ExecResult> {
        let mut connection = self.connection.lock().await;
        let result = sqlx::Executor::execute(&mut **connection, sqlx::raw_sql(sql)).await?;
        Ok(exec_result(result))
    }
}
