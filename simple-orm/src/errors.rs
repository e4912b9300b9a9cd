//! # Error Handling Module
//!
//! This module defines the error type shared by every part of Simple ORM.
//!
//! ## Error Types
//!
//! - **Definition**: a model or schema was declared inconsistently (duplicate
//!   field, reference to a model without primary key, unresolved references)
//! - **Connection**: an operation needed a connector and none could be resolved
//! - **Visibility**: a query asked for a field that can never be shown
//! - **Conflict**: two different tables ended up under the same alias
//! - **InvalidArgument**: an option, operator or key did not resolve
//! - **Migration**: the migrations graph is inconsistent
//! - **DatabaseError**, **Io**, **Serialization**: wrapped foreign errors
//!
//! Path resolution misses are not errors: `follow_references` returns `None`
//! and each caller decides whether a miss is fatal.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use simple_orm::Error;
//!
//! match schema.model("users")?.find(options).await {
//!     Ok(rows) => println!("{} rows", rows.len()),
//!     Err(Error::Visibility(msg)) => eprintln!("cannot show: {}", msg),
//!     Err(Error::Connection(msg)) => eprintln!("no connection: {}", msg),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use thiserror::Error;

// ============================================================================
// Error Enum Definition
// ============================================================================

/// The main error type for Simple ORM operations.
///
/// Definition, connection, visibility and conflict errors are never swallowed
/// by the library: they always surface to the immediate caller.
#[derive(Error, Debug)]
pub enum Error {
    /// A model or schema definition is invalid.
    ///
    /// Raised at definition or finalize time. When a schema finalizes with
    /// unresolved references, the message names every one of them.
    #[error("Definition error: {0}")]
    Definition(String),

    /// No connector could be resolved for an operation.
    #[error("Connection error: {0}")]
    Connection(String),

    /// A field whose `can_be_shown` flag is false was explicitly selected.
    #[error("Visibility error: {0}")]
    Visibility(String),

    /// Two different tables were registered under the same alias in one query.
    ///
    /// This usually means a self-referencing join was not aliased.
    #[error("Alias conflict: {0}")]
    Conflict(String),

    /// An argument passed to the ORM did not make sense.
    ///
    /// # When to Use
    ///
    /// - Unknown operators in a condition
    /// - Condition, insert or update keys that match no field or path
    /// - Unknown model names
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The migrations graph or a migration step is inconsistent.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A database value could not be converted into a [`crate::Value`].
    #[error("Type conversion error: {0}")]
    Conversion(String),

    /// Database operation error.
    ///
    /// Wraps errors from sqlx, converted automatically with `?`.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    /// Filesystem error while loading models or migrations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (de)serialization error for model and migration files.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),
}

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

// ============================================================================
// Helper Functions
// ============================================================================

impl Error {
    /// Creates a `Definition` error.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// return Err(Error::definition(format!("Field {} already exists", name)));
    /// ```
    pub fn definition(msg: impl Into<String>) -> Self {
        Error::Definition(msg.into())
    }

    /// Creates a `Connection` error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Error::Connection(msg.into())
    }

    /// Creates a `Visibility` error.
    pub fn visibility(msg: impl Into<String>) -> Self {
        Error::Visibility(msg.into())
    }

    /// Creates a `Conflict` error.
    pub fn conflict(msg: impl Into<String>) -> Self {
        Error::Conflict(msg.into())
    }

    /// Creates an `InvalidArgument` error.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let op: Operator = "~=".parse()
    ///     .map_err(|_| Error::invalid_argument("unknown operator ~="))?;
    /// ```
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Creates a `Migration` error.
    pub fn migration(msg: impl Into<String>) -> Self {
        Error::Migration(msg.into())
    }

    /// Creates a `Conversion` error.
    pub fn conversion(msg: impl Into<String>) -> Self {
        Error::Conversion(msg.into())
    }
}
