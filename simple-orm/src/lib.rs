//! # Simple ORM
//!
//! Declarative model graphs over MySQL. Models are registered in a
//! [`Schema`], references between them are followed with dotted paths
//! (`"user.avatar.url"`), and every operation goes through an intermediate
//! query that a [`Formatter`] renders for a [`Dialect`].
//!
//! ```rust,ignore
//! use simple_orm::{Database, FieldDefinition, FindOptions, ModelDefinition, Schema};
//!
//! let db = Database::connect("mysql://root@localhost/app").await?;
//!
//! let mut schema = Schema::new("app").with_connection(Arc::new(db));
//! schema.add_model(
//!     ModelDefinition::new("users")
//!         .field(FieldDefinition::id())
//!         .field(FieldDefinition::new("name", "varchar(255)")),
//! )?;
//! schema.add_model(
//!     ModelDefinition::new("avatars")
//!         .field(FieldDefinition::id())
//!         .field(FieldDefinition::references("users").name("user"))
//!         .field(FieldDefinition::new("url", "text")),
//! )?;
//! schema.finalize()?;
//!
//! let rows = schema
//!     .model("avatars")?
//!     .find(FindOptions::new().show("user.name").filter("user.id", 3))
//!     .await?;
//! ```

pub use simple_orm_macro::Entity;

pub mod alias;
pub mod config;
pub mod connector;
pub mod database;
pub mod ddl;
pub mod entity;
pub mod errors;
pub mod field;
pub mod format;
pub mod loader;
pub mod migration;
pub mod model;
pub mod mysql;
pub mod options;
pub mod path;
pub mod query;
pub mod query_builder;
pub mod schema;
pub mod snapshot;
pub mod table_list;
pub mod transaction;
pub mod value;

pub use config::ConnectionConfig;
pub use connector::{Connector, ExecResult};
pub use database::{Database, DatabaseBuilder};
pub use entity::Entity;
pub use errors::{Error, Result};
pub use field::{Field, FieldDefinition};
pub use format::{Dialect, Formatter};
pub use loader::load_models;
pub use migration::{Migration, MigrationMaker, MigrationState, MigrationStep, MigrationsGraph, ModelStep};
pub use model::{Model, ModelDefinition, ModelId};
pub use mysql::MysqlDialect;
pub use options::{ConditionValue, DeleteOptions, FindOptions, InsertOptions, OrderItem, SetValue, Show, UpdateOptions};
pub use query::{Limit, Operator, Query, Sort, Statement, Term};
pub use query_builder::QueryBuilder;
pub use schema::{ModelRef, Schema};
pub use snapshot::{ConstraintSchema, FieldSchema, KeySchema, ModelSchema};
pub use transaction::Transaction;
pub use value::{Row, Value};
