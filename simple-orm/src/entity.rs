//! # Entity Module
//!
//! Rust structs standing in for model definitions.
//!
//! ## Overview
//!
//! An [`Entity`] knows how to describe its table as a [`ModelDefinition`]
//! and how to turn one of its values into a [`Row`] for `insert`. The trait
//! is normally derived:
//!
//! ```rust,ignore
//! use simple_orm::{Entity, InsertOptions, Schema};
//!
//! #[derive(Entity)]
//! struct User {
//!     #[orm(id)]
//!     id: i32,
//!     #[orm(size = 255)]
//!     name: String,
//!     #[orm(hidden)]
//!     password: String,
//! }
//!
//! #[derive(Entity)]
//! #[orm(table = "avatars")]
//! struct Avatar {
//!     #[orm(id)]
//!     id: i32,
//!     #[orm(references = "user")]
//!     user_id: i32,
//!     url: Option<String>,
//! }
//!
//! let mut schema = Schema::new("app");
//! schema.add_entity::<User>()?;
//! schema.add_entity::<Avatar>()?;
//! schema.finalize()?;
//!
//! schema.model("user")?.insert(InsertOptions::entity(user)).await?;
//! ```

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    errors::Result,
    model::{ModelDefinition, ModelId},
    options::InsertOptions,
    schema::Schema,
    value::Row,
};

// ============================================================================
// Entity Trait
// ============================================================================

/// A struct mapped onto one model.
pub trait Entity {
    /// Name of the model the struct maps to.
    fn model_name() -> &'static str;

    /// The model definition, fields in struct order.
    fn definition() -> ModelDefinition;

    /// The struct's columns and values, in struct order.
    fn into_row(self) -> Row;
}

impl Schema {
    /// Registers the model of an [`Entity`].
    ///
    /// # Errors
    ///
    /// Same as [`Schema::add_model`].
    pub fn add_entity<E: Entity>(&mut self) -> Result<ModelId> {
        self.add_model(E::definition())
    }
}

impl InsertOptions {
    /// Inserts a single entity.
    pub fn entity<E: Entity>(entity: E) -> Self {
        Self::row(entity.into_row())
    }

    /// Inserts a batch of entities. Columns follow the first entity.
    pub fn entities<E, I>(entities: I) -> Self
    where
        E: Entity,
        I: IntoIterator<Item = E>,
    {
        Self::rows(entities.into_iter().map(Entity::into_row).collect())
    }
}
