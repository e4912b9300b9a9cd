//! # Model Module
//!
//! Runtime model definitions: one table, its fields and its place in the
//! reference graph.
//!
//! ## Overview
//!
//! Models are declared with a [`ModelDefinition`] and registered in a
//! [`crate::Schema`], which owns them in an arena. References between models
//! are stored as [`ModelId`] indices into that arena rather than as pointers,
//! so the bidirectional graph (references and back-references) has no
//! ownership cycles.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use simple_orm::{FieldDefinition, ModelDefinition, Schema};
//!
//! let mut schema = Schema::new("app");
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
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{collections::HashMap, fmt, sync::Arc};

use indexmap::IndexMap;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    alias::alias,
    connector::Connector,
    errors::{Error, Result},
    field::{Field, FieldDefinition},
    options::FindOptions,
    query::Query,
    snapshot::{ConstraintSchema, KeySchema, ModelSchema},
    value::{Row, Value},
};

// ============================================================================
// Graph Types
// ============================================================================

/// Index of a model inside its schema's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(pub(crate) usize);

/// An outgoing reference: this model's `field` points at `model`'s primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    pub field: String,
    pub model: ModelId,
}

/// An incoming reference: `model` references this one under `ref_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackReference {
    pub ref_name: String,
    pub model: ModelId,
}

/// Receives the built query and the call options; returning `Some` replaces
/// the query.
pub type FindPreprocess = Arc<dyn Fn(&Query, &FindOptions) -> Option<Query> + Send + Sync>;

/// Receives the raw rows and the call options before they reach the caller.
pub type FindPostprocess = Arc<dyn Fn(Vec<Row>, &FindOptions) -> Result<Vec<Row>> + Send + Sync>;

// ============================================================================
// Model Definition
// ============================================================================

/// Declarative input for a model.
#[derive(Clone, Default)]
pub struct ModelDefinition {
    pub(crate) name: String,
    pub(crate) fields: Vec<FieldDefinition>,
    pub(crate) primary_key: Vec<String>,
    pub(crate) keys: Vec<KeySchema>,
    pub(crate) constraints: Vec<ConstraintSchema>,
    pub(crate) db_options: IndexMap<String, Value>,
    pub(crate) connection: Option<Arc<dyn Connector>>,
    pub(crate) find_preprocess: Option<FindPreprocess>,
    pub(crate) find_postprocess: Option<FindPostprocess>,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Rebuilds a definition from an exported snapshot.
    pub fn from_schema(schema: ModelSchema) -> Self {
        Self {
            name: schema.name,
            fields: schema.fields.into_iter().map(FieldDefinition::from).collect(),
            primary_key: schema.primary_key,
            keys: schema.keys,
            constraints: schema.constraints,
            db_options: schema.db_options,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }

    pub fn fields<I>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = FieldDefinition>,
    {
        self.fields.extend(fields);
        self
    }

    /// Declares primary key columns up front. Fields flagged as primary key
    /// are appended to this list when they are added.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.primary_key = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(mut self, key: KeySchema) -> Self {
        self.keys.push(key);
        self
    }

    pub fn constraint(mut self, constraint: ConstraintSchema) -> Self {
        self.constraints.push(constraint);
        self
    }

    pub fn db_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.db_options.insert(name.into(), value.into());
        self
    }

    /// Binds a connector to this model. It takes precedence over the
    /// schema's connector.
    pub fn connection(mut self, connection: Arc<dyn Connector>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn find_preprocess<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Query, &FindOptions) -> Option<Query> + Send + Sync + 'static,
    {
        self.find_preprocess = Some(Arc::new(hook));
        self
    }

    pub fn find_postprocess<F>(mut self, hook: F) -> Self
    where
        F: Fn(Vec<Row>, &FindOptions) -> Result<Vec<Row>> + Send + Sync + 'static,
    {
        self.find_postprocess = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for ModelDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelDefinition")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Model
// ============================================================================

/// A reference found while adding fields, linked later by the schema.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PendingReference {
    pub ref_name: String,
    pub field: String,
    pub target: String,
    pub explicit_type: bool,
}

/// One table's definition plus its edges in the reference graph.
pub struct Model {
    pub(crate) name: String,
    pub(crate) alias: String,
    pub(crate) fields: Vec<Field>,
    pub(crate) fields_map: HashMap<String, usize>,
    pub(crate) primary_key: Vec<String>,
    pub(crate) keys: Vec<KeySchema>,
    pub(crate) constraints: Vec<ConstraintSchema>,
    pub(crate) db_options: IndexMap<String, Value>,
    pub(crate) references: IndexMap<String, Reference>,
    pub(crate) back_references: IndexMap<String, BackReference>,
    pub(crate) connection: Option<Arc<dyn Connector>>,
    pub(crate) find_preprocess: Option<FindPreprocess>,
    pub(crate) find_postprocess: Option<FindPostprocess>,
}

impl Model {
    /// Builds a model from its definition.
    ///
    /// Returns the model and the references it declares; linking them needs
    /// the schema, since targets are looked up by name.
    ///
    /// # Errors
    ///
    /// * [`Error::Definition`] if two fields share a name.
    pub(crate) fn build(def: ModelDefinition) -> Result<(Self, Vec<PendingReference>)> {
        let mut model = Model {
            alias: alias(&def.name),
            name: def.name,
            fields: Vec::new(),
            fields_map: HashMap::new(),
            primary_key: Vec::new(),
            keys: def.keys,
            constraints: def.constraints,
            db_options: def.db_options,
            references: IndexMap::new(),
            back_references: IndexMap::new(),
            connection: def.connection,
            find_preprocess: def.find_preprocess,
            find_postprocess: def.find_postprocess,
        };

        for column in def.primary_key {
            if !model.primary_key.contains(&column) {
                model.primary_key.push(column);
            }
        }

        let mut pending = Vec::new();
        for field in def.fields {
            if let Some(reference) = model.add_field(field)? {
                pending.push(reference);
            }
        }

        Ok((model, pending))
    }

    /// Adds one field, updating the field map and primary key.
    pub(crate) fn add_field(&mut self, def: FieldDefinition) -> Result<Option<PendingReference>> {
        let resolved = def.resolve();
        let name = resolved.field.name.clone();

        if self.fields_map.contains_key(&name) {
            return Err(Error::definition(format!(
                "trying to declare field {} on model {}, which already exists",
                name, self.name
            )));
        }

        self.fields_map.insert(name.clone(), self.fields.len());
        self.fields.push(resolved.field);

        if resolved.primary_key && !self.primary_key.contains(&name) {
            self.primary_key.push(name.clone());
        }

        Ok(resolved
            .reference
            .map(|(ref_name, target, explicit_type)| PendingReference {
                ref_name,
                field: name,
                target,
                explicit_type,
            }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The table alias used in generated SQL.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Fields in declaration (column) order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields_map.get(name).map(|&i| &self.fields[i])
    }

    pub(crate) fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields_map.get(name).map(|&i| &mut self.fields[i])
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields_map.contains_key(name)
    }

    pub fn primary_key(&self) -> &[String] {
        &self.primary_key
    }

    /// The primary key field used for joins, or `None` for key-less models.
    pub(crate) fn join_key(&self) -> Option<&str> {
        self.primary_key.first().map(String::as_str)
    }

    /// The primary key column whose type a referencing column inherits.
    pub(crate) fn referenced_key_field(&self) -> Option<&Field> {
        self.fields
            .iter()
            .filter(|f| self.primary_key.contains(&f.name))
            .last()
    }

    pub fn references(&self) -> &IndexMap<String, Reference> {
        &self.references
    }

    pub fn back_references(&self) -> &IndexMap<String, BackReference> {
        &self.back_references
    }

    pub fn get_reference(&self, name: &str) -> Option<&Reference> {
        self.references.get(name)
    }

    pub fn get_back_reference(&self, name: &str) -> Option<&BackReference> {
        self.back_references.get(name)
    }

    pub fn connection(&self) -> Option<&Arc<dyn Connector>> {
        self.connection.as_ref()
    }

    /// Exports the model snapshot consumed by the migration tooling.
    pub fn get_schema(&self) -> ModelSchema {
        ModelSchema {
            name: self.name.clone(),
            primary_key: self.primary_key.clone(),
            keys: self.keys.clone(),
            constraints: self.constraints.clone(),
            db_options: self.db_options.clone(),
            fields: self.fields.iter().map(Field::schema).collect(),
        }
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .field("fields", &self.fields)
            .field("primary_key", &self.primary_key)
            .field("references", &self.references)
            .field("back_references", &self.back_references)
            .field("connected", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::FieldSchema;

    #[test]
    fn duplicate_field_is_a_definition_error() {
        let def = ModelDefinition::new("users")
            .field(FieldDefinition::id())
            .field(FieldDefinition::new("id", "int"));
        let err = Model::build(def).unwrap_err();
        assert!(matches!(err, Error::Definition(_)));
    }

    #[test]
    fn primary_key_has_no_duplicates() {
        let def = ModelDefinition::new("users")
            .primary_key(["id"])
            .field(FieldDefinition::id());
        let (model, _) = Model::build(def).unwrap();
        assert_eq!(model.primary_key(), ["id"]);
        assert_eq!(model.alias(), "U");
    }

    #[test]
    fn references_are_reported_as_pending() {
        let def = ModelDefinition::new("avatars")
            .field(FieldDefinition::id())
            .field(FieldDefinition::references("users").name("user"));
        let (model, pending) = Model::build(def).unwrap();
        assert!(model.has_field("userId"));
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].ref_name, "user");
        assert_eq!(pending[0].target, "users");
    }

    #[test]
    fn schema_export_round_trips() {
        let mut snapshot = ModelSchema::new("userRoles");
        snapshot.primary_key = vec!["id".into()];
        snapshot.db_options.insert("engine".into(), Value::from("InnoDB"));
        let mut id = FieldSchema::new("id", "int");
        id.auto_increment = true;
        let mut role = FieldSchema::new("role", "enum");
        role.values = vec!["admin".into(), "user".into()];
        role.default = Some(Value::from("user"));
        snapshot.fields = vec![id, role];

        let (model, _) = Model::build(ModelDefinition::from_schema(snapshot.clone())).unwrap();
        assert_eq!(model.alias(), "UR");
        assert_eq!(model.get_schema(), snapshot);

        let (again, _) = Model::build(ModelDefinition::from_schema(model.get_schema())).unwrap();
        assert_eq!(again.get_schema(), snapshot);
    }
}
