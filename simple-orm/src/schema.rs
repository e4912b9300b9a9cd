//! # Schema Module
//!
//! A [`Schema`] is the arena owning every model of an application. It
//! resolves references by model name, disambiguates aliases and hands out
//! [`ModelRef`] handles through which queries are built and executed.
//!
//! ## Two-phase Build
//!
//! 1. `add_model` registers models. References to models that are already
//!    registered are linked immediately; forward references are queued.
//! 2. `finalize` links every queued reference, makes aliases unique and
//!    fails with a single error naming every reference still unresolved.
//!    After that the schema accepts no more models.
//!
//! ## Example
//!
//! ```rust,ignore
//! let mut schema = Schema::new("app").with_connection(db.clone());
//! schema.add_model(avatars_definition)?; // references "users", queued
//! schema.add_model(users_definition)?;
//! schema.finalize()?;
//!
//! let rows = schema.model("avatars")?
//!     .find(FindOptions::new().filter("user.name", "ana"))
//!     .await?;
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use std::{collections::HashMap, fmt, sync::Arc};

use log::{debug, info};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    alias::disambiguate,
    connector::{Connector, ExecResult},
    errors::{Error, Result},
    model::{BackReference, Model, ModelDefinition, ModelId, PendingReference, Reference},
    options::{DeleteOptions, FindOptions, InsertOptions, UpdateOptions},
    path::{self, ResolvedPath},
    query::{Limit, Query},
    query_builder::QueryBuilder,
    snapshot::ModelSchema,
    value::Row,
};

// ============================================================================
// Schema
// ============================================================================

/// A reference whose target model was not registered yet.
#[derive(Debug, Clone, PartialEq)]
struct UnresolvedReference {
    model: ModelId,
    reference: PendingReference,
}

/// Registry of models sharing a resolution namespace and a connection.
pub struct Schema {
    name: String,
    models: Vec<Model>,
    by_name: HashMap<String, ModelId>,
    unresolved: Vec<UnresolvedReference>,
    finalized: bool,
    connection: Option<Arc<dyn Connector>>,
}

impl Schema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            models: Vec::new(),
            by_name: HashMap::new(),
            unresolved: Vec::new(),
            finalized: false,
            connection: None,
        }
    }

    /// Builds and finalizes a schema from exported snapshots.
    pub fn from_snapshots<I>(name: impl Into<String>, snapshots: I) -> Result<Self>
    where
        I: IntoIterator<Item = ModelSchema>,
    {
        let mut schema = Schema::new(name);
        for snapshot in snapshots {
            schema.add_model(ModelDefinition::from_schema(snapshot))?;
        }
        schema.finalize()?;
        Ok(schema)
    }

    pub fn with_connection(mut self, connection: Arc<dyn Connector>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Registers a model.
    ///
    /// # Errors
    ///
    /// * [`Error::Definition`] if the schema is finalized, the name is taken,
    ///   a field is declared twice, or an already registered reference target
    ///   has no primary key. Nothing is registered in that case.
    pub fn add_model(&mut self, def: ModelDefinition) -> Result<ModelId> {
        if self.finalized {
            return Err(Error::definition(format!(
                "cannot add model {} to finalized schema {}",
                def.name, self.name
            )));
        }
        if self.by_name.contains_key(&def.name) {
            return Err(Error::definition(format!("model {} is already defined", def.name)));
        }

        let (model, pending) = Model::build(def)?;

        for reference in &pending {
            let target = if reference.target == model.name {
                Some(&model)
            } else {
                self.by_name.get(&reference.target).map(|&id| self.get(id))
            };
            if let Some(target) = target {
                check_referenceable(target)?;
            }
        }

        let id = ModelId(self.models.len());
        debug!("registering model {} as {:?}", model.name, id);
        self.by_name.insert(model.name.clone(), id);
        self.models.push(model);

        for reference in pending {
            if !self.link(id, &reference)? {
                debug!("queueing reference {} -> {}", reference.ref_name, reference.target);
                self.unresolved.push(UnresolvedReference { model: id, reference });
            }
        }

        Ok(id)
    }

    /// Links `reference` if its target is registered. Returns whether it did.
    fn link(&mut self, source: ModelId, reference: &PendingReference) -> Result<bool> {
        let Some(&target) = self.by_name.get(&reference.target) else {
            return Ok(false);
        };

        let key_type = check_referenceable(self.get(target))?.field_type.clone();
        let source_name = self.get(source).name.clone();

        let model = &mut self.models[source.0];
        if !reference.explicit_type {
            if let Some(field) = model.field_mut(&reference.field) {
                field.field_type = key_type;
            }
        }
        model.references.insert(
            reference.ref_name.clone(),
            Reference {
                field: reference.field.clone(),
                model: target,
            },
        );

        self.models[target.0].back_references.insert(
            source_name,
            BackReference {
                ref_name: reference.ref_name.clone(),
                model: source,
            },
        );

        Ok(true)
    }

    /// Links every queued reference whose target is now registered.
    ///
    /// A reference that cannot be linked stays queued; every such failure is
    /// reported together once the whole queue has been tried.
    ///
    /// # Errors
    ///
    /// * [`Error::Definition`] listing each reference whose target exists but
    ///   cannot be referenced.
    pub fn resolve_references(&mut self) -> Result<()> {
        let mut still_unresolved = Vec::new();
        let mut failures = Vec::new();

        for entry in std::mem::take(&mut self.unresolved) {
            match self.link(entry.model, &entry.reference) {
                Ok(true) => {}
                Ok(false) => still_unresolved.push(entry),
                Err(e) => {
                    let source = &self.get(entry.model).name;
                    failures.push(format!("{} -> {}: {}", source, entry.reference.target, e));
                    still_unresolved.push(entry);
                }
            }
        }

        self.unresolved = still_unresolved;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(Error::definition(failures.join(", ")))
        }
    }

    /// Freezes the schema.
    ///
    /// Resolves pending references and makes aliases unique in registration
    /// order (`U`, `U2`, `U3`, ...). Aliases are made unique even when
    /// resolution fails.
    ///
    /// # Errors
    ///
    /// * [`Error::Definition`] naming every reference left unresolved, along
    ///   with the reason for each one whose target cannot be referenced.
    pub fn finalize(&mut self) -> Result<()> {
        self.finalized = true;
        let link_failures = self.resolve_references().err();

        let aliases = disambiguate(self.models.iter().map(|m| m.alias.as_str()));
        for (model, alias) in self.models.iter_mut().zip(aliases) {
            model.alias = alias;
        }

        if !self.unresolved.is_empty() {
            let names: Vec<String> = self
                .unresolved
                .iter()
                .map(|u| format!("{} -> {}", self.get(u.model).name, u.reference.target))
                .collect();
            let mut msg = format!(
                "schema {} finalized, but some references are still unresolved: {}",
                self.name,
                names.join(", ")
            );
            if let Some(e) = link_failures {
                msg.push_str(&format!(" ({})", e));
            }
            return Err(Error::definition(msg));
        }

        info!("schema {} finalized with {} models", self.name, self.models.len());
        Ok(())
    }

    /// Pending references as `(model, target)` name pairs.
    pub fn unresolved_references(&self) -> Vec<(String, String)> {
        self.unresolved
            .iter()
            .map(|u| (self.get(u.model).name.clone(), u.reference.target.clone()))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------------

    pub(crate) fn get(&self, id: ModelId) -> &Model {
        &self.models[id.0]
    }

    pub fn model_id(&self, name: &str) -> Option<ModelId> {
        self.by_name.get(name).copied()
    }

    /// Returns a handle on the named model.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidArgument`] if no model has that name.
    pub fn model(&self, name: &str) -> Result<ModelRef<'_>> {
        let id = self
            .model_id(name)
            .ok_or_else(|| Error::invalid_argument(format!("unknown model {}", name)))?;
        Ok(self.model_ref(id))
    }

    pub fn model_ref(&self, id: ModelId) -> ModelRef<'_> {
        ModelRef {
            schema: self,
            id,
            alias_prefix: String::new(),
        }
    }

    /// Models in registration order.
    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    /// Snapshots of every model, in registration order.
    pub fn get_schema(&self) -> Vec<ModelSchema> {
        self.models.iter().map(Model::get_schema).collect()
    }

    // ------------------------------------------------------------------------
    // Connection
    // ------------------------------------------------------------------------

    pub fn connect(&mut self, connection: Arc<dyn Connector>) {
        self.connection = Some(connection);
    }

    pub fn disconnect(&mut self) {
        self.connection = None;
    }

    pub fn connection(&self) -> Option<&Arc<dyn Connector>> {
        self.connection.as_ref()
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("name", &self.name)
            .field("models", &self.models)
            .field("unresolved", &self.unresolved)
            .field("finalized", &self.finalized)
            .finish_non_exhaustive()
    }
}

/// Returns the key column a reference to `target` would copy its type from.
fn check_referenceable(target: &Model) -> Result<&crate::field::Field> {
    target.referenced_key_field().ok_or_else(|| {
        Error::definition(format!(
            "cannot reference {} because it has no primary key",
            target.name
        ))
    })
}

// ============================================================================
// Model Handle
// ============================================================================

/// A model of a schema, ready to be queried.
///
/// Cheap to clone. `with_alias_prefix` returns a handle whose generated
/// aliases are all prefixed, so one model graph can be embedded twice in the
/// same statement.
#[derive(Debug, Clone)]
pub struct ModelRef<'s> {
    schema: &'s Schema,
    id: ModelId,
    alias_prefix: String,
}

impl<'s> ModelRef<'s> {
    pub fn id(&self) -> ModelId {
        self.id
    }

    pub fn schema(&self) -> &'s Schema {
        self.schema
    }

    pub fn model(&self) -> &'s Model {
        self.schema.get(self.id)
    }

    pub fn name(&self) -> &'s str {
        self.model().name()
    }

    /// The alias of the model's table in generated statements.
    pub fn alias(&self) -> String {
        format!("{}{}", self.alias_prefix, self.model().alias())
    }

    pub fn alias_prefix(&self) -> &str {
        &self.alias_prefix
    }

    pub fn with_alias_prefix(&self, prefix: impl Into<String>) -> Self {
        Self {
            schema: self.schema,
            id: self.id,
            alias_prefix: prefix.into(),
        }
    }

    pub fn get_schema(&self) -> ModelSchema {
        self.model().get_schema()
    }

    /// Resolves a dotted key from this model. See [`crate::path`].
    pub fn follow_references(&self, key: &str) -> Option<ResolvedPath> {
        path::follow_references(self.schema, self.id, key)
    }

    /// A fresh builder seeded with this model's table.
    pub fn query_builder(&self) -> Result<QueryBuilder<'s>> {
        QueryBuilder::new(self.schema, self.id, &self.alias_prefix)
    }

    /// Builds the query `find` would run, pre-hook included.
    pub fn find_query(&self, options: &FindOptions) -> Result<Query> {
        let query = self.query_builder()?.find_query(options)?;
        Ok(match &self.model().find_preprocess {
            Some(hook) => hook(&query, options).unwrap_or(query),
            None => query,
        })
    }

    /// Resolves the connector for one call: the call's transaction, then the
    /// model's connector, then the schema's.
    ///
    /// # Errors
    ///
    /// * [`Error::Connection`] if none is available.
    pub fn connection(&self, transaction: Option<&Arc<dyn Connector>>) -> Result<Arc<dyn Connector>> {
        transaction
            .or(self.model().connection.as_ref())
            .or(self.schema.connection.as_ref())
            .cloned()
            .ok_or_else(|| {
                Error::connection(format!(
                    "cannot access {} objects, no connection available",
                    self.name()
                ))
            })
    }

    // ------------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------------

    /// Runs a select and returns its rows.
    ///
    /// The post-hook, then the per-row mapper of `options`, are applied to
    /// the rows before they are returned.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let rows = schema.model("avatars")?
    ///     .find(FindOptions::new().show("user.name").filter("user.id", 3))
    ///     .await?;
    /// ```
    pub async fn find(&self, options: FindOptions) -> Result<Vec<Row>> {
        let db = self.connection(options.transaction.as_ref())?;
        let query = self.find_query(&options)?;

        let rows = db.query(&query).await?;

        let rows = match &self.model().find_postprocess {
            Some(hook) => hook(rows, &options)?,
            None => rows,
        };

        Ok(match &options.map_row {
            Some(mapper) => rows.into_iter().map(|row| mapper(row)).collect(),
            None => rows,
        })
    }

    /// Like `find`, with the limit count forced to 1. A requested offset is
    /// kept.
    pub async fn find_one(&self, mut options: FindOptions) -> Result<Option<Row>> {
        options.limit = Some(Limit {
            offset: options.limit.and_then(|l| l.offset),
            count: 1,
        });
        Ok(self.find(options).await?.into_iter().next())
    }

    /// Inserts one or more rows.
    pub async fn insert(&self, options: InsertOptions) -> Result<ExecResult> {
        let db = self.connection(options.transaction.as_ref())?;
        let statement = self.query_builder()?.insert_statement(&options)?;
        db.insert(&statement).await
    }

    /// Updates the rows matching `options.conditions`.
    pub async fn update(&self, options: UpdateOptions) -> Result<ExecResult> {
        let db = self.connection(options.transaction.as_ref())?;
        let statement = self.query_builder()?.update_statement(&options)?;
        db.update(&statement).await
    }

    /// Deletes the rows matching `options.conditions`.
    pub async fn delete(&self, options: DeleteOptions) -> Result<ExecResult> {
        let db = self.connection(options.transaction.as_ref())?;
        let statement = self.query_builder()?.delete_statement(&options)?;
        db.delete(&statement).await
    }
}
