//! # Migration Module
//!
//! Schema migrations as data. A [`Migration`] is a named list of
//! [`MigrationStep`]s plus the names of the migrations it builds on; it is
//! stored as `<name>.migration.yaml`.
//!
//! ## Components
//!
//! - [`diff`]: computes the steps turning one set of model snapshots into
//!   another.
//! - [`apply`]: replays steps onto snapshots.
//! - [`MigrationState`]: a named set of snapshots, diffable into the next
//!   migration.
//! - [`MigrationsGraph`]: the migrations of a directory, linked by
//!   dependency.
//! - [`MigrationMaker`]: diffs the models on disk against the latest
//!   migration and saves the result.
//! - [`sql`]: renders steps as MySQL DDL.
//!
//! ## File Format
//!
//! ```yaml
//! name: 2-add-avatars
//! dependencies:
//! - 1-initial
//! steps:
//! - action: createModel
//!   name: avatars
//!   fields:
//!   - name: id
//!     type: int
//! - action: changeModel
//!   model: users
//!   steps:
//!   - action: deleteField
//!     name: legacy
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    snapshot::{ConstraintSchema, FieldSchema, KeySchema, ModelSchema},
    value::{Row, Value},
};

pub mod apply;
pub mod diff;
pub mod graph;
pub mod maker;
pub mod sql;
pub mod state;

pub use graph::MigrationsGraph;
pub use maker::MigrationMaker;
pub use state::MigrationState;

/// A named, persisted list of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Migration {
    pub name: String,
    /// Names of the migrations this one applies on top of.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub steps: Vec<MigrationStep>,
}

impl Migration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dependencies: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// File name the migration is stored under.
    pub fn file_name(&self) -> String {
        format!("{}.migration.yaml", self.name)
    }
}

/// A schema-level step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum MigrationStep {
    CreateModel(ModelSchema),
    DeleteModel {
        name: String,
    },
    /// Applies `steps` to the model currently named `model`.
    ChangeModel {
        model: String,
        steps: Vec<ModelStep>,
    },
    /// Replays a migration listed among the dependencies.
    ApplyMigration {
        migration: String,
    },
    /// Seeds rows. The model structure is unchanged.
    InsertData {
        model: String,
        #[serde(default)]
        rows: Vec<Row>,
    },
}

/// A step inside `changeModel`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ModelStep {
    Rename {
        to: String,
    },
    SetPrimaryKey {
        #[serde(default)]
        to: Vec<String>,
    },
    CreateKey(KeySchema),
    DeleteKey {
        name: String,
    },
    SetKey(KeySchema),
    CreateConstraint(ConstraintSchema),
    DeleteConstraint {
        name: String,
    },
    SetConstraint(ConstraintSchema),
    #[serde(rename = "createDBOption")]
    CreateDbOption {
        name: String,
        value: Value,
    },
    #[serde(rename = "deleteDBOption")]
    DeleteDbOption {
        name: String,
    },
    #[serde(rename = "setDBOption")]
    SetDbOption {
        name: String,
        value: Value,
    },
    CreateField(FieldSchema),
    DeleteField {
        name: String,
    },
    SetField(FieldSchema),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_are_tagged_by_action() {
        let yaml = "\
name: 2-x
dependencies:
- 1-init
steps:
- action: createModel
  name: users
  fields:
  - name: id
    type: int
- action: changeModel
  model: posts
  steps:
  - action: setDBOption
    name: engine
    value: InnoDB
  - action: deleteField
    name: legacy
";
        let migration: Migration = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(migration.dependencies, vec!["1-init"]);
        assert!(matches!(&migration.steps[0], MigrationStep::CreateModel(m) if m.name == "users"));
        match &migration.steps[1] {
            MigrationStep::ChangeModel { model, steps } => {
                assert_eq!(model, "posts");
                assert_eq!(
                    steps[0],
                    ModelStep::SetDbOption {
                        name: "engine".into(),
                        value: Value::from("InnoDB")
                    }
                );
                assert_eq!(steps[1], ModelStep::DeleteField { name: "legacy".into() });
            }
            other => panic!("unexpected step {:?}", other),
        }
    }

    #[test]
    fn serialized_step_carries_its_action() {
        let step = MigrationStep::DeleteModel { name: "users".into() };
        assert_eq!(serde_yaml::to_string(&step).unwrap(), "action: deleteModel\nname: users\n");
    }
}
