//! # Schema Snapshot Module
//!
//! Serializable, connection-free descriptions of models. These are what
//! `get_schema()` exports, what `*.model.yaml` files contain and what the
//! migration tooling diffs and replays.
//!
//! Empty lists, empty maps and absent values are omitted when serializing,
//! so exporting a model built from a snapshot reproduces that snapshot.
//!
//! ## Example
//!
//! ```yaml
//! name: users
//! primaryKey: [id]
//! fields:
//!   - { name: id, type: int, autoIncrement: true }
//!   - { name: name, type: varchar(255) }
//!   - { name: role, type: enum, values: [admin, user], default: user }
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{query::Sort, value::Value};

fn is_false(v: &bool) -> bool {
    !*v
}

// ============================================================================
// Field Snapshot
// ============================================================================

/// One column of a model snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub can_be_null: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_increment: bool,
    /// Allowed values, present only for `enum` fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl FieldSchema {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            can_be_null: false,
            auto_increment: false,
            values: Vec::new(),
            default: None,
        }
    }
}

// ============================================================================
// Keys
// ============================================================================

/// A column taking part in a key, with an optional sort direction.
///
/// Accepts either a bare column name or a `{ name, sort }` mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "KeyFieldRepr")]
pub struct KeyField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum KeyFieldRepr {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        sort: Option<Sort>,
    },
}

impl From<KeyFieldRepr> for KeyField {
    fn from(repr: KeyFieldRepr) -> Self {
        match repr {
            KeyFieldRepr::Name(name) => KeyField { name, sort: None },
            KeyFieldRepr::Full { name, sort } => KeyField { name, sort },
        }
    }
}

impl From<&str> for KeyField {
    fn from(name: &str) -> Self {
        KeyField {
            name: name.to_string(),
            sort: None,
        }
    }
}

/// A secondary (non primary) key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeySchema {
    pub name: String,
    pub fields: Vec<KeyField>,
}

// ============================================================================
// Constraints
// ============================================================================

/// Referential action of a foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OnAction {
    #[default]
    NoAction,
    Cascade,
    SetNull,
    Restrict,
}

impl OnAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            OnAction::NoAction => "NO ACTION",
            OnAction::Cascade => "CASCADE",
            OnAction::SetNull => "SET NULL",
            OnAction::Restrict => "RESTRICT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintType {
    #[default]
    ForeignKey,
}

/// The `REFERENCES table (field)` part of a foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintTarget {
    pub table: String,
    pub field: String,
}

/// A named table constraint. Only foreign keys are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSchema {
    pub name: String,
    #[serde(rename = "type", default)]
    pub constraint_type: ConstraintType,
    pub field: String,
    pub references: ConstraintTarget,
    #[serde(default)]
    pub on_delete: OnAction,
    #[serde(default)]
    pub on_update: OnAction,
}

// ============================================================================
// Model Snapshot
// ============================================================================

/// The exported shape of a model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSchema {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keys: Vec<KeySchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<ConstraintSchema>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub db_options: IndexMap<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldSchema>,
}

impl ModelSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: Vec::new(),
            keys: Vec::new(),
            constraints: Vec::new(),
            db_options: IndexMap::new(),
            fields: Vec::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}
