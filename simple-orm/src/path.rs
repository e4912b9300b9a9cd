//! # Path Resolver
//!
//! Walks dotted keys such as `"author.country.name"` through the reference
//! graph of a schema, producing the joins needed to reach the terminal field.
//!
//! ## Resolution Rules
//!
//! - Each component is looked up among the current model's references, then
//!   its back-references. A hit appends a [`PathEntry`] and moves on to the
//!   target model.
//! - A component that is neither is the terminal field, but only when it is
//!   the last one.
//! - Without a terminal field, the first primary key column of the last
//!   model is used.
//! - A miss anywhere yields `None`; callers decide whether that is fatal.
//!
//! ## Join Modifiers
//!
//! A leading `?` on a hop asks for a `LEFT JOIN`, a trailing `?` for a
//! `RIGHT JOIN`, both for an `OUTER JOIN`. Unmarked hops use a plain `JOIN`.
//!
//! ```rust,ignore
//! let path = schema.model("avatars")?.follow_references("?user.name").unwrap();
//! assert_eq!(path.field, "name");
//! ```

// ============================================================================
// External Crate Imports
// ============================================================================

use log::debug;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    model::{BackReference, ModelId, Reference},
    query::{Condition, FromEntry, JoinKind, Operator, Term},
    schema::Schema,
};

// ============================================================================
// Path Types
// ============================================================================

/// How one hop of a path leaves its model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hop {
    /// Follows an outgoing reference.
    Reference(Reference),
    /// Follows an incoming reference in reverse.
    BackReference(BackReference),
}

/// One hop of a resolved path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    /// The model the hop starts from.
    pub from: ModelId,
    /// The path component, without join modifiers.
    pub key: String,
    pub hop: Hop,
    pub join: JoinKind,
}

impl PathEntry {
    /// The model the hop arrives at.
    pub fn target(&self) -> ModelId {
        match &self.hop {
            Hop::Reference(r) => r.model,
            Hop::BackReference(b) => b.model,
        }
    }
}

/// The result of resolving a dotted key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub path: Vec<PathEntry>,
    pub last_model: ModelId,
    pub field: String,
}

impl ResolvedPath {
    /// `true` when the key named a field of the starting model itself.
    pub fn is_local(&self) -> bool {
        self.path.is_empty()
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Splits the join modifiers off a path component.
fn parse_component(component: &str) -> (&str, JoinKind) {
    let (left, rest) = match component.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, component),
    };
    let (right, name) = match rest.strip_suffix('?') {
        Some(name) => (true, name),
        None => (false, rest),
    };

    let kind = match (left, right) {
        (true, true) => JoinKind::Outer,
        (true, false) => JoinKind::Left,
        (false, true) => JoinKind::Right,
        (false, false) => JoinKind::Plain,
    };
    (name, kind)
}

/// Resolves `key` starting at `start`.
///
/// Returns `None` when a component does not resolve or the terminal field
/// does not exist on the last model.
pub fn follow_references(schema: &Schema, start: ModelId, key: &str) -> Option<ResolvedPath> {
    let mut current = start;
    let mut path = Vec::new();
    let mut field = None;

    let components: Vec<&str> = key.split('.').collect();
    debug!("following references {:?}", components);

    for (i, component) in components.iter().enumerate() {
        let (name, join) = parse_component(component);
        let model = schema.get(current);
        let is_last = i + 1 == components.len();

        if let Some(reference) = model.get_reference(name) {
            debug!("  :: {} :: {} -- found reference", model.name(), name);
            path.push(PathEntry {
                from: current,
                key: name.to_string(),
                hop: Hop::Reference(reference.clone()),
                join,
            });
            current = reference.model;
        } else if let Some(back) = model.get_back_reference(name) {
            debug!("  :: {} :: {} -- found back reference", model.name(), name);
            path.push(PathEntry {
                from: current,
                key: name.to_string(),
                hop: Hop::BackReference(back.clone()),
                join,
            });
            current = back.model;
        } else if is_last {
            field = Some(name.to_string());
        } else {
            debug!("  -- {} not found on model {}", name, model.name());
            return None;
        }
    }

    let last = schema.get(current);
    let field = match field {
        Some(field) => field,
        None => last.join_key()?.to_string(),
    };

    if !last.has_field(&field) {
        debug!("  -- field {} not found on model {}", field, last.name());
        return None;
    }

    Some(ResolvedPath {
        path,
        last_model: current,
        field,
    })
}

/// Converts one path entry into the `FROM` entry joining its target.
///
/// Aliases are the models' own aliases with `prefix` prepended. Returns
/// `None` if the back-referenced model lost the reference it came from.
pub fn join(schema: &Schema, entry: &PathEntry, prefix: &str) -> Option<FromEntry> {
    let from = schema.get(entry.from);
    let from_alias = format!("{}{}", prefix, from.alias());

    let (target, lhs_field, rhs_field) = match &entry.hop {
        Hop::Reference(reference) => {
            let target = schema.get(reference.model);
            (target, reference.field.clone(), target.join_key()?.to_string())
        }
        Hop::BackReference(back) => {
            let target = schema.get(back.model);
            let reference = target.get_reference(&back.ref_name)?;
            (target, from.join_key()?.to_string(), reference.field.clone())
        }
    };
    let target_alias = format!("{}{}", prefix, target.alias());

    Some(FromEntry {
        join: Some(entry.join),
        table: target.name().to_string(),
        alias: Some(target_alias.clone()),
        on: Some(Condition::new(
            Term::field(from_alias, lhs_field),
            Operator::Eq,
            Term::field(target_alias, rhs_field),
        )),
    })
}
