//! Computing the steps between two sets of model snapshots.
//!
//! Items are paired by name: present only on the left means delete, only on
//! the right means create, on both sides means compare. Keys, constraints,
//! fields and table options are replaced wholesale (`set*`) when they differ
//! at all.

use indexmap::IndexMap;

use super::{MigrationStep, ModelStep};
use crate::{snapshot::ModelSchema, value::Value};

/// Pairs items of `a` and `b` sharing a key.
///
/// Pairs follow the order of `a`, then items only found in `b` in their own
/// order.
pub fn pair_by<'a, T, K, F>(a: &'a [T], b: &'a [T], key: F) -> Vec<(Option<&'a T>, Option<&'a T>)>
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    let mut pairs: Vec<(Option<&T>, Option<&T>)> = a.iter().map(|item| (Some(item), None)).collect();
    for item in b {
        let k = key(item);
        match pairs.iter_mut().find(|(left, _)| left.is_some_and(|l| key(l) == k)) {
            Some(pair) => pair.1 = Some(item),
            None => pairs.push((None, Some(item))),
        }
    }
    pairs
}

/// Create, delete or set steps for two lists of named items.
fn diff_named<T, F, C, D, S>(a: &[T], b: &[T], name: F, create: C, delete: D, set: S) -> Vec<ModelStep>
where
    T: PartialEq + Clone,
    F: Fn(&T) -> &str,
    C: Fn(T) -> ModelStep,
    D: Fn(String) -> ModelStep,
    S: Fn(T) -> ModelStep,
{
    pair_by(a, b, |item| name(item).to_string())
        .into_iter()
        .filter_map(|pair| match pair {
            (Some(old), None) => Some(delete(name(old).to_string())),
            (None, Some(new)) => Some(create(new.clone())),
            (Some(old), Some(new)) if old != new => Some(set(new.clone())),
            _ => None,
        })
        .collect()
}

fn diff_db_options(a: &IndexMap<String, Value>, b: &IndexMap<String, Value>) -> Vec<ModelStep> {
    let mut steps = Vec::new();
    for (name, old) in a {
        match b.get(name) {
            None => steps.push(ModelStep::DeleteDbOption { name: name.clone() }),
            Some(new) if new != old => steps.push(ModelStep::SetDbOption {
                name: name.clone(),
                value: new.clone(),
            }),
            Some(_) => {}
        }
    }
    for (name, new) in b {
        if !a.contains_key(name) {
            steps.push(ModelStep::CreateDbOption {
                name: name.clone(),
                value: new.clone(),
            });
        }
    }
    steps
}

/// Steps turning model `a` into model `b`. A `changeModel` is only emitted
/// when it carries steps.
pub fn diff_model(a: Option<&ModelSchema>, b: Option<&ModelSchema>) -> Vec<MigrationStep> {
    let (a, b) = match (a, b) {
        (Some(a), None) => return vec![MigrationStep::DeleteModel { name: a.name.clone() }],
        (None, Some(b)) => return vec![MigrationStep::CreateModel(b.clone())],
        (None, None) => return Vec::new(),
        (Some(a), Some(b)) => (a, b),
    };

    let mut steps = Vec::new();
    if a.name != b.name {
        steps.push(ModelStep::Rename { to: b.name.clone() });
    }
    if a.primary_key != b.primary_key {
        steps.push(ModelStep::SetPrimaryKey {
            to: b.primary_key.clone(),
        });
    }
    steps.extend(diff_named(
        &a.keys,
        &b.keys,
        |k| k.name.as_str(),
        ModelStep::CreateKey,
        |name| ModelStep::DeleteKey { name },
        ModelStep::SetKey,
    ));
    steps.extend(diff_named(
        &a.constraints,
        &b.constraints,
        |c| c.name.as_str(),
        ModelStep::CreateConstraint,
        |name| ModelStep::DeleteConstraint { name },
        ModelStep::SetConstraint,
    ));
    steps.extend(diff_db_options(&a.db_options, &b.db_options));
    steps.extend(diff_named(
        &a.fields,
        &b.fields,
        |f| f.name.as_str(),
        ModelStep::CreateField,
        |name| ModelStep::DeleteField { name },
        ModelStep::SetField,
    ));

    if steps.is_empty() {
        Vec::new()
    } else {
        vec![MigrationStep::ChangeModel {
            model: a.name.clone(),
            steps,
        }]
    }
}

/// Steps turning the model list `a` into `b`, pairing models by name.
pub fn compute_diff(a: &[ModelSchema], b: &[ModelSchema]) -> Vec<MigrationStep> {
    pair_by(a, b, |m| m.name.clone())
        .into_iter()
        .flat_map(|(old, new)| diff_model(old, new))
        .collect()
}
