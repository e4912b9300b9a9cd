//! Replaying migration steps onto model snapshots.

use std::collections::HashSet;

use log::debug;

use super::{Migration, MigrationStep, ModelStep};
use crate::{
    errors::{Error, Result},
    snapshot::{ConstraintSchema, FieldSchema, KeySchema, ModelSchema},
};

/// Looks migrations up by name.
pub trait MigrationSource {
    fn migration(&self, name: &str) -> Option<&Migration>;
}

/// Replays migrations onto a list of models.
///
/// `applyMigration` steps replay a dependency at most once per replayer.
pub struct Replayer<'a> {
    source: &'a dyn MigrationSource,
    applied: HashSet<String>,
}

impl<'a> Replayer<'a> {
    pub fn new(source: &'a dyn MigrationSource) -> Self {
        Self {
            source,
            applied: HashSet::new(),
        }
    }

    pub fn is_applied(&self, name: &str) -> bool {
        self.applied.contains(name)
    }

    /// Applies every step of `migration`.
    pub fn migration(&mut self, models: &mut Vec<ModelSchema>, migration: &Migration) -> Result<()> {
        debug!("applying migration {}", migration.name);
        self.applied.insert(migration.name.clone());
        for step in &migration.steps {
            self.step(models, migration, step)?;
        }
        Ok(())
    }

    fn step(&mut self, models: &mut Vec<ModelSchema>, migration: &Migration, step: &MigrationStep) -> Result<()> {
        match step {
            MigrationStep::ApplyMigration { migration: name } => {
                if !migration.dependencies.contains(name) {
                    return Err(Error::migration(format!(
                        "could not apply migration {}: it is not a dependency of {}",
                        name, migration.name
                    )));
                }
                if self.is_applied(name) {
                    return Ok(());
                }
                let dependency = self.source.migration(name).ok_or_else(|| {
                    Error::migration(format!("could not apply migration {}: the migration was not found", name))
                })?;
                self.migration(models, dependency)
            }
            MigrationStep::CreateModel(model) => {
                if position(models, &model.name).is_some() {
                    return Err(Error::migration(format!(
                        "cannot create model {}, since it already exists",
                        model.name
                    )));
                }
                models.push(model.clone());
                Ok(())
            }
            MigrationStep::DeleteModel { name } => {
                let idx = require_model(models, name)?;
                models.remove(idx);
                Ok(())
            }
            MigrationStep::ChangeModel { model, steps } => {
                let idx = require_model(models, model)?;
                for step in steps {
                    apply_model_step(&mut models[idx], step)?;
                }
                Ok(())
            }
            MigrationStep::InsertData { .. } => Ok(()),
        }
    }
}

fn position(models: &[ModelSchema], name: &str) -> Option<usize> {
    models.iter().position(|m| m.name == name)
}

fn require_model(models: &[ModelSchema], name: &str) -> Result<usize> {
    position(models, name).ok_or_else(|| Error::migration(format!("model {} does not exist", name)))
}

/// Items addressed by name inside a model.
trait Named: Clone {
    const KIND: &'static str;
    fn name(&self) -> &str;
}

impl Named for KeySchema {
    const KIND: &'static str = "key";
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for ConstraintSchema {
    const KIND: &'static str = "constraint";
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for FieldSchema {
    const KIND: &'static str = "field";
    fn name(&self) -> &str {
        &self.name
    }
}

fn missing<T: Named>(name: &str, model: &str) -> Error {
    Error::migration(format!("{} {} does not exist on {}", T::KIND, name, model))
}

fn create_item<T: Named>(list: &mut Vec<T>, item: &T, model: &str) -> Result<()> {
    if list.iter().any(|i| i.name() == item.name()) {
        return Err(Error::migration(format!(
            "{} {} already exists on {}",
            T::KIND,
            item.name(),
            model
        )));
    }
    list.push(item.clone());
    Ok(())
}

fn set_item<T: Named>(list: &mut [T], item: &T, model: &str) -> Result<()> {
    let slot = list
        .iter_mut()
        .find(|i| i.name() == item.name())
        .ok_or_else(|| missing::<T>(item.name(), model))?;
    *slot = item.clone();
    Ok(())
}

fn delete_item<T: Named>(list: &mut Vec<T>, name: &str, model: &str) -> Result<()> {
    let idx = list
        .iter()
        .position(|i| i.name() == name)
        .ok_or_else(|| missing::<T>(name, model))?;
    list.remove(idx);
    Ok(())
}

/// Applies one `changeModel` step.
pub fn apply_model_step(model: &mut ModelSchema, step: &ModelStep) -> Result<()> {
    let owner = model.name.clone();
    match step {
        ModelStep::Rename { to } => model.name = to.clone(),
        ModelStep::SetPrimaryKey { to } => model.primary_key = to.clone(),
        ModelStep::CreateKey(key) => create_item(&mut model.keys, key, &owner)?,
        ModelStep::SetKey(key) => set_item(&mut model.keys, key, &owner)?,
        ModelStep::DeleteKey { name } => delete_item::<KeySchema>(&mut model.keys, name, &owner)?,
        ModelStep::CreateConstraint(c) => create_item(&mut model.constraints, c, &owner)?,
        ModelStep::SetConstraint(c) => set_item(&mut model.constraints, c, &owner)?,
        ModelStep::DeleteConstraint { name } => {
            delete_item::<ConstraintSchema>(&mut model.constraints, name, &owner)?
        }
        ModelStep::CreateField(f) => create_item(&mut model.fields, f, &owner)?,
        ModelStep::SetField(f) => set_item(&mut model.fields, f, &owner)?,
        ModelStep::DeleteField { name } => delete_item::<FieldSchema>(&mut model.fields, name, &owner)?,
        ModelStep::CreateDbOption { name, value } => {
            if model.db_options.contains_key(name) {
                return Err(Error::migration(format!("option {} already exists on {}", name, owner)));
            }
            model.db_options.insert(name.clone(), value.clone());
        }
        ModelStep::SetDbOption { name, value } => {
            let slot = model
                .db_options
                .get_mut(name)
                .ok_or_else(|| Error::migration(format!("option {} does not exist on {}", name, owner)))?;
            *slot = value.clone();
        }
        ModelStep::DeleteDbOption { name } => {
            model
                .db_options
                .shift_remove(name)
                .ok_or_else(|| Error::migration(format!("option {} does not exist on {}", name, owner)))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{migration::diff::compute_diff, snapshot::FieldSchema, value::Value};
    use std::collections::HashMap;

    struct Source(HashMap<String, Migration>);

    impl MigrationSource for Source {
        fn migration(&self, name: &str) -> Option<&Migration> {
            self.0.get(name)
        }
    }

    fn users() -> ModelSchema {
        let mut m = ModelSchema::new("users");
        m.fields = vec![FieldSchema::new("id", "int")];
        m
    }

    #[test]
    fn replaying_a_diff_reaches_the_target() {
        let mut target = users();
        target.fields.push(FieldSchema::new("name", "text"));
        target.db_options.insert("engine".into(), Value::from("InnoDB"));
        let mut posts = ModelSchema::new("posts");
        posts.fields = vec![FieldSchema::new("id", "int")];

        let before = vec![users()];
        let after = vec![target, posts];

        let mut migration = Migration::new("2-x");
        migration.steps = compute_diff(&before, &after);

        let source = Source(HashMap::new());
        let mut models = before.clone();
        Replayer::new(&source).migration(&mut models, &migration).unwrap();
        assert_eq!(models, after);
    }

    #[test]
    fn creating_an_existing_model_fails() {
        let mut migration = Migration::new("m");
        migration.steps = vec![MigrationStep::CreateModel(users())];
        let source = Source(HashMap::new());
        let mut models = vec![users()];
        let err = Replayer::new(&source).migration(&mut models, &migration).unwrap_err();
        assert!(matches!(err, Error::Migration(_)));
    }

    #[test]
    fn changing_a_missing_model_fails() {
        let mut migration = Migration::new("m");
        migration.steps = vec![MigrationStep::DeleteModel { name: "ghost".into() }];
        let source = Source(HashMap::new());
        assert!(Replayer::new(&source).migration(&mut Vec::new(), &migration).is_err());
    }

    #[test]
    fn apply_migration_replays_a_dependency_once() {
        let mut first = Migration::new("1-init");
        first.steps = vec![MigrationStep::CreateModel(users())];
        let mut second = Migration::new("2-again");
        second.dependencies = vec!["1-init".into()];
        second.steps = vec![
            MigrationStep::ApplyMigration {
                migration: "1-init".into(),
            },
            MigrationStep::ApplyMigration {
                migration: "1-init".into(),
            },
        ];

        let source = Source(HashMap::from([("1-init".to_string(), first)]));
        let mut models = Vec::new();
        Replayer::new(&source).migration(&mut models, &second).unwrap();
        assert_eq!(models, vec![users()]);
    }

    #[test]
    fn apply_migration_requires_a_declared_dependency() {
        let mut migration = Migration::new("2");
        migration.steps = vec![MigrationStep::ApplyMigration { migration: "1".into() }];
        let source = Source(HashMap::new());
        assert!(Replayer::new(&source).migration(&mut Vec::new(), &migration).is_err());
    }
}
