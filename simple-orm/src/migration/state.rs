//! Named sets of model snapshots.

use super::{Migration, diff::compute_diff};
use crate::snapshot::ModelSchema;

/// The models of a schema at some point of its history.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MigrationState {
    pub name: String,
    pub models: Vec<ModelSchema>,
    /// The migration this state was replayed from, if any.
    pub migration: Option<String>,
}

impl MigrationState {
    pub fn new(name: impl Into<String>, models: Vec<ModelSchema>) -> Self {
        Self {
            name: name.into(),
            models,
            migration: None,
        }
    }

    /// The state reached after `migration`, given the replayed models.
    pub fn at_migration(migration: &Migration, models: Vec<ModelSchema>) -> Self {
        Self {
            name: migration.name.clone(),
            models,
            migration: Some(migration.name.clone()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// The migration turning this state into `other`, named after `other`.
    ///
    /// It depends on the migration this state was replayed from.
    pub fn diff(&self, other: &MigrationState) -> Migration {
        Migration {
            name: other.name.clone(),
            dependencies: self.migration.iter().cloned().collect(),
            steps: compute_diff(&self.models, &other.models),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationStep;

    #[test]
    fn diff_from_empty_state_has_no_dependencies() {
        let empty = MigrationState::default();
        let current = MigrationState::new("1-init", vec![ModelSchema::new("users")]);
        let migration = empty.diff(&current);
        assert_eq!(migration.name, "1-init");
        assert!(migration.dependencies.is_empty());
        assert_eq!(migration.steps, vec![MigrationStep::CreateModel(ModelSchema::new("users"))]);
    }

    #[test]
    fn diff_depends_on_the_replayed_migration() {
        let previous = MigrationState::at_migration(&Migration::new("1-init"), vec![]);
        let migration = previous.diff(&MigrationState::new("2-next", vec![]));
        assert_eq!(migration.dependencies, vec!["1-init"]);
        assert!(migration.steps.is_empty());
    }
}
