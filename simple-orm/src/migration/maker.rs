//! Making the next migration from the models on disk.

use std::path::PathBuf;

use chrono::Utc;
use log::{debug, info};

use super::{Migration, MigrationState, MigrationsGraph};
use crate::{errors::Result, loader::load_models};

/// Diffs the model snapshots of a directory against the latest migration.
///
/// # Example
///
/// ```rust,ignore
/// let made = MigrationMaker::new("./models", "./migrations")
///     .name("add-avatars")
///     .make_migration()?;
/// ```
#[derive(Debug, Clone)]
pub struct MigrationMaker {
    models: PathBuf,
    migrations: PathBuf,
    name: Option<String>,
    dry_run: bool,
    verbose: bool,
}

impl MigrationMaker {
    pub fn new(models: impl Into<PathBuf>, migrations: impl Into<PathBuf>) -> Self {
        Self {
            models: models.into(),
            migrations: migrations.into(),
            name: None,
            dry_run: false,
            verbose: false,
        }
    }

    /// Name suffix of the migration. Defaults to `auto-<unix millis>`.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Computes the migration without saving it.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Logs the migration as YAML.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Makes, and unless dry-running saves, the next migration.
    ///
    /// Returns `None` when the models already match the latest migration.
    ///
    /// # Errors
    ///
    /// * [`crate::Error::Migration`] when the graph does not validate or the
    ///   file would overwrite another.
    /// * I/O and YAML errors while reading models or migrations.
    pub fn make_migration(&self) -> Result<Option<Migration>> {
        if self.dry_run {
            info!("running dry");
        }

        let mut graph = MigrationsGraph::load(&self.migrations)?;
        debug!("{} migrations found", graph.len());
        graph.validate()?;

        let last = graph.leaf_state()?;

        let suffix = match &self.name {
            Some(name) => name.clone(),
            None => format!("auto-{}", Utc::now().timestamp_millis()),
        };
        let current = MigrationState::new(format!("{}-{}", graph.len() + 1, suffix), load_models(&self.models)?);
        debug!("{} models found", current.models.len());

        let migration = last.diff(&current);
        if migration.steps.is_empty() {
            info!("no changes since {}", last.name);
            return Ok(None);
        }

        graph.add_migration(migration.clone());
        if self.verbose {
            info!("{}", serde_yaml::to_string(&migration)?);
        }

        if !self.dry_run {
            graph.save()?;
        }
        Ok(Some(migration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationStep;
    use std::fs;

    fn write_model(dir: &std::path::Path, name: &str, fields: &str) {
        fs::write(
            dir.join(format!("{}.model.yaml", name)),
            format!("name: {}\nfields:\n{}", name, fields),
        )
        .unwrap();
    }

    #[test]
    fn first_migration_creates_models() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let migrations = dir.path().join("migrations");
        fs::create_dir(&models).unwrap();
        write_model(&models, "users", "- name: id\n  type: int\n");

        let made = MigrationMaker::new(&models, &migrations)
            .name("init")
            .make_migration()
            .unwrap()
            .unwrap();
        assert_eq!(made.name, "1-init");
        assert!(made.dependencies.is_empty());
        assert!(matches!(&made.steps[0], MigrationStep::CreateModel(m) if m.name == "users"));
        assert!(migrations.join("1-init.migration.yaml").exists());
    }

    #[test]
    fn next_migration_depends_on_the_leaf() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let migrations = dir.path().join("migrations");
        fs::create_dir(&models).unwrap();
        write_model(&models, "users", "- name: id\n  type: int\n");
        MigrationMaker::new(&models, &migrations).name("init").make_migration().unwrap();

        assert!(MigrationMaker::new(&models, &migrations).make_migration().unwrap().is_none());

        write_model(&models, "users", "- name: id\n  type: int\n- name: name\n  type: text\n");
        let made = MigrationMaker::new(&models, &migrations)
            .name("add-name")
            .make_migration()
            .unwrap()
            .unwrap();
        assert_eq!(made.name, "2-add-name");
        assert_eq!(made.dependencies, vec!["1-init"]);
        assert!(matches!(&made.steps[0], MigrationStep::ChangeModel { model, .. } if model == "users"));
    }

    #[test]
    fn dry_run_saves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let migrations = dir.path().join("migrations");
        fs::create_dir(&models).unwrap();
        write_model(&models, "users", "- name: id\n  type: int\n");

        let made = MigrationMaker::new(&models, &migrations).dry_run(true).make_migration().unwrap();
        assert!(made.unwrap().name.starts_with("1-auto-"));
        assert!(!migrations.exists());
    }
}
