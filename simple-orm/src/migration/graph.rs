//! The migrations of a directory, linked by dependency.

use std::{
    collections::{HashMap, HashSet},
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info};

use super::{
    Migration,
    apply::{MigrationSource, Replayer},
    state::MigrationState,
};
use crate::{
    errors::{Error, Result},
    snapshot::ModelSchema,
};

const MIGRATION_SUFFIX: &str = ".migration.yaml";

#[derive(Debug, Clone)]
struct Entry {
    migration: Migration,
    dirty: bool,
}

/// A dependency named by a migration that no loaded migration provides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingDependency {
    pub name: String,
    pub by: String,
}

/// Migrations loaded from one directory.
#[derive(Debug, Clone)]
pub struct MigrationsGraph {
    path: PathBuf,
    list: Vec<Entry>,
    by_name: HashMap<String, usize>,
    naming_conflicts: Vec<String>,
    missing: Vec<MissingDependency>,
    provides_for: Vec<Vec<usize>>,
}

impl MigrationsGraph {
    /// An empty graph saving into `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            list: Vec::new(),
            by_name: HashMap::new(),
            naming_conflicts: Vec::new(),
            missing: Vec::new(),
            provides_for: Vec::new(),
        }
    }

    /// Loads every `*.migration.yaml` of `path`, in file name order. A
    /// missing directory yields an empty graph.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let mut graph = Self::new(path);
        debug!("reading migrations from {}", graph.path.display());

        if graph.path.is_dir() {
            let mut files: Vec<PathBuf> = fs::read_dir(&graph.path)?
                .map(|entry| entry.map(|e| e.path()))
                .collect::<std::io::Result<_>>()?;
            files.retain(|p| p.file_name().and_then(|n| n.to_str()).is_some_and(|n| n.ends_with(MIGRATION_SUFFIX)));
            files.sort();

            for file in files {
                let migration: Migration = serde_yaml::from_str(&fs::read_to_string(&file)?)?;
                graph.list.push(Entry {
                    migration,
                    dirty: false,
                });
            }
        }

        graph.connect();
        Ok(graph)
    }

    /// Recomputes names, dependency links and the derived lists.
    fn connect(&mut self) {
        self.by_name.clear();
        self.naming_conflicts.clear();
        for (idx, entry) in self.list.iter().enumerate() {
            let name = &entry.migration.name;
            if self.by_name.insert(name.clone(), idx).is_some() && !self.naming_conflicts.contains(name) {
                self.naming_conflicts.push(name.clone());
            }
        }

        self.missing.clear();
        self.provides_for = vec![Vec::new(); self.list.len()];
        for (idx, entry) in self.list.iter().enumerate() {
            for dependency in &entry.migration.dependencies {
                match self.by_name.get(dependency) {
                    Some(&provider) => self.provides_for[provider].push(idx),
                    None => {
                        if !self.missing.iter().any(|m| &m.name == dependency) {
                            self.missing.push(MissingDependency {
                                name: dependency.clone(),
                                by: entry.migration.name.clone(),
                            });
                        }
                    }
                }
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn migrations(&self) -> impl Iterator<Item = &Migration> {
        self.list.iter().map(|e| &e.migration)
    }

    pub fn get(&self, name: &str) -> Option<&Migration> {
        self.by_name.get(name).map(|&idx| &self.list[idx].migration)
    }

    /// Migrations without dependencies.
    pub fn roots(&self) -> Vec<&Migration> {
        self.migrations().filter(|m| m.dependencies.is_empty()).collect()
    }

    /// Migrations nothing depends on.
    pub fn leaves(&self) -> Vec<&Migration> {
        self.list
            .iter()
            .zip(&self.provides_for)
            .filter(|(_, dependents)| dependents.is_empty())
            .map(|(e, _)| &e.migration)
            .collect()
    }

    /// Migrations added but not saved yet.
    pub fn dirty(&self) -> Vec<&Migration> {
        self.list.iter().filter(|e| e.dirty).map(|e| &e.migration).collect()
    }

    pub fn naming_conflicts(&self) -> &[String] {
        &self.naming_conflicts
    }

    pub fn missing(&self) -> &[MissingDependency] {
        &self.missing
    }

    pub fn add_migration(&mut self, migration: Migration) {
        self.list.push(Entry {
            migration,
            dirty: true,
        });
        self.connect();
    }

    /// Checks the graph can be extended: unique names, no missing
    /// dependency and a single leaf.
    pub fn validate(&self) -> Result<()> {
        if !self.naming_conflicts.is_empty() {
            return Err(Error::migration(format!(
                "some migration names are conflicting: {}",
                self.naming_conflicts.join(", ")
            )));
        }

        if !self.missing.is_empty() {
            let missing: Vec<String> = self.missing.iter().map(|m| format!("{} by {}", m.name, m.by)).collect();
            return Err(Error::migration(format!("some migrations are missing: {}", missing.join(", "))));
        }

        let leaves = self.leaves();
        if leaves.len() > 1 {
            let names: Vec<&str> = leaves.iter().map(|m| m.name.as_str()).collect();
            return Err(Error::migration(format!(
                "there are divergent migrations which must be merged: {}",
                names.join(", ")
            )));
        }

        Ok(())
    }

    /// Dependency-first order of the closure of `name`.
    fn closure(&self, name: &str) -> Result<Vec<&Migration>> {
        fn visit<'g>(
            graph: &'g MigrationsGraph,
            name: &str,
            visiting: &mut HashSet<String>,
            done: &mut HashSet<String>,
            order: &mut Vec<&'g Migration>,
        ) -> Result<()> {
            if done.contains(name) {
                return Ok(());
            }
            if !visiting.insert(name.to_string()) {
                return Err(Error::migration(format!("migration {} depends on itself", name)));
            }
            let migration = graph
                .get(name)
                .ok_or_else(|| Error::migration(format!("migration {} not found", name)))?;
            for dependency in &migration.dependencies {
                visit(graph, dependency, visiting, done, order)?;
            }
            visiting.remove(name);
            done.insert(name.to_string());
            order.push(migration);
            Ok(())
        }

        let mut order = Vec::new();
        visit(self, name, &mut HashSet::new(), &mut HashSet::new(), &mut order)?;
        Ok(order)
    }

    /// The models after replaying `name` and everything it depends on.
    pub fn models_at(&self, name: &str) -> Result<Vec<ModelSchema>> {
        let mut models = Vec::new();
        let mut replayer = Replayer::new(self);
        for migration in self.closure(name)? {
            if !replayer.is_applied(&migration.name) {
                replayer.migration(&mut models, migration)?;
            }
        }
        Ok(models)
    }

    /// The state at the single leaf, or an empty state without migrations.
    pub fn leaf_state(&self) -> Result<MigrationState> {
        match self.leaves().first() {
            Some(leaf) => Ok(MigrationState::at_migration(leaf, self.models_at(&leaf.name)?)),
            None => Ok(MigrationState::default()),
        }
    }

    /// Writes dirty migrations. Never overwrites a file; if any target
    /// exists nothing is written.
    ///
    /// Returns how many migrations were saved.
    pub fn save(&mut self) -> Result<usize> {
        let dirty: Vec<usize> = (0..self.list.len()).filter(|&i| self.list[i].dirty).collect();
        if dirty.is_empty() {
            debug!("all migrations are already saved");
            return Ok(0);
        }

        fs::create_dir_all(&self.path)?;
        let paths: Vec<PathBuf> = dirty
            .iter()
            .map(|&i| self.path.join(self.list[i].migration.file_name()))
            .collect();
        if let Some(clash) = paths.iter().find(|p| p.exists()) {
            return Err(Error::migration(format!(
                "cannot save all migrations, {} already exists",
                clash.display()
            )));
        }

        for (&idx, path) in dirty.iter().zip(&paths) {
            let yaml = serde_yaml::to_string(&self.list[idx].migration)?;
            let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
            file.write_all(yaml.as_bytes())?;
            self.list[idx].dirty = false;
            info!("saved migration {}", path.display());
        }

        self.connect();
        Ok(paths.len())
    }
}

impl MigrationSource for MigrationsGraph {
    fn migration(&self, name: &str) -> Option<&Migration> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::MigrationStep;

    fn migration(name: &str, deps: &[&str]) -> Migration {
        Migration {
            name: name.into(),
            dependencies: deps.iter().map(|d| d.to_string()).collect(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn missing_directory_is_an_empty_graph() {
        let dir = tempfile::tempdir().unwrap();
        let graph = MigrationsGraph::load(dir.path().join("nope")).unwrap();
        assert!(graph.is_empty());
        assert!(graph.validate().is_ok());
        assert_eq!(graph.leaf_state().unwrap(), MigrationState::default());
    }

    #[test]
    fn roots_and_leaves() {
        let mut graph = MigrationsGraph::new("unused");
        graph.add_migration(migration("1", &[]));
        graph.add_migration(migration("2", &["1"]));

        let roots: Vec<&str> = graph.roots().iter().map(|m| m.name.as_str()).collect();
        let leaves: Vec<&str> = graph.leaves().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(roots, vec!["1"]);
        assert_eq!(leaves, vec!["2"]);
        assert!(graph.validate().is_ok());
    }

    #[test]
    fn validation_failures() {
        let mut graph = MigrationsGraph::new("unused");
        graph.add_migration(migration("1", &[]));
        graph.add_migration(migration("1", &[]));
        assert!(graph.validate().unwrap_err().to_string().contains("conflicting: 1"));

        let mut graph = MigrationsGraph::new("unused");
        graph.add_migration(migration("2", &["1"]));
        assert!(graph.validate().unwrap_err().to_string().contains("1 by 2"));

        let mut graph = MigrationsGraph::new("unused");
        graph.add_migration(migration("1", &[]));
        graph.add_migration(migration("2a", &["1"]));
        graph.add_migration(migration("2b", &["1"]));
        assert!(graph.validate().unwrap_err().to_string().contains("2a, 2b"));
    }

    #[test]
    fn models_at_replays_the_dependency_closure() {
        let mut first = migration("1", &[]);
        first.steps = vec![MigrationStep::CreateModel(ModelSchema::new("users"))];
        let mut second = migration("2", &["1"]);
        second.steps = vec![MigrationStep::CreateModel(ModelSchema::new("posts"))];

        let mut graph = MigrationsGraph::new("unused");
        graph.add_migration(first);
        graph.add_migration(second);

        let names: Vec<String> = graph.models_at("2").unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["users", "posts"]);
    }

    #[test]
    fn save_writes_dirty_migrations_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("migrations");

        let mut graph = MigrationsGraph::load(&path).unwrap();
        graph.add_migration(migration("1-init", &[]));
        assert_eq!(graph.save().unwrap(), 1);
        assert!(graph.dirty().is_empty());
        assert_eq!(graph.save().unwrap(), 0);

        let reloaded = MigrationsGraph::load(&path).unwrap();
        assert_eq!(reloaded.get("1-init"), Some(&migration("1-init", &[])));
    }

    #[test]
    fn save_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("1-init.migration.yaml"), "name: other\n").unwrap();

        let mut graph = MigrationsGraph::new(dir.path());
        graph.add_migration(migration("1-init", &[]));
        assert!(matches!(graph.save(), Err(Error::Migration(_))));
        assert_eq!(graph.dirty().len(), 1);
    }
}
