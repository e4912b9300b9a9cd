//! Project options: where the models and migrations of a project live.
//!
//! Options are layered. Defaults come first, then every
//! `[package.metadata.simple-orm]` table found in a `Cargo.toml` while
//! walking up from the start directory (outermost first, so the closest
//! manifest wins), then whatever was given on the command line. Paths in a
//! manifest are relative to that manifest's directory.
//!
//! ```toml
//! [package.metadata.simple-orm]
//! models = "db/models"
//! migrations = "db/migrations"
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectOptions {
    pub models: PathBuf,
    pub migrations: PathBuf,
}

impl Default for ProjectOptions {
    fn default() -> Self {
        Self {
            models: PathBuf::from("./models"),
            migrations: PathBuf::from("./migrations"),
        }
    }
}

/// One layer of options; unset entries leave the layer below untouched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Layer {
    pub models: Option<PathBuf>,
    pub migrations: Option<PathBuf>,
}

#[derive(Deserialize)]
struct Manifest {
    package: Option<Package>,
}

#[derive(Deserialize)]
struct Package {
    metadata: Option<Metadata>,
}

#[derive(Deserialize)]
struct Metadata {
    #[serde(rename = "simple-orm")]
    simple_orm: Option<Layer>,
}

impl ProjectOptions {
    fn apply(&mut self, layer: Layer) {
        if let Some(models) = layer.models {
            self.models = models;
        }
        if let Some(migrations) = layer.migrations {
            self.migrations = migrations;
        }
    }

    /// Layers defaults, the manifests above `start` and `overrides`.
    ///
    /// `start` defaults to the current directory.
    pub fn compute(start: Option<&Path>, overrides: Layer) -> Result<Self> {
        let start = match start {
            Some(dir) => dir.to_path_buf(),
            None => std::env::current_dir().context("cannot read the current directory")?,
        };
        let start = fs::canonicalize(&start).with_context(|| format!("cannot resolve {}", start.display()))?;

        let mut options = Self::default();
        for layer in manifest_layers(&start)? {
            options.apply(layer);
        }
        options.apply(overrides);
        Ok(options)
    }
}

/// The `simple-orm` tables of every manifest from `start` up to the root,
/// outermost first, with their paths resolved.
pub fn manifest_layers(start: &Path) -> Result<Vec<Layer>> {
    let mut layers = Vec::new();
    for dir in start.ancestors() {
        let manifest = dir.join("Cargo.toml");
        if !manifest.is_file() {
            continue;
        }
        let text = fs::read_to_string(&manifest).with_context(|| format!("cannot read {}", manifest.display()))?;
        let parsed: Manifest =
            toml::from_str(&text).with_context(|| format!("cannot parse {}", manifest.display()))?;

        let Some(layer) = parsed.package.and_then(|p| p.metadata).and_then(|m| m.simple_orm) else {
            continue;
        };
        debug!("options found in {}", manifest.display());
        layers.push(Layer {
            models: layer.models.map(|p| dir.join(p)),
            migrations: layer.migrations.map(|p| dir.join(p)),
        });
    }
    layers.reverse();
    Ok(layers)
}
