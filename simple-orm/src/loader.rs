//! # Model Loader
//!
//! Finds `*.model.yaml` / `*.model.yml` snapshot files under a directory.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{errors::Result, snapshot::ModelSchema};

const MODEL_SUFFIXES: [&str; 2] = [".model.yaml", ".model.yml"];

fn is_model_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| MODEL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
}

fn collect(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(&path, files)?;
        } else if is_model_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Model snapshot files below `dir`, recursively, sorted by path.
pub fn model_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    collect(dir.as_ref(), &mut files)?;
    files.sort();
    Ok(files)
}

/// Loads every model snapshot below `dir`, in path order.
pub fn load_models(dir: impl AsRef<Path>) -> Result<Vec<ModelSchema>> {
    model_files(dir)?
        .into_iter()
        .map(|path| {
            debug!("loading model {}", path.display());
            let model: ModelSchema = serde_yaml::from_str(&fs::read_to_string(&path)?)?;
            Ok(model)
        })
        .collect()
}
