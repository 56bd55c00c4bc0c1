// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory discovery of migration steps.
//!
//! Step files are named `<version>_<description>.<ext>`. Two kinds are
//! recognized:
//!
//! - `.json` — a static patch document: a JSON array of RFC 6902 operations.
//! - `.step` — a step manifest: a JSON object declaring either
//!   `{"transform": "<name>"}`, resolved against a compiled-in
//!   [`TransformTable`], or `{"patch": [...]}` with inline operations. When
//!   both are declared the transform wins.
//!
//! No code is ever loaded from disk: transforms are registered in the host
//! binary and step files only reference them by name. Files whose stem starts
//! with `_` or whose prefix does not parse as a version are skipped, so
//! helper files can live alongside step files.

use crate::registry::{Registry, RegistryError};
use crate::step::{BoxError, MigrationStep, TransformFn};
use crate::version::{NumericVersion, VersionKey};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Extension of step manifest files.
pub const STEP_EXT: &str = "step";
/// Extension of static patch documents.
pub const PATCH_EXT: &str = "json";

/// Errors from resolving a directory of step files
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("migrations directory does not exist or is not a directory: {}", .0.display())]
    MissingDir(PathBuf),
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("patch document {} is not a JSON array of operations", path.display())]
    NotAnArray { path: PathBuf },
    #[error("step manifest {} declares neither a transform nor a patch", path.display())]
    MissingStepDecl { path: PathBuf },
    #[error("step manifest {} names unknown transform '{name}'", path.display())]
    UnknownTransform { path: PathBuf, name: String },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Compiled-in table of named transforms that step manifests may reference.
#[derive(Clone, Default)]
pub struct TransformTable {
    transforms: HashMap<String, TransformFn>,
}

impl TransformTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transform under `name`, replacing any previous one.
    pub fn register<F, E>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        self.transforms
            .insert(name.into(), Arc::new(move |doc| f(doc).map_err(Into::into)));
        self
    }

    pub fn get(&self, name: &str) -> Option<TransformFn> {
        self.transforms.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }
}

impl fmt::Debug for TransformTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("TransformTable")
            .field("transforms", &names)
            .finish()
    }
}

#[derive(Deserialize)]
struct StepManifest {
    transform: Option<String>,
    patch: Option<Value>,
}

/// Scan `dir` for step files and build a registry from them.
///
/// Two files resolving to the same version key (e.g. `1_real.json` and
/// `1_real.step`) fail with a duplicate-key error before any document is
/// touched.
pub fn load_dir(dir: &Path, transforms: &TransformTable) -> Result<Registry, LoadError> {
    if !dir.is_dir() {
        return Err(LoadError::MissingDir(dir.to_path_buf()));
    }

    let entries = fs::read_dir(dir).map_err(|source| LoadError::Io {
        path: dir.to_path_buf(),
        source,
    })?;
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| LoadError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    paths.sort();

    let mut registry = Registry::new();
    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if stem.starts_with('_') {
            continue;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if NumericVersion::parse_prefix(stem).is_none() {
            debug!(path = %path.display(), "skipping file without version prefix");
            continue;
        }
        let step = match ext {
            PATCH_EXT => resolve_patch_document(&path)?,
            STEP_EXT => resolve_manifest(&path, transforms)?,
            _ => continue,
        };
        registry.insert(stem, step)?;
    }
    Ok(registry)
}

fn read_json(path: &Path) -> Result<Value, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn resolve_patch_document(path: &Path) -> Result<MigrationStep, LoadError> {
    let doc = read_json(path)?;
    parse_patch(doc, path)
}

fn resolve_manifest(path: &Path, transforms: &TransformTable) -> Result<MigrationStep, LoadError> {
    let doc = read_json(path)?;
    let manifest: StepManifest =
        serde_json::from_value(doc).map_err(|source| LoadError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    if let Some(name) = manifest.transform {
        let transform = transforms
            .get(&name)
            .ok_or_else(|| LoadError::UnknownTransform {
                path: path.to_path_buf(),
                name: name.clone(),
            })?;
        return Ok(MigrationStep::Transform(transform));
    }
    match manifest.patch {
        Some(patch) => parse_patch(patch, path),
        None => Err(LoadError::MissingStepDecl {
            path: path.to_path_buf(),
        }),
    }
}

fn parse_patch(value: Value, path: &Path) -> Result<MigrationStep, LoadError> {
    if !value.is_array() {
        return Err(LoadError::NotAnArray {
            path: path.to_path_buf(),
        });
    }
    let ops = serde_json::from_value(value).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(MigrationStep::Patch(ops))
}

#[cfg(test)]
#[path = "loader_tests.rs"]
mod tests;
