// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File-backed config store with migration write-back.

use crate::yaml::{from_yaml_str, to_yaml_string};
use driftconf_migrate::{
    load_dir, run, DuplicateKeyError, LoadError, MigrateError, NumericVersion, Registry,
    TransformTable, VersionKey, VERSION_FIELD,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Errors from reading or writing a config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error for {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error(transparent)]
    Duplicate(#[from] DuplicateKeyError),
    #[error(transparent)]
    Migrate(#[from] MigrateError<NumericVersion>),
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A YAML config file with versioned migrations.
///
/// The store owns the file location, the inline migration registry, and an
/// optional migrations directory; `T` is the typed model the raw document
/// parses into once migrated.
#[derive(Debug)]
pub struct ConfigStore<T> {
    directory: PathBuf,
    file_name: String,
    version_field: String,
    schema_url: Option<String>,
    migrations: Registry,
    migrations_dir: Option<PathBuf>,
    transforms: TransformTable,
    _model: PhantomData<fn() -> T>,
}

impl<T> ConfigStore<T>
where
    T: Serialize + DeserializeOwned,
{
    /// A store for `file_name` inside `directory`. A leading `~` in the
    /// directory is expanded against the user's home directory.
    pub fn new(directory: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        Self {
            directory: expand_home(directory.as_ref()),
            file_name: file_name.into(),
            version_field: VERSION_FIELD.to_string(),
            schema_url: None,
            migrations: Registry::new(),
            migrations_dir: None,
            transforms: TransformTable::new(),
            _model: PhantomData,
        }
    }

    /// Emit a `# yaml-language-server` header pointing at `url` when writing.
    pub fn with_schema_url(mut self, url: impl Into<String>) -> Self {
        self.schema_url = Some(url.into());
        self
    }

    /// Inline migration registry.
    pub fn with_migrations(mut self, migrations: Registry) -> Self {
        self.migrations = migrations;
        self
    }

    /// Discover additional steps from a directory of step files at read time.
    pub fn with_migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = Some(dir.into());
        self
    }

    /// Named transforms that discovered step manifests may reference.
    pub fn with_transforms(mut self, transforms: TransformTable) -> Self {
        self.transforms = transforms;
        self
    }

    /// Use a different document field for the stored version.
    pub fn with_version_field(mut self, name: impl Into<String>) -> Self {
        self.version_field = name.into();
        self
    }

    /// Full path to the config file.
    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }

    /// Inline migrations merged with directory-discovered ones.
    ///
    /// Fails fast on a version-key collision between the two sources.
    pub fn effective_registry(&self) -> Result<Registry, ConfigError> {
        let mut effective = self.migrations.clone();
        if let Some(dir) = &self.migrations_dir {
            let discovered = load_dir(dir, &self.transforms)?;
            effective.merge(discovered)?;
        }
        Ok(effective)
    }

    /// Read the raw document without migrating or parsing it.
    pub fn load_raw(&self) -> Result<Value, ConfigError> {
        let path = self.path();
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        from_yaml_str(&text).map_err(|source| ConfigError::Yaml { path, source })
    }

    /// Read the config file, run pending migrations, and parse the model.
    ///
    /// When migrations change the document, the migrated form is persisted
    /// before parsing, so the file on disk never lags what the caller sees.
    pub fn read(&self) -> Result<T, ConfigError> {
        let raw = self.load_raw()?;
        let registry = self.effective_registry()?;
        let migrated = if registry.is_empty() {
            raw
        } else {
            let migrated = run(&raw, &registry, None, &self.version_field)?;
            if migrated != raw {
                debug!(path = %self.path().display(), "writing back migrated config");
                self.write_raw(&migrated)?;
            }
            migrated
        };
        self.parse(migrated)
    }

    /// Serialize `config` and write it to disk, stamping the version field to
    /// the latest known migration if the model's value lags it.
    pub fn write(&self, config: &T) -> Result<(), ConfigError> {
        let mut doc = serde_json::to_value(config)?;
        let registry = self.effective_registry()?;
        if let (Some(latest), Some(map)) = (registry.latest(), doc.as_object_mut()) {
            let stored = map
                .get(&self.version_field)
                .and_then(NumericVersion::from_value)
                .unwrap_or_else(NumericVersion::zero);
            if stored < latest {
                map.insert(self.version_field.clone(), latest.to_value());
            }
        }
        self.write_raw(&doc)
    }

    /// Render `config` as YAML without touching disk.
    pub fn serialize(&self, config: &T) -> Result<String, ConfigError> {
        let doc = serde_json::to_value(config)?;
        to_yaml_string(&doc, self.schema_url.as_deref()).map_err(|source| ConfigError::Yaml {
            path: self.path(),
            source,
        })
    }

    fn parse(&self, raw: Value) -> Result<T, ConfigError> {
        serde_json::from_value(raw).map_err(|source| ConfigError::Parse {
            path: self.path(),
            source,
        })
    }

    /// Write a raw document atomically (write to .tmp, then rename).
    fn write_raw(&self, doc: &Value) -> Result<(), ConfigError> {
        let path = self.path();
        let io_err = |source| ConfigError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let text = to_yaml_string(doc, self.schema_url.as_deref()).map_err(|source| {
            ConfigError::Yaml {
                path: path.clone(),
                source,
            }
        })?;
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, text).map_err(io_err)?;
        fs::rename(&tmp_path, &path).map_err(io_err)?;
        Ok(())
    }
}

fn expand_home(path: &Path) -> PathBuf {
    let Some(text) = path.to_str() else {
        return path.to_path_buf();
    };
    let Some(rest) = text.strip_prefix('~') else {
        return path.to_path_buf();
    };
    if !rest.is_empty() && !rest.starts_with('/') {
        // ~user form, not supported
        return path.to_path_buf();
    }
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches('/')),
        None => path.to_path_buf(),
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
