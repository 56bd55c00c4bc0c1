// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The migration registry: an immutable, duplicate-free map from version key
//! to migration step.
//!
//! Keys are full migration identifiers like `"2_rename_receiver_key"`; only
//! the parsed version prefix participates in ordering. A registry is built
//! once (inline, discovered from a directory, or merged from both) and is
//! read-only afterwards, so concurrent runs against it never race.

use crate::step::MigrationStep;
use crate::version::{NumericVersion, VersionKey};
use std::collections::btree_map::{self, BTreeMap};
use thiserror::Error;

/// Two sources claimed the same version key.
#[derive(Debug, Error)]
#[error("duplicate migration key: {key}")]
pub struct DuplicateKeyError {
    pub key: String,
}

/// Errors from building a registry
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error(transparent)]
    Duplicate(#[from] DuplicateKeyError),
    #[error("migration key has no parsable version prefix: {0}")]
    InvalidKey(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) key: String,
    pub(crate) step: MigrationStep,
}

/// All known migration steps, ordered by version key.
#[derive(Debug, Clone)]
pub struct Registry<V: VersionKey = NumericVersion> {
    entries: BTreeMap<V, Entry>,
}

impl<V: VersionKey> Default for Registry<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: VersionKey> Registry<V> {
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a step under a key like `"3_add_roles"`.
    ///
    /// Fails if the key's version prefix does not parse, or if another step
    /// is already registered at the same version.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        step: impl Into<MigrationStep>,
    ) -> Result<(), RegistryError> {
        let key = key.into();
        let version =
            V::parse_prefix(&key).ok_or_else(|| RegistryError::InvalidKey(key.clone()))?;
        match self.entries.entry(version) {
            btree_map::Entry::Occupied(_) => Err(DuplicateKeyError { key }.into()),
            btree_map::Entry::Vacant(slot) => {
                slot.insert(Entry {
                    key,
                    step: step.into(),
                });
                Ok(())
            }
        }
    }

    /// Merge another registry into this one, failing fast on the first
    /// version-key collision without inserting anything.
    pub fn merge(&mut self, other: Registry<V>) -> Result<(), DuplicateKeyError> {
        for (version, entry) in &other.entries {
            if self.entries.contains_key(version) {
                return Err(DuplicateKeyError {
                    key: entry.key.clone(),
                });
            }
        }
        self.entries.extend(other.entries);
        Ok(())
    }

    /// The highest registered version key, if any.
    pub fn latest(&self) -> Option<V> {
        self.entries.keys().next_back().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full key strings in ascending version order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.key.as_str())
    }

    /// Entries with `stored < key <= target`, ascending.
    pub(crate) fn applicable<'a>(
        &'a self,
        stored: &'a V,
        target: &'a V,
    ) -> impl Iterator<Item = (&'a V, &'a Entry)> {
        use std::ops::Bound::{Excluded, Included};
        self.entries.range((Excluded(stored), Included(target)))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
