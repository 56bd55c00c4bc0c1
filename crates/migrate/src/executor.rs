// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The migration executor.
//!
//! Given a document, a registry, and an optional explicit target, the
//! executor selects the steps with `stored < key <= target`, applies them in
//! ascending order, and stamps the version field only after every selected
//! step has succeeded. The input document is never mutated.

use crate::registry::Registry;
use crate::step::StepError;
use crate::version::VersionKey;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Default name of the document field holding the stored version.
pub const VERSION_FIELD: &str = "version";

/// Errors from a migration run
#[derive(Debug, Error)]
pub enum MigrateError<V: VersionKey> {
    /// The document was written by newer software than this registry knows
    /// about. No steps have run.
    #[error(
        "stored version {stored} is ahead of the latest known migration {latest}; \
         the document may have been written by a newer version of the software"
    )]
    VersionAhead { stored: V, latest: V },

    /// A step failed. `last_successful` is the rollback marker: the key of
    /// the last step that completed, or the stored version if none did.
    #[error("migration '{key}' failed (last successful: {last_successful}): {source}")]
    Step {
        key: String,
        last_successful: V,
        #[source]
        source: StepError,
    },

    /// The document root (or a transform's output) is not a JSON object, so
    /// no version field can be read or stamped.
    #[error("document root is not an object")]
    NotAnObject,
}

/// Migrate `document` from its stored version up to `target` (inclusive).
///
/// `target` defaults to the highest key in the registry, or the scheme's zero
/// value when the registry is empty. On success the returned document carries
/// `version_field = target`; on failure the caller's document is untouched
/// and no partially migrated document is exposed.
pub fn run<V: VersionKey>(
    document: &Value,
    registry: &Registry<V>,
    target: Option<V>,
    version_field: &str,
) -> Result<Value, MigrateError<V>> {
    let mut doc = document.clone();
    let stored = match doc.as_object() {
        Some(map) => map
            .get(version_field)
            .and_then(V::from_value)
            .unwrap_or_else(V::zero),
        None => return Err(MigrateError::NotAnObject),
    };
    let target = target
        .or_else(|| registry.latest())
        .unwrap_or_else(V::zero);

    if stored > target {
        return Err(MigrateError::VersionAhead {
            stored,
            latest: target,
        });
    }

    let mut last_successful = stored.clone();
    for (version, entry) in registry.applicable(&stored, &target) {
        debug!(key = %entry.key, "applying migration");
        doc = entry
            .step
            .apply(doc)
            .map_err(|source| MigrateError::Step {
                key: entry.key.clone(),
                last_successful: last_successful.clone(),
                source,
            })?;
        last_successful = version.clone();
    }

    match doc.as_object_mut() {
        Some(map) => {
            map.insert(version_field.to_string(), target.to_value());
            Ok(doc)
        }
        None => Err(MigrateError::NotAnObject),
    }
}

/// [`run`] with the default version field and the registry's latest key as
/// the target.
pub fn run_latest<V: VersionKey>(
    document: &Value,
    registry: &Registry<V>,
) -> Result<Value, MigrateError<V>> {
    run(document, registry, None, VERSION_FIELD)
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
