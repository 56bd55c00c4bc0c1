// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Versioned migration engine for configuration documents.
//!
//! A document is a JSON-compatible value carrying a version field. The engine
//! evolves it from its stored version to a target version by applying
//! registered migration steps in ascending version-key order. Steps are either
//! opaque transforms (`Value -> Value`) or declarative RFC 6902 patches.
//!
//! Registries are built once (inline, from a directory of step files, or
//! merged from both) and are immutable afterwards, so one registry can serve
//! any number of concurrent runs.

mod executor;
mod loader;
mod patch;
mod pointer;
mod registry;
mod step;
mod version;

pub use executor::{run, run_latest, MigrateError, VERSION_FIELD};
pub use loader::{load_dir, LoadError, TransformTable, PATCH_EXT, STEP_EXT};
pub use patch::{apply_patch, PatchError, PatchOp};
pub use pointer::{parse_pointer, PointerError};
pub use registry::{DuplicateKeyError, Registry, RegistryError};
pub use step::{BoxError, MigrationStep, StepError, TransformFn};
pub use version::{NumericVersion, SemanticVersion, VersionKey};
