// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Migration steps: one unit of document transformation.

use crate::patch::{apply_patch, PatchError, PatchOp};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Boxed error type carried out of a failing transform.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An opaque document transformation.
///
/// Shared via `Arc` so a step can live in a compiled-in transform table and
/// in a registry at the same time.
pub type TransformFn = Arc<dyn Fn(Value) -> Result<Value, BoxError> + Send + Sync>;

/// Errors from applying a single migration step
#[derive(Debug, Error)]
pub enum StepError {
    #[error("transform failed: {0}")]
    Transform(#[source] BoxError),
    #[error("patch failed: {0}")]
    Patch(#[from] PatchError),
}

/// One registered migration: an opaque transform or a declarative patch.
#[derive(Clone)]
pub enum MigrationStep {
    Transform(TransformFn),
    Patch(Vec<PatchOp>),
}

impl MigrationStep {
    /// Wrap a fallible transform function.
    pub fn transform<F, E>(f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, E> + Send + Sync + 'static,
        E: Into<BoxError>,
    {
        Self::Transform(Arc::new(move |doc| f(doc).map_err(Into::into)))
    }

    /// Wrap a declarative patch.
    pub fn patch(ops: Vec<PatchOp>) -> Self {
        Self::Patch(ops)
    }

    /// Apply this step, consuming the document and producing the next one.
    pub fn apply(&self, doc: Value) -> Result<Value, StepError> {
        match self {
            Self::Transform(f) => f(doc).map_err(StepError::Transform),
            Self::Patch(ops) => Ok(apply_patch(ops, doc)?),
        }
    }
}

impl From<Vec<PatchOp>> for MigrationStep {
    fn from(ops: Vec<PatchOp>) -> Self {
        Self::Patch(ops)
    }
}

impl fmt::Debug for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(_) => f.write_str("MigrationStep::Transform(..)"),
            Self::Patch(ops) => write!(f, "MigrationStep::Patch({} ops)", ops.len()),
        }
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
