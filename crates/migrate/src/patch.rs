// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFC 6902 patch application.
//!
//! A patch is an ordered list of operations applied atomically as one
//! migration step: the first failing operation aborts the rest, and the
//! executor discards the partially patched document.

use crate::pointer::{parse_pointer, PointerError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One RFC 6902 edit instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOp {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

/// Errors from applying a patch operation
#[derive(Debug, Error)]
pub enum PatchError {
    #[error(transparent)]
    Pointer(#[from] PointerError),
    #[error("path not found: {0}")]
    NotFound(String),
    #[error("'{token}' is not a valid array index in {path}")]
    InvalidIndex { path: String, token: String },
    #[error("array index {index} out of bounds in {path}")]
    OutOfBounds { path: String, index: usize },
    #[error("cannot descend into a scalar at {0}")]
    NotAContainer(String),
    #[error("test failed at {path}: expected {expected}, found {actual}")]
    TestFailed {
        path: String,
        expected: Value,
        actual: Value,
    },
}

/// Apply `ops` to `doc` in array order, returning the patched document.
pub fn apply_patch(ops: &[PatchOp], mut doc: Value) -> Result<Value, PatchError> {
    for op in ops {
        apply_op(op, &mut doc)?;
    }
    Ok(doc)
}

fn apply_op(op: &PatchOp, doc: &mut Value) -> Result<(), PatchError> {
    match op {
        PatchOp::Add { path, value } => add(doc, path, value.clone()),
        PatchOp::Remove { path } => remove(doc, path).map(|_| ()),
        PatchOp::Replace { path, value } => {
            *get_mut(doc, path)? = value.clone();
            Ok(())
        }
        PatchOp::Move { from, path } => {
            let moved = remove(doc, from)?;
            add(doc, path, moved)
        }
        PatchOp::Copy { from, path } => {
            let copied = get(doc, from)?.clone();
            add(doc, path, copied)
        }
        PatchOp::Test { path, value } => {
            let actual = get(doc, path)?;
            if actual == value {
                Ok(())
            } else {
                Err(PatchError::TestFailed {
                    path: path.clone(),
                    expected: value.clone(),
                    actual: actual.clone(),
                })
            }
        }
    }
}

fn get<'a>(doc: &'a Value, pointer: &str) -> Result<&'a Value, PatchError> {
    let tokens = parse_pointer(pointer)?;
    let mut node = doc;
    for token in &tokens {
        node = child(node, token).ok_or_else(|| PatchError::NotFound(pointer.to_string()))?;
    }
    Ok(node)
}

fn get_mut<'a>(doc: &'a mut Value, pointer: &str) -> Result<&'a mut Value, PatchError> {
    let tokens = parse_pointer(pointer)?;
    descend_mut(doc, &tokens, pointer)
}

fn child<'a>(node: &'a Value, token: &str) -> Option<&'a Value> {
    match node {
        Value::Object(map) => map.get(token),
        Value::Array(arr) => token.parse::<usize>().ok().and_then(|i| arr.get(i)),
        _ => None,
    }
}

fn descend_mut<'a>(
    doc: &'a mut Value,
    tokens: &[String],
    pointer: &str,
) -> Result<&'a mut Value, PatchError> {
    let mut node = doc;
    for token in tokens {
        node = match node {
            Value::Object(map) => map.get_mut(token),
            Value::Array(arr) => token.parse::<usize>().ok().and_then(|i| arr.get_mut(i)),
            _ => None,
        }
        .ok_or_else(|| PatchError::NotFound(pointer.to_string()))?;
    }
    Ok(node)
}

/// Insert `value` at `pointer`, creating/overwriting a map key or inserting
/// into an array (`-` appends). The parent must already exist.
fn add(doc: &mut Value, pointer: &str, value: Value) -> Result<(), PatchError> {
    let tokens = parse_pointer(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        *doc = value;
        return Ok(());
    };
    let parent = descend_mut(doc, parents, pointer)?;
    match parent {
        Value::Object(map) => {
            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(arr) => {
            if last == "-" {
                arr.push(value);
                return Ok(());
            }
            let index = parse_index(last, pointer)?;
            if index > arr.len() {
                return Err(PatchError::OutOfBounds {
                    path: pointer.to_string(),
                    index,
                });
            }
            arr.insert(index, value);
            Ok(())
        }
        _ => Err(PatchError::NotAContainer(pointer.to_string())),
    }
}

/// Remove and return the value at `pointer`. Fails if it is absent.
fn remove(doc: &mut Value, pointer: &str) -> Result<Value, PatchError> {
    let tokens = parse_pointer(pointer)?;
    let Some((last, parents)) = tokens.split_last() else {
        // The whole document cannot be removed
        return Err(PatchError::NotFound(pointer.to_string()));
    };
    let parent = descend_mut(doc, parents, pointer)?;
    match parent {
        Value::Object(map) => map
            .remove(last)
            .ok_or_else(|| PatchError::NotFound(pointer.to_string())),
        Value::Array(arr) => {
            let index = parse_index(last, pointer)?;
            if index >= arr.len() {
                return Err(PatchError::OutOfBounds {
                    path: pointer.to_string(),
                    index,
                });
            }
            Ok(arr.remove(index))
        }
        _ => Err(PatchError::NotAContainer(pointer.to_string())),
    }
}

fn parse_index(token: &str, pointer: &str) -> Result<usize, PatchError> {
    token.parse().map_err(|_| PatchError::InvalidIndex {
        path: pointer.to_string(),
        token: token.to_string(),
    })
}

#[cfg(test)]
#[path = "patch_tests.rs"]
mod tests;
