// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Version keys: the ordered identifiers attached to migration steps.
//!
//! Two schemes ship with the engine. [`NumericVersion`] orders by the integer
//! prefix of keys like `"3_add_roles"` and is the canonical scheme.
//! [`SemanticVersion`] orders full `major.minor.patch` triples for documents
//! versioned that way. The executor and registry only ever see the
//! [`VersionKey`] trait, so either scheme (or a future one) plugs in.

use serde_json::Value;
use std::fmt;

/// A totally-ordered migration version identifier.
///
/// Only relative ordering and equality matter to the engine. A document with
/// no version field is treated as being at [`VersionKey::zero`].
pub trait VersionKey: Clone + Ord + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// The version of a document no migration has touched.
    fn zero() -> Self;

    /// Parse the version prefix of a migration key or file stem, the part
    /// before the first `_` (e.g. `"3"` in `"3_add_roles"`). Returns `None`
    /// when the prefix is not a valid token of this scheme.
    fn parse_prefix(key: &str) -> Option<Self>;

    /// Read a version out of a document's version field.
    fn from_value(value: &Value) -> Option<Self>;

    /// The JSON representation stamped into a document's version field.
    fn to_value(&self) -> Value;
}

/// Non-negative integer version, stored in documents as a JSON number.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NumericVersion(pub u64);

impl fmt::Display for NumericVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NumericVersion {
    fn from(n: u64) -> Self {
        Self(n)
    }
}

impl VersionKey for NumericVersion {
    fn zero() -> Self {
        Self(0)
    }

    fn parse_prefix(key: &str) -> Option<Self> {
        let prefix = key.split('_').next()?;
        prefix.parse().ok().map(Self)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_u64().map(Self)
    }

    fn to_value(&self) -> Value {
        Value::from(self.0)
    }
}

/// `major.minor.patch` version, stored in documents as a string.
///
/// Ordering is field order: major, then minor, then patch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SemanticVersion {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse a `"1.2.0"` triple. All three components are required.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            major,
            minor,
            patch,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl VersionKey for SemanticVersion {
    fn zero() -> Self {
        Self::default()
    }

    fn parse_prefix(key: &str) -> Option<Self> {
        let prefix = key.split('_').next()?;
        Self::parse(prefix)
    }

    fn from_value(value: &Value) -> Option<Self> {
        value.as_str().and_then(Self::parse)
    }

    fn to_value(&self) -> Value {
        Value::String(self.to_string())
    }
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
