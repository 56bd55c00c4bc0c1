// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! File-backed configuration with migration support.
//!
//! [`ConfigStore`] reads a YAML config file, runs any pending migrations via
//! `driftconf-migrate`, writes the migrated document back to disk, and parses
//! it into a typed model. Writing goes the other way: the typed model is
//! serialized, its version stamped to the latest known migration, and the
//! result written atomically.

mod store;
mod yaml;

pub use store::{ConfigError, ConfigStore};
pub use yaml::{from_yaml_str, to_yaml_string};
