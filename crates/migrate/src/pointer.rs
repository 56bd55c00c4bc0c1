// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RFC 6901 JSON pointer parsing.
//!
//! A pointer is split into reference tokens here; whether a token names a map
//! key or an array index is decided against the document during traversal,
//! since RFC 6901 tokens carry no type of their own.

use thiserror::Error;

/// Errors from parsing a JSON pointer string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PointerError {
    #[error("pointer must be empty or start with '/': {0}")]
    MissingLeadingSlash(String),
    #[error("invalid escape sequence '~{0}' in pointer")]
    InvalidEscape(char),
    #[error("dangling '~' at end of pointer token")]
    DanglingTilde,
}

/// Split a pointer into unescaped reference tokens.
///
/// The empty pointer refers to the whole document and yields no tokens.
/// `~1` unescapes to `/` and `~0` to `~`, in that order per the RFC.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    let Some(rest) = pointer.strip_prefix('/') else {
        return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
    };
    rest.split('/').map(unescape_token).collect()
}

fn unescape_token(token: &str) -> Result<String, PointerError> {
    if !token.contains('~') {
        return Ok(token.to_string());
    }
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();
    while let Some(c) = chars.next() {
        if c != '~' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('0') => out.push('~'),
            Some('1') => out.push('/'),
            Some(other) => return Err(PointerError::InvalidEscape(other)),
            None => return Err(PointerError::DanglingTilde),
        }
    }
    Ok(out)
}

#[cfg(test)]
#[path = "pointer_tests.rs"]
mod tests;
