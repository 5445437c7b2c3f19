//! Sandbox path validation.
//!
//! Decides whether a script-supplied path may be opened. Paths are judged as
//! strings relative to the sandbox root; nothing is canonicalized and the
//! filesystem is never touched.
//!
//! Stricter than a plain separator count: `a/../../b` and its `.`/`//`
//! padded forms are rejected because they end up above the root.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::is_slash;

/// How much a script is trusted. Threaded into every check instead of living
/// in a process-wide flag, so hosts with different trust levels can coexist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustMode {
    /// Paths must stay below the sandbox root.
    #[default]
    Sandboxed,
    /// Host-authored scripts: every path is accepted.
    Trusted,
}

impl TrustMode {
    pub fn from_flag(trusted: bool) -> Self {
        if trusted {
            TrustMode::Trusted
        } else {
            TrustMode::Sandboxed
        }
    }

    pub fn is_trusted(self) -> bool {
        matches!(self, TrustMode::Trusted)
    }
}

/// Errors returned by [`validate_path`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot open file. File name is empty.")]
    EmptyPath,

    #[error("Cannot open file '{path}'. Absolute paths or access to the parent directory is prohibited.")]
    InvalidPath { path: String, reason: Rejection },
}

/// Which rule rejected a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Contains `:` (drive letter or URI scheme).
    DriveSeparator,
    /// Starts with `/` or `~/`.
    Absolute,
    /// Starts with `../` or `..\`.
    ParentPrefix,
    /// Climbs above the root somewhere along the path.
    Escape,
}

impl Rejection {
    pub fn as_str(self) -> &'static str {
        match self {
            Rejection::DriveSeparator => "drive or scheme separator",
            Rejection::Absolute => "absolute or home-relative path",
            Rejection::ParentPrefix => "parent directory prefix",
            Rejection::Escape => "escapes the sandbox root",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// True when `path` may be opened under `trust`.
///
/// An empty path is *valid* here: this predicate only judges absoluteness and
/// traversal. Callers that need a non-empty path check that separately (see
/// [`validate_path`]).
pub fn is_path_valid(path: &str, trust: TrustMode) -> bool {
    trust.is_trusted() || check(path).is_none()
}

/// [`is_path_valid`] as a `Result`, also rejecting the empty path.
pub fn validate_path(path: &str, trust: TrustMode) -> Result<(), PathError> {
    if path.is_empty() {
        return Err(PathError::EmptyPath);
    }
    if trust.is_trusted() {
        return Ok(());
    }
    match check(path) {
        None => Ok(()),
        Some(reason) => Err(PathError::InvalidPath {
            path: path.to_string(),
            reason,
        }),
    }
}

/// Read all of `path` after validating it under `trust`.
///
/// Host-side helper with no library fallback. A rejected path surfaces as a
/// [`PathError`] that callers can downcast to.
pub fn read_whole_file(path: &str, trust: TrustMode) -> anyhow::Result<Vec<u8>> {
    validate_path(path, trust)?;
    std::fs::read(path).with_context(|| format!("Cannot read file '{}'", path))
}

fn check(path: &str) -> Option<Rejection> {
    let b = path.as_bytes();
    if b.is_empty() {
        return None;
    }
    if b.contains(&b':') {
        return Some(Rejection::DriveSeparator);
    }
    if b[0] == b'/' || b.starts_with(b"~/") {
        return Some(Rejection::Absolute);
    }
    if b.len() >= 3 && b.starts_with(b"..") && is_slash(b[2]) {
        return Some(Rejection::ParentPrefix);
    }

    // A separator closing a named segment counts +1, every textual ".." counts
    // -1. Empty, "." and ".." segments add nothing, so runs of separators and
    // "." segments cannot pad the depth.
    let mut depth: i64 = 0;
    let mut segment_start = 0;
    for i in 0..b.len() {
        if is_slash(b[i]) {
            if is_named_segment(&b[segment_start..i]) {
                depth += 1;
            }
            segment_start = i + 1;
        }
        if b[i] == b'.' && b.get(i + 1) == Some(&b'.') {
            depth -= 1;
        }
        if depth < 0 {
            return Some(Rejection::Escape);
        }
    }
    None
}

fn is_named_segment(segment: &[u8]) -> bool {
    !matches!(segment, b"" | b"." | b"..")
}
