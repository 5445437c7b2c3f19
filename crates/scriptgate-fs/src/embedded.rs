//! Embedded library table.
//!
//! A read-only map from a bare file name (`math.das`) to library source,
//! consulted when a `daslib/...` request has no real file behind it. The table
//! is built once at startup and installed process-wide; installation leaks it
//! on purpose so borrowed sources stay valid until exit. Reads need no locking
//! because nothing mutates the table after installation.

use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;

use scriptgate_core::config::SandboxConfig;
use scriptgate_core::path::{extract_file_name, is_slash};

use crate::error::{FsError, Result};

/// Directory name marking the embedded library namespace.
pub const LIBRARY_NAMESPACE: &str = "daslib";

static INSTALLED: OnceLock<&'static EmbeddedLibrary> = OnceLock::new();

/// Library sources packed into one arena, each NUL-terminated.
#[derive(Debug, Default)]
pub struct EmbeddedLibrary {
    arena: Vec<u8>,
    entries: HashMap<String, Range<usize>>,
}

impl EmbeddedLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Table holding the sources compiled into this crate.
    pub fn bundled() -> Self {
        let mut lib = Self::new();
        for (name, source) in crate::bundled::SOURCES {
            lib.insert(*name, source);
        }
        lib
    }

    /// Add or replace an entry. Replaced bytes stay in the arena.
    pub fn insert(&mut self, name: impl Into<String>, source: &[u8]) {
        let start = self.arena.len();
        self.arena.extend_from_slice(source);
        self.arena.push(0);
        self.entries.insert(name.into(), start..self.arena.len());
    }

    /// Add every regular file directly inside `dir`, keyed by file name.
    /// Returns how many entries were added.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let io_err = |source| FsError::Io {
            path: dir.display().to_string(),
            source,
        };
        let mut files: Vec<_> = std::fs::read_dir(dir)
            .map_err(io_err)?
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .collect();
        files.sort_by_key(|e| e.file_name());

        let mut added = 0;
        for entry in files {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                tracing::warn!("Skipping non UTF-8 library file in {}", dir.display());
                continue;
            };
            let path = entry.path();
            let source = std::fs::read(&path).map_err(|source| FsError::Io {
                path: path.display().to_string(),
                source,
            })?;
            self.insert(name, &source);
            added += 1;
        }
        Ok(added)
    }

    /// Terminated source for a bare file name.
    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries.get(name).map(|r| &self.arena[r.clone()])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Entry names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Give the table a process lifetime. Never freed.
    pub fn leak(self) -> &'static EmbeddedLibrary {
        Box::leak(Box::new(self))
    }
}

/// Install `lib` as the process-wide table. Only the first call succeeds.
pub fn install(lib: EmbeddedLibrary) -> Result<&'static EmbeddedLibrary> {
    if INSTALLED.get().is_some() {
        return Err(FsError::LibraryAlreadyInstalled);
    }
    let leaked = lib.leak();
    INSTALLED
        .set(leaked)
        .map_err(|_| FsError::LibraryAlreadyInstalled)?;
    tracing::debug!("Installed embedded library with {} entries", leaked.len());
    Ok(leaked)
}

/// The installed table, if [`install`] has run.
pub fn installed() -> Option<&'static EmbeddedLibrary> {
    INSTALLED.get().copied()
}

/// Build the bundled table plus `config.library_dir` and install it.
pub fn initialize(config: &SandboxConfig) -> Result<&'static EmbeddedLibrary> {
    let mut lib = EmbeddedLibrary::bundled();
    if let Some(dir) = config.library_dir.as_deref() {
        let added = lib.load_dir(Path::new(dir))?;
        tracing::info!("Added {} library sources from {}", added, dir);
    }
    install(lib)
}

/// Table key for `path` when it points into the library namespace.
///
/// `daslib/x.das`, `.../daslib/x.das` and `...\daslib/x.das` all map to
/// `x.das`; anything else is outside the namespace.
pub fn library_key(path: &str) -> Option<&str> {
    let in_namespace = path
        .strip_prefix(LIBRARY_NAMESPACE)
        .is_some_and(|rest| rest.starts_with('/'))
        || path.match_indices(LIBRARY_NAMESPACE).any(|(i, _)| {
            i > 0
                && is_slash(path.as_bytes()[i - 1])
                && path.as_bytes().get(i + LIBRARY_NAMESPACE.len()) == Some(&b'/')
        });
    in_namespace.then(|| extract_file_name(path))
}
