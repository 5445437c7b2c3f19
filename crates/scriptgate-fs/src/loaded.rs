//! Loaded script sources and who owns their bytes.

use std::fmt;

/// Who is responsible for a [`LoadedFile`]'s bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// Read from the real filesystem; freed when the `LoadedFile` drops.
    Owned,
    /// Lives in the embedded library for the rest of the process.
    Borrowed,
}

enum SourceBuf {
    Owned(Box<[u8]>),
    Borrowed(&'static [u8]),
}

/// Immutable script source.
///
/// The buffer always carries one trailing NUL so it can be handed to a parser
/// expecting a terminated text source; [`LoadedFile::source`] excludes it.
pub struct LoadedFile {
    path: String,
    buf: SourceBuf,
}

impl LoadedFile {
    /// Take ownership of `contents`, appending the terminator.
    pub(crate) fn owned(path: impl Into<String>, mut contents: Vec<u8>) -> Self {
        contents.push(0);
        Self {
            path: path.into(),
            buf: SourceBuf::Owned(contents.into_boxed_slice()),
        }
    }

    /// `terminated` must already end with a NUL.
    pub(crate) fn borrowed(path: impl Into<String>, terminated: &'static [u8]) -> Self {
        debug_assert_eq!(terminated.last(), Some(&0));
        Self {
            path: path.into(),
            buf: SourceBuf::Borrowed(terminated),
        }
    }

    /// The path the file was requested under.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn terminated(&self) -> &[u8] {
        match &self.buf {
            SourceBuf::Owned(b) => b,
            SourceBuf::Borrowed(b) => b,
        }
    }

    /// Source bytes without the terminator.
    pub fn source(&self) -> &[u8] {
        let t = self.terminated();
        &t[..t.len() - 1]
    }

    /// Source bytes including the trailing NUL.
    pub fn source_with_nul(&self) -> &[u8] {
        self.terminated()
    }

    pub fn as_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.source())
    }

    pub fn len(&self) -> usize {
        self.terminated().len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ownership(&self) -> Ownership {
        match self.buf {
            SourceBuf::Owned(_) => Ownership::Owned,
            SourceBuf::Borrowed(_) => Ownership::Borrowed,
        }
    }

    pub fn is_owned(&self) -> bool {
        self.ownership() == Ownership::Owned
    }
}

impl fmt::Debug for LoadedFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadedFile")
            .field("path", &self.path)
            .field("len", &self.len())
            .field("ownership", &self.ownership())
            .finish()
    }
}
