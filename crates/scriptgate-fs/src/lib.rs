//! Sandboxed file access for a script-hosting runtime.
//!
//! [`FileAccessor`] turns load and module requests into source text: paths are
//! checked by [`scriptgate_core::path_validation`], real files are read whole,
//! and `daslib/...` requests fall back to the [`EmbeddedLibrary`].

pub mod access;
pub mod bundled;
pub mod embedded;
pub mod error;
pub mod loaded;
pub mod policy;

pub use access::{FileAccessor, OpenedFile};
pub use embedded::EmbeddedLibrary;
pub use error::{FsError, Result};
pub use loaded::{LoadedFile, Ownership};
pub use policy::{ModuleInfo, MountManifest, Mounts, PolicyBuilder, ResolutionPolicy};
