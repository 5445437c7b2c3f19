//! Sandboxed file accessor.
//!
//! Loads script sources for the compiler: real files first, the embedded
//! library as the single fallback. Resolution callbacks come from a
//! [`ResolutionPolicy`] that the root accessor owns and derived accessors
//! borrow through a weak handle, so a derived accessor can never keep the
//! parent's policy alive or release it.
//!
//! One accessor serves one thread; give other threads their own derived
//! accessor.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::sync::{Arc, Weak};

use serde::Serialize;

use scriptgate_core::observability;
use scriptgate_core::path::{extract_dir, file_mtime};
use scriptgate_core::path_validation::{self, PathError, Rejection, TrustMode};

use crate::embedded::{self, library_key, EmbeddedLibrary};
use crate::error::{FsError, Result};
use crate::loaded::LoadedFile;
use crate::policy::{ModuleInfo, PolicyBuilder, ResolutionPolicy, MOUNT_MARKER};


/// A file opened with hot-reload tracking on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenedFile {
    pub path: String,
    /// Seconds since the Unix epoch at load time.
    pub mtime: u64,
}

enum PolicyHandle {
    None,
    Owned(Arc<ResolutionPolicy>),
    Shared(Weak<ResolutionPolicy>),
}

pub struct FileAccessor {
    policy: PolicyHandle,
    derived: bool,
    trust: TrustMode,
    library: Option<&'static EmbeddedLibrary>,
    track_opened: bool,
    opened: Vec<OpenedFile>,
    cache: HashMap<String, Arc<LoadedFile>>,
}

impl FileAccessor {
    /// Bare accessor: no policy until [`FileAccessor::attach_policy`].
    pub fn new(hot_reload: bool) -> Self {
        Self {
            policy: PolicyHandle::None,
            derived: false,
            trust: TrustMode::Sandboxed,
            library: None,
            track_opened: hot_reload,
            opened: Vec::new(),
            cache: HashMap::new(),
        }
    }

    /// Root accessor owning the policy built from `base`.
    pub fn root(base: &str, hot_reload: bool, builder: &dyn PolicyBuilder) -> Self {
        Self::new(hot_reload).build_policy(base, builder)
    }

    /// Accessor sharing `parent`'s policy, trust mode and library, with its
    /// own cache and opened-file list. Without a parent this is a bare accessor.
    pub fn derived(parent: Option<&FileAccessor>, hot_reload: bool) -> Self {
        let mut access = Self::new(hot_reload);
        if let Some(parent) = parent {
            access.policy = match &parent.policy {
                PolicyHandle::None => PolicyHandle::None,
                PolicyHandle::Owned(p) => PolicyHandle::Shared(Arc::downgrade(p)),
                PolicyHandle::Shared(w) => PolicyHandle::Shared(w.clone()),
            };
            access.trust = parent.trust;
            access.library = parent.library;
            access.derived = true;
        }
        access
    }

    pub fn with_trust_mode(mut self, trust: TrustMode) -> Self {
        self.trust = trust;
        self
    }

    /// Use `library` instead of the process-wide installed table.
    pub fn with_library(mut self, library: &'static EmbeddedLibrary) -> Self {
        self.library = Some(library);
        self
    }

    /// Build and attach the policy for `base`. A failed build leaves the
    /// accessor with a policy that reports `failed()` and resolves through the
    /// baseline.
    pub fn build_policy(mut self, base: &str, builder: &dyn PolicyBuilder) -> Self {
        let mut bootstrap = FileAccessor::new(false).with_trust_mode(self.trust);
        bootstrap.library = self.library;
        let policy = match builder.build(base, &mut bootstrap) {
            Ok(policy) => policy,
            Err(e) => {
                tracing::warn!("Cannot build resolution policy from '{}': {}", base, e);
                ResolutionPolicy::new(base)
            }
        };
        self.attach_policy(policy);
        self
    }

    /// Take ownership of `policy`. A derived accessor stops sharing its
    /// parent's policy and becomes an owner.
    pub fn attach_policy(&mut self, policy: ResolutionPolicy) {
        self.policy = PolicyHandle::Owned(Arc::new(policy));
        self.derived = false;
    }

    pub fn is_derived(&self) -> bool {
        self.derived
    }

    pub fn trust_mode(&self) -> TrustMode {
        self.trust
    }

    pub fn tracks_opened_files(&self) -> bool {
        self.track_opened
    }

    /// Files opened since creation, oldest first. Only filled with hot reload on.
    pub fn opened_files(&self) -> &[OpenedFile] {
        &self.opened
    }

    /// True when no usable module resolver is attached.
    pub fn failed(&self) -> bool {
        match &self.policy {
            PolicyHandle::None => true,
            PolicyHandle::Owned(p) => p.failed(),
            PolicyHandle::Shared(w) => w.upgrade().map_or(true, |p| p.failed()),
        }
    }

    pub fn is_path_valid(&self, path: &str) -> bool {
        path_validation::is_path_valid(path, self.trust)
    }

    fn library(&self) -> Option<&'static EmbeddedLibrary> {
        self.library.or_else(embedded::installed)
    }

    /// Load `path` fresh.
    ///
    /// A path failing validation is never opened on disk, but may still be
    /// served from the embedded library.
    pub fn load(&mut self, path: &str) -> Result<LoadedFile> {
        let rejection = match path_validation::validate_path(path, self.trust) {
            Ok(()) => None,
            Err(PathError::EmptyPath) => return Err(FsError::EmptyPath),
            Err(PathError::InvalidPath { reason, .. }) => Some(reason),
        };

        if rejection.is_none() {
            match File::open(path) {
                Ok(file) => return self.read_opened(path, file),
                Err(e) => tracing::debug!("Cannot open '{}': {}", path, e),
            }
        }

        if let Some(found) = self.load_from_library(path) {
            return Ok(found);
        }

        match rejection {
            Some(reason) => Err(self.blocked(path, reason)),
            None => Err(FsError::FileNotFound(path.to_string())),
        }
    }

    fn blocked(&self, path: &str, reason: Rejection) -> FsError {
        observability::security_blocked_path(path, reason.as_str());
        FsError::InvalidPath {
            path: path.to_string(),
            reason,
        }
    }

    fn read_opened(&mut self, path: &str, mut file: File) -> Result<LoadedFile> {
        let read_err = |source| FsError::ReadError {
            path: path.to_string(),
            source,
        };
        let meta = file.metadata().map_err(read_err)?;
        if meta.is_dir() {
            return Err(read_err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "is a directory",
            )));
        }
        let len = usize::try_from(meta.len()).map_err(|_| {
            read_err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "file too large",
            ))
        })?;

        let mut contents = Vec::with_capacity(len + 1);
        contents.resize(len, 0);
        file.read_exact(&mut contents).map_err(read_err)?;

        if self.track_opened {
            self.opened.push(OpenedFile {
                path: path.to_string(),
                mtime: file_mtime(path),
            });
        }
        tracing::debug!("Loaded '{}' ({} bytes)", path, len);
        Ok(LoadedFile::owned(path, contents))
    }

    fn load_from_library(&self, path: &str) -> Option<LoadedFile> {
        let key = library_key(path)?;
        let source = self.library()?.get(key)?;
        tracing::debug!("Serving '{}' from embedded library entry '{}'", path, key);
        Some(LoadedFile::borrowed(path, source))
    }

    /// Cached load: the first successful load of `path` is reused until
    /// [`FileAccessor::forget`] drops it.
    pub fn file(&mut self, path: &str) -> Result<Arc<LoadedFile>> {
        if let Some(hit) = self.cache.get(path) {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(self.load(path)?);
        self.cache.insert(path.to_string(), Arc::clone(&loaded));
        Ok(loaded)
    }

    /// Drop `path` from the cache. Returns whether it was cached.
    pub fn forget(&mut self, path: &str) -> bool {
        self.cache.remove(path).is_some()
    }

    fn with_policy<T>(
        &self,
        request: &str,
        base_dir: &str,
        f: impl FnOnce(&ResolutionPolicy) -> Result<T>,
    ) -> Result<T> {
        match &self.policy {
            PolicyHandle::None => f(&ResolutionPolicy::default()),
            PolicyHandle::Owned(p) => f(p),
            PolicyHandle::Shared(w) => match w.upgrade() {
                Some(p) => f(&p),
                None => Err(FsError::resolution(
                    request,
                    base_dir,
                    "parent resolution policy was released",
                )),
            },
        }
    }

    /// Resolve a module request made from `from_file`.
    ///
    /// Relative to `from_file`'s directory first; a mount-qualified request
    /// (`%name/...`) that fails there is retried with an empty base.
    pub fn resolve_module(&self, request: &str, from_file: &str) -> Result<ModuleInfo> {
        let base_dir = extract_dir(from_file);
        let first = self.with_policy(request, base_dir, |p| p.resolve_module(request, base_dir));
        match first {
            Err(e) if request.starts_with(MOUNT_MARKER) && !base_dir.is_empty() => {
                tracing::debug!("Retrying '{}' without base directory: {}", request, e);
                self.with_policy(request, "", |p| p.resolve_module(request, ""))
            }
            other => other,
        }
    }

    /// Resolve a textual include made from `from_file`.
    pub fn resolve_include(&self, request: &str, from_file: &str) -> Result<String> {
        let base_dir = extract_dir(from_file);
        self.with_policy(request, base_dir, |p| p.resolve_include(request, base_dir))
    }

    pub fn is_module_allowed(&self, module_name: &str) -> bool {
        self.with_policy(module_name, "", |p| Ok(p.is_module_allowed(module_name)))
            .unwrap_or(false)
    }
}
