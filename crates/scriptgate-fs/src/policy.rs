//! Module and include resolution policy.
//!
//! A policy bundles the host's module resolver, include resolver and
//! module-allow predicate. Accessors share one policy: the accessor that
//! built it owns it, derived accessors only hold a weak handle.

use serde::Serialize;

use scriptgate_core::path::{combine_path, extract_dir, extract_file_name};

use crate::access::FileAccessor;
use crate::error::{FsError, Result};

/// First character of a mount-qualified request (`%app/foo`).
pub const MOUNT_MARKER: char = '%';

/// Extension assumed for module requests that carry none.
pub const SCRIPT_EXTENSION: &str = ".das";

/// `(request, base_dir) -> candidate path`
pub type ModuleResolver = Box<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;
/// `(request, base_dir) -> include path`
pub type IncludeResolver = Box<dyn Fn(&str, &str) -> Option<String> + Send + Sync>;
/// `(module_name) -> allowed`
pub type ModuleAllowed = Box<dyn Fn(&str) -> bool + Send + Sync>;

/// Where a module request resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub module_name: String,
    pub file_name: String,
}

impl ModuleInfo {
    fn for_file(file_name: String) -> Self {
        Self {
            module_name: module_name_for(&file_name).to_string(),
            file_name,
        }
    }
}

/// File stem of the last path component.
fn module_name_for(file_name: &str) -> &str {
    let name = extract_file_name(file_name);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(i) => &name[..i],
    }
}

fn has_extension(path: &str) -> bool {
    extract_file_name(path).rfind('.').is_some_and(|i| i > 0)
}

/// Resolution used when no module resolver is configured.
///
/// Dotted names (`util.strings`) become `util/strings.das` under `base_dir`;
/// requests that already look like paths are joined as-is. Mount-qualified
/// requests cannot be resolved without a resolver.
pub fn baseline_path(request: &str, base_dir: &str) -> Option<String> {
    if request.is_empty() || request.starts_with(MOUNT_MARKER) {
        return None;
    }
    let looks_like_path = request.contains(['/', '\\']) || request.ends_with(SCRIPT_EXTENSION);
    let relative = if looks_like_path {
        request.to_string()
    } else {
        format!("{}{}", request.replace('.', "/"), SCRIPT_EXTENSION)
    };
    if base_dir.is_empty() {
        Some(relative)
    } else {
        Some(combine_path(base_dir, &relative))
    }
}

/// Host-supplied resolution callbacks plus the base resource they came from.
#[derive(Default)]
pub struct ResolutionPolicy {
    base: String,
    module_resolver: Option<ModuleResolver>,
    include_resolver: Option<IncludeResolver>,
    module_allowed: Option<ModuleAllowed>,
}

impl std::fmt::Debug for ResolutionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionPolicy")
            .field("base", &self.base)
            .field("module_resolver", &self.module_resolver.is_some())
            .field("include_resolver", &self.include_resolver.is_some())
            .field("module_allowed", &self.module_allowed.is_some())
            .finish()
    }
}

impl ResolutionPolicy {
    /// Policy with no callbacks yet; `failed()` until a module resolver is set.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            ..Self::default()
        }
    }

    pub fn with_module_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.module_resolver = Some(Box::new(f));
        self
    }

    pub fn with_include_resolver<F>(mut self, f: F) -> Self
    where
        F: Fn(&str, &str) -> Option<String> + Send + Sync + 'static,
    {
        self.include_resolver = Some(Box::new(f));
        self
    }

    pub fn with_module_allowed<F>(mut self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.module_allowed = Some(Box::new(f));
        self
    }

    /// The base resource this policy was built from.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// True when no module resolver is available and the baseline is used.
    pub fn failed(&self) -> bool {
        self.module_resolver.is_none()
    }

    pub fn is_module_allowed(&self, module_name: &str) -> bool {
        self.module_allowed.as_ref().map_or(true, |f| f(module_name))
    }

    /// Resolve `request` against `base_dir`, then consult the allow predicate.
    pub fn resolve_module(&self, request: &str, base_dir: &str) -> Result<ModuleInfo> {
        if request.is_empty() {
            return Err(FsError::resolution(request, base_dir, "empty module request"));
        }
        let candidate = match &self.module_resolver {
            Some(resolve) => resolve(request, base_dir).filter(|p| !p.is_empty()),
            None => baseline_path(request, base_dir),
        };
        let Some(file_name) = candidate else {
            return Err(FsError::resolution(request, base_dir, "no candidate path"));
        };
        let info = ModuleInfo::for_file(file_name);
        if !self.is_module_allowed(&info.module_name) {
            return Err(FsError::resolution(
                request,
                base_dir,
                format!("module '{}' is not allowed", info.module_name),
            ));
        }
        Ok(info)
    }

    /// Resolve a textual include; the baseline joins it onto `base_dir`.
    pub fn resolve_include(&self, request: &str, base_dir: &str) -> Result<String> {
        if request.is_empty() {
            return Err(FsError::resolution(request, base_dir, "empty include request"));
        }
        let resolved = match &self.include_resolver {
            Some(resolve) => resolve(request, base_dir).filter(|p| !p.is_empty()),
            None if base_dir.is_empty() => Some(request.to_string()),
            None => Some(combine_path(base_dir, request)),
        };
        resolved.ok_or_else(|| FsError::resolution(request, base_dir, "include not found"))
    }
}

/// Builds the policy for a root accessor from its base resource.
///
/// `access` is a bare accessor the builder may use to read the resource.
pub trait PolicyBuilder {
    fn build(&self, base: &str, access: &mut FileAccessor) -> Result<ResolutionPolicy>;
}

impl<F> PolicyBuilder for F
where
    F: Fn(&str, &mut FileAccessor) -> Result<ResolutionPolicy>,
{
    fn build(&self, base: &str, access: &mut FileAccessor) -> Result<ResolutionPolicy> {
        self(base, access)
    }
}

/// Named directories addressed by `%name/rest` module requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mounts {
    entries: Vec<(String, String)>,
}

impl Mounts {
    /// Parse `name=dir` pairs separated by `;` or newlines. `#` starts a
    /// comment line; malformed entries are skipped with a warning.
    pub fn parse(spec: &str) -> Self {
        let mut mounts = Self::default();
        for item in spec.split([';', '\n']) {
            let item = item.trim();
            if item.is_empty() || item.starts_with('#') {
                continue;
            }
            match item.split_once('=') {
                Some((name, dir)) if !name.trim().is_empty() && !dir.trim().is_empty() => {
                    mounts.add(name.trim(), dir.trim());
                }
                _ => tracing::warn!("Ignoring malformed mount entry '{}'", item),
            }
        }
        mounts
    }

    /// Add or replace a mount.
    pub fn add(&mut self, name: impl Into<String>, dir: impl Into<String>) {
        let name = name.into();
        let dir = dir.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = dir,
            None => self.entries.push((name, dir)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, d)| d.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Prefix every relative mount directory with `dir`.
    fn relative_to(mut self, dir: &str) -> Self {
        if dir.is_empty() {
            return self;
        }
        for (_, d) in &mut self.entries {
            if !d.starts_with('/') && !d.contains(':') {
                *d = combine_path(dir, d);
            }
        }
        self
    }

    /// Map `%name/rest` into the mount, everything else through the baseline.
    pub fn resolve(&self, request: &str, base_dir: &str) -> Option<String> {
        let Some(qualified) = request.strip_prefix(MOUNT_MARKER) else {
            return baseline_path(request, base_dir);
        };
        let (name, rest) = qualified.split_once(['/', '\\'])?;
        if rest.is_empty() {
            return None;
        }
        let dir = self.get(name)?;
        let path = combine_path(dir, rest);
        if has_extension(rest) {
            Some(path)
        } else {
            Some(format!("{}{}", path, SCRIPT_EXTENSION))
        }
    }

    pub fn into_policy(self, base: impl Into<String>) -> ResolutionPolicy {
        ResolutionPolicy::new(base).with_module_resolver(move |req, dir| self.resolve(req, dir))
    }
}

impl PolicyBuilder for Mounts {
    fn build(&self, base: &str, _access: &mut FileAccessor) -> Result<ResolutionPolicy> {
        Ok(self.clone().into_policy(base))
    }
}

/// Reads the base resource as a mount list (same syntax as [`Mounts::parse`])
/// through the sandboxed accessor. Relative mount directories are taken
/// relative to the manifest's own directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct MountManifest;

impl PolicyBuilder for MountManifest {
    fn build(&self, base: &str, access: &mut FileAccessor) -> Result<ResolutionPolicy> {
        let manifest = access.load(base)?;
        let text = String::from_utf8_lossy(manifest.source());
        let mounts = Mounts::parse(&text).relative_to(extract_dir(base));
        if mounts.is_empty() {
            tracing::warn!("Mount manifest '{}' declares no mounts", base);
        }
        Ok(mounts.into_policy(base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_path() {
        assert_eq!(baseline_path("util.strings", "src"), Some("src/util/strings.das".to_string()));
        assert_eq!(baseline_path("main", ""), Some("main.das".to_string()));
        assert_eq!(baseline_path("lib/x.das", "src/"), Some("src/lib/x.das".to_string()));
        assert_eq!(baseline_path("x.das", ""), Some("x.das".to_string()));
        assert_eq!(baseline_path("%app/x", "src"), None);
        assert_eq!(baseline_path("", "src"), None);
    }

    #[test]
    fn test_module_name_for() {
        assert_eq!(module_name_for("a/b/strings.das"), "strings");
        assert_eq!(module_name_for("a\\b\\x"), "x");
        assert_eq!(module_name_for(".hidden"), ".hidden");
    }

    #[test]
    fn test_policy_without_resolver_is_failed_and_uses_baseline() {
        let policy = ResolutionPolicy::new("project.mounts");
        assert!(policy.failed());
        assert_eq!(policy.base(), "project.mounts");
        let info = policy.resolve_module("util.math", "scripts").unwrap();
        assert_eq!(info.file_name, "scripts/util/math.das");
        assert_eq!(info.module_name, "math");
    }

    #[test]
    fn test_policy_resolver_and_allow_predicate() {
        let policy = ResolutionPolicy::new("base")
            .with_module_resolver(|req, dir| Some(format!("{dir}/mods/{req}.das")))
            .with_module_allowed(|m| m != "forbidden");
        assert!(!policy.failed());

        let info = policy.resolve_module("net", "app").unwrap();
        assert_eq!(info.file_name, "app/mods/net.das");

        let err = policy.resolve_module("forbidden", "app").unwrap_err();
        assert!(err.to_string().contains("not allowed"));
        assert!(matches!(err, FsError::ModuleResolutionFailed { .. }));
    }

    #[test]
    fn test_empty_candidate_is_a_failure() {
        let policy = ResolutionPolicy::new("base").with_module_resolver(|_, _| Some(String::new()));
        assert!(policy.resolve_module("x", "").is_err());
        assert!(policy.resolve_module("", "").is_err());
    }

    #[test]
    fn test_include_resolution() {
        let baseline = ResolutionPolicy::new("base");
        assert_eq!(baseline.resolve_include("inc.das", "a/b").unwrap(), "a/b/inc.das");
        assert_eq!(baseline.resolve_include("inc.das", "").unwrap(), "inc.das");

        let custom = ResolutionPolicy::new("base").with_include_resolver(|req, _| {
            (req == "known.das").then(|| "includes/known.das".to_string())
        });
        assert_eq!(custom.resolve_include("known.das", "x").unwrap(), "includes/known.das");
        assert!(custom.resolve_include("other.das", "x").is_err());
    }

    #[test]
    fn test_mounts_parse_and_resolve() {
        let mounts = Mounts::parse("app=scripts/app; lib = vendor/lib\n# comment\nbroken;=nodir");
        assert_eq!(mounts.get("app"), Some("scripts/app"));
        assert_eq!(mounts.get("lib"), Some("vendor/lib"));
        assert_eq!(mounts.get("broken"), None);

        assert_eq!(mounts.resolve("%app/foo", "ignored"), Some("scripts/app/foo.das".to_string()));
        assert_eq!(mounts.resolve("%lib/x/y.das", ""), Some("vendor/lib/x/y.das".to_string()));
        assert_eq!(mounts.resolve("%missing/foo", ""), None);
        assert_eq!(mounts.resolve("%app", ""), None);
        assert_eq!(mounts.resolve("local", "src"), Some("src/local.das".to_string()));
    }

    #[test]
    fn test_mounts_add_replaces() {
        let mut mounts = Mounts::default();
        mounts.add("app", "a");
        mounts.add("app", "b");
        assert_eq!(mounts.get("app"), Some("b"));
    }

    #[test]
    fn test_mounts_relative_to_manifest_dir() {
        let mounts = Mounts::parse("app=app;abs=/opt/x").relative_to("project");
        assert_eq!(mounts.get("app"), Some("project/app"));
        assert_eq!(mounts.get("abs"), Some("/opt/x"));
    }
}
