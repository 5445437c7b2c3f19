//! Subcommand implementations.

use std::io::Write;

use anyhow::{Context, Result};
use serde_json::json;

use scriptgate_core::config::SandboxConfig;
use scriptgate_core::path;
use scriptgate_core::path_validation::{
    is_path_valid, read_whole_file, validate_path, PathError, TrustMode,
};
use scriptgate_fs::{embedded, FileAccessor, MountManifest, Mounts, Ownership};

/// Accessor for this invocation: manifest policy, else `SCRIPTGATE_MOUNTS`,
/// else a bare accessor on the baseline.
pub fn build_accessor(config: &SandboxConfig, project: Option<&str>) -> FileAccessor {
    let access = FileAccessor::new(config.hot_reload).with_trust_mode(config.trust_mode);
    match (project, config.mounts.as_deref()) {
        (Some(manifest), _) => access.build_policy(manifest, &MountManifest),
        (None, Some(spec)) => access.build_policy("SCRIPTGATE_MOUNTS", &Mounts::parse(spec)),
        (None, None) => access,
    }
}

fn verdict(path: &str, trust: TrustMode) -> String {
    if is_path_valid(path, trust) {
        return format!("valid\t{}", path);
    }
    match validate_path(path, trust) {
        Err(PathError::InvalidPath { reason, .. }) => format!("invalid\t{}\t{}", path, reason),
        _ => format!("invalid\t{}", path),
    }
}

pub fn check(paths: &[String], trust: TrustMode) -> Result<()> {
    let mut rejected = 0;
    for p in paths {
        if !is_path_valid(p, trust) {
            rejected += 1;
        }
        println!("{}", verdict(p, trust));
    }
    if rejected > 0 {
        anyhow::bail!("{} of {} path(s) rejected", rejected, paths.len());
    }
    Ok(())
}

pub fn load(access: &mut FileAccessor, path: &str, as_json: bool) -> Result<()> {
    let loaded = access.load(path)?;
    if as_json {
        let summary = json!({
            "path": loaded.path(),
            "len": loaded.len(),
            "ownership": match loaded.ownership() {
                Ownership::Owned => "owned",
                Ownership::Borrowed => "borrowed",
            },
            "opened": access.opened_files(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let mut out = std::io::stdout().lock();
        out.write_all(loaded.source())
            .context("Cannot write source to stdout")?;
        out.flush()?;
    }
    Ok(())
}

pub fn read(path: &str, trust: TrustMode) -> Result<()> {
    let bytes = read_whole_file(path, trust)?;
    let mut out = std::io::stdout().lock();
    out.write_all(&bytes).context("Cannot write file to stdout")?;
    out.flush()?;
    Ok(())
}

pub fn resolve(access: &FileAccessor, request: &str, from: &str, include: bool) -> Result<()> {
    if include {
        println!("{}", access.resolve_include(request, from)?);
    } else {
        let info = access.resolve_module(request, from)?;
        println!("{}", serde_json::to_string_pretty(&info)?);
    }
    Ok(())
}

pub fn library() -> Result<()> {
    let lib = embedded::installed().context("Embedded library is not installed")?;
    for name in lib.names() {
        let len = lib.get(name).map_or(0, |s| s.len().saturating_sub(1));
        println!("{}\t{}", name, len);
    }
    Ok(())
}

pub fn cwd() -> Result<()> {
    println!("{}", path::current_dir()?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_reports_reason() {
        assert_eq!(verdict("a/b.das", TrustMode::Sandboxed), "valid\ta/b.das");
        assert_eq!(
            verdict("../x", TrustMode::Sandboxed),
            "invalid\t../x\tparent directory prefix"
        );
        assert_eq!(verdict("/etc/passwd", TrustMode::Trusted), "valid\t/etc/passwd");
    }

    #[test]
    fn test_check_fails_when_any_path_rejected() {
        let ok = vec!["a.das".to_string(), "b/c.das".to_string()];
        assert!(check(&ok, TrustMode::Sandboxed).is_ok());
        let bad = vec!["a.das".to_string(), "~/x".to_string()];
        let err = check(&bad, TrustMode::Sandboxed).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));
    }

    #[test]
    fn test_read_rejects_escaping_path() {
        let err = read("../outside.das", TrustMode::Sandboxed).unwrap_err();
        assert!(err.downcast_ref::<PathError>().is_some());
    }

    #[test]
    fn test_build_accessor_from_mount_env() {
        let config = SandboxConfig {
            mounts: Some("app=scripts/app".to_string()),
            ..SandboxConfig::default()
        };
        let access = build_accessor(&config, None);
        assert!(!access.failed());
        let info = access.resolve_module("%app/menu", "main.das").unwrap();
        assert_eq!(info.file_name, "scripts/app/menu.das");

        let bare = build_accessor(&SandboxConfig::default(), None);
        assert!(bare.failed());
    }
}
