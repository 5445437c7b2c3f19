//! Plain path string helpers and unvalidated filesystem queries.
//!
//! Nothing here enforces the sandbox. Callers that handle script-supplied
//! paths run them through [`crate::path_validation`] first.

use anyhow::{Context, Result};
use std::time::UNIX_EPOCH;

/// `/` or `\`.
#[inline]
pub fn is_slash(c: u8) -> bool {
    c == b'/' || c == b'\\'
}

fn trim_trailing_slashes(path: &str) -> &str {
    path.trim_end_matches(['/', '\\'])
}

fn last_slash(path: &str) -> Option<usize> {
    path.rfind(['/', '\\'])
}

/// Join `dir` and `name` with exactly one `/` between them.
pub fn combine_path(dir: &str, name: &str) -> String {
    let dir = trim_trailing_slashes(dir);
    let mut res = String::with_capacity(dir.len() + 1 + name.len());
    res.push_str(dir);
    res.push('/');
    res.push_str(name);
    res
}

/// Everything before the last separator, or `""` when there is none.
pub fn extract_dir(path: &str) -> &str {
    last_slash(path).map_or("", |i| &path[..i])
}

/// Everything after the last separator, or the whole path when there is none.
pub fn extract_file_name(path: &str) -> &str {
    last_slash(path).map_or(path, |i| &path[i + 1..])
}

pub fn file_exists(path: &str) -> bool {
    !path.is_empty() && std::fs::metadata(path).is_ok()
}

/// Modification time in whole seconds since the Unix epoch; 0 when unknown.
pub fn file_mtime(path: &str) -> u64 {
    if path.is_empty() {
        return 0;
    }
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .ok()
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs())
}

/// Change the process working directory. Trailing separators are trimmed;
/// an empty path is a no-op.
pub fn change_dir(path: &str) -> Result<()> {
    if path.is_empty() {
        return Ok(());
    }
    let trimmed = trim_trailing_slashes(path);
    // "/" trims down to nothing
    let target = if trimmed.is_empty() { &path[..1] } else { trimmed };
    std::env::set_current_dir(target)
        .with_context(|| format!("Cannot change directory to '{}'", target))
}

pub fn current_dir() -> Result<String> {
    let dir = std::env::current_dir().context("Cannot query current directory")?;
    Ok(dir.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combine_path_single_separator() {
        assert_eq!(combine_path("dir/", "x.das"), "dir/x.das");
        assert_eq!(combine_path("dir", "x.das"), "dir/x.das");
        assert_eq!(combine_path("dir///", "x"), "dir/x");
        assert_eq!(combine_path("dir\\/\\", "x"), "dir/x");
        assert_eq!(combine_path("", "x"), "/x");
    }

    #[test]
    fn test_extract_dir_and_file_name() {
        assert_eq!(extract_dir("a/b/c.das"), "a/b");
        assert_eq!(extract_file_name("a/b/c.das"), "c.das");
        assert_eq!(extract_dir("c.das"), "");
        assert_eq!(extract_file_name("c.das"), "c.das");
        // whichever separator comes last wins
        assert_eq!(extract_dir("a\\b/c\\d.das"), "a\\b/c");
        assert_eq!(extract_file_name("a/b\\d.das"), "d.das");
        assert_eq!(extract_file_name("dir/"), "");
    }

    #[test]
    fn test_file_exists_and_mtime() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("x.das");
        let file_str = file.to_str().unwrap();
        assert!(!file_exists(file_str));
        assert_eq!(file_mtime(file_str), 0);

        std::fs::write(&file, "let x = 1").unwrap();
        assert!(file_exists(file_str));
        assert!(file_mtime(file_str) > 0);
        assert!(!file_exists(""));
    }

    #[test]
    fn test_change_dir_trims_and_restores() {
        let tmp = tempfile::tempdir().unwrap();
        let before = current_dir().unwrap();
        let with_slash = format!("{}/", tmp.path().display());

        change_dir(&with_slash).unwrap();
        let inside = std::env::current_dir().unwrap();
        change_dir(&before).unwrap();

        assert_eq!(
            inside.canonicalize().unwrap(),
            tmp.path().canonicalize().unwrap()
        );
        assert!(change_dir("").is_ok());
        assert!(change_dir(&format!("{}/missing", tmp.path().display())).is_err());
    }
}
