//! The process-wide library table as the CLI uses it: installed once by
//! `initialize`, then consulted by accessors that pin no table of their own.

use scriptgate_core::config::SandboxConfig;
use scriptgate_fs::{embedded, FileAccessor, FsError, Ownership};

#[test]
fn test_initialize_serves_library_dir_through_default_accessor() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("extra.das"), "module extra").unwrap();

    let config = SandboxConfig {
        library_dir: Some(dir.path().to_str().unwrap().to_string()),
        ..SandboxConfig::default()
    };
    let lib = embedded::initialize(&config).unwrap();
    assert!(std::ptr::eq(lib, embedded::installed().unwrap()));
    assert!(lib.contains("extra.das"));

    let mut access = FileAccessor::new(false);
    let extra = access.load("daslib/extra.das").unwrap();
    assert_eq!(extra.ownership(), Ownership::Borrowed);
    assert_eq!(extra.source(), b"module extra");

    let bundled = access.load("sdk/daslib/clamp.das").unwrap();
    assert_eq!(bundled.ownership(), Ownership::Borrowed);
    assert!(!bundled.is_empty());

    assert!(matches!(
        access.load("daslib/missing.das"),
        Err(FsError::FileNotFound(_))
    ));
    assert!(matches!(
        embedded::initialize(&SandboxConfig::default()),
        Err(FsError::LibraryAlreadyInstalled)
    ));
}
