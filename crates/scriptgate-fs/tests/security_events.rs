//! Security events written by sandboxed loads.
//!
//! The events log path is read once per process, so this file holds a single
//! test that sets it before anything else touches the config.

use scriptgate_core::config::env_keys::observability::SCRIPTGATE_SECURITY_EVENTS_LOG;
use scriptgate_core::config::loader::{set_env_var, ScopedEnvGuard};
use scriptgate_fs::{FileAccessor, FsError};

#[test]
fn test_blocked_load_appends_jsonl_event() {
    let dir = tempfile::tempdir().unwrap();
    let log = dir.path().join("events").join("security.jsonl");
    let _guard = ScopedEnvGuard(SCRIPTGATE_SECURITY_EVENTS_LOG);
    set_env_var(SCRIPTGATE_SECURITY_EVENTS_LOG, log.to_str().unwrap());

    let mut access = FileAccessor::new(false);
    let err = access.load("a//..//..//secret.das").unwrap_err();
    assert!(matches!(err, FsError::InvalidPath { .. }));
    assert!(matches!(access.load("../up.das"), Err(FsError::InvalidPath { .. })));

    let content = std::fs::read_to_string(&log).unwrap();
    let records: Vec<serde_json::Value> = content
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(records.len(), 2);

    let first = &records[0];
    assert_eq!(first["type"], "security_blocked");
    assert_eq!(first["category"], "path");
    assert_eq!(first["details"]["path"], "a//..//..//secret.das");
    assert_eq!(first["details"]["reason"], "escapes the sandbox root");
    assert!(first["ts"].as_str().unwrap().ends_with('Z'));
    assert_eq!(records[1]["details"]["reason"], "parent directory prefix");
}
