//! Observability: tracing init and security events.
//!
//! Uses config::ObservabilityConfig for SCRIPTGATE_QUIET, LOG_LEVEL, LOG_JSON and
//! SECURITY_EVENTS_LOG.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use serde_json::json;
use tracing_subscriber::{prelude::*, EnvFilter};

static SECURITY_EVENTS_PATH: Mutex<Option<String>> = Mutex::new(None);

/// Initialize tracing. Call at process startup.
/// When SCRIPTGATE_QUIET=1 only WARN and above are logged.
pub fn init_tracing() {
    let cfg = crate::config::ObservabilityConfig::from_env();
    let level: String = if cfg.quiet {
        "scriptgate=warn".to_string()
    } else {
        cfg.log_level.clone()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&level));

    let _ = if cfg.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
}

fn get_security_events_path() -> Option<String> {
    {
        let guard = SECURITY_EVENTS_PATH.lock().ok()?;
        if let Some(ref p) = *guard {
            return Some(p.clone());
        }
    }
    let path = crate::config::ObservabilityConfig::from_env()
        .security_events_log
        .clone()?;
    if path.is_empty() {
        return None;
    }
    if let Some(parent) = Path::new(&path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    {
        let mut guard = SECURITY_EVENTS_PATH.lock().ok()?;
        *guard = Some(path.clone());
    }
    Some(path)
}

fn append_jsonl(path: &str, record: &serde_json::Value) {
    if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(path) {
        if let Ok(line) = serde_json::to_string(record) {
            let _ = writeln!(f, "{}", line);
        }
    }
}

fn path_blocked_record(path: &str, reason: &str) -> serde_json::Value {
    json!({
        "ts": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        "type": "security_blocked",
        "category": "path",
        "details": {
            "path": path,
            "reason": reason
        }
    })
}

/// Security event: a script asked for a path outside the sandbox root.
pub fn security_blocked_path(path: &str, reason: &str) {
    tracing::warn!(
        path = %path,
        reason = %reason,
        "Security: blocked file access"
    );
    if let Some(events) = get_security_events_path() {
        append_jsonl(&events, &path_blocked_record(path, reason));
    }
}

/// Security event: trust mode switched every path check off.
pub fn security_trust_mode_enabled(source: &str) {
    tracing::warn!(source = %source, "Security: trust mode enabled, path checks disabled");
    if let Some(events) = get_security_events_path() {
        let record = json!({
            "ts": Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
            "type": "trust_mode_enabled",
            "category": "runtime",
            "details": { "source": source }
        });
        append_jsonl(&events, &record);
    }
}
