//! Config structs grouped by concern, loaded from the environment.

use super::env_keys::{observability as obv_keys, sandbox as sbx_keys};
use super::loader::{env_bool, env_optional, env_or};
use crate::path_validation::TrustMode;

/// File access and sandbox configuration.
#[derive(Debug, Clone, Default)]
pub struct SandboxConfig {
    pub trust_mode: TrustMode,
    pub hot_reload: bool,
    /// Directory every script-relative path is interpreted against.
    pub root: Option<String>,
    pub library_dir: Option<String>,
    /// Raw `name=dir;name=dir` list.
    pub mounts: Option<String>,
}

impl SandboxConfig {
    /// Load from the environment (reads `.env` first).
    pub fn from_env() -> Self {
        super::loader::load_dotenv();
        let trusted = env_bool(
            sbx_keys::SCRIPTGATE_TRUST_MODE,
            sbx_keys::TRUST_MODE_ALIASES,
            false,
        );
        Self {
            trust_mode: TrustMode::from_flag(trusted),
            hot_reload: env_bool(sbx_keys::SCRIPTGATE_HOT_RELOAD, &[], false),
            root: env_optional(sbx_keys::SCRIPTGATE_ROOT, &[]),
            library_dir: env_optional(sbx_keys::SCRIPTGATE_LIBRARY_DIR, &[]),
            mounts: env_optional(sbx_keys::SCRIPTGATE_MOUNTS, &[]),
        }
    }

    /// CLI flags win over the environment.
    pub fn with_trust_override(mut self, trusted: bool) -> Self {
        if trusted {
            self.trust_mode = TrustMode::Trusted;
        }
        self
    }
}

/// Observability config: quiet, log_level, log_json, security_events_log.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    pub quiet: bool,
    pub log_level: String,
    pub log_json: bool,
    pub security_events_log: Option<String>,
}

impl ObservabilityConfig {
    pub fn from_env() -> &'static Self {
        use std::sync::OnceLock;
        static CACHE: OnceLock<ObservabilityConfig> = OnceLock::new();
        CACHE.get_or_init(|| {
            super::loader::load_dotenv();
            Self {
                quiet: env_bool(obv_keys::SCRIPTGATE_QUIET, &[], false),
                log_level: env_or(obv_keys::SCRIPTGATE_LOG_LEVEL, &[], || {
                    "scriptgate=info".to_string()
                }),
                log_json: env_bool(obv_keys::SCRIPTGATE_LOG_JSON, &[], false),
                security_events_log: env_optional(obv_keys::SCRIPTGATE_SECURITY_EVENTS_LOG, &[]),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::{set_env_var, ScopedEnvGuard};

    #[test]
    fn test_sandbox_config_reads_env() {
        let _t = ScopedEnvGuard(sbx_keys::SCRIPTGATE_TRUST_MODE);
        let _h = ScopedEnvGuard(sbx_keys::SCRIPTGATE_HOT_RELOAD);
        let _m = ScopedEnvGuard(sbx_keys::SCRIPTGATE_MOUNTS);
        set_env_var(sbx_keys::SCRIPTGATE_TRUST_MODE, "1");
        set_env_var(sbx_keys::SCRIPTGATE_HOT_RELOAD, "true");
        set_env_var(sbx_keys::SCRIPTGATE_MOUNTS, "app=scripts/app");

        let cfg = SandboxConfig::from_env();
        assert_eq!(cfg.trust_mode, TrustMode::Trusted);
        assert!(cfg.hot_reload);
        assert_eq!(cfg.mounts.as_deref(), Some("app=scripts/app"));
    }

    #[test]
    fn test_trust_override_only_escalates() {
        let cfg = SandboxConfig::default().with_trust_override(false);
        assert_eq!(cfg.trust_mode, TrustMode::Sandboxed);
        let cfg = cfg.with_trust_override(true);
        assert_eq!(cfg.trust_mode, TrustMode::Trusted);
    }
}
