//! Environment variable keys.
//!
//! Primary variables use the `SCRIPTGATE_*` prefix.

/// Sandbox and file access
pub mod sandbox {
    /// "1" disables every path restriction (fully trusted host scripts).
    pub const SCRIPTGATE_TRUST_MODE: &str = "SCRIPTGATE_TRUST_MODE";
    pub const TRUST_MODE_ALIASES: &[&str] = &["SCRIPTGATE_TRUSTED"];

    /// Record opened files and their mtimes for hot reload.
    pub const SCRIPTGATE_HOT_RELOAD: &str = "SCRIPTGATE_HOT_RELOAD";

    /// Sandbox root; the CLI changes into it before serving requests.
    pub const SCRIPTGATE_ROOT: &str = "SCRIPTGATE_ROOT";

    /// Extra embedded library sources, installed next to the bundled set.
    pub const SCRIPTGATE_LIBRARY_DIR: &str = "SCRIPTGATE_LIBRARY_DIR";

    /// `name=dir;name=dir` mount list for `%name/...` module requests.
    pub const SCRIPTGATE_MOUNTS: &str = "SCRIPTGATE_MOUNTS";
}

/// Observability and logging
pub mod observability {
    pub const SCRIPTGATE_QUIET: &str = "SCRIPTGATE_QUIET";

    pub const SCRIPTGATE_LOG_LEVEL: &str = "SCRIPTGATE_LOG_LEVEL";

    pub const SCRIPTGATE_LOG_JSON: &str = "SCRIPTGATE_LOG_JSON";

    pub const SCRIPTGATE_SECURITY_EVENTS_LOG: &str = "SCRIPTGATE_SECURITY_EVENTS_LOG";
}
