use clap::{Parser, Subcommand};

/// scriptgate - sandboxed file access for hosted scripts
#[derive(Parser, Debug)]
#[command(name = "scriptgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Disable every path restriction (fully trusted host scripts)
    #[arg(long, global = true)]
    pub trusted: bool,

    /// Sandbox root to change into first (default: SCRIPTGATE_ROOT)
    #[arg(long, global = true, value_name = "DIR")]
    pub root: Option<String>,

    /// Mount manifest (`name=dir` lines) to build the resolution policy from
    #[arg(long, global = true, value_name = "FILE")]
    pub project: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether paths may be opened by a sandboxed script
    Check {
        #[arg(value_name = "PATH", required = true)]
        paths: Vec<String>,
    },

    /// Load a script source the way the runtime would and print it
    Load {
        #[arg(value_name = "PATH")]
        path: String,

        /// Print a JSON summary instead of the source
        #[arg(long)]
        json: bool,
    },

    /// Read a host file with path validation only (no library fallback)
    Read {
        #[arg(value_name = "PATH")]
        path: String,
    },

    /// Resolve a module (or include) request
    Resolve {
        #[arg(value_name = "REQUEST")]
        request: String,

        /// File the request is made from
        #[arg(long, value_name = "FILE", default_value = "")]
        from: String,

        /// Resolve as a textual include instead of a module
        #[arg(long)]
        include: bool,
    },

    /// List embedded library entries
    Library,

    /// Print the current working directory
    Cwd,
}
