mod cli;
mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};

use scriptgate_core::config::SandboxConfig;
use scriptgate_core::{observability, path};
use scriptgate_fs::embedded;

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    let config = SandboxConfig::from_env().with_trust_override(cli.trusted);
    if config.trust_mode.is_trusted() {
        observability::security_trust_mode_enabled(if cli.trusted { "cli" } else { "env" });
    }
    if let Some(root) = cli.root.as_deref().or(config.root.as_deref()) {
        path::change_dir(root)?;
        tracing::debug!("Sandbox root: {}", path::current_dir()?);
    }
    embedded::initialize(&config).context("Cannot initialize embedded library")?;

    match cli.command {
        Commands::Check { paths } => commands::check(&paths, config.trust_mode)?,
        Commands::Load { path, json } => {
            let mut access = commands::build_accessor(&config, cli.project.as_deref());
            commands::load(&mut access, &path, json)?;
        }
        Commands::Read { path } => commands::read(&path, config.trust_mode)?,
        Commands::Resolve {
            request,
            from,
            include,
        } => {
            let access = commands::build_accessor(&config, cli.project.as_deref());
            commands::resolve(&access, &request, &from, include)?;
        }
        Commands::Library => commands::library()?,
        Commands::Cwd => commands::cwd()?,
    }
    Ok(())
}
