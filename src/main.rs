//! Strata - content-addressed role layer builds
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use strata::cli::commands::ProjectContext;
use strata::cli::{Cli, Commands};
use strata::config::schema::LogFormat;
use strata::config::ConfigManager;
use strata::error::{StrataError, StrataResult};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> StrataResult<()> {
    let cli = Cli::parse();

    let project_dir = match &cli.project {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()
            .map_err(|e| StrataError::io("getting current directory", e))?,
    };

    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };

    // Find local config unless --no-local is set
    let local_config_path = if cli.no_local {
        None
    } else {
        ConfigManager::find_local_config(&project_dir)
    };

    let config = config_manager
        .load_merged(local_config_path.as_deref())
        .await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("strata=warn"),
        1 => EnvFilter::new("strata=info"),
        _ => EnvFilter::new("strata=debug"),
    };

    match config.general.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init(),
    }

    match &local_config_path {
        Some(path) => debug!("Using local config: {}", path.display()),
        None if cli.no_local => debug!("Local config discovery disabled (--no-local)"),
        None => {}
    }

    let project = ProjectContext::new(project_dir, cli.roles_path);

    match cli.command {
        Commands::Fingerprint(args) => {
            strata::cli::commands::fingerprint(args, &config, &project).await
        }
        Commands::Lookup(args) => strata::cli::commands::lookup(args, &config, &project).await,
        Commands::Build(args) => strata::cli::commands::build(args, &config, &project).await,
        Commands::Config(args) => {
            strata::cli::commands::config(args, &config, &config_manager).await
        }
    }
}
