//! CLI argument definitions using clap derive

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Strata - content-addressed role layer builds
///
/// Fingerprints Ansible roles with their dependency closure and commits
/// each unseen fingerprint as an image layer, reusing existing layers.
#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "STRATA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local strata.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,

    /// Project directory (defaults to current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Additional role search path, searched before configured paths
    #[arg(long = "roles-path", global = true)]
    pub roles_path: Vec<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the fingerprint of a role and its dependencies
    Fingerprint(FingerprintArgs),

    /// Find the image built for a role or fingerprint
    Lookup(LookupArgs),

    /// Build a role layer unless its fingerprint is already cached
    Build(BuildArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the fingerprint command
#[derive(Parser, Debug)]
pub struct FingerprintArgs {
    /// Role name
    pub role: String,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the lookup command
#[derive(Parser, Debug)]
pub struct LookupArgs {
    /// Role name
    #[arg(required_unless_present = "fingerprint", conflicts_with = "fingerprint")]
    pub role: Option<String>,

    /// Look up a fingerprint directly
    #[arg(long)]
    pub fingerprint: Option<String>,

    /// Output format
    #[arg(short, long, default_value = "plain")]
    pub format: OutputFormat,
}

/// Arguments for the build command
#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Role name
    pub role: String,

    /// Base image to apply the role on
    #[arg(long)]
    pub base_image: Option<String>,

    /// Repository to tag the layer in
    #[arg(long)]
    pub repository: Option<String>,

    /// Don't tag the layer as latest
    #[arg(long)]
    pub no_latest: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Bare value
    Plain,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_build_flags() {
        let cli = Cli::parse_from([
            "strata",
            "-vv",
            "--roles-path",
            "/opt/roles",
            "build",
            "web",
            "--repository",
            "acme-web",
            "--no-latest",
        ]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.roles_path, vec![PathBuf::from("/opt/roles")]);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.role, "web");
                assert_eq!(args.repository.as_deref(), Some("acme-web"));
                assert!(args.no_latest);
                assert_eq!(args.format, OutputFormat::Table);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn lookup_needs_role_or_fingerprint() {
        assert!(Cli::try_parse_from(["strata", "lookup"]).is_err());
        assert!(Cli::try_parse_from(["strata", "lookup", "web", "--fingerprint", "ab"]).is_err());

        let cli = Cli::try_parse_from(["strata", "lookup", "--fingerprint", "ab"]).unwrap();
        match cli.command {
            Commands::Lookup(args) => {
                assert!(args.role.is_none());
                assert_eq!(args.fingerprint.as_deref(), Some("ab"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
