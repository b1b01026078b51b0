//! CLI interface using clap
//!
//! Provides the command-line interface for vcm-checkpoint

mod commands;

pub use commands::*;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vcm-checkpoint - snapshot VCM project membership into a checkpoint catalog
#[derive(Parser, Debug)]
#[command(name = "vcm-checkpoint")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (defaults to ./vcm-checkpoint.toml when present)
    #[arg(short, long, global = true, env = "VCM_CHECKPOINT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short = 'o', long, global = true, default_value = "text")]
    pub format: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest the project membership of one revision as a checkpoint
    Ingest(IngestArgs),

    /// List the members recorded for a checkpoint
    Show(ShowArgs),

    /// Show row counts of the catalog
    Stats(StatsArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Arguments for ingest command
#[derive(Parser, Debug)]
pub struct IngestArgs {
    /// Revision label; also the checkpoint name
    pub revision: String,

    /// Store connection descriptor (overrides configuration)
    #[arg(short, long)]
    pub store: Option<String>,

    /// VCM project path (overrides configuration)
    #[arg(short, long)]
    pub project: Option<String>,

    /// Ingest a captured JSON-lines response instead of querying the service
    #[arg(long)]
    pub replay: Option<PathBuf>,
}

/// Arguments for show command
#[derive(Parser, Debug)]
pub struct ShowArgs {
    /// Revision label of the checkpoint
    pub revision: String,

    /// Store connection descriptor (overrides configuration)
    #[arg(short, long)]
    pub store: Option<String>,
}

/// Arguments for stats command
#[derive(Parser, Debug)]
pub struct StatsArgs {
    /// Store connection descriptor (overrides configuration)
    #[arg(short, long)]
    pub store: Option<String>,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Show current configuration
    #[arg(long)]
    pub show: bool,

    /// Write the default configuration file
    #[arg(long)]
    pub init: bool,

    /// Overwrite an existing file with --init
    #[arg(short, long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["vcm-checkpoint", "ingest", "R1", "--store", "a.db"]);
        let Commands::Ingest(args) = cli.command else {
            panic!("expected ingest");
        };
        assert_eq!(args.revision, "R1");
        assert_eq!(args.store.as_deref(), Some("a.db"));
        assert!(args.replay.is_none());
    }

    #[test]
    fn test_ingest_requires_revision() {
        assert!(Cli::try_parse_from(["vcm-checkpoint", "ingest"]).is_err());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::parse_from(["vcm-checkpoint", "stats", "-o", "json", "--config", "x.toml"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
        assert!(matches!(cli.command, Commands::Stats(_)));
    }
}
