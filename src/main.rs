//! vcm-checkpoint - VCM project membership snapshots
//!
//! Records which file revisions made up a project at a given revision label,
//! so later audits can reconstruct the build.

use anyhow::Result;
use clap::Parser;
use vcm_checkpoint::cli::{
    apply_ingest_overrides, ingest, init_config, load_config, print_config, print_members,
    print_stats, print_summary, show, stats, Cli, Commands,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Setup logging; stdout is reserved for command output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    // Execute command
    match cli.command {
        Commands::Ingest(args) => {
            let config = apply_ingest_overrides(load_config(cli.config.as_deref())?, &args);
            let summary = ingest(&config, &args.revision)?;
            print_summary(&summary, cli.format)?;
        }

        Commands::Show(args) => {
            let config = load_config(cli.config.as_deref())?;
            let store = args.store.unwrap_or(config.store_connection);
            let members = show(&store, &args.revision)?;
            print_members(&args.revision, &members, cli.format)?;
        }

        Commands::Stats(args) => {
            let config = load_config(cli.config.as_deref())?;
            let store = args.store.unwrap_or(config.store_connection);
            let stats = stats(&store)?;
            print_stats(&stats, cli.format)?;
        }

        Commands::Config(args) => {
            if args.init {
                let path = init_config(cli.config.as_deref(), args.force)?;
                println!("✓ Wrote default configuration to {:?}", path);
            }
            if args.show || !args.init {
                let config = load_config(cli.config.as_deref())?;
                print_config(&config, cli.format)?;
            }
        }
    }

    Ok(())
}
