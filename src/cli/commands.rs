//! Command implementations

use super::{IngestArgs, OutputFormat};
use crate::config::{Config, ConnectorConfig, DEFAULT_CONFIG_FILE};
use crate::session::{CheckpointSession, RunSummary};
use crate::storage::{RecordedMember, Store, StoreStats};
use crate::vcm::connector_from_config;
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Resolve the configuration file to use
///
/// An explicit path must exist; otherwise the default file is used when present.
pub fn load_config(explicit: Option<&Path>) -> Result<Config> {
    let config = match explicit {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(Path::new(DEFAULT_CONFIG_FILE))?,
    };
    Ok(config)
}

/// Apply `ingest` overrides on top of the configuration
pub fn apply_ingest_overrides(mut config: Config, args: &IngestArgs) -> Config {
    if let Some(store) = &args.store {
        config.store_connection = store.clone();
    }
    if let Some(project) = &args.project {
        config.project_path = project.clone();
    }
    if let Some(file) = &args.replay {
        config.connector = ConnectorConfig::Replay {
            response_file: file.clone(),
        };
    }
    config
}

/// Ingest one revision as a checkpoint
pub fn ingest(config: &Config, revision: &str) -> Result<RunSummary> {
    config.validate().context("Invalid configuration")?;

    let connector = connector_from_config(&config.connector);
    let session = CheckpointSession::open(&config.store_connection, connector)
        .context("Failed to open checkpoint session")?;

    let summary = session
        .run(&config.query(revision))
        .with_context(|| format!("Checkpoint {revision:?} was not fully ingested"))?;

    Ok(summary)
}

/// Members recorded for a checkpoint
pub fn show(store_connection: &str, revision: &str) -> Result<Vec<RecordedMember>> {
    let store = open_existing(store_connection)?;

    let checkpoint_id = store
        .checkpoint_id(revision)?
        .ok_or_else(|| anyhow::anyhow!("Checkpoint not found: {}", revision))?;

    Ok(store.checkpoint_members(checkpoint_id)?)
}

/// Row counts of the catalog
pub fn stats(store_connection: &str) -> Result<StoreStats> {
    let store = open_existing(store_connection)?;
    Ok(store.stats()?)
}

/// Write the default configuration file, returning its path
pub fn init_config(path: Option<&Path>, force: bool) -> Result<PathBuf> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if path.exists() && !force {
        anyhow::bail!("{:?} already exists. Use --force to overwrite.", path);
    }

    Config::default().save(&path)?;
    Ok(path)
}

fn open_existing(store_connection: &str) -> Result<Store> {
    if store_connection != crate::storage::IN_MEMORY && !Path::new(store_connection).exists() {
        anyhow::bail!("Store not found: {}. Run 'vcm-checkpoint ingest' first.", store_connection);
    }
    Store::open(store_connection).context("Failed to open store")
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a run summary
pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(summary);
    }

    println!("✓ Checkpoint {} ingested", summary.revision);
    println!(
        "  Checkpoint ID: {}{}",
        summary.checkpoint_id,
        if summary.checkpoint_created { " (new)" } else { "" }
    );
    println!("  Command: {}", summary.command_line);
    println!("  Work items: {}", summary.items_seen);
    println!("  Members recorded: {}", summary.members_recorded);
    println!("  Skipped: {}", summary.skipped);
    Ok(())
}

/// Print the members of a checkpoint
pub fn print_members(revision: &str, members: &[RecordedMember], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(members);
    }

    println!("Checkpoint {}", revision);
    println!("==========={}\n", "=".repeat(revision.len()));

    if members.is_empty() {
        println!("No members recorded.");
        return Ok(());
    }

    for member in members {
        println!(
            "{}\t{}\t{}\t{}",
            member.member, member.member_rev, member.cpid, member.archive
        );
    }
    println!("\n{} member(s)", members.len());
    Ok(())
}

/// Print catalog statistics
pub fn print_stats(stats: &StoreStats, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(stats);
    }

    println!("Checkpoints: {}", stats.checkpoints);
    println!("Archives: {}", stats.archives);
    println!("Members: {}", stats.members);
    println!("Checkpoint members: {}", stats.checkpoint_members);
    Ok(())
}

/// Print the effective configuration
pub fn print_config(config: &Config, format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        return print_json(config);
    }

    println!("vcm-checkpoint Configuration");
    println!("============================\n");

    println!("Project: {}", config.project_path);
    println!("Store: {}", config.store_connection);

    println!("\nAttribute filters:");
    for tag in &config.attribute_filters {
        println!("  - {}", tag);
    }

    match &config.connector {
        ConnectorConfig::Process { program, args } => {
            println!("\nConnector: process");
            println!("  Program: {}", program);
            if !args.is_empty() {
                println!("  Args: {}", args.join(" "));
            }
        }
        ConnectorConfig::Replay { response_file } => {
            println!("\nConnector: replay");
            println!("  Response file: {:?}", response_file);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ingest_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let response = dir.path().join("response.jsonl");
        let mut file = std::fs::File::create(&response).unwrap();
        writeln!(
            file,
            r#"{{"id":"a.c","model_type":"si.Member","fields":{{"name":{{"scalar":"a.c"}},"memberarchive":{{"item":{{"id":"/src/a.c"}}}},"memberrev":{{"item":{{"id":"1.3"}}}}}}}}"#
        )
        .unwrap();

        let store = dir.path().join("catalog.db").to_string_lossy().into_owned();
        let args = IngestArgs {
            revision: "R7".to_string(),
            store: Some(store.clone()),
            project: None,
            replay: Some(response),
        };
        let config = apply_ingest_overrides(Config::default(), &args);

        let summary = ingest(&config, &args.revision).unwrap();
        assert_eq!(summary.members_recorded, 1);

        let members = show(&store, "R7").unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].member_rev, "1.3");
        assert_eq!(members[0].cpid, "");

        assert!(show(&store, "R8").is_err());
        assert_eq!(stats(&store).unwrap().checkpoints, 1);
    }

    #[test]
    fn test_stats_requires_existing_store() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.db");
        assert!(stats(missing.to_str().unwrap()).is_err());
        assert!(!missing.exists());
    }

    #[test]
    fn test_init_config_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        init_config(Some(&path), false).unwrap();
        assert!(init_config(Some(&path), false).is_err());
        init_config(Some(&path), true).unwrap();
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
