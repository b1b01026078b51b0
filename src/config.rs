//! Configuration for checkpoint ingestion

use crate::vcm::ViewProjectQuery;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "vcm-checkpoint.toml";

/// Ingestion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// VCM project to list
    #[serde(default = "default_project_path")]
    pub project_path: String,

    /// Build attribute tags to include, in order
    #[serde(default = "default_attribute_filters")]
    pub attribute_filters: Vec<String>,

    /// Store connection descriptor (SQLite path or `:memory:`)
    #[serde(default = "default_store_connection")]
    pub store_connection: String,

    /// How the VCM service is reached
    #[serde(default)]
    pub connector: ConnectorConfig,
}

/// VCM connector selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ConnectorConfig {
    /// Run an external client that prints JSON-lines work items
    Process {
        #[serde(default = "default_program")]
        program: String,
        #[serde(default)]
        args: Vec<String>,
    },
    /// Serve a captured JSON-lines response file
    Replay { response_file: PathBuf },
}

fn default_project_path() -> String {
    "/Projects/FCA/VF_VSIM_2022/project.pj".to_string()
}

fn default_attribute_filters() -> Vec<String> {
    ["Build_DJ", "Build_Boot", "Build_HSM", "Build_HSMUP", "Build_BM", "Build_BU"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_store_connection() -> String {
    "checkpoints.db".to_string()
}

fn default_program() -> String {
    "si".to_string()
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        ConnectorConfig::Process {
            program: default_program(),
            args: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_path: default_project_path(),
            attribute_filters: default_attribute_filters(),
            store_connection: default_store_connection(),
            connector: ConnectorConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;
        config.normalize();
        Ok(config)
    }

    /// Load configuration from `path` if it exists, or return defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration as TOML
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Trim attribute tags and drop repeats, keeping the first occurrence
    pub fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        for tag in &mut self.attribute_filters {
            *tag = tag.trim().to_string();
        }
        self.attribute_filters.retain(|tag| seen.insert(tag.clone()));
    }

    /// Reject configurations that cannot produce a run
    pub fn validate(&self) -> Result<()> {
        if self.project_path.trim().is_empty() {
            anyhow::bail!("project_path must not be empty");
        }
        if self.store_connection.trim().is_empty() {
            anyhow::bail!("store_connection must not be empty");
        }
        if let Some(tag) = self.attribute_filters.iter().find(|t| t.trim().is_empty()) {
            anyhow::bail!("attribute_filters contains an empty tag: {:?}", tag);
        }
        match &self.connector {
            ConnectorConfig::Process { program, .. } if program.trim().is_empty() => {
                anyhow::bail!("connector.program must not be empty");
            }
            ConnectorConfig::Replay { response_file } if response_file.as_os_str().is_empty() => {
                anyhow::bail!("connector.response_file must not be empty");
            }
            _ => {}
        }
        Ok(())
    }

    /// The project listing for `revision`
    pub fn query(&self, revision: &str) -> ViewProjectQuery {
        ViewProjectQuery::new(
            self.project_path.clone(),
            self.attribute_filters.clone(),
            revision,
        )
    }
}
