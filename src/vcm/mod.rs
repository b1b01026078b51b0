//! Versioned-configuration-management service interface
//!
//! This module models the one query the snapshot needs:
//! - Command construction for the recursive project listing
//! - The work-item/field shape of its response
//! - Connectors that execute the command (external client or captured replay)

mod command;
mod connector;
mod item;

pub use command::{Command, CommandOption, ViewProjectQuery, MEMBER_FIELDS};
pub use connector::{Connector, ProcessConnector, ReplayConnector, Response};
pub use item::{FieldValue, ItemRef, ModelKind, WorkItem};

use crate::config::ConnectorConfig;

/// Build the connector selected by configuration
pub fn connector_from_config(config: &ConnectorConfig) -> Box<dyn Connector> {
    match config {
        ConnectorConfig::Process { program, args } => {
            Box::new(ProcessConnector::new(program.as_str(), args.clone()))
        }
        ConnectorConfig::Replay { response_file } => {
            Box::new(ReplayConnector::new(response_file.clone()))
        }
    }
}
