//! vcm-checkpoint - VCM project membership snapshots
//!
//! This library queries a versioned-configuration-management service for the
//! members of a project at one revision and records them as a deduplicated
//! checkpoint in a relational catalog.

pub mod cli;
pub mod config;
pub mod error;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod vcm;

/// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorKind, IngestError, Result};
pub use session::{CheckpointSession, RunSummary, SessionState};
pub use storage::Store;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "vcm-checkpoint";
