//! Error taxonomy for the ingestion pipeline
//!
//! Every failure is fatal to the run. The variants exist so callers (and
//! tests) can tell the failure kinds apart without parsing messages.

use thiserror::Error;

/// Result alias used throughout the pipeline
pub type Result<T, E = IngestError> = std::result::Result<T, E>;

/// A fatal ingestion failure
#[derive(Debug, Error)]
pub enum IngestError {
    /// The store or the VCM connector could not be acquired
    #[error("environment: failed to acquire {resource}: {reason}")]
    Environment { resource: String, reason: String },

    /// The VCM command could not be constructed or did not succeed
    #[error("query `{command}` failed: {reason}")]
    Query { command: String, reason: String },

    /// A work item could not be materialized, or a field held the wrong variant
    #[error("work item {position} ({item}) is malformed: {reason}")]
    MalformedItem {
        position: usize,
        item: String,
        reason: String,
    },

    /// A required field is absent on a member work item
    #[error("work item `{item}` is missing required field `{field}`")]
    MissingField { item: String, field: &'static str },

    /// The get-or-create invariant was violated
    #[error("registry {table}[{key:?}]: {reason}")]
    Registry {
        table: &'static str,
        key: String,
        reason: String,
    },

    /// A join-record insert did not land exactly once
    #[error("write to {table} for `{item}` affected {affected} rows, expected 1")]
    Write {
        table: &'static str,
        item: String,
        affected: usize,
    },

    /// A session step was called out of order
    #[error("session step `{operation}` called while {state}, expected {expected}")]
    Sequence {
        operation: &'static str,
        state: String,
        expected: String,
    },

    /// Any other store statement failure
    #[error("store operation `{operation}` failed")]
    Store {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

/// Discriminant of [`IngestError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Environment,
    Query,
    MalformedItem,
    MissingField,
    Registry,
    Write,
    Sequence,
    Store,
}

impl IngestError {
    /// The kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::Environment { .. } => ErrorKind::Environment,
            IngestError::Query { .. } => ErrorKind::Query,
            IngestError::MalformedItem { .. } => ErrorKind::MalformedItem,
            IngestError::MissingField { .. } => ErrorKind::MissingField,
            IngestError::Registry { .. } => ErrorKind::Registry,
            IngestError::Write { .. } => ErrorKind::Write,
            IngestError::Sequence { .. } => ErrorKind::Sequence,
            IngestError::Store { .. } => ErrorKind::Store,
        }
    }

    pub(crate) fn environment(resource: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::Environment {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn query(command: impl Into<String>, reason: impl ToString) -> Self {
        IngestError::Query {
            command: command.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn store(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| IngestError::Store { operation, source }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Environment => write!(f, "environment"),
            ErrorKind::Query => write!(f, "query"),
            ErrorKind::MalformedItem => write!(f, "malformed-item"),
            ErrorKind::MissingField => write!(f, "missing-field"),
            ErrorKind::Registry => write!(f, "registry"),
            ErrorKind::Write => write!(f, "write"),
            ErrorKind::Sequence => write!(f, "sequence"),
            ErrorKind::Store => write!(f, "store"),
        }
    }
}
