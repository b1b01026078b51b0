//! Checkpoint session lifecycle
//!
//! A session owns the store connection and the VCM connector for one run:
//! `Closed -> Open -> Queried -> Draining -> Closed`. Release happens on every
//! path out of the run, including after a fatal error while draining.
//!
//! At most one session may write to a given store at a time; dimension
//! registration is not atomic across processes.

use crate::error::{IngestError, Result};
use crate::snapshot::{ingest, IngestOutcome, Walker};
use crate::storage::{resolve, Dimension, Store};
use crate::vcm::{Connector, Response, ViewProjectQuery};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Lifecycle state of a [`CheckpointSession`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionState {
    Closed,
    Open,
    Queried,
    Draining,
}

/// The checkpoint a run writes into
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Checkpoint {
    pub id: i64,
    pub label: String,
    /// Whether this run created the checkpoint row
    pub created: bool,
}

/// Counts from draining one response
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DrainSummary {
    pub items_seen: usize,
    pub members_recorded: usize,
    pub skipped: usize,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub revision: String,
    pub checkpoint_id: i64,
    pub checkpoint_created: bool,
    pub command_line: String,
    pub items_seen: usize,
    pub members_recorded: usize,
    pub skipped: usize,
}

/// One ingestion run against a store and a VCM connector
pub struct CheckpointSession<C: Connector> {
    store: Store,
    connector: C,
    state: SessionState,
}

impl<C: Connector> CheckpointSession<C> {
    /// Acquire the store and the connector
    pub fn open(store_connection: &str, mut connector: C) -> Result<Self> {
        let store = Store::open(store_connection)?;
        connector.connect()?;

        let mut session = Self {
            store,
            connector,
            state: SessionState::Closed,
        };
        session.transition(SessionState::Open);
        Ok(session)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    fn transition(&mut self, to: SessionState) {
        debug!(from = ?self.state, to = ?to, "session transition");
        self.state = to;
    }

    fn expect_state(&self, expected: SessionState, operation: &'static str) -> Result<()> {
        if self.state != expected {
            return Err(IngestError::Sequence {
                operation,
                state: format!("{:?}", self.state),
                expected: format!("{:?}", expected),
            });
        }
        Ok(())
    }

    /// Resolve the checkpoint and issue the project listing
    pub fn begin(&mut self, query: &ViewProjectQuery) -> Result<(Checkpoint, Response)> {
        self.expect_state(SessionState::Open, "begin")?;

        let resolved = resolve(&self.store, Dimension::Checkpoints, &query.revision)?;
        let checkpoint = Checkpoint {
            id: resolved.id,
            label: query.revision.clone(),
            created: resolved.created,
        };
        info!(
            revision = %checkpoint.label,
            checkpoint_id = checkpoint.id,
            created = checkpoint.created,
            "checkpoint resolved"
        );

        let command = query.command()?;
        debug!(command = %command, "executing VCM command");
        let response = self.connector.execute(&command)?;

        self.transition(SessionState::Queried);
        Ok((checkpoint, response))
    }

    /// Ingest every work item of the response, in response order
    pub fn drain(&mut self, checkpoint: &Checkpoint, response: &mut Response) -> Result<DrainSummary> {
        self.expect_state(SessionState::Queried, "drain")?;
        self.transition(SessionState::Draining);

        let mut summary = DrainSummary::default();
        for item in Walker::new(response.reader()) {
            let item = item?;
            summary.items_seen += 1;
            match ingest(&self.store, &item, checkpoint.id)? {
                IngestOutcome::Recorded(_) => summary.members_recorded += 1,
                IngestOutcome::Skipped(_) => summary.skipped += 1,
            }
        }

        info!(
            checkpoint_id = checkpoint.id,
            items = summary.items_seen,
            recorded = summary.members_recorded,
            skipped = summary.skipped,
            "response drained"
        );
        Ok(summary)
    }

    /// Release the connector and close the store
    pub fn close(mut self) -> Result<()> {
        let released = self.connector.release();
        if let Err(e) = &released {
            warn!(error = %e, "failed to release VCM connector");
        }
        self.transition(SessionState::Closed);
        let closed = self.store.close();

        released.and(closed)
    }

    /// Run the whole lifecycle for one checkpoint
    ///
    /// The first fatal error is returned; release failures after it are logged.
    pub fn run(mut self, query: &ViewProjectQuery) -> Result<RunSummary> {
        let outcome = self.begin(query).and_then(|(checkpoint, mut response)| {
            let drained = self.drain(&checkpoint, &mut response);
            let command_line = response.command_line().to_string();
            let released = response.close();

            let summary = match (drained, released) {
                (Ok(summary), Ok(())) => summary,
                (Err(e), released) => {
                    if let Err(release_err) = released {
                        warn!(error = %release_err, "failed to release VCM response");
                    }
                    return Err(e);
                }
                (Ok(_), Err(e)) => return Err(e),
            };

            Ok(RunSummary {
                revision: checkpoint.label,
                checkpoint_id: checkpoint.id,
                checkpoint_created: checkpoint.created,
                command_line,
                items_seen: summary.items_seen,
                members_recorded: summary.members_recorded,
                skipped: summary.skipped,
            })
        });

        let closed = self.close();
        match (outcome, closed) {
            (Ok(summary), Ok(())) => Ok(summary),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), closed) => {
                if let Err(close_err) = closed {
                    warn!(error = %close_err, "failed to close session");
                }
                Err(e)
            }
        }
    }
}
