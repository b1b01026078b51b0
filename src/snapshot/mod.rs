//! Snapshot building from work items
//!
//! This module handles:
//! - Walking the work items of a listing response
//! - Extracting the member fields of each member item
//! - Registering the referenced entities and appending the membership row

mod walker;

pub use walker::Walker;

use crate::error::{IngestError, Result};
use crate::storage::{resolve_or_create, CheckpointMember, Dimension, Store, CHECKPOINT_MEMBERS};
use crate::vcm::{ModelKind, WorkItem};
use tracing::debug;

/// The fields of a member work item that make up a membership row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRecord {
    pub name: String,
    pub archive: String,
    /// Empty when the member has no committed revision
    pub member_rev: String,
    /// Empty when no change package is attributed
    pub cpid: String,
}

impl MemberRecord {
    /// Extract the member fields
    ///
    /// `name` and `memberarchive` are required; `memberrev` and `cpid` are not.
    pub fn from_item(item: &WorkItem) -> Result<Self> {
        let missing = |field: &'static str| IngestError::MissingField {
            item: item.id.clone(),
            field,
        };

        let name = item.scalar("name")?.ok_or_else(|| missing("name"))?;
        let archive = item
            .reference_id("memberarchive")?
            .ok_or_else(|| missing("memberarchive"))?;
        let member_rev = item.reference_id("memberrev")?.unwrap_or_default();
        let cpid = item.reference_id("cpid")?.unwrap_or_default();

        Ok(Self {
            name: name.to_string(),
            archive: archive.to_string(),
            member_rev: member_rev.to_string(),
            cpid: cpid.to_string(),
        })
    }
}

/// What ingesting one work item did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// A membership row was appended
    Recorded(CheckpointMember),
    /// The item is not a member and was left alone
    Skipped(ModelKind),
}

/// Ingest one work item into the checkpoint
///
/// Only member items produce rows. The append is unconditional, so ingesting
/// the same item twice yields two identical rows.
pub fn ingest(store: &Store, item: &WorkItem, checkpoint_id: i64) -> Result<IngestOutcome> {
    let kind = item.kind();
    if kind != ModelKind::Member {
        debug!(position = item.position, id = %item.id, %kind, "skipping non-member item");
        return Ok(IngestOutcome::Skipped(kind));
    }

    let record = MemberRecord::from_item(item)?;

    let member_id = resolve_or_create(store, Dimension::Members, &record.name)?;
    let archive_id = resolve_or_create(store, Dimension::Archives, &record.archive)?;

    let row = CheckpointMember {
        checkpoint_id,
        member_id,
        archive_id,
        member_rev: record.member_rev,
        cpid: record.cpid,
    };

    let affected = store
        .insert_checkpoint_member(&row)
        .map_err(IngestError::store("insert checkpoint member"))?;
    if affected != 1 {
        return Err(IngestError::Write {
            table: CHECKPOINT_MEMBERS,
            item: item.id.clone(),
            affected,
        });
    }

    debug!(
        position = item.position,
        member = %record.name,
        member_id,
        archive_id,
        member_rev = %row.member_rev,
        "recorded member"
    );

    Ok(IngestOutcome::Recorded(row))
}
