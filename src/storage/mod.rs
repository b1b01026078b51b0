//! SQLite storage layer for the checkpoint catalog
//!
//! This module handles persistent storage of:
//! - Dimension rows (checkpoints, archives, members) keyed by business key
//! - Checkpoint membership facts linking the three
//! - Read-back of a recorded checkpoint for audits

pub mod registry;
mod schema;

pub use registry::{resolve, resolve_or_create, Resolution};
pub use schema::SCHEMA;

use crate::error::{IngestError, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Connection descriptor that selects an in-memory store
pub const IN_MEMORY: &str = ":memory:";

/// A dimension table holding `(ID, Desc)` rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Checkpoints,
    Archives,
    Members,
}

impl Dimension {
    /// Table name in the catalog
    pub fn table(self) -> &'static str {
        match self {
            Dimension::Checkpoints => "Checkpoints",
            Dimension::Archives => "Archives",
            Dimension::Members => "Members",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}

/// Name of the fact table
pub const CHECKPOINT_MEMBERS: &str = "CheckpointMembers";

/// One `CheckpointMembers` row
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckpointMember {
    pub checkpoint_id: i64,
    pub member_id: i64,
    pub archive_id: i64,
    pub member_rev: String,
    pub cpid: String,
}

/// A recorded member of a checkpoint, with names resolved
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedMember {
    pub member: String,
    pub archive: String,
    pub member_rev: String,
    pub cpid: String,
}

/// Catalog connection wrapper
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open the store named by a connection descriptor
    ///
    /// The descriptor is a SQLite path, or [`IN_MEMORY`].
    pub fn open(descriptor: &str) -> Result<Self> {
        let conn = if descriptor == IN_MEMORY {
            Connection::open_in_memory()
        } else {
            Connection::open(descriptor)
        }
        .map_err(|e| IngestError::environment(format!("store {descriptor:?}"), e))?;

        let store = Self { conn };
        store.initialize()?;

        Ok(store)
    }

    /// Open an in-memory store (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open(IN_MEMORY)
    }

    /// Raw connection, for tests that need to tamper with the schema
    #[cfg(test)]
    pub(crate) fn connection(&self) -> &Connection {
        &self.conn
    }

    fn initialize(&self) -> Result<()> {
        self.conn
            .execute_batch(SCHEMA)
            .map_err(IngestError::store("initialize schema"))
    }

    /// Close the connection, reporting any failure to release it
    pub fn close(self) -> Result<()> {
        self.conn
            .close()
            .map_err(|(_, e)| IngestError::store("close")(e))
    }

    // ==================== Dimensions ====================

    /// Look up the id of the row whose key equals `key` exactly
    pub fn find_id(&self, dimension: Dimension, key: &str) -> Result<Option<i64>> {
        let sql = format!(
            r#"SELECT "ID" FROM "{}" WHERE "Desc" = ?1"#,
            dimension.table()
        );
        self.conn
            .query_row(&sql, params![key], |row| row.get(0))
            .optional()
            .map_err(IngestError::store("select dimension id"))
    }

    /// Insert a new dimension row, returning the number of rows affected
    pub fn insert_key(&self, dimension: Dimension, key: &str) -> rusqlite::Result<usize> {
        let sql = format!(r#"INSERT INTO "{}" ("Desc") VALUES (?1)"#, dimension.table());
        self.conn.execute(&sql, params![key])
    }

    /// Id of a checkpoint by revision label, if recorded
    pub fn checkpoint_id(&self, label: &str) -> Result<Option<i64>> {
        self.find_id(Dimension::Checkpoints, label)
    }

    // ==================== Facts ====================

    /// Append a checkpoint membership row, returning the number of rows affected
    pub fn insert_checkpoint_member(&self, row: &CheckpointMember) -> rusqlite::Result<usize> {
        self.conn.execute(
            r#"
            INSERT INTO "CheckpointMembers"
                ("CheckpointID", "NameID", "MemberArchiveID", "MemberRev", "CPID")
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                row.checkpoint_id,
                row.member_id,
                row.archive_id,
                row.member_rev,
                row.cpid,
            ],
        )
    }

    /// All membership rows recorded for a checkpoint, in insertion order
    pub fn checkpoint_members(&self, checkpoint_id: i64) -> Result<Vec<RecordedMember>> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT m."Desc", a."Desc", cm."MemberRev", cm."CPID"
                FROM "CheckpointMembers" cm
                JOIN "Members" m ON m."ID" = cm."NameID"
                JOIN "Archives" a ON a."ID" = cm."MemberArchiveID"
                WHERE cm."CheckpointID" = ?1
                ORDER BY cm.rowid
                "#,
            )
            .map_err(IngestError::store("prepare checkpoint members"))?;

        let rows = stmt
            .query_map(params![checkpoint_id], |row| {
                Ok(RecordedMember {
                    member: row.get(0)?,
                    archive: row.get(1)?,
                    member_rev: row.get(2)?,
                    cpid: row.get(3)?,
                })
            })
            .map_err(IngestError::store("select checkpoint members"))?;

        let mut members = Vec::new();
        for row in rows {
            members.push(row.map_err(IngestError::store("read checkpoint member"))?);
        }

        Ok(members)
    }

    // ==================== Statistics ====================

    /// Row counts per table
    pub fn stats(&self) -> Result<StoreStats> {
        let count = |table: &str| -> Result<usize> {
            let n: i64 = self
                .conn
                .query_row(&format!(r#"SELECT COUNT(*) FROM "{table}""#), [], |row| {
                    row.get(0)
                })
                .map_err(IngestError::store("count rows"))?;
            Ok(n as usize)
        };

        Ok(StoreStats {
            checkpoints: count(Dimension::Checkpoints.table())?,
            archives: count(Dimension::Archives.table())?,
            members: count(Dimension::Members.table())?,
            checkpoint_members: count(CHECKPOINT_MEMBERS)?,
        })
    }
}

/// Catalog statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub checkpoints: usize,
    pub archives: usize,
    pub members: usize,
    pub checkpoint_members: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_creation() {
        let store = Store::open_in_memory().unwrap();
        let stats = store.stats().unwrap();
        assert_eq!(stats.checkpoints, 0);
        assert_eq!(stats.checkpoint_members, 0);
    }

    #[test]
    fn test_find_id_is_exact_match() {
        let store = Store::open_in_memory().unwrap();
        assert_eq!(store.insert_key(Dimension::Members, "License.liz").unwrap(), 1);

        assert!(store.find_id(Dimension::Members, "License.liz").unwrap().is_some());
        assert!(store.find_id(Dimension::Members, "license.liz").unwrap().is_none());
        assert!(store.find_id(Dimension::Archives, "License.liz").unwrap().is_none());
    }

    #[test]
    fn test_fact_rows_require_existing_dimensions() {
        let store = Store::open_in_memory().unwrap();
        let row = CheckpointMember {
            checkpoint_id: 42,
            member_id: 1,
            archive_id: 1,
            member_rev: "1.1".to_string(),
            cpid: String::new(),
        };
        assert!(store.insert_checkpoint_member(&row).is_err());
    }

    #[test]
    fn test_checkpoint_members_read_back() {
        let store = Store::open_in_memory().unwrap();
        store.insert_key(Dimension::Checkpoints, "R1").unwrap();
        store.insert_key(Dimension::Members, "a.c").unwrap();
        store.insert_key(Dimension::Archives, "/src/a.c").unwrap();

        let checkpoint_id = store.checkpoint_id("R1").unwrap().unwrap();
        let row = CheckpointMember {
            checkpoint_id,
            member_id: store.find_id(Dimension::Members, "a.c").unwrap().unwrap(),
            archive_id: store.find_id(Dimension::Archives, "/src/a.c").unwrap().unwrap(),
            member_rev: "1.2".to_string(),
            cpid: "10:1".to_string(),
        };
        assert_eq!(store.insert_checkpoint_member(&row).unwrap(), 1);

        let members = store.checkpoint_members(checkpoint_id).unwrap();
        assert_eq!(
            members,
            vec![RecordedMember {
                member: "a.c".to_string(),
                archive: "/src/a.c".to_string(),
                member_rev: "1.2".to_string(),
                cpid: "10:1".to_string(),
            }]
        );
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.db");
        let descriptor = path.to_str().unwrap();

        let store = Store::open(descriptor).unwrap();
        store.insert_key(Dimension::Checkpoints, "R1").unwrap();
        store.close().unwrap();

        let store = Store::open(descriptor).unwrap();
        assert_eq!(store.stats().unwrap().checkpoints, 1);
    }
}
