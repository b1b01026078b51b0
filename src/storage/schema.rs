//! Catalog schema definition

/// SQL schema for the checkpoint catalog
///
/// Dimension tables are keyed by their `Desc` business key. The fact table has
/// no uniqueness constraint: re-ingesting a checkpoint appends rows again.
pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- One row per ingested revision label
CREATE TABLE IF NOT EXISTS "Checkpoints" (
    "ID" INTEGER PRIMARY KEY AUTOINCREMENT,
    "Desc" TEXT NOT NULL UNIQUE
);

-- Versioned file lineages
CREATE TABLE IF NOT EXISTS "Archives" (
    "ID" INTEGER PRIMARY KEY AUTOINCREMENT,
    "Desc" TEXT NOT NULL UNIQUE
);

-- Named file entries within a project
CREATE TABLE IF NOT EXISTS "Members" (
    "ID" INTEGER PRIMARY KEY AUTOINCREMENT,
    "Desc" TEXT NOT NULL UNIQUE
);

-- Member revision X of archive Y was part of checkpoint Z via change package W
CREATE TABLE IF NOT EXISTS "CheckpointMembers" (
    "CheckpointID" INTEGER NOT NULL,
    "NameID" INTEGER NOT NULL,
    "MemberArchiveID" INTEGER NOT NULL,
    "MemberRev" TEXT NOT NULL,
    "CPID" TEXT NOT NULL,
    FOREIGN KEY ("CheckpointID") REFERENCES "Checkpoints"("ID"),
    FOREIGN KEY ("NameID") REFERENCES "Members"("ID"),
    FOREIGN KEY ("MemberArchiveID") REFERENCES "Archives"("ID")
);

CREATE INDEX IF NOT EXISTS idx_checkpoint_members_checkpoint ON "CheckpointMembers"("CheckpointID");
"#;
