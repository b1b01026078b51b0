//! Get-or-create lookups over the dimension tables
//!
//! The lookup-then-insert sequence is not atomic. At most one ingestion
//! process may write to a given store at a time.

use super::{Dimension, Store};
use crate::error::{IngestError, Result};
use tracing::debug;

/// A resolved dimension row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub id: i64,
    /// Whether the row was inserted by this call
    pub created: bool,
}

/// Return the id of the `dimension` row keyed by `key`, inserting it if absent
pub fn resolve_or_create(store: &Store, dimension: Dimension, key: &str) -> Result<i64> {
    resolve(store, dimension, key).map(|resolution| resolution.id)
}

/// Like [`resolve_or_create`], also reporting whether the row is new
///
/// Warm path: one SELECT. Cold path: SELECT, INSERT, SELECT.
pub fn resolve(store: &Store, dimension: Dimension, key: &str) -> Result<Resolution> {
    let fail = |reason: String| IngestError::Registry {
        table: dimension.table(),
        key: key.to_string(),
        reason,
    };

    if key.is_empty() {
        return Err(fail("empty business key".to_string()));
    }

    if let Some(id) = store.find_id(dimension, key)? {
        debug!(table = dimension.table(), key, id, "registry hit");
        return Ok(Resolution { id, created: false });
    }

    let affected = store
        .insert_key(dimension, key)
        .map_err(|e| fail(format!("insert failed: {e}")))?;
    if affected != 1 {
        return Err(fail(format!("insert affected {affected} rows, expected 1")));
    }

    let id = store
        .find_id(dimension, key)?
        .ok_or_else(|| fail("row not found after insert".to_string()))?;
    debug!(table = dimension.table(), key, id, "registry insert");

    Ok(Resolution { id, created: true })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_same_key_same_id() {
        let store = Store::open_in_memory().unwrap();

        let first = resolve_or_create(&store, Dimension::Archives, "/Tools/HexView/license.liz").unwrap();
        let second = resolve_or_create(&store, Dimension::Archives, "/Tools/HexView/license.liz").unwrap();

        assert_eq!(first, second);
        assert_eq!(store.stats().unwrap().archives, 1);
    }

    #[test]
    fn test_distinct_keys_distinct_ids() {
        let store = Store::open_in_memory().unwrap();

        let a = resolve_or_create(&store, Dimension::Members, "a.c").unwrap();
        let b = resolve_or_create(&store, Dimension::Members, "b.c").unwrap();
        let upper = resolve_or_create(&store, Dimension::Members, "A.c").unwrap();

        assert_ne!(a, b);
        assert_ne!(a, upper);
        assert_eq!(store.stats().unwrap().members, 3);
    }

    #[test]
    fn test_dimensions_are_independent() {
        let store = Store::open_in_memory().unwrap();

        resolve_or_create(&store, Dimension::Members, "x").unwrap();
        resolve_or_create(&store, Dimension::Archives, "x").unwrap();

        let stats = store.stats().unwrap();
        assert_eq!(stats.members, 1);
        assert_eq!(stats.archives, 1);
        assert_eq!(stats.checkpoints, 0);
    }

    #[test]
    fn test_empty_key_rejected() {
        let store = Store::open_in_memory().unwrap();

        let err = resolve_or_create(&store, Dimension::Checkpoints, "").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert_eq!(store.stats().unwrap().checkpoints, 0);
    }

    #[test]
    fn test_resolve_reports_creation() {
        let store = Store::open_in_memory().unwrap();

        let first = resolve(&store, Dimension::Checkpoints, "R1").unwrap();
        let second = resolve(&store, Dimension::Checkpoints, "R1").unwrap();

        assert!(first.created);
        assert!(!second.created);
        assert_eq!(first.id, second.id);
    }

    #[test]
    fn test_ignored_insert_is_registry_error() {
        let store = Store::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                r#"CREATE TRIGGER "drop_members" BEFORE INSERT ON "Members"
                   BEGIN SELECT RAISE(IGNORE); END;"#,
            )
            .unwrap();

        let err = resolve_or_create(&store, Dimension::Members, "a.c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert!(err.to_string().contains("affected 0 rows"));
        assert_eq!(store.stats().unwrap().members, 0);
    }

    #[test]
    fn test_vanished_row_is_registry_error() {
        let store = Store::open_in_memory().unwrap();
        store
            .connection()
            .execute_batch(
                r#"CREATE TRIGGER "purge_archives" AFTER INSERT ON "Archives"
                   BEGIN DELETE FROM "Archives" WHERE "ID" = NEW."ID"; END;"#,
            )
            .unwrap();

        let err = resolve_or_create(&store, Dimension::Archives, "/src/a.c").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Registry);
        assert!(err.to_string().contains("not found after insert"));
    }

    #[test]
    fn test_keys_with_quotes_are_bound() {
        let store = Store::open_in_memory().unwrap();

        let key = "it's \"quoted\"";
        let id = resolve_or_create(&store, Dimension::Members, key).unwrap();
        assert_eq!(store.find_id(Dimension::Members, key).unwrap(), Some(id));
    }
}
