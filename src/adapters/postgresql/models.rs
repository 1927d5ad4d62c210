//! PostgreSQL row mapping
//!
//! The `documents` table stores every collection; this module converts its
//! rows to domain documents and holds the SQL used by the adapter.

use crate::domain::document::{Document, RevisionInfo};
use crate::domain::fields::JsonObject;
use serde_json::Value;
use tokio_postgres::Row;

pub(crate) const SELECT_LIVE: &str =
    "SELECT id, rev, body FROM documents WHERE collection = $1 AND id = $2 AND NOT deleted";

pub(crate) const SELECT_REVISION: &str =
    "SELECT rev, deleted FROM documents WHERE collection = $1 AND id = $2";

pub(crate) const INSERT_NEW: &str = r#"
    INSERT INTO documents (collection, id, rev, deleted, body, updated_at)
    VALUES ($1, $2, $3, $4, $5, NOW())
    ON CONFLICT (collection, id) DO NOTHING
"#;

pub(crate) const UPDATE_AT_REVISION: &str = r#"
    UPDATE documents
    SET rev = $4, deleted = $5, body = $6, updated_at = NOW()
    WHERE collection = $1 AND id = $2 AND rev = $3
"#;

pub(crate) const SCAN_LIVE: &str = r#"
    SELECT id, rev, body FROM documents
    WHERE collection = $1
      AND NOT deleted
      AND ($2::TEXT IS NULL OR id COLLATE "C" >= $2::TEXT)
    ORDER BY id COLLATE "C"
    OFFSET $3 LIMIT $4
"#;

pub(crate) const COUNT_LIVE: &str =
    "SELECT COUNT(*) FROM documents WHERE collection = $1 AND NOT deleted";

/// Convert a `(id, rev, body)` row into a live document
pub(crate) fn document_from_row(row: &Row) -> Document {
    let body: Value = row.get("body");
    Document {
        id: row.get("id"),
        rev: Some(row.get("rev")),
        deleted: false,
        body: body_object(body),
    }
}

/// Convert a `(rev, deleted)` row into revision info
pub(crate) fn revision_from_row(row: &Row) -> RevisionInfo {
    RevisionInfo {
        rev: row.get("rev"),
        deleted: row.get("deleted"),
    }
}

/// Body column value for a write; tombstones carry no content
pub(crate) fn body_value(doc: &Document) -> Value {
    if doc.deleted {
        Value::Object(JsonObject::new())
    } else {
        Value::Object(doc.body.clone())
    }
}

fn body_object(value: Value) -> JsonObject {
    match value {
        Value::Object(map) => map,
        _ => JsonObject::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_body_value_for_tombstone() {
        let mut doc = Document::new("a", json!({"x": 1}).as_object().cloned().unwrap());
        assert_eq!(body_value(&doc), json!({"x": 1}));

        doc.deleted = true;
        assert_eq!(body_value(&doc), json!({}));
    }

    #[test]
    fn test_body_object_rejects_non_objects() {
        assert!(body_object(json!([1, 2])).is_empty());
        assert_eq!(body_object(json!({"a": 1})).len(), 1);
    }
}
