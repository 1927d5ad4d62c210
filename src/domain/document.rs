//! Stored document model
//!
//! Every entity persisted by a [`DocumentStore`](crate::adapters::database::DocumentStore)
//! is a [`Document`]: a primary identifier, an optimistic-concurrency revision,
//! a tombstone flag and a JSON body.

use crate::domain::fields::JsonObject;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A document held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Primary identifier, unique within a collection
    pub id: String,

    /// Current revision (`N-<32 hex>`); `None` for documents never written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,

    /// Tombstone marker
    #[serde(default)]
    pub deleted: bool,

    /// Entity content without identity or revision metadata
    #[serde(default)]
    pub body: JsonObject,
}

impl Document {
    /// Create a new, never-written document
    pub fn new(id: impl Into<String>, body: JsonObject) -> Self {
        Self {
            id: id.into(),
            rev: None,
            deleted: false,
            body,
        }
    }

    /// Set the revision the write is based on
    pub fn with_rev(mut self, rev: impl Into<String>) -> Self {
        self.rev = Some(rev.into());
        self
    }

    /// Read a body field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.body.get(key)
    }

    /// Read a string body field
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.body.get(key).and_then(Value::as_str)
    }
}

/// Revision and tombstone state of a stored document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionInfo {
    /// Current revision
    pub rev: String,

    /// Whether the document is a tombstone
    pub deleted: bool,
}

/// Compute the revision that follows `previous`
///
/// Revisions are `<generation>-<32 hex chars>`; a missing or malformed
/// previous revision starts at generation 1.
pub fn next_revision(previous: Option<&str>) -> String {
    let generation = previous.map(revision_generation).unwrap_or(0) + 1;
    format!("{generation}-{}", Uuid::new_v4().simple())
}

/// Generation number of a revision string
pub fn revision_generation(rev: &str) -> u64 {
    rev.split_once('-')
        .and_then(|(generation, _)| generation.parse().ok())
        .unwrap_or(0)
}
