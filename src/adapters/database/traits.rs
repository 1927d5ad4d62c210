//! Document store abstraction traits
//!
//! This module defines the interface that storage backends must implement
//! to work with arcport. The store is injected into the import store and the
//! export factory; nothing in the pipeline reaches for a global handle.

use crate::domain::document::{Document, RevisionInfo};
use crate::domain::errors::StoreError;
use crate::domain::export::ExportCollection;
use crate::domain::Result;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Named store collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    SavedRequests,
    HistoryRequests,
    Projects,
    UrlHistory,
    WebsocketUrlHistory,
    Variables,
    Environments,
    AuthData,
    HostRules,
    ClientCertificates,
    ClientCertificatesData,
    Cookies,
}

impl Collection {
    /// Every collection
    pub const ALL: [Collection; 12] = [
        Self::SavedRequests,
        Self::HistoryRequests,
        Self::Projects,
        Self::UrlHistory,
        Self::WebsocketUrlHistory,
        Self::Variables,
        Self::Environments,
        Self::AuthData,
        Self::HostRules,
        Self::ClientCertificates,
        Self::ClientCertificatesData,
        Self::Cookies,
    ];

    /// Store name of the collection
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SavedRequests => "saved-requests",
            Self::HistoryRequests => "history-requests",
            Self::Projects => "legacy-projects",
            Self::UrlHistory => "url-history",
            Self::WebsocketUrlHistory => "websocket-url-history",
            Self::Variables => "variables",
            Self::Environments => "variables-environments",
            Self::AuthData => "auth-data",
            Self::HostRules => "host-rules",
            Self::ClientCertificates => "client-certificates",
            Self::ClientCertificatesData => "client-certificates-data",
            Self::Cookies => "cookies",
        }
    }

    /// Store collection holding an export collection
    ///
    /// Client certificates map to their index collection; the data records
    /// live in [`Collection::ClientCertificatesData`].
    pub fn for_export(collection: ExportCollection) -> Self {
        match collection {
            ExportCollection::Requests => Self::SavedRequests,
            ExportCollection::Projects => Self::Projects,
            ExportCollection::History => Self::HistoryRequests,
            ExportCollection::UrlHistory => Self::UrlHistory,
            ExportCollection::WebsocketUrlHistory => Self::WebsocketUrlHistory,
            ExportCollection::Variables => Self::Variables,
            ExportCollection::AuthData => Self::AuthData,
            ExportCollection::HostRules => Self::HostRules,
            ExportCollection::ClientCertificates => Self::ClientCertificates,
            ExportCollection::Cookies => Self::Cookies,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = StoreError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| StoreError::InvalidDocument(format!("Unknown collection: {s}")))
    }
}

/// Outcome of one document of a bulk write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The document was written
    Ok { id: String, rev: String },

    /// The document was rejected
    Failed {
        id: String,
        error: String,
        /// Whether the failure was a revision conflict
        conflict: bool,
    },
}

impl WriteOutcome {
    /// Build the outcome of a single write
    pub fn from_result(id: &str, result: std::result::Result<WriteSuccess, StoreError>) -> Self {
        match result {
            Ok(success) => Self::Ok {
                id: success.id,
                rev: success.rev,
            },
            Err(e) => Self::Failed {
                id: id.to_string(),
                conflict: e.is_conflict(),
                error: e.to_string(),
            },
        }
    }

    /// Identifier of the written document
    pub fn id(&self) -> &str {
        match self {
            Self::Ok { id, .. } | Self::Failed { id, .. } => id,
        }
    }

    /// Whether the write succeeded
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }

    /// Whether the write failed with a revision conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Failed { conflict: true, .. })
    }
}

/// Successful single write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSuccess {
    pub id: String,
    pub rev: String,
}

/// Paginated scan request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanRequest {
    /// Identifier to start from (inclusive)
    pub start_key: Option<String>,

    /// Number of documents to skip from the start position
    pub skip: usize,

    /// Maximum number of documents to return
    pub limit: usize,
}

impl ScanRequest {
    /// First page of a scan
    pub fn first(limit: usize) -> Self {
        Self {
            start_key: None,
            skip: 0,
            limit,
        }
    }

    /// Page following `last_key`
    pub fn after(last_key: impl Into<String>, limit: usize) -> Self {
        Self {
            start_key: Some(last_key.into()),
            skip: 1,
            limit,
        }
    }
}

/// One page of a scan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScanPage {
    /// Live documents in ascending identifier order
    pub docs: Vec<Document>,

    /// Identifier of the last returned document
    pub next_start_key: Option<String>,
}

/// Document store trait
///
/// Implementations provide per-collection primitives with optimistic
/// concurrency: writing a document whose identifier already exists (live or
/// tombstone) with a revision other than the stored one fails with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Test the backend connection
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be reached.
    async fn test_connection(&self) -> Result<()>;

    /// Fetch a live document
    ///
    /// Returns `Ok(None)` when the document does not exist or is a tombstone.
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>>;

    /// Write a single document
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when `doc.rev` does not match the
    /// stored revision.
    async fn put(
        &self,
        collection: Collection,
        doc: Document,
    ) -> std::result::Result<WriteSuccess, StoreError>;

    /// Write many documents, reporting an outcome per document
    ///
    /// A failure of one document never aborts the others. The outcomes are in
    /// input order.
    async fn bulk_write(&self, collection: Collection, docs: Vec<Document>)
        -> Result<Vec<WriteOutcome>>;

    /// Read one page of live documents in ascending identifier order
    async fn scan(&self, collection: Collection, request: ScanRequest) -> Result<ScanPage>;

    /// Current revision of a document, including tombstones
    async fn revision_info(&self, collection: Collection, id: &str)
        -> Result<Option<RevisionInfo>>;

    /// Mark a document deleted
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] when there is no live document and
    /// [`StoreError::Conflict`] when `rev` is stale.
    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        rev: &str,
    ) -> std::result::Result<WriteSuccess, StoreError>;

    /// Number of live documents in a collection
    async fn count(&self, collection: Collection) -> Result<usize>;

    /// Make pending writes durable
    ///
    /// Backends that persist every write immediately keep the default no-op.
    async fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Backend name used in logs
    fn backend_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_round_trip_names() {
        for collection in Collection::ALL {
            assert_eq!(
                Collection::from_str(collection.as_str()).unwrap(),
                collection
            );
        }
        assert!(Collection::from_str("nope").is_err());
        assert_eq!(Collection::Projects.to_string(), "legacy-projects");
    }

    #[test]
    fn test_export_collection_mapping() {
        assert_eq!(
            Collection::for_export(ExportCollection::Requests),
            Collection::SavedRequests
        );
        assert_eq!(
            Collection::for_export(ExportCollection::History),
            Collection::HistoryRequests
        );
        assert_eq!(
            Collection::for_export(ExportCollection::UrlHistory).as_str(),
            "url-history"
        );
    }

    #[test]
    fn test_write_outcome_from_result() {
        let ok = WriteOutcome::from_result(
            "a",
            Ok(WriteSuccess {
                id: "a".to_string(),
                rev: "1-x".to_string(),
            }),
        );
        assert!(ok.is_ok());
        assert_eq!(ok.id(), "a");

        let conflict = WriteOutcome::from_result(
            "b",
            Err(StoreError::Conflict {
                collection: "c".to_string(),
                id: "b".to_string(),
            }),
        );
        assert!(conflict.is_conflict());
        assert!(!conflict.is_ok());

        let failed = WriteOutcome::from_result("c", Err(StoreError::Backend("x".to_string())));
        assert!(!failed.is_conflict());
        assert_eq!(failed.id(), "c");
    }

    #[test]
    fn test_scan_request_after() {
        let request = ScanRequest::after("k9", 50);
        assert_eq!(request.start_key.as_deref(), Some("k9"));
        assert_eq!(request.skip, 1);
        assert_eq!(request.limit, 50);
    }
}
