//! Import summary and reporting
//!
//! This module defines structures for tracking and reporting import results.

use crate::adapters::database::traits::Collection;
use crate::core::transform::DataFormat;
use crate::domain::export::ExportCollection;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Search index partition of a written request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexType {
    Saved,
    History,
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved => f.write_str("saved"),
            Self::History => f.write_str("history"),
        }
    }
}

/// Request the URL search index must learn about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexUpdate {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub index_type: IndexType,
}

/// Write counts for one store collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionResult {
    pub collection: Collection,
    pub written: usize,
    pub failed: usize,
}

/// Document that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportError {
    /// Store collection of the document
    pub collection: Collection,

    /// Document identifier
    pub id: String,

    /// Error message
    pub message: String,
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}: {}", self.collection, self.id, self.message)
    }
}

/// Summary of an import operation
#[derive(Debug, Clone, Default)]
pub struct ImportSummary {
    /// Detected input format, when the import started from raw input
    pub format: Option<DataFormat>,

    /// Entity counts of the transformed export object
    pub planned: Vec<(ExportCollection, usize)>,

    /// Per-collection write counts, in write order
    pub collections: Vec<CollectionResult>,

    /// Documents that failed after conflict resolution
    pub errors: Vec<ImportError>,

    /// Index updates for written requests, saved first
    pub index_updates: Vec<IndexUpdate>,

    /// Environments created for imported variables
    pub environments_created: usize,

    /// Whether the import ran without writing
    pub dry_run: bool,

    /// Duration of the import
    pub duration: Duration,
}

impl ImportSummary {
    /// Create a new empty import summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Record the result of writing a collection
    pub fn record(&mut self, collection: Collection, written: usize, errors: Vec<ImportError>) {
        crate::log_collection_written!(collection, written, errors.len());
        self.collections.push(CollectionResult {
            collection,
            written,
            failed: errors.len(),
        });
        self.errors.extend(errors);
    }

    /// Total documents written
    pub fn total_written(&self) -> usize {
        self.collections.iter().map(|c| c.written).sum()
    }

    /// Total documents that failed
    pub fn total_failed(&self) -> usize {
        self.collections.iter().map(|c| c.failed).sum()
    }

    /// Write counts of one collection
    pub fn collection(&self, collection: Collection) -> Option<&CollectionResult> {
        self.collections.iter().find(|c| c.collection == collection)
    }

    /// Errors, or `None` when every document was written
    pub fn errors_or_none(&self) -> Option<&[ImportError]> {
        if self.errors.is_empty() {
            None
        } else {
            Some(&self.errors)
        }
    }

    /// Index updates, or `None` when no request was written
    pub fn index_updates_or_none(&self) -> Option<&[IndexUpdate]> {
        if self.index_updates.is_empty() {
            None
        } else {
            Some(&self.index_updates)
        }
    }

    /// Check if the import was successful (no failures)
    pub fn is_successful(&self) -> bool {
        self.errors.is_empty()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            format = ?self.format,
            written = self.total_written(),
            failed = self.total_failed(),
            index_updates = self.index_updates.len(),
            environments_created = self.environments_created,
            dry_run = self.dry_run,
            duration_ms = self.duration.as_millis() as u64,
            "Import completed"
        );

        if !self.errors.is_empty() {
            tracing::warn!(error_count = self.errors.len(), "Import completed with errors");
            for error in &self.errors {
                tracing::warn!(
                    collection = %error.collection,
                    id = %error.id,
                    message = %error.message,
                    "Import error"
                );
            }
        }
    }
}
