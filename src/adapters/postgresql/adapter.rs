//! PostgreSQL adapter implementing the document store trait
//!
//! Optimistic concurrency is enforced in SQL: a write based on revision `r`
//! only updates the row whose stored revision is still `r`, and a write with
//! no revision only inserts when no row (live or tombstone) exists.

use crate::adapters::database::traits::{
    Collection, DocumentStore, ScanPage, ScanRequest, WriteOutcome, WriteSuccess,
};
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::adapters::postgresql::models::{
    body_value, document_from_row, revision_from_row, COUNT_LIVE, INSERT_NEW, SCAN_LIVE,
    SELECT_LIVE, SELECT_REVISION, UPDATE_AT_REVISION,
};
use crate::domain::document::{next_revision, Document, RevisionInfo};
use crate::domain::errors::StoreError;
use crate::domain::{ArcportError, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// PostgreSQL implementation of [`DocumentStore`]
pub struct PostgreSQLAdapter {
    client: Arc<PostgreSQLClient>,
}

impl PostgreSQLAdapter {
    /// Create a new PostgreSQL adapter
    pub fn new(client: PostgreSQLClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// Create a new PostgreSQL adapter with an Arc-wrapped client
    pub fn new_with_arc(client: Arc<PostgreSQLClient>) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Arc<PostgreSQLClient> {
        &self.client
    }

    async fn write_one(
        conn: &tokio_postgres::Client,
        collection: Collection,
        doc: Document,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        if doc.id.is_empty() {
            return Err(StoreError::InvalidDocument(format!(
                "Document in {collection} has an empty id"
            )));
        }

        let body = body_value(&doc);
        let name = collection.as_str();

        if let Some(expected) = doc.rev.as_deref() {
            let rev = next_revision(Some(expected));
            let updated = conn
                .execute(
                    UPDATE_AT_REVISION,
                    &[&name, &doc.id, &expected, &rev, &doc.deleted, &body],
                )
                .await
                .map_err(backend_error)?;
            if updated == 1 {
                return Ok(WriteSuccess { id: doc.id, rev });
            }
        }

        // No row matched the expected revision: the write only succeeds as a
        // brand-new document
        let rev = next_revision(None);
        let inserted = conn
            .execute(INSERT_NEW, &[&name, &doc.id, &rev, &doc.deleted, &body])
            .await
            .map_err(backend_error)?;

        if inserted == 1 {
            Ok(WriteSuccess { id: doc.id, rev })
        } else {
            Err(StoreError::Conflict {
                collection: collection.to_string(),
                id: doc.id,
            })
        }
    }
}

fn backend_error(e: tokio_postgres::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn database_error(context: &str) -> impl Fn(tokio_postgres::Error) -> ArcportError + '_ {
    move |e| ArcportError::Database(format!("{context}: {e}"))
}

#[async_trait]
impl DocumentStore for PostgreSQLAdapter {
    async fn test_connection(&self) -> Result<()> {
        self.client.test_connection().await?;
        self.client.ensure_schema().await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(SELECT_LIVE, &[&collection.as_str(), &id])
            .await
            .map_err(database_error("Failed to read document"))?;
        Ok(row.as_ref().map(document_from_row))
    }

    async fn put(
        &self,
        collection: Collection,
        doc: Document,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::write_one(&**conn, collection, doc).await
    }

    async fn bulk_write(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<Vec<WriteOutcome>> {
        let conn = self.client.get_connection().await?;
        let mut outcomes = Vec::with_capacity(docs.len());

        for doc in docs {
            let id = doc.id.clone();
            let result = Self::write_one(&**conn, collection, doc).await;
            outcomes.push(WriteOutcome::from_result(&id, result));
        }

        Ok(outcomes)
    }

    async fn scan(&self, collection: Collection, request: ScanRequest) -> Result<ScanPage> {
        let conn = self.client.get_connection().await?;
        let offset = i64::try_from(request.skip).unwrap_or(i64::MAX);
        let limit = i64::try_from(request.limit).unwrap_or(i64::MAX);

        let rows = conn
            .query(
                SCAN_LIVE,
                &[&collection.as_str(), &request.start_key, &offset, &limit],
            )
            .await
            .map_err(database_error("Failed to scan documents"))?;

        let docs: Vec<Document> = rows.iter().map(document_from_row).collect();
        let next_start_key = docs.last().map(|doc| doc.id.clone());
        Ok(ScanPage {
            docs,
            next_start_key,
        })
    }

    async fn revision_info(
        &self,
        collection: Collection,
        id: &str,
    ) -> Result<Option<RevisionInfo>> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_opt(SELECT_REVISION, &[&collection.as_str(), &id])
            .await
            .map_err(database_error("Failed to read revision"))?;
        Ok(row.as_ref().map(revision_from_row))
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        rev: &str,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        let conn = self
            .client
            .get_connection()
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let current = conn
            .query_opt(SELECT_REVISION, &[&collection.as_str(), &id])
            .await
            .map_err(backend_error)?
            .map(|row| revision_from_row(&row));

        match current {
            Some(info) if !info.deleted => {
                let tombstone = Document {
                    id: id.to_string(),
                    rev: Some(rev.to_string()),
                    deleted: true,
                    body: Default::default(),
                };
                Self::write_one(&**conn, collection, tombstone).await
            }
            _ => Err(StoreError::NotFound {
                collection: collection.to_string(),
                id: id.to_string(),
            }),
        }
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let conn = self.client.get_connection().await?;
        let row = conn
            .query_one(COUNT_LIVE, &[&collection.as_str()])
            .await
            .map_err(database_error("Failed to count documents"))?;
        let count: i64 = row.get(0);
        Ok(usize::try_from(count).unwrap_or(0))
    }

    fn backend_name(&self) -> &str {
        "postgresql"
    }
}
