//! Import store
//!
//! Writes every collection of an [`ExportObject`] to the document store.
//! Each collection is bulk-written once; documents rejected with a revision
//! conflict get a second pass that reads the stored revision (restoring
//! deleted documents) and overwrites. Only failures of that second pass, and
//! non-conflict failures of the first, are reported.

use crate::adapters::database::traits::{Collection, DocumentStore, WriteOutcome, WriteSuccess};
use crate::core::export::pagination::{read_all, DEFAULT_PAGE_SIZE};
use crate::core::import::summary::{ImportError, ImportSummary, IndexType, IndexUpdate};
use crate::domain::document::Document;
use crate::domain::errors::StoreError;
use crate::domain::export::{
    new_key, ExportClientCertificate, ExportCollection, ExportObject, ExportRequest,
    ExportVariable, DEFAULT_ENVIRONMENT,
};
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

/// Result of writing one batch of documents
#[derive(Debug, Default)]
struct WriteReport {
    written: Vec<WriteSuccess>,
    errors: Vec<ImportError>,
}

/// Bulk importer with conflict resolution
pub struct ImportStore {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl ImportStore {
    /// Create an import store over a document store
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the page size used when reading existing environments
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Page size used when reading existing records
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// The underlying document store
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Import every collection of an export object
    ///
    /// Never fails: per-document problems, and store failures affecting a
    /// whole collection, are collected into the summary.
    pub async fn import_data(&self, export: &ExportObject) -> ImportSummary {
        let start_time = Instant::now();
        let mut summary = ImportSummary::new();
        summary.planned = export.collection_counts();

        if let Some(requests) = &export.requests {
            let updates = self
                .write_requests(Collection::SavedRequests, requests, IndexType::Saved, &mut summary)
                .await;
            summary.index_updates.extend(updates);
        }

        if let Some(projects) = &export.projects {
            self.write_entities(Collection::Projects, projects, &mut summary)
                .await;
        }

        if let Some(history) = &export.history {
            let updates = self
                .write_requests(
                    Collection::HistoryRequests,
                    history,
                    IndexType::History,
                    &mut summary,
                )
                .await;
            summary.index_updates.extend(updates);
        }

        for collection in [
            ExportCollection::WebsocketUrlHistory,
            ExportCollection::UrlHistory,
            ExportCollection::Cookies,
            ExportCollection::AuthData,
        ] {
            if let Some(entities) = export.entities(collection) {
                self.write_entities(Collection::for_export(collection), entities, &mut summary)
                    .await;
            }
        }

        if let Some(variables) = &export.variables {
            self.write_entities(Collection::Variables, variables, &mut summary)
                .await;
            self.ensure_environments(variables, &mut summary).await;
        }

        if let Some(host_rules) = &export.host_rules {
            self.write_entities(Collection::HostRules, host_rules, &mut summary)
                .await;
        }

        if let Some(certificates) = &export.client_certificates {
            self.write_certificates(certificates, &mut summary).await;
        }

        summary.with_duration(start_time.elapsed())
    }

    async fn write_entities<T: Serialize>(
        &self,
        collection: Collection,
        entities: &[T],
        summary: &mut ImportSummary,
    ) {
        let (docs, mut errors) = to_documents(collection, entities);
        let report = self.write_documents(collection, docs).await;
        errors.extend(report.errors);
        summary.record(collection, report.written.len(), errors);
    }

    async fn write_requests(
        &self,
        collection: Collection,
        requests: &[ExportRequest],
        index_type: IndexType,
        summary: &mut ImportSummary,
    ) -> Vec<IndexUpdate> {
        let (docs, errors) = to_documents(collection, requests);
        let urls: HashMap<String, String> = docs
            .iter()
            .map(|doc| (doc.id.clone(), doc.str_field("url").unwrap_or_default().to_string()))
            .collect();

        let report = self.write_documents(collection, docs).await;
        let mut all_errors = errors;
        all_errors.extend(report.errors);
        summary.record(collection, report.written.len(), all_errors);

        report
            .written
            .into_iter()
            .map(|written| IndexUpdate {
                url: urls.get(&written.id).cloned().unwrap_or_default(),
                id: written.id,
                index_type,
            })
            .collect()
    }

    /// Create environment records for variables that reference missing ones
    async fn ensure_environments(&self, variables: &[ExportVariable], summary: &mut ImportSummary) {
        let mut seen: HashSet<String> = HashSet::new();
        let wanted: Vec<&str> = variables
            .iter()
            .map(|v| v.environment.as_str())
            .filter(|name| !name.is_empty() && !name.eq_ignore_ascii_case(DEFAULT_ENVIRONMENT))
            .filter(|name| seen.insert(name.to_lowercase()))
            .collect();
        if wanted.is_empty() {
            return;
        }

        let existing: HashSet<String> =
            match read_all(self.store.as_ref(), Collection::Environments, self.page_size).await {
                Ok(docs) => docs
                    .iter()
                    .filter_map(|doc| doc.str_field("name"))
                    .map(str::to_lowercase)
                    .collect(),
                Err(e) => {
                    summary.record(
                        Collection::Environments,
                        0,
                        vec![ImportError {
                            collection: Collection::Environments,
                            id: String::new(),
                            message: format!("Failed to read environments: {e}"),
                        }],
                    );
                    return;
                }
            };

        let created = fields::now_millis();
        let docs: Vec<Document> = wanted
            .into_iter()
            .filter(|name| !existing.contains(&name.to_lowercase()))
            .map(|name| {
                let mut body = JsonObject::new();
                body.insert("name".to_string(), Value::String(name.to_string()));
                body.insert("created".to_string(), Value::from(created));
                Document::new(new_key(), body)
            })
            .collect();
        if docs.is_empty() {
            return;
        }

        let report = self.write_documents(Collection::Environments, docs).await;
        summary.environments_created += report.written.len();
        summary.record(Collection::Environments, report.written.len(), report.errors);
    }

    /// Certificates are written as two parallel bulk writes: index and data
    async fn write_certificates(
        &self,
        certificates: &[ExportClientCertificate],
        summary: &mut ImportSummary,
    ) {
        let mut index_docs = Vec::with_capacity(certificates.len());
        let mut data_docs = Vec::with_capacity(certificates.len());
        let mut errors = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for certificate in certificates {
            let id = if certificate.key.is_empty() {
                new_key()
            } else {
                certificate.key.clone()
            };
            if !seen.insert(id.clone()) {
                continue;
            }
            match certificate.to_store_parts(&id) {
                Ok((index, data)) => {
                    index_docs.push(Document::new(id.clone(), index));
                    data_docs.push(Document::new(id, data));
                }
                Err(e) => errors.push(ImportError {
                    collection: Collection::ClientCertificates,
                    id,
                    message: e.to_string(),
                }),
            }
        }

        let (index_report, data_report) = futures::join!(
            self.write_documents(Collection::ClientCertificates, index_docs),
            self.write_documents(Collection::ClientCertificatesData, data_docs)
        );

        errors.extend(index_report.errors);
        summary.record(Collection::ClientCertificates, index_report.written.len(), errors);
        summary.record(
            Collection::ClientCertificatesData,
            data_report.written.len(),
            data_report.errors,
        );
    }

    /// Bulk write with a second pass for conflicted documents
    async fn write_documents(&self, collection: Collection, docs: Vec<Document>) -> WriteReport {
        let mut report = WriteReport::default();
        if docs.is_empty() {
            return report;
        }

        let outcomes = match self.store.bulk_write(collection, docs.clone()).await {
            Ok(outcomes) => outcomes,
            Err(e) => {
                tracing::error!(collection = %collection, error = %e, "Bulk write failed");
                report.errors = docs
                    .into_iter()
                    .map(|doc| ImportError {
                        collection,
                        id: doc.id,
                        message: e.to_string(),
                    })
                    .collect();
                return report;
            }
        };

        let mut conflicted = Vec::new();
        for (doc, outcome) in docs.into_iter().zip(outcomes) {
            match outcome {
                WriteOutcome::Ok { id, rev } => report.written.push(WriteSuccess { id, rev }),
                WriteOutcome::Failed { conflict: true, .. } => conflicted.push(doc),
                WriteOutcome::Failed { id, error, .. } => report.errors.push(ImportError {
                    collection,
                    id,
                    message: error,
                }),
            }
        }

        if conflicted.is_empty() {
            return report;
        }

        crate::log_retry_attempt!(collection, conflicted.len());
        for doc in conflicted {
            let id = doc.id.clone();
            match self.resolve_conflict(collection, doc).await {
                Ok(written) => report.written.push(written),
                Err(e) => report.errors.push(ImportError {
                    collection,
                    id,
                    message: e.to_string(),
                }),
            }
        }
        report
    }

    /// Overwrite a document that conflicted on the first pass
    async fn resolve_conflict(
        &self,
        collection: Collection,
        doc: Document,
    ) -> Result<WriteSuccess> {
        let current = self.store.revision_info(collection, &doc.id).await?;

        let rev = match current {
            Some(info) if info.deleted => {
                tracing::debug!(
                    collection = %collection,
                    id = %doc.id,
                    "Restoring deleted document"
                );
                let restored = Document {
                    id: doc.id.clone(),
                    rev: Some(info.rev),
                    deleted: false,
                    body: doc.body.clone(),
                };
                Some(self.store.put(collection, restored).await?.rev)
            }
            Some(info) => Some(info.rev),
            None => None,
        };

        let doc = Document {
            rev,
            deleted: false,
            ..doc
        };
        Ok(self.store.put(collection, doc).await?)
    }

    /// Delete a client certificate: the index record first, then its data
    ///
    /// Failing to delete the data record is logged and not reported.
    ///
    /// # Errors
    ///
    /// Returns an error when the index record does not exist or cannot be deleted.
    pub async fn delete_client_certificate(&self, id: &str) -> Result<()> {
        let index = self
            .store
            .get(Collection::ClientCertificates, id)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                collection: Collection::ClientCertificates.to_string(),
                id: id.to_string(),
            })?;

        let rev = index.rev.clone().unwrap_or_default();
        self.store
            .delete(Collection::ClientCertificates, id, &rev)
            .await?;

        let data_key = index.str_field("dataKey").unwrap_or(id).to_string();
        match self
            .store
            .get(Collection::ClientCertificatesData, &data_key)
            .await
        {
            Ok(Some(data)) => {
                let rev = data.rev.unwrap_or_default();
                if let Err(e) = self
                    .store
                    .delete(Collection::ClientCertificatesData, &data_key, &rev)
                    .await
                {
                    tracing::warn!(id = %data_key, error = %e, "Failed to delete certificate data");
                }
            }
            Ok(None) => {
                tracing::debug!(id = %data_key, "Certificate data already removed");
            }
            Err(e) => {
                tracing::warn!(id = %data_key, error = %e, "Failed to read certificate data");
            }
        }

        tracing::info!(id = %id, "Client certificate deleted");
        Ok(())
    }

    /// Rename an environment and move its variables
    ///
    /// Variables reference environments by name, so every variable of the old
    /// environment (matched case-insensitively) is rewritten. Returns the
    /// number of variables moved.
    ///
    /// # Errors
    ///
    /// Returns an error when the new name is empty or a write fails.
    pub async fn rename_environment(&self, old_name: &str, new_name: &str) -> Result<usize> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(ArcportError::Validation(
                "Environment name cannot be empty".to_string(),
            ));
        }

        let environments =
            read_all(self.store.as_ref(), Collection::Environments, self.page_size).await?;
        if let Some(mut environment) = environments
            .into_iter()
            .find(|doc| doc.str_field("name").is_some_and(|n| n.eq_ignore_ascii_case(old_name)))
        {
            environment
                .body
                .insert("name".to_string(), Value::String(new_name.to_string()));
            self.store.put(Collection::Environments, environment).await?;
        }

        let moved: Vec<Document> =
            read_all(self.store.as_ref(), Collection::Variables, self.page_size)
                .await?
                .into_iter()
                .filter(|doc| {
                    doc.str_field("environment")
                        .is_some_and(|env| env.eq_ignore_ascii_case(old_name))
                })
                .map(|mut doc| {
                    doc.body
                        .insert("environment".to_string(), Value::String(new_name.to_string()));
                    doc
                })
                .collect();

        let count = moved.len();
        let failed = self
            .store
            .bulk_write(Collection::Variables, moved)
            .await?
            .iter()
            .filter(|outcome| !outcome.is_ok())
            .count();
        if failed > 0 {
            return Err(ArcportError::Other(format!(
                "{failed} of {count} variables could not be moved to environment {new_name}"
            )));
        }

        tracing::info!(from = %old_name, to = %new_name, variables = count, "Environment renamed");
        Ok(count)
    }
}

/// Convert entities to store documents: the key becomes the id, `kind` is dropped
fn to_documents<T: Serialize>(
    collection: Collection,
    entities: &[T],
) -> (Vec<Document>, Vec<ImportError>) {
    let mut docs = Vec::with_capacity(entities.len());
    let mut errors = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    for entity in entities {
        match serde_json::to_value(entity) {
            Ok(Value::Object(mut body)) => {
                body.remove("kind");
                let id = body
                    .remove("key")
                    .as_ref()
                    .and_then(fields::value_as_id)
                    .unwrap_or_else(new_key);
                // First occurrence of a key wins
                if !seen.insert(id.clone()) {
                    tracing::debug!(collection = %collection, id = %id, "Skipping duplicate key");
                    continue;
                }
                docs.push(Document::new(id, body));
            }
            Ok(_) => errors.push(ImportError {
                collection,
                id: String::new(),
                message: "Entity is not a JSON object".to_string(),
            }),
            Err(e) => errors.push(ImportError {
                collection,
                id: String::new(),
                message: e.to_string(),
            }),
        }
    }
    (docs, errors)
}
