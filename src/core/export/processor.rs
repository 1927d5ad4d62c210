//! Export processor
//!
//! Turns raw store documents into the canonical [`ExportObject`].

use crate::core::export::factory::{CertificatePair, ExportData};
use crate::domain::document::Document;
use crate::domain::export::{
    kinds, ExportClientCertificate, ExportCollection, ExportEntity, ExportObject, ExportProject,
    ExportRequest, ExportVariable,
};
use crate::domain::fields::{self, JsonObject};
use serde_json::Value;

/// Field of a request holding its pre-multi-project parent reference
const LEGACY_PROJECT_FIELD: &str = "legacyProject";

/// Builds export objects from raw store documents
#[derive(Debug, Clone)]
pub struct ExportProcessor {
    version: String,
    kind: String,
}

impl ExportProcessor {
    /// Create a processor stamping the given application version
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            kind: kinds::ALL_DATA_EXPORT.to_string(),
        }
    }

    /// Set the top-level kind of produced export objects
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        let kind = kind.into();
        if !kind.is_empty() {
            self.kind = kind;
        }
        self
    }

    /// Assemble an export object
    ///
    /// Every collection present in `data` is present in the result, even
    /// when it holds no entities.
    pub fn process(&self, data: Vec<ExportData>) -> ExportObject {
        let mut export = ExportObject::new(&self.version, &self.kind);

        for entry in data {
            match entry {
                ExportData::Certificates(pairs) => {
                    let list = export.client_certificates.get_or_insert_with(Vec::new);
                    for certificate in certificates(pairs) {
                        if !list.iter().any(|c| c.key == certificate.key) {
                            list.push(certificate);
                        }
                    }
                }
                ExportData::Documents { collection, docs } => {
                    self.add_documents(&mut export, collection, docs);
                }
            }
        }

        export
    }

    fn add_documents(
        &self,
        export: &mut ExportObject,
        collection: ExportCollection,
        docs: Vec<Document>,
    ) {
        let bodies = docs.into_iter().filter(|d| !d.deleted).map(keyed_body);

        match collection {
            ExportCollection::Requests => export
                .requests
                .get_or_insert_with(Vec::new)
                .extend(bodies.map(|body| request(&body))),
            ExportCollection::History => {
                export
                    .history
                    .get_or_insert_with(Vec::new)
                    .extend(bodies.map(|body| {
                        let mut item = ExportRequest::from_json(&body, kinds::HISTORY);
                        item.projects.clear();
                        item.name = None;
                        item
                    }))
            }
            ExportCollection::Projects => export
                .projects
                .get_or_insert_with(Vec::new)
                .extend(bodies.map(|body| ExportProject::from_json(&body))),
            ExportCollection::Variables => export
                .variables
                .get_or_insert_with(Vec::new)
                .extend(bodies.filter_map(|body| variable(&body))),
            // Certificates arrive as `ExportData::Certificates` pairs; unpaired
            // certificate documents are ignored here
            _ => {
                let kind = collection.entity_kind();
                if let Some(list) = export.entities_mut(collection) {
                    list.get_or_insert_with(Vec::new)
                        .extend(bodies.map(|body| ExportEntity::from_json(&body, kind)));
                }
            }
        }
    }
}

/// Document body with the store identifier as `key`
fn keyed_body(doc: Document) -> JsonObject {
    let mut body = doc.body;
    body.insert("key".to_string(), Value::String(doc.id));
    body
}

fn request(body: &JsonObject) -> ExportRequest {
    let mut request = ExportRequest::from_json(body, kinds::REQUEST);
    if let Some(project) = fields::non_empty_string(body, LEGACY_PROJECT_FIELD) {
        request.add_project(&project);
    }
    request
}

fn variable(body: &JsonObject) -> Option<ExportVariable> {
    fields::non_empty_string(body, "environment")?;
    Some(ExportVariable::from_json(body))
}

fn certificates(pairs: Vec<CertificatePair>) -> impl Iterator<Item = ExportClientCertificate> {
    pairs.into_iter().filter_map(|pair| {
        let certificate = ExportClientCertificate::from_store_parts(
            &pair.index.id,
            &pair.index.body,
            &pair.data.body,
        );
        if certificate.is_none() {
            tracing::warn!(id = %pair.index.id, "Certificate without material skipped");
        }
        certificate
    })
}
