//! Export coordinator - main orchestrator for the export process
//!
//! store -> export factory (paginated reads, certificate join) -> export
//! processor -> export object

use crate::adapters::database::traits::DocumentStore;
use crate::config::ArcportConfig;
use crate::core::export::factory::{ExportFactory, ExportRequestMap};
use crate::core::export::processor::ExportProcessor;
use crate::core::export::summary::ExportSummary;
use crate::domain::context::ResultExt;
use crate::domain::export::ExportObject;
use crate::domain::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Export coordinator
pub struct ExportCoordinator {
    factory: ExportFactory,
    processor: ExportProcessor,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(store: Arc<dyn DocumentStore>, config: &ArcportConfig) -> Self {
        Self {
            factory: ExportFactory::new(store).with_page_size(config.export.page_size),
            processor: ExportProcessor::new(&config.application.app_version)
                .with_kind(&config.export.kind),
        }
    }

    /// Override the top-level kind of the produced export object
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.processor = self.processor.with_kind(kind);
        self
    }

    /// Read the selected collections and build the export object
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn export(
        &self,
        request: &ExportRequestMap,
    ) -> Result<(ExportObject, ExportSummary)> {
        let start_time = Instant::now();
        tracing::info!(
            collections = request.selected().count(),
            "Starting export"
        );

        let data = self.factory.get_export_data(request).await?;
        let export = self.processor.process(data);
        let summary = ExportSummary::from_export(&export).with_duration(start_time.elapsed());
        Ok((export, summary))
    }

    /// Export and write the portable file
    ///
    /// # Errors
    ///
    /// Returns an error on store failures or when the file cannot be written.
    pub async fn export_to_file(
        &self,
        request: &ExportRequestMap,
        path: impl AsRef<Path>,
        pretty: bool,
    ) -> Result<ExportSummary> {
        let path = path.as_ref();
        let (export, summary) = self.export(request).await?;
        let content = export.to_json_string(pretty)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        tokio::fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write export file {}", path.display()))?;

        let mut summary = summary;
        summary.output_path = Some(path.display().to_string());
        summary.log_summary();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::traits::Collection;
    use crate::adapters::memory::MemoryStore;
    use crate::domain::document::Document;
    use crate::domain::export::{kinds, ExportCollection};
    use serde_json::json;

    async fn store_with_requests() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        let body = json!({"name": "r", "url": "http://a", "method": "POST"});
        store
            .bulk_write(
                Collection::SavedRequests,
                vec![Document::new("r1", body.as_object().cloned().unwrap())],
            )
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_export_saved() {
        let store = store_with_requests().await;
        let mut config = ArcportConfig::default();
        config.application.app_version = "9.9.9".to_string();
        let coordinator = ExportCoordinator::new(store, &config);

        let (export, summary) = coordinator
            .export(&ExportRequestMap::collections([ExportCollection::Requests]))
            .await
            .unwrap();

        assert_eq!(export.version, "9.9.9");
        assert_eq!(export.kind, kinds::ALL_DATA_EXPORT);
        assert_eq!(export.requests.as_ref().unwrap()[0].method, "POST");
        assert_eq!(summary.count(ExportCollection::Projects), Some(0));
        assert_eq!(summary.total_entities(), 1);
    }

    #[tokio::test]
    async fn test_export_to_file() {
        let store = store_with_requests().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/export.json");
        let coordinator = ExportCoordinator::new(store, &ArcportConfig::default())
            .with_kind(kinds::SAVED_DATA_EXPORT);

        let summary = coordinator
            .export_to_file(&ExportRequestMap::all(), &path, true)
            .await
            .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["kind"], kinds::SAVED_DATA_EXPORT);
        assert_eq!(written["requests"][0]["key"], "r1");
        assert_eq!(summary.output_path, Some(path.display().to_string()));
    }
}
