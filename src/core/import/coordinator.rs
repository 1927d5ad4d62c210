//! Import coordinator - runs the whole import pipeline
//!
//! raw content -> parse -> classify -> transform -> import store -> flush

use crate::adapters::database::traits::DocumentStore;
use crate::config::schema::ImportConfig;
use crate::core::import::store::ImportStore;
use crate::core::import::summary::ImportSummary;
use crate::core::transform::{self, TransformOptions};
use crate::domain::context::ResultExt;
use crate::domain::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

/// Import coordinator
pub struct ImportCoordinator {
    importer: ImportStore,
    options: TransformOptions,
    dry_run: bool,
}

impl ImportCoordinator {
    /// Create a new import coordinator
    pub fn new(store: Arc<dyn DocumentStore>, config: &ImportConfig) -> Self {
        Self {
            importer: ImportStore::new(store),
            options: TransformOptions::from(config),
            dry_run: config.dry_run,
        }
    }

    /// Transform only, without writing to the store
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Page size used when the import reads existing records back
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.importer = self.importer.with_page_size(page_size);
        self
    }

    /// Override the transform options
    pub fn with_options(mut self, options: TransformOptions) -> Self {
        self.options = options;
        self
    }

    /// The import store used for writes
    pub fn importer(&self) -> &ImportStore {
        &self.importer
    }

    /// Import a file from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not JSON, or matches
    /// no known format.
    pub async fn import_file(&self, path: impl AsRef<Path>) -> Result<ImportSummary> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read import file {}", path.display()))?;
        self.import_str(&content).await
    }

    /// Import raw file content
    pub async fn import_str(&self, content: &str) -> Result<ImportSummary> {
        let raw = transform::parse_input(content)?;
        self.import_value(&raw).await
    }

    /// Import an already parsed value
    pub async fn import_value(&self, raw: &Value) -> Result<ImportSummary> {
        let start_time = Instant::now();
        let (format, export) = transform::transform(raw, &self.options).await?;
        crate::log_import_start!(format, export.kind);

        let mut summary = if self.dry_run {
            tracing::info!("Dry run: skipping store writes");
            let mut summary = ImportSummary::new();
            summary.planned = export.collection_counts();
            summary
        } else {
            let summary = self.importer.import_data(&export).await;
            self.importer.store().flush().await?;
            summary
        };

        summary.format = Some(format);
        summary.dry_run = self.dry_run;
        let summary = summary.with_duration(start_time.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}
