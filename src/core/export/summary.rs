//! Export summary and reporting

use crate::domain::export::{ExportCollection, ExportObject};
use std::time::Duration;

/// Summary of an export operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportSummary {
    /// Top-level kind of the produced export object
    pub kind: String,

    /// Entity counts of every exported collection, in wire order
    pub collections: Vec<(ExportCollection, usize)>,

    /// Duration of the export
    pub duration: Duration,

    /// File the export was written to, if any
    pub output_path: Option<String>,
}

impl ExportSummary {
    /// Summarize an export object
    pub fn from_export(export: &ExportObject) -> Self {
        Self {
            kind: export.kind.clone(),
            collections: export.collection_counts(),
            ..Self::default()
        }
    }

    /// Set the duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Number of entities in one collection
    pub fn count(&self, collection: ExportCollection) -> Option<usize> {
        self.collections
            .iter()
            .find(|(c, _)| *c == collection)
            .map(|(_, n)| *n)
    }

    /// Total number of exported entities
    pub fn total_entities(&self) -> usize {
        self.collections.iter().map(|(_, n)| n).sum()
    }

    /// Log the summary
    pub fn log_summary(&self) {
        tracing::info!(
            kind = %self.kind,
            collections = self.collections.len(),
            entities = self.total_entities(),
            output = ?self.output_path,
            duration_ms = self.duration.as_millis() as u64,
            "Export completed"
        );
        for (collection, count) in &self.collections {
            tracing::debug!(collection = %collection, count = count, "Exported collection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::export::{kinds, ExportProject};

    #[test]
    fn test_from_export() {
        let mut export = ExportObject::new("1", kinds::PROJECT_EXPORT);
        export.projects = Some(vec![
            ExportProject::new("a", "A"),
            ExportProject::new("b", "B"),
        ]);
        export.requests = Some(Vec::new());

        let summary = ExportSummary::from_export(&export).with_duration(Duration::from_millis(7));
        assert_eq!(summary.kind, kinds::PROJECT_EXPORT);
        assert_eq!(summary.count(ExportCollection::Projects), Some(2));
        assert_eq!(summary.count(ExportCollection::Requests), Some(0));
        assert_eq!(summary.count(ExportCollection::Cookies), None);
        assert_eq!(summary.total_entities(), 2);
        assert_eq!(summary.duration, Duration::from_millis(7));
    }
}
