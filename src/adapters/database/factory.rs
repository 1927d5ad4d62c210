//! Document store factory
//!
//! This module creates the configured storage backend.

use crate::adapters::database::traits::DocumentStore;
use crate::adapters::memory::MemoryStore;
use crate::adapters::postgresql::adapter::PostgreSQLAdapter;
use crate::adapters::postgresql::client::PostgreSQLClient;
use crate::config::schema::{ArcportConfig, StoreBackend};
use crate::domain::{ArcportError, Result};
use std::sync::Arc;

/// Create a document store based on the configuration
///
/// The memory backend loads its snapshot when one is configured and exists.
/// The PostgreSQL backend creates its schema before returning.
///
/// # Errors
///
/// Returns an error if the snapshot cannot be read or the database cannot be
/// reached.
pub async fn create_document_store(config: &ArcportConfig) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = match config.memory.snapshot_path.as_deref() {
                Some(path) => {
                    tracing::info!(snapshot = %path, "Opening memory store");
                    MemoryStore::open(path).await?
                }
                None => {
                    tracing::info!("Creating ephemeral memory store");
                    MemoryStore::new()
                }
            };
            Ok(Arc::new(store) as Arc<dyn DocumentStore>)
        }
        StoreBackend::PostgreSQL => {
            let pg_config = config.postgresql.as_ref().ok_or_else(|| {
                ArcportError::Configuration(
                    "PostgreSQL configuration is required when store.backend is postgresql"
                        .to_string(),
                )
            })?;

            tracing::info!("Creating PostgreSQL document store");
            let client = PostgreSQLClient::new(pg_config.clone()).await?;
            client.ensure_schema().await?;
            let adapter = PostgreSQLAdapter::new(client);

            Ok(Arc::new(adapter) as Arc<dyn DocumentStore>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::database::traits::Collection;

    #[tokio::test]
    async fn test_ephemeral_memory_store() {
        let mut config = ArcportConfig::default();
        config.memory.snapshot_path = None;

        let store = create_document_store(&config).await.unwrap();
        assert_eq!(store.backend_name(), "memory");
        assert_eq!(store.count(Collection::SavedRequests).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_missing_snapshot_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ArcportConfig::default();
        config.memory.snapshot_path = Some(
            dir.path()
                .join("store.json")
                .to_string_lossy()
                .to_string(),
        );

        let store = create_document_store(&config).await.unwrap();
        assert_eq!(store.count(Collection::Projects).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_postgresql_without_section() {
        let mut config = ArcportConfig::default();
        config.store.backend = StoreBackend::PostgreSQL;
        config.postgresql = None;

        let result = create_document_store(&config).await;
        assert!(matches!(result, Err(ArcportError::Configuration(_))));
    }
}
