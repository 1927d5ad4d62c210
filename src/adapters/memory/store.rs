//! In-memory document store
//!
//! Collections are ordered maps behind an async `RwLock`, so scans come back
//! in ascending identifier order without sorting. The store can be seeded
//! from and flushed to a JSON snapshot file, which lets the CLI work without
//! a database server.

use crate::adapters::database::traits::{
    Collection, DocumentStore, ScanPage, ScanRequest, WriteOutcome, WriteSuccess,
};
use crate::domain::context::ResultExt;
use crate::domain::document::{next_revision, Document, RevisionInfo};
use crate::domain::errors::StoreError;
use crate::domain::fields::JsonObject;
use crate::domain::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct StoredDocument {
    rev: String,
    deleted: bool,
    body: JsonObject,
}

type CollectionMap = BTreeMap<String, StoredDocument>;

/// Snapshot file layout: collection name to documents
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    collections: BTreeMap<String, Vec<Document>>,
}

/// In-memory store
pub struct MemoryStore {
    collections: RwLock<BTreeMap<Collection, CollectionMap>>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Create an empty store with no snapshot file
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(BTreeMap::new()),
            snapshot_path: None,
        }
    }

    /// Open a store backed by a snapshot file
    ///
    /// A missing file yields an empty store; the file is created on the first
    /// [`flush`](DocumentStore::flush).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut collections = BTreeMap::new();

        if tokio::fs::try_exists(&path).await? {
            let content = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
            let snapshot: Snapshot = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse snapshot {}", path.display()))?;

            for (name, docs) in snapshot.collections {
                let collection: Collection = name.parse()?;
                let map: CollectionMap = docs
                    .into_iter()
                    .map(|doc| {
                        let stored = StoredDocument {
                            rev: doc.rev.unwrap_or_else(|| next_revision(None)),
                            deleted: doc.deleted,
                            body: doc.body,
                        };
                        (doc.id, stored)
                    })
                    .collect();
                collections.insert(collection, map);
            }

            tracing::debug!(
                path = %path.display(),
                collections = collections.len(),
                "Loaded memory store snapshot"
            );
        }

        Ok(Self {
            collections: RwLock::new(collections),
            snapshot_path: Some(path),
        })
    }

    fn write_one(
        map: &mut CollectionMap,
        collection: Collection,
        doc: Document,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        if doc.id.is_empty() {
            return Err(StoreError::InvalidDocument(format!(
                "Document in {collection} has an empty id"
            )));
        }

        let previous = match map.get(&doc.id) {
            Some(existing) => {
                if doc.rev.as_deref() != Some(existing.rev.as_str()) {
                    return Err(StoreError::Conflict {
                        collection: collection.to_string(),
                        id: doc.id,
                    });
                }
                Some(existing.rev.clone())
            }
            None => None,
        };

        let rev = next_revision(previous.as_deref());
        map.insert(
            doc.id.clone(),
            StoredDocument {
                rev: rev.clone(),
                deleted: doc.deleted,
                body: if doc.deleted { JsonObject::new() } else { doc.body },
            },
        );
        Ok(WriteSuccess { id: doc.id, rev })
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn test_connection(&self) -> Result<()> {
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|map| map.get(id))
            .filter(|stored| !stored.deleted)
            .map(|stored| Document {
                id: id.to_string(),
                rev: Some(stored.rev.clone()),
                deleted: false,
                body: stored.body.clone(),
            }))
    }

    async fn put(
        &self,
        collection: Collection,
        doc: Document,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        let mut collections = self.collections.write().await;
        Self::write_one(collections.entry(collection).or_default(), collection, doc)
    }

    async fn bulk_write(
        &self,
        collection: Collection,
        docs: Vec<Document>,
    ) -> Result<Vec<WriteOutcome>> {
        let mut collections = self.collections.write().await;
        let map = collections.entry(collection).or_default();

        Ok(docs
            .into_iter()
            .map(|doc| {
                let id = doc.id.clone();
                WriteOutcome::from_result(&id, Self::write_one(map, collection, doc))
            })
            .collect())
    }

    async fn scan(&self, collection: Collection, request: ScanRequest) -> Result<ScanPage> {
        let collections = self.collections.read().await;
        let Some(map) = collections.get(&collection) else {
            return Ok(ScanPage::default());
        };

        let lower = match &request.start_key {
            Some(key) => Bound::Included(key.clone()),
            None => Bound::Unbounded,
        };
        let docs: Vec<Document> = map
            .range((lower, Bound::Unbounded))
            .filter(|(_, stored)| !stored.deleted)
            .skip(request.skip)
            .take(request.limit)
            .map(|(id, stored)| Document {
                id: id.clone(),
                rev: Some(stored.rev.clone()),
                deleted: false,
                body: stored.body.clone(),
            })
            .collect();

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
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|map| map.get(id))
            .map(|stored| RevisionInfo {
                rev: stored.rev.clone(),
                deleted: stored.deleted,
            }))
    }

    async fn delete(
        &self,
        collection: Collection,
        id: &str,
        rev: &str,
    ) -> std::result::Result<WriteSuccess, StoreError> {
        let mut collections = self.collections.write().await;
        let map = collections.entry(collection).or_default();

        match map.get(id) {
            Some(stored) if !stored.deleted => {}
            _ => {
                return Err(StoreError::NotFound {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
        }

        let tombstone = Document {
            id: id.to_string(),
            rev: Some(rev.to_string()),
            deleted: true,
            body: JsonObject::new(),
        };
        Self::write_one(map, collection, tombstone)
    }

    async fn count(&self, collection: Collection) -> Result<usize> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|map| map.values().filter(|stored| !stored.deleted).count())
            .unwrap_or(0))
    }

    async fn flush(&self) -> Result<()> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let snapshot = {
            let collections = self.collections.read().await;
            Snapshot {
                collections: collections
                    .iter()
                    .map(|(collection, map)| {
                        let docs = map
                            .iter()
                            .map(|(id, stored)| Document {
                                id: id.clone(),
                                rev: Some(stored.rev.clone()),
                                deleted: stored.deleted,
                                body: stored.body.clone(),
                            })
                            .collect();
                        (collection.as_str().to_string(), docs)
                    })
                    .collect(),
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, serde_json::to_vec(&snapshot)?).await?;
        tokio::fs::rename(&tmp_path, path).await?;

        tracing::debug!(path = %path.display(), "Flushed memory store snapshot");
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
