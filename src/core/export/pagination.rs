//! Paginated collection reads
//!
//! Collections are read in bounded pages: each page continues from the last
//! identifier of the previous one, skipping that identifier, until a page
//! comes back shorter than requested.

use crate::adapters::database::traits::{Collection, DocumentStore, ScanRequest};
use crate::domain::document::Document;
use crate::domain::Result;

/// Default number of documents per page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Read every live document of a collection
///
/// # Errors
///
/// Returns the first store error; documents read before it are discarded.
pub async fn read_all(
    store: &dyn DocumentStore,
    collection: Collection,
    page_size: usize,
) -> Result<Vec<Document>> {
    let page_size = page_size.max(1);
    let mut docs: Vec<Document> = Vec::new();
    let mut request = ScanRequest::first(page_size);
    let mut pages = 0usize;

    loop {
        let page = store.scan(collection, request).await?;
        pages += 1;
        let received = page.docs.len();
        docs.extend(page.docs);

        match page.next_start_key {
            Some(last_key) if received == page_size => {
                request = ScanRequest::after(last_key, page_size);
            }
            _ => break,
        }
    }

    tracing::debug!(
        collection = %collection,
        documents = docs.len(),
        pages = pages,
        "Read collection"
    );
    Ok(docs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use serde_json::json;

    async fn seeded(count: usize) -> MemoryStore {
        let store = MemoryStore::new();
        let docs = (0..count)
            .map(|i| {
                Document::new(
                    format!("doc-{i:04}"),
                    json!({"n": i}).as_object().cloned().unwrap(),
                )
            })
            .collect();
        store.bulk_write(Collection::Cookies, docs).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_reads_across_pages() {
        let store = seeded(25).await;
        let docs = read_all(&store, Collection::Cookies, 10).await.unwrap();

        assert_eq!(docs.len(), 25);
        assert_eq!(docs[0].id, "doc-0000");
        assert_eq!(docs[24].id, "doc-0024");
    }

    #[tokio::test]
    async fn test_exact_multiple_of_page_size() {
        let store = seeded(20).await;
        let docs = read_all(&store, Collection::Cookies, 10).await.unwrap();
        assert_eq!(docs.len(), 20);
    }

    #[tokio::test]
    async fn test_skips_tombstones() {
        let store = seeded(3).await;
        let doc = store.get(Collection::Cookies, "doc-0001").await.unwrap().unwrap();
        store
            .delete(Collection::Cookies, "doc-0001", doc.rev.as_deref().unwrap())
            .await
            .unwrap();

        let docs = read_all(&store, Collection::Cookies, 2).await.unwrap();
        let ids: Vec<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["doc-0000", "doc-0002"]);
    }

    #[tokio::test]
    async fn test_empty_collection() {
        let store = MemoryStore::new();
        let docs = read_all(&store, Collection::Variables, 100).await.unwrap();
        assert!(docs.is_empty());
    }
}
