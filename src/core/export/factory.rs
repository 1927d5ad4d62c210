//! Export factory
//!
//! Reads the requested collections from the store. Client certificates are
//! read from both the index and the data collection and paired by `dataKey`;
//! certificates referenced by exported requests are joined in even when the
//! certificate collection itself was not requested.

use crate::adapters::database::traits::{Collection, DocumentStore};
use crate::core::export::pagination::{read_all, DEFAULT_PAGE_SIZE};
use crate::domain::document::Document;
use crate::domain::export::{kinds, ExportCollection, ExportRequest};
use crate::domain::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// What to export from one collection
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ExportSelection {
    /// Leave the collection out
    #[default]
    Skip,
    /// Read every document
    All,
    /// Export these documents as given
    Items(Vec<Document>),
}

impl ExportSelection {
    fn is_skip(&self) -> bool {
        matches!(self, Self::Skip)
    }
}

impl From<bool> for ExportSelection {
    fn from(value: bool) -> Self {
        if value {
            Self::All
        } else {
            Self::Skip
        }
    }
}

/// Per-collection export selection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportRequestMap {
    selections: BTreeMap<ExportCollection, ExportSelection>,
}

impl ExportRequestMap {
    /// Select nothing
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every collection
    pub fn all() -> Self {
        ExportCollection::ALL
            .into_iter()
            .fold(Self::new(), |map, c| map.with(c, ExportSelection::All))
    }

    /// Select the given collections in full
    pub fn collections(collections: impl IntoIterator<Item = ExportCollection>) -> Self {
        collections
            .into_iter()
            .fold(Self::new(), |map, c| map.with(c, ExportSelection::All))
    }

    /// Set the selection of one collection
    pub fn with(mut self, collection: ExportCollection, selection: ExportSelection) -> Self {
        if selection.is_skip() {
            self.selections.remove(&collection);
        } else {
            self.selections.insert(collection, selection);
        }
        self
    }

    /// Selection of one collection
    pub fn get(&self, collection: ExportCollection) -> &ExportSelection {
        static SKIP: ExportSelection = ExportSelection::Skip;
        self.selections.get(&collection).unwrap_or(&SKIP)
    }

    /// Whether nothing is selected
    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }

    /// Selected collections, in wire order
    pub fn selected(&self) -> impl Iterator<Item = (ExportCollection, &ExportSelection)> {
        self.selections.iter().map(|(c, s)| (*c, s))
    }
}

/// Certificate index record joined with its data record
#[derive(Debug, Clone, PartialEq)]
pub struct CertificatePair {
    pub index: Document,
    pub data: Document,
}

/// Raw documents of one exported collection
#[derive(Debug, Clone, PartialEq)]
pub enum ExportData {
    /// Plain documents of a collection
    Documents {
        collection: ExportCollection,
        docs: Vec<Document>,
    },
    /// Paired certificate records
    Certificates(Vec<CertificatePair>),
}

impl ExportData {
    /// Number of entities
    pub fn len(&self) -> usize {
        match self {
            Self::Documents { docs, .. } => docs.len(),
            Self::Certificates(pairs) => pairs.len(),
        }
    }

    /// Whether there are no entities
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Reads export data from a document store
pub struct ExportFactory {
    store: Arc<dyn DocumentStore>,
    page_size: usize,
}

impl ExportFactory {
    /// Create a factory with the default page size
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Set the number of documents read per page
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Read the selected collections
    ///
    /// Selecting saved requests without projects also exports projects.
    /// Certificates referenced by exported requests or history that are not
    /// already part of the result are appended as an extra certificates entry.
    ///
    /// # Errors
    ///
    /// Returns the first store error.
    pub async fn get_export_data(&self, request: &ExportRequestMap) -> Result<Vec<ExportData>> {
        let mut request = request.clone();
        if !request.get(ExportCollection::Requests).is_skip()
            && request.get(ExportCollection::Projects).is_skip()
        {
            request = request.with(ExportCollection::Projects, ExportSelection::All);
        }

        let mut result = Vec::new();
        for (collection, selection) in request.selected() {
            let data = match collection {
                ExportCollection::ClientCertificates => {
                    ExportData::Certificates(self.certificates(selection).await?)
                }
                _ => ExportData::Documents {
                    collection,
                    docs: self.documents(collection, selection).await?,
                },
            };
            result.push(data);
        }

        let referenced = self.referenced_certificates(&result).await?;
        if !referenced.is_empty() {
            tracing::debug!(
                certificates = referenced.len(),
                "Joined certificates referenced by requests"
            );
            result.push(ExportData::Certificates(referenced));
        }

        Ok(result)
    }

    async fn documents(
        &self,
        collection: ExportCollection,
        selection: &ExportSelection,
    ) -> Result<Vec<Document>> {
        match selection {
            ExportSelection::Skip => Ok(Vec::new()),
            ExportSelection::Items(items) => Ok(items.clone()),
            ExportSelection::All => {
                read_all(
                    self.store.as_ref(),
                    Collection::for_export(collection),
                    self.page_size,
                )
                .await
            }
        }
    }

    async fn certificates(&self, selection: &ExportSelection) -> Result<Vec<CertificatePair>> {
        match selection {
            ExportSelection::Skip => Ok(Vec::new()),
            ExportSelection::Items(items) => {
                let mut pairs = Vec::with_capacity(items.len());
                for index in items {
                    if let Some(pair) = self.pair_for_index(index.clone()).await? {
                        pairs.push(pair);
                    }
                }
                Ok(pairs)
            }
            ExportSelection::All => {
                let (index, data) = futures::try_join!(
                    read_all(
                        self.store.as_ref(),
                        Collection::ClientCertificates,
                        self.page_size
                    ),
                    read_all(
                        self.store.as_ref(),
                        Collection::ClientCertificatesData,
                        self.page_size
                    )
                )?;
                Ok(pair_certificates(index, data))
            }
        }
    }

    async fn pair_for_index(&self, index: Document) -> Result<Option<CertificatePair>> {
        let data_key = index.str_field("dataKey").unwrap_or(&index.id).to_string();
        let data = self
            .store
            .get(Collection::ClientCertificatesData, &data_key)
            .await?;
        if data.is_none() {
            tracing::warn!(id = %index.id, "Certificate without data record skipped");
        }
        Ok(data.map(|data| CertificatePair { index, data }))
    }

    /// Certificates referenced from exported requests and history but not exported yet
    async fn referenced_certificates(&self, data: &[ExportData]) -> Result<Vec<CertificatePair>> {
        let mut exported: HashSet<String> = HashSet::new();
        let mut wanted: Vec<String> = Vec::new();

        for entry in data {
            match entry {
                ExportData::Certificates(pairs) => {
                    exported.extend(pairs.iter().map(|p| p.index.id.clone()));
                }
                ExportData::Documents { collection, docs }
                    if matches!(
                        collection,
                        ExportCollection::Requests | ExportCollection::History
                    ) =>
                {
                    for doc in docs {
                        let request = ExportRequest::from_json(&doc.body, kinds::REQUEST);
                        for id in request.client_certificate_ids() {
                            if !wanted.iter().any(|w| w == id) {
                                wanted.push(id.to_string());
                            }
                        }
                    }
                }
                ExportData::Documents { .. } => {}
            }
        }

        let mut pairs = Vec::new();
        for id in wanted.into_iter().filter(|id| !exported.contains(id)) {
            match self.store.get(Collection::ClientCertificates, &id).await? {
                Some(index) => {
                    if let Some(pair) = self.pair_for_index(index).await? {
                        pairs.push(pair);
                    }
                }
                None => tracing::debug!(id = %id, "Referenced certificate not found"),
            }
        }
        Ok(pairs)
    }
}

/// Pair index records with data records by `dataKey`, dropping unpaired index records
pub fn pair_certificates(index: Vec<Document>, data: Vec<Document>) -> Vec<CertificatePair> {
    let mut data_by_id: HashMap<String, Document> =
        data.into_iter().map(|doc| (doc.id.clone(), doc)).collect();

    index
        .into_iter()
        .filter_map(|index| {
            let data_key = index.str_field("dataKey").unwrap_or(&index.id).to_string();
            match data_by_id.remove(&data_key) {
                Some(data) => Some(CertificatePair { index, data }),
                None => {
                    tracing::warn!(id = %index.id, "Certificate without data record skipped");
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryStore;
    use serde_json::{json, Value};

    fn doc(id: &str, body: Value) -> Document {
        Document::new(id, body.as_object().cloned().unwrap())
    }

    async fn seeded() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .bulk_write(
                Collection::SavedRequests,
                vec![
                    doc("r1", json!({"url": "http://a", "method": "GET"})),
                    doc("r2", json!({"url": "http://b", "authorization": [
                        {"type": "client certificate", "enabled": true, "config": {"id": "c2"}}
                    ]})),
                ],
            )
            .await
            .unwrap();
        store
            .bulk_write(
                Collection::Projects,
                vec![doc("p1", json!({"name": "P", "requests": ["r1"]}))],
            )
            .await
            .unwrap();
        store
            .bulk_write(
                Collection::ClientCertificates,
                vec![
                    doc("c1", json!({"name": "one", "type": "pem", "dataKey": "c1"})),
                    doc("c2", json!({"name": "two", "type": "p12", "dataKey": "c2"})),
                    doc("c3", json!({"name": "orphan", "type": "pem", "dataKey": "gone"})),
                ],
            )
            .await
            .unwrap();
        store
            .bulk_write(
                Collection::ClientCertificatesData,
                vec![
                    doc("c1", json!({"cert": {"data": "one"}})),
                    doc("c2", json!({"cert": {"data": "two"}})),
                ],
            )
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_request_map() {
        let map = ExportRequestMap::new()
            .with(ExportCollection::Cookies, true.into())
            .with(ExportCollection::History, ExportSelection::Skip);
        assert_eq!(map.get(ExportCollection::Cookies), &ExportSelection::All);
        assert!(map.get(ExportCollection::History).is_skip());
        assert_eq!(map.selected().count(), 1);
        assert_eq!(ExportRequestMap::all().selected().count(), 10);
    }

    #[test]
    fn test_pair_certificates_drops_unpaired() {
        let pairs = pair_certificates(
            vec![
                doc("a", json!({"dataKey": "da"})),
                doc("b", json!({"dataKey": "db"})),
            ],
            vec![doc("da", json!({"cert": {"data": "x"}}))],
        );
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].index.id, "a");
        assert_eq!(pairs[0].data.id, "da");
    }

    #[tokio::test]
    async fn test_saved_pulls_projects_and_certificates() {
        let store = seeded().await;
        let factory = ExportFactory::new(store).with_page_size(10);

        let data = factory
            .get_export_data(&ExportRequestMap::collections([ExportCollection::Requests]))
            .await
            .unwrap();

        assert_eq!(data.len(), 3);
        assert!(matches!(
            &data[0],
            ExportData::Documents {
                collection: ExportCollection::Requests,
                docs,
            } if docs.len() == 2
        ));
        assert!(matches!(
            &data[1],
            ExportData::Documents {
                collection: ExportCollection::Projects,
                docs,
            } if docs.len() == 1
        ));
        match &data[2] {
            ExportData::Certificates(pairs) => {
                assert_eq!(pairs.len(), 1);
                assert_eq!(pairs[0].index.id, "c2");
            }
            other => panic!("unexpected entry: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_referenced_certificate_not_duplicated() {
        let store = seeded().await;
        let factory = ExportFactory::new(store);

        let data = factory
            .get_export_data(&ExportRequestMap::collections([
                ExportCollection::Requests,
                ExportCollection::ClientCertificates,
            ]))
            .await
            .unwrap();

        let certificate_entries: Vec<&ExportData> = data
            .iter()
            .filter(|d| matches!(d, ExportData::Certificates(_)))
            .collect();
        assert_eq!(certificate_entries.len(), 1);
        assert_eq!(certificate_entries[0].len(), 2);
    }

    #[tokio::test]
    async fn test_items_used_as_given() {
        let store = seeded().await;
        let factory = ExportFactory::new(store);
        let items = vec![doc("x", json!({"name": "given"}))];

        let data = factory
            .get_export_data(
                &ExportRequestMap::new()
                    .with(ExportCollection::Projects, ExportSelection::Items(items.clone())),
            )
            .await
            .unwrap();

        assert_eq!(
            data,
            vec![ExportData::Documents {
                collection: ExportCollection::Projects,
                docs: items
            }]
        );
    }
}
