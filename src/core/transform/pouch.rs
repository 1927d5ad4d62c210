//! Previous document-store schema
//!
//! Files from these versions are already close to the canonical shape but
//! carry storage metadata (`_id`, `_rev`), may use hyphenated collection
//! names, and link requests to projects through a single `legacyProject`
//! back-reference instead of key lists.

use crate::core::transform::linking::link_requests_and_projects;
use crate::core::transform::{TransformOptions, UNKNOWN_VERSION};
use crate::domain::export::{
    kinds, new_key, ExportClientCertificate, ExportCollection, ExportEntity, ExportObject,
    ExportProject, ExportRequest, ExportVariable,
};
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Transform the previous document-store schema
pub async fn transform(raw: &Value, options: &TransformOptions) -> Result<ExportObject> {
    let obj = raw.as_object().ok_or_else(|| {
        ArcportError::UnknownFormat("Data export must be a JSON object".to_string())
    })?;

    let load_to_workspace =
        options.load_to_workspace || fields::boolean(obj, "loadToWorkspace").unwrap_or(false);
    let kind = if load_to_workspace {
        fields::non_empty_string(obj, "kind").unwrap_or_else(|| kinds::IMPORT.to_string())
    } else {
        kinds::IMPORT.to_string()
    };

    let mut export = ExportObject::new(
        fields::non_empty_string(obj, "version").unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        kind,
    );
    if load_to_workspace {
        export.load_to_workspace = Some(true);
    }

    let projects = objects(obj, ExportCollection::Projects).map(|items| {
        items
            .map(|item| {
                let mut project = ExportProject::from_json(item);
                ensure_key(&mut project.key);
                project
            })
            .collect::<Vec<_>>()
    });

    // Any identifier a request may use for its project -> project key
    let mut project_refs: HashMap<String, String> = HashMap::new();
    if let (Some(projects), Some(items)) = (
        projects.as_ref(),
        objects(obj, ExportCollection::Projects),
    ) {
        for (project, item) in projects.iter().zip(items) {
            project_refs.insert(project.key.clone(), project.key.clone());
            for field in ["_referenceId", "_id"] {
                if let Some(old_id) = fields::non_empty_string(item, field) {
                    project_refs.entry(old_id).or_insert_with(|| project.key.clone());
                }
            }
        }
    }

    let mut requests = objects(obj, ExportCollection::Requests).map(|items| {
        items
            .map(|item| {
                let mut request = ExportRequest::from_json(item, kinds::REQUEST);
                ensure_key(&mut request.key);
                normalize_times(&mut request, item);
                if let Some(project_key) = fields::non_empty_string(item, "legacyProject")
                    .and_then(|id| project_refs.get(&id))
                {
                    request.add_project(project_key);
                }
                request
            })
            .collect::<Vec<_>>()
    })
    .map(|requests| unique_by_key(requests, |r| r.key.as_str()));
    let mut projects = projects.map(|projects| unique_by_key(projects, |p| p.key.as_str()));

    match (requests.as_mut(), projects.as_mut()) {
        (Some(requests), Some(projects)) => link_requests_and_projects(requests, projects),
        (Some(requests), None) => link_requests_and_projects(requests, &mut []),
        (None, Some(projects)) => link_requests_and_projects(&mut [], projects),
        (None, None) => {}
    }

    export.history = objects(obj, ExportCollection::History).map(|items| {
        items
            .map(|item| {
                let mut request = ExportRequest::from_json(item, kinds::HISTORY);
                ensure_key(&mut request.key);
                normalize_times(&mut request, item);
                request.projects.clear();
                request.name = None;
                request
            })
            .collect::<Vec<_>>()
    })
    .map(|history| unique_by_key(history, |r| r.key.as_str()));

    export.variables = objects(obj, ExportCollection::Variables).map(|items| {
        items
            .map(|item| {
                let mut variable = ExportVariable::from_json(item);
                ensure_key(&mut variable.key);
                variable
            })
            .collect::<Vec<_>>()
    })
    .map(|variables| unique_by_key(variables, |v| v.key.as_str()));

    export.client_certificates = objects(obj, ExportCollection::ClientCertificates).map(|items| {
        items
            .filter_map(ExportClientCertificate::from_json)
            .map(|mut cert| {
                ensure_key(&mut cert.key);
                cert
            })
            .collect::<Vec<_>>()
    })
    .map(|certs| unique_by_key(certs, |c| c.key.as_str()));

    for collection in [
        ExportCollection::UrlHistory,
        ExportCollection::WebsocketUrlHistory,
        ExportCollection::AuthData,
        ExportCollection::HostRules,
        ExportCollection::Cookies,
    ] {
        let entities = objects(obj, collection).map(|items| {
            items
                .map(|item| {
                    let mut entity = ExportEntity::from_json(item, collection.entity_kind());
                    ensure_key(&mut entity.key);
                    entity
                })
                .collect::<Vec<_>>()
        })
        .map(|entities| unique_by_key(entities, |e| e.key.as_str()));
        if let Some(slot) = export.entities_mut(collection) {
            *slot = entities;
        }
    }

    export.requests = requests;
    export.projects = projects;

    tracing::debug!(
        collections = ?export.collection_counts(),
        kind = %export.kind,
        "Transformed data export"
    );
    Ok(export)
}

/// Objects of a collection; `None` when the collection is absent
fn objects(
    obj: &JsonObject,
    collection: ExportCollection,
) -> Option<impl Iterator<Item = &JsonObject>> {
    collection
        .find_in(obj)
        .map(|items| items.iter().filter_map(Value::as_object))
}

/// Keeps the first entity of each key
fn unique_by_key<T>(items: Vec<T>, key: impl Fn(&T) -> &str) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item).to_string()))
        .collect()
}

fn ensure_key(key: &mut String) {
    if key.is_empty() {
        *key = new_key();
    }
}

/// `updated` defaults to now and `created` to `updated`
fn normalize_times(request: &mut ExportRequest, item: &JsonObject) {
    if fields::timestamp(item, "updated").is_none() {
        request.updated = fields::now_millis();
        if fields::timestamp(item, "created").is_none() {
            request.created = request.updated;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "createdAt": "2019-02-02T21:58:33.000Z",
            "version": "13.0.0",
            "kind": "ARC#AllDataExport",
            "requests": [
                {"_id": "r1", "_rev": "1-a", "name": "One", "url": "http://one",
                 "method": "GET", "legacyProject": "old-p1", "created": 100, "updated": 200},
                {"key": "r2", "name": "Two", "url": "http://two", "projects": ["p2"]},
                {"name": "Three"}
            ],
            "projects": [
                {"_id": "p1", "_referenceId": "old-p1", "name": "P1", "requests": []},
                {"key": "p2", "name": "P2"}
            ],
            "history": [{"_id": "h1", "url": "http://h", "method": "POST", "created": 5}],
            "url-history": [{"_id": "http://one", "cnt": 3}],
            "urlHistory": [{"key": "http://camel", "cnt": 1}],
            "websocket-url-history": [{"_id": "ws://a"}],
            "auth-data": [{"_id": "basic/http://one", "username": "u"}],
            "variables": [{"_id": "v1", "variable": "host", "value": "a", "environment": "prod"}],
            "client-certificates": [
                {"_id": "c1", "name": "Cert", "type": "pem", "created": "2019-02-02T21:58:33.000Z",
                 "cert": {"data": "-----BEGIN-----"}, "pKey": {"data": "key", "passphrase": "p"}},
                {"_id": "c2", "name": "No material"}
            ],
            "cookies": [{"_id": "ck1", "name": "sid", "value": "x", "domain": "a.com"}]
        })
    }

    #[tokio::test]
    async fn test_collections_and_keys() {
        let export = transform(&sample(), &TransformOptions::default()).await.unwrap();

        assert_eq!(export.kind, kinds::IMPORT);
        assert_eq!(export.version, "13.0.0");
        assert!(export.load_to_workspace.is_none());

        let requests = export.requests.as_ref().unwrap();
        assert_eq!(requests[0].key, "r1");
        assert_eq!(requests[0].created, 100);
        assert_eq!(requests[0].updated, 200);
        assert!(!requests[2].key.is_empty());
        assert!(!requests[0].extra.contains_key("legacyProject"));
        assert!(!requests[0].extra.contains_key("_rev"));

        let url_history = export.url_history.as_ref().unwrap();
        assert_eq!(url_history.len(), 1);
        assert_eq!(url_history[0].key, "http://camel");

        assert_eq!(export.websocket_url_history.as_ref().unwrap().len(), 1);
        assert_eq!(export.auth_data.as_ref().unwrap()[0].key, "basic/http://one");
        assert_eq!(export.cookies.as_ref().unwrap()[0].kind, kinds::COOKIE);
        assert!(export.host_rules.is_none());

        let variables = export.variables.as_ref().unwrap();
        assert_eq!(variables[0].name, "host");
        assert_eq!(variables[0].environment, "prod");
    }

    #[tokio::test]
    async fn test_relinks_projects() {
        let export = transform(&sample(), &TransformOptions::default()).await.unwrap();
        let requests = export.requests.unwrap();
        let projects = export.projects.unwrap();

        assert_eq!(projects[0].key, "p1");
        assert_eq!(projects[0].requests, vec!["r1"]);
        assert_eq!(projects[1].requests, vec!["r2"]);
        assert_eq!(requests[0].projects, vec!["p1"]);
        assert_eq!(requests[1].projects, vec!["p2"]);
        assert!(requests[2].projects.is_empty());
        assert!(!projects[0].extra.contains_key("_referenceId"));
    }

    #[tokio::test]
    async fn test_certificates_normalized() {
        let export = transform(&sample(), &TransformOptions::default()).await.unwrap();
        let certs = export.client_certificates.unwrap();

        assert_eq!(certs.len(), 1);
        assert_eq!(certs[0].key, "c1");
        assert_eq!(certs[0].cert_type, "pem");
        assert_eq!(certs[0].created, 1_549_144_713_000);
        assert_eq!(certs[0].p_key.as_ref().unwrap().passphrase.as_deref(), Some("p"));
    }

    #[tokio::test]
    async fn test_load_to_workspace_keeps_kind() {
        let mut raw = sample();
        raw["loadToWorkspace"] = json!(true);

        let export = transform(&raw, &TransformOptions::default()).await.unwrap();
        assert_eq!(export.kind, kinds::ALL_DATA_EXPORT);
        assert_eq!(export.load_to_workspace, Some(true));
    }

    #[tokio::test]
    async fn test_duplicate_keys_keep_first() {
        let raw = json!({
            "kind": "ARC#SavedExport",
            "requests": [
                {"key": "r1", "url": "http://a"},
                {"key": "r1", "url": "http://b"},
                {"key": "r2", "url": "http://c"}
            ],
            "history": [{"_id": "h1", "url": "http://h"}, {"_id": "h1", "url": "http://x"}]
        });

        let export = transform(&raw, &TransformOptions::default()).await.unwrap();
        let requests = export.requests.unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "http://a");
        assert_eq!(requests[1].key, "r2");

        let history = export.history.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].url, "http://h");
    }

    #[tokio::test]
    async fn test_history_name_dropped() {
        let raw = json!({
            "kind": "ARC#HistoryDataExport",
            "history": [{"_id": "h1", "name": "Named", "url": "http://h"}]
        });

        let export = transform(&raw, &TransformOptions::default()).await.unwrap();
        let history = export.history.unwrap();
        assert_eq!(history[0].key, "h1");
        assert!(history[0].name.is_none());
        assert!(!history[0].extra.contains_key("name"));
    }

    #[tokio::test]
    async fn test_missing_updated_defaults_to_now() {
        let raw = json!({"kind": "ARC#SavedExport", "requests": [{"key": "a", "created": 10}]});
        let before = fields::now_millis();

        let export = transform(&raw, &TransformOptions::default()).await.unwrap();
        let request = &export.requests.unwrap()[0];
        assert!(request.updated >= before);
        assert_eq!(request.created, 10);
        assert!(export.projects.is_none());
    }
}
