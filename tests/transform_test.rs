//! Integration tests for format classification and the transformers

use arcport::core::transform::{classify, transform, DataFormat, TransformOptions};
use arcport::domain::{kinds, ArcportError, ExportObject};
use serde_json::{json, Value};
use test_case::test_case;

/// Every request/project reference must be mirrored on the other side
fn assert_linked(export: &ExportObject) {
    let requests = export.requests.as_deref().unwrap_or_default();
    let projects = export.projects.as_deref().unwrap_or_default();

    for request in requests {
        for project_key in &request.projects {
            let project = projects
                .iter()
                .find(|p| &p.key == project_key)
                .unwrap_or_else(|| panic!("request {} references missing project", request.key));
            assert!(
                project.requests.contains(&request.key),
                "project {} does not list request {}",
                project.key,
                request.key
            );
        }
    }
    for project in projects {
        for request_key in &project.requests {
            let request = requests
                .iter()
                .find(|r| &r.key == request_key)
                .unwrap_or_else(|| panic!("project {} references missing request", project.key));
            assert!(request.projects.contains(&project.key));
        }
    }
}

fn har_entry(method: &str, url: &str, started: &str) -> Value {
    json!({
        "startedDateTime": started,
        "request": {"method": method, "url": url, "headers": []}
    })
}

#[test_case(json!({"version": 1, "collections": []}), DataFormat::PostmanBackup; "postman dump")]
#[test_case(
    json!({"info": {"schema": "https://schema.getpostman.com/json/collection/v2.0.0/collection.json"}}),
    DataFormat::PostmanV2;
    "postman v2"
)]
#[test_case(
    json!({"info": {"schema": "https://schema.getpostman.com/json/collection/v2.1.0/collection.json"}}),
    DataFormat::PostmanV21;
    "postman v2.1"
)]
#[test_case(json!({"folders": [], "requests": []}), DataFormat::PostmanV1; "postman v1")]
#[test_case(json!({"_postman_variable_scope": "globals"}), DataFormat::PostmanEnvironment; "postman environment")]
#[test_case(json!({"kind": "ARC#AllDataExport", "requests": []}), DataFormat::ArcPouch; "all data export")]
#[test_case(json!({"kind": "ARC#SessionCookies", "cookies": []}), DataFormat::ArcPouch; "session cookies")]
#[test_case(json!({"kind": "ARC#requestsDataExport", "requests": []}), DataFormat::ArcDexie; "requests data export")]
#[test_case(json!({"requests": [], "projects": []}), DataFormat::ArcLegacy; "legacy without kind")]
#[test_case(json!({"headers-sets": []}), DataFormat::ArcLegacy; "legacy headers sets")]
#[test_case(json!({"url": "http://a", "method": "GET", "headers": ""}), DataFormat::ArcLegacy; "single request")]
fn test_classifier(raw: Value, expected: DataFormat) {
    assert_eq!(classify(&raw).unwrap(), expected);
}

#[test_case(json!([]); "array")]
#[test_case(json!("text"); "string")]
#[test_case(json!({"url": "http://a", "method": "GET"}); "request without headers")]
#[test_case(json!({"data": {"items": []}}); "foreign object")]
fn test_classifier_rejects(raw: Value) {
    assert!(matches!(classify(&raw), Err(ArcportError::UnknownFormat(_))));
}

#[tokio::test]
async fn test_single_request_legacy_scenario() {
    let raw = json!({
        "url": "http://api.example.com/items",
        "method": "GET",
        "headers": "Accept: application/json",
        "payload": "",
        "driveId": "X",
        "time": 1_549_144_713_000i64
    });

    let (format, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_eq!(format, DataFormat::ArcLegacy);
    assert_eq!(export.kind, kinds::IMPORT);

    let requests = export.requests.as_ref().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].name.as_deref(), Some("unnamed"));
    assert_eq!(requests[0].drive_id.as_deref(), Some("X"));
    assert_eq!(requests[0].created, 1_549_144_713_000);
    assert!(requests[0].projects.is_empty());
    assert_eq!(export.projects, Some(Vec::new()));
}

#[tokio::test]
async fn test_legacy_linking() {
    let raw = json!({
        "projects": [
            {"_id": "old-1", "name": "One"},
            {"id": 2, "name": "Two"}
        ],
        "requests": [
            {"project": "old-1", "url": "http://a", "method": "GET"},
            {"project": 2, "url": "http://b", "method": "POST"},
            {"url": "http://c", "method": "GET"},
            {"project": "gone", "url": "http://d", "method": "GET"}
        ]
    });

    let (_, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_linked(&export);

    let projects = export.projects.as_ref().unwrap();
    assert_eq!(projects[0].requests.len(), 1);
    assert_eq!(projects[1].requests.len(), 1);
    let requests = export.requests.as_ref().unwrap();
    assert!(requests[2].projects.is_empty());
    assert!(requests[3].projects.is_empty());
}

#[tokio::test]
async fn test_pouch_linking_and_kinds() {
    let raw = json!({
        "kind": "ARC#AllDataExport",
        "createdAt": "2019-02-02T21:58:33.000Z",
        "version": "13.0.0",
        "projects": [
            {"key": "p1", "name": "Project", "requests": ["r2"]},
            {"_id": "p2", "_referenceId": "ref-2", "name": "Referenced"}
        ],
        "requests": [
            {"key": "r1", "name": "one", "url": "http://a", "legacyProject": "p1"},
            {"key": "r2", "name": "two", "url": "http://b"},
            {"key": "r3", "name": "three", "url": "http://c", "legacyProject": "ref-2"}
        ],
        "history": [{"key": "h1", "url": "http://h", "projects": ["p1"]}],
        "url-history": [{"key": "http://a", "cnt": 2}],
        "cookies": [{"key": "c1", "name": "sid", "value": "x", "domain": "a"}]
    });

    let (format, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_eq!(format, DataFormat::ArcPouch);
    assert_eq!(export.kind, kinds::IMPORT);
    assert_eq!(export.version, "13.0.0");
    assert_linked(&export);

    let projects = export.projects.as_ref().unwrap();
    let mut p1_requests = projects[0].requests.clone();
    p1_requests.sort();
    assert_eq!(p1_requests, vec!["r1", "r2"]);
    assert_eq!(projects[1].requests, vec!["r3"]);

    let history = export.history.as_ref().unwrap();
    assert!(history[0].projects.is_empty());
    assert_eq!(history[0].kind, kinds::HISTORY);

    let url_history = export.url_history.as_ref().unwrap();
    assert_eq!(url_history[0].kind, kinds::URL_HISTORY);
    assert_eq!(export.cookies.as_ref().unwrap()[0].kind, kinds::COOKIE);
}

#[tokio::test]
async fn test_pouch_load_to_workspace_keeps_kind() {
    let raw = json!({"kind": "ARC#ProjectExport", "loadToWorkspace": true, "requests": []});

    let (_, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_eq!(export.kind, kinds::PROJECT_EXPORT);
}

#[tokio::test]
async fn test_dexie_history_deduplication() {
    let raw = json!({
        "kind": "ARC#requestsDataExport",
        "requests": [
            {"id": "h1", "type": "history", "har": {"log": {"entries": [
                har_entry("GET", "http://Example.com/a", "2021-03-04T08:00:00.000Z")
            ]}}},
            {"id": "h2", "type": "history", "har": {"log": {"entries": [
                har_entry("get", "http://example.com/a", "2021-03-04T17:30:00.000Z")
            ]}}},
            {"id": "h3", "type": "history", "har": {"log": {"entries": [
                har_entry("GET", "http://example.com/a", "2021-03-05T08:00:00.000Z")
            ]}}}
        ]
    });
    let options = TransformOptions {
        chunk_size: 1,
        ..Default::default()
    };

    let (format, export) = transform(&raw, &options).await.unwrap();
    assert_eq!(format, DataFormat::ArcDexie);
    let history = export.history.unwrap();
    assert_eq!(history.len(), 2);
    assert_ne!(history[0].key, history[1].key);
}

#[tokio::test]
async fn test_dexie_linking() {
    let raw = json!({
        "kind": "ARC#requestsDataExport",
        "requests": [
            {"id": "s1", "type": "saved", "name": "one", "har": {"log": {"entries": [
                har_entry("GET", "http://a", "2021-03-04T08:00:00.000Z")
            ]}}},
            {"id": "s2", "type": "saved", "name": "two", "har": {"log": {"entries": [
                har_entry("POST", "http://b", "2021-03-04T08:00:00.000Z")
            ]}}}
        ],
        "projects": [
            {"id": "p1", "name": "A", "requestIds": ["s1", "s2"]},
            {"id": "p2", "name": "B", "requests": ["s2", "nope"]}
        ]
    });

    let (_, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_linked(&export);
    let requests = export.requests.as_ref().unwrap();
    assert_eq!(requests[1].projects, vec!["p1", "p2"]);
    assert_eq!(export.projects.as_ref().unwrap()[1].requests, vec!["s2"]);
}

#[tokio::test]
async fn test_postman_v1_linking() {
    let raw = json!({
        "id": "c1",
        "name": "API",
        "folders": [
            {"id": "f1", "name": "Users", "order": ["r1", "r2"]},
            {"id": "f2", "name": "Admin", "order": []}
        ],
        "requests": [
            {"id": "r1", "name": "List", "url": "http://a", "method": "GET", "headers": ""},
            {"id": "r2", "name": "Get", "url": "http://a/1", "method": "GET", "headers": ""},
            {"id": "r3", "name": "Stats", "url": "http://s", "method": "GET", "headers": "", "folder": "f2"},
            {"id": "r4", "name": "Root", "url": "http://r", "method": "GET", "headers": ""}
        ]
    });

    let (format, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_eq!(format, DataFormat::PostmanV1);
    assert_linked(&export);
    assert!(export
        .requests
        .as_ref()
        .unwrap()
        .iter()
        .all(|r| r.projects.len() == 1));
}

#[tokio::test]
async fn test_postman_v2_linking_and_variables() {
    let raw = json!({
        "info": {
            "name": "Shop",
            "schema": "https://schema.getpostman.com/json/collection/v2.0.0/collection.json"
        },
        "item": [
            {"name": "Orders", "item": [
                {"name": "Create", "request": {
                    "method": "POST",
                    "url": "{{base}}/orders",
                    "header": [{"key": "Authorization", "value": "Bearer {{ token }}"}]
                }},
                {"name": "Nested", "item": [
                    {"name": "Deep", "request": "{{base}}/deep"}
                ]}
            ]},
            {"name": "Ping", "request": "{{base}}/ping"}
        ],
        "variable": [{"key": "base", "value": "http://localhost"}]
    });

    let (format, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    assert_eq!(format, DataFormat::PostmanV2);
    assert_linked(&export);

    let requests = export.requests.as_ref().unwrap();
    assert_eq!(requests.len(), 3);
    let create = requests.iter().find(|r| r.name.as_deref() == Some("Create")).unwrap();
    assert_eq!(create.url, "${base}/orders");
    assert_eq!(create.headers, "Authorization: Bearer ${token}");

    let variables = export.variables.as_ref().unwrap();
    assert_eq!(variables[0].name, "base");
    assert_eq!(variables[0].environment, "Shop");
}

#[tokio::test]
async fn test_postman_environment() {
    let raw = json!({
        "name": "staging",
        "_postman_variable_scope": "environment",
        "values": [
            {"key": "host", "value": "s.example.com", "enabled": true},
            {"key": "debug", "value": "1", "enabled": false}
        ]
    });

    let (_, export) = transform(&raw, &TransformOptions::default()).await.unwrap();
    let variables = export.variables.unwrap();
    assert_eq!(variables.len(), 2);
    assert!(variables.iter().all(|v| v.environment == "staging"));
    assert!(!variables[1].enabled);
}

#[tokio::test]
async fn test_transform_is_serializable() {
    let raw = json!({"projects": [{"_id": "p", "name": "P"}], "requests": [{"project": "p"}]});
    let (_, export) = transform(&raw, &TransformOptions::default()).await.unwrap();

    let text = export.to_json_string(false).unwrap();
    let back: ExportObject = serde_json::from_str(&text).unwrap();
    assert_eq!(back, export);
}
