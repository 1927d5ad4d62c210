//! Oldest application schema
//!
//! Two shapes exist: a bare request object, and an object with `projects`
//! and `requests` arrays where each request names its project through a
//! `project` field holding the project's old identifier.

use crate::core::transform::classify::is_single_request;
use crate::core::transform::linking::link_requests_and_projects;
use crate::core::transform::{TransformOptions, UNKNOWN_VERSION};
use crate::domain::export::{
    kinds, new_key, ExportObject, ExportProject, ExportRequest, DEFAULT_REQUEST_NAME,
};
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use serde_json::Value;
use std::collections::HashMap;

/// Fields of the oldest schema that have no canonical equivalent
const LEGACY_FIELDS: &[&str] = &["id", "project", "time", "type"];

/// Transform the oldest schema
pub async fn transform(raw: &Value, _options: &TransformOptions) -> Result<ExportObject> {
    let obj = raw.as_object().ok_or_else(|| {
        ArcportError::UnknownFormat("Legacy export must be a JSON object".to_string())
    })?;

    let mut export = ExportObject::new(UNKNOWN_VERSION, kinds::IMPORT);

    if is_single_request(obj) {
        export.requests = Some(vec![saved_request(obj)]);
        export.projects = Some(Vec::new());
        return Ok(export);
    }

    // Old project id -> new key; lives only for this call
    let mut project_keys: HashMap<String, String> = HashMap::new();
    let mut projects: Vec<ExportProject> = Vec::new();

    for item in fields::array(obj, "projects").iter().filter_map(Value::as_object) {
        let key = new_key();
        if let Some(old_id) = legacy_id(item) {
            project_keys.insert(old_id, key.clone());
        }

        let mut project = ExportProject::from_json(item);
        project.key = key;
        project.requests.clear();
        if let Some(time) = legacy_time(item) {
            project.created = time;
            project.updated = time;
        }
        project.extra = fields::without(&project.extra, LEGACY_FIELDS);
        projects.push(project);
    }

    let mut requests: Vec<ExportRequest> = Vec::new();
    let mut history: Vec<ExportRequest> = Vec::new();

    for item in fields::array(obj, "requests").iter().filter_map(Value::as_object) {
        if fields::string(item, "type").as_deref() == Some("history") {
            history.push(history_request(item));
            continue;
        }

        let mut request = saved_request(item);
        let project = item
            .get("project")
            .and_then(fields::value_as_id)
            .and_then(|old_id| project_keys.get(&old_id));
        match project {
            Some(project_key) => request.projects = vec![project_key.clone()],
            None => request.projects.clear(),
        }
        requests.push(request);
    }

    for item in fields::array(obj, "history").iter().filter_map(Value::as_object) {
        history.push(history_request(item));
    }

    link_requests_and_projects(&mut requests, &mut projects);

    tracing::debug!(
        requests = requests.len(),
        projects = projects.len(),
        history = history.len(),
        "Transformed legacy export"
    );

    export.requests = Some(requests);
    export.projects = Some(projects);
    if !history.is_empty() {
        export.history = Some(history);
    }
    Ok(export)
}

fn saved_request(item: &JsonObject) -> ExportRequest {
    let mut request = base_request(item, kinds::REQUEST);
    if request.name.as_deref().map_or(true, str::is_empty) {
        request.name = Some(DEFAULT_REQUEST_NAME.to_string());
    }
    request
}

fn history_request(item: &JsonObject) -> ExportRequest {
    let mut request = base_request(item, kinds::HISTORY);
    request.name = None;
    request.projects.clear();
    request
}

fn base_request(item: &JsonObject, kind: &str) -> ExportRequest {
    let mut request = ExportRequest::from_json(item, kind);
    request.key = new_key();
    if !item.contains_key("created") && !item.contains_key("updated") {
        if let Some(time) = legacy_time(item) {
            request.created = time;
            request.updated = time;
        }
    }
    request.extra = fields::without(&request.extra, LEGACY_FIELDS);
    request
}

fn legacy_id(item: &JsonObject) -> Option<String> {
    item.get("_id")
        .and_then(fields::value_as_id)
        .or_else(|| item.get("id").and_then(fields::value_as_id))
}

fn legacy_time(item: &JsonObject) -> Option<i64> {
    fields::timestamp(item, "time")
}
