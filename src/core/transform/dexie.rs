//! Intermediate per-object-store schema
//!
//! Each request record carries its content as an embedded HAR log and a
//! `type` of `saved`, `drive` or `history`. Projects list the identifiers of
//! the requests they own. Records are processed in chunks with a cooperative
//! yield between chunks so large files don't starve other tasks.

use crate::core::transform::linking::link_requests_and_projects;
use crate::core::transform::{TransformOptions, UNKNOWN_VERSION};
use crate::domain::export::{
    kinds, new_key, ExportObject, ExportProject, ExportRequest, DEFAULT_REQUEST_NAME,
};
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::HashSet;
use url::form_urlencoded;

/// Content of one HAR entry
#[derive(Debug, Default, PartialEq)]
struct HarContent {
    method: Option<String>,
    url: Option<String>,
    headers: String,
    payload: String,
    started: Option<i64>,
}

/// Transform the intermediate schema
pub async fn transform(raw: &Value, options: &TransformOptions) -> Result<ExportObject> {
    let obj = raw.as_object().ok_or_else(|| {
        ArcportError::UnknownFormat("Requests data export must be a JSON object".to_string())
    })?;

    let records: Vec<&JsonObject> = fields::array(obj, "requests")
        .iter()
        .filter_map(Value::as_object)
        .collect();

    let mut saved: Vec<ExportRequest> = Vec::new();
    let mut history: Vec<ExportRequest> = Vec::new();
    let mut history_keys: HashSet<String> = HashSet::new();
    let chunk_size = options.chunk_size.max(1);

    for (index, chunk) in records.chunks(chunk_size).enumerate() {
        if index > 0 {
            tokio::task::yield_now().await;
        }

        for record in chunk {
            if fields::string(record, "type").as_deref() == Some("history") {
                let item = history_item(record);
                if history_keys.insert(item.key.clone()) {
                    history.push(item);
                }
            } else {
                saved.push(saved_item(record, options.har_reference_entry));
            }
        }
    }

    let mut projects: Vec<ExportProject> = fields::array(obj, "projects")
        .iter()
        .filter_map(Value::as_object)
        .map(project_item)
        .collect();

    link_requests_and_projects(&mut saved, &mut projects);

    tracing::debug!(
        saved = saved.len(),
        history = history.len(),
        duplicates = records.len() - saved.len() - history.len(),
        projects = projects.len(),
        "Transformed requests data export"
    );

    let mut export = ExportObject::new(
        fields::non_empty_string(obj, "version").unwrap_or_else(|| UNKNOWN_VERSION.to_string()),
        kinds::IMPORT,
    );
    export.requests = Some(saved);
    export.projects = Some(projects);
    export.history = Some(history);
    Ok(export)
}

fn saved_item(record: &JsonObject, reference_entry: usize) -> ExportRequest {
    let key = record_id(record).unwrap_or_else(new_key);
    let mut request = ExportRequest::new(key, kinds::REQUEST);

    let entries = har_entries(record);
    let index = fields::integer(record, "referenceEntry")
        .and_then(|i| usize::try_from(i).ok())
        .unwrap_or(reference_entry);
    let entry = entries.get(index).or_else(|| entries.last());
    apply_content(&mut request, record, entry.map(har_content));

    request.name = Some(
        fields::non_empty_string(record, "name")
            .unwrap_or_else(|| DEFAULT_REQUEST_NAME.to_string()),
    );
    request.description = fields::string(record, "description");
    request.drive_id = fields::non_empty_string(record, "driveId");
    request
}

fn history_item(record: &JsonObject) -> ExportRequest {
    let mut request = ExportRequest::new(String::new(), kinds::HISTORY);
    let entries = har_entries(record);
    apply_content(&mut request, record, entries.last().map(har_content));
    request.key = history_key(request.created, &request.url, &request.method);
    request
}

fn apply_content(request: &mut ExportRequest, record: &JsonObject, content: Option<HarContent>) {
    let content = content.unwrap_or_default();
    if let Some(method) = content.method {
        request.method = method;
    }
    if let Some(url) = content.url {
        request.url = url;
    }
    request.headers = content.headers;
    request.payload = content.payload;

    let created = content
        .started
        .or_else(|| fields::timestamp(record, "created"))
        .or_else(|| fields::timestamp(record, "time"));
    if let Some(created) = created {
        request.created = created;
    }
    request.updated = fields::timestamp(record, "updated").unwrap_or(request.created);
}

fn project_item(record: &JsonObject) -> ExportProject {
    let key = record_id(record).unwrap_or_else(new_key);
    let mut project = ExportProject::from_json(record);
    project.key = key;

    let owned = if record.contains_key("requestIds") {
        fields::string_list(record, "requestIds")
    } else {
        fields::string_list(record, "requests")
    };
    project.requests = owned;
    project.extra = fields::without(&project.extra, &["id", "requestIds"]);
    project
}

fn record_id(record: &JsonObject) -> Option<String> {
    record
        .get("id")
        .and_then(fields::value_as_id)
        .or_else(|| fields::non_empty_string(record, "key"))
}

fn har_entries(record: &JsonObject) -> &[Value] {
    fields::object(record, "har")
        .and_then(|har| fields::object(har, "log"))
        .map(|log| fields::array(log, "entries"))
        .unwrap_or(&[])
}

fn har_content(entry: &Value) -> HarContent {
    let Some(entry) = entry.as_object() else {
        return HarContent::default();
    };
    let Some(request) = fields::object(entry, "request") else {
        return HarContent {
            started: started_at(entry),
            ..Default::default()
        };
    };

    let headers = match request.get("headers") {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_object)
            .filter_map(|h| {
                let name = fields::non_empty_string(h, "name")?;
                let value = fields::string(h, "value").unwrap_or_default();
                Some(format!("{name}: {value}"))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::String(s)) => s.clone(),
        _ => String::new(),
    };

    HarContent {
        method: fields::non_empty_string(request, "method"),
        url: fields::non_empty_string(request, "url"),
        headers,
        payload: fields::object(request, "postData")
            .and_then(|data| fields::text(data, "text"))
            .unwrap_or_default(),
        started: started_at(entry),
    }
}

fn started_at(entry: &JsonObject) -> Option<i64> {
    fields::timestamp(entry, "startedDateTime")
}

/// Key of a history item: the day, URL and method it was captured with
///
/// Captures of the same URL and method on the same UTC day collide.
pub fn history_key(created: i64, url: &str, method: &str) -> String {
    let midnight = DateTime::<Utc>::from_timestamp_millis(created)
        .and_then(|dt| dt.date_naive().and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(created);
    let encoded: String = form_urlencoded::byte_serialize(url.to_lowercase().as_bytes()).collect();
    format!("{midnight}/{encoded}/{}", method.to_lowercase())
}
