//! Foreign-tool collections, data dumps and environments
//!
//! Collections become projects: the collection itself is the root project
//! and every folder (nested folders included) becomes a project of its own.
//! Requests belong to the project of the folder that contains them.
//! `{{name}}` variable references are rewritten to `${name}`.

use crate::core::transform::linking::link_requests_and_projects;
use crate::core::transform::{TransformOptions, UNKNOWN_VERSION};
use crate::domain::export::{
    kinds, new_key, ExportObject, ExportProject, ExportRequest, ExportVariable,
    DEFAULT_ENVIRONMENT, DEFAULT_PROJECT_NAME, DEFAULT_REQUEST_NAME,
};
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use regex::Regex;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::OnceLock;

fn variable_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\{\{\s*([^{}\s]+)\s*\}\}").expect("variable reference pattern is valid")
    })
}

/// Rewrite `{{name}}` references to `${name}`
pub fn rewrite_variables(input: &str) -> String {
    variable_pattern().replace_all(input, "$${$1}").into_owned()
}

/// Requests and projects of one collection, with a lazily created root project
struct CollectionBuilder {
    root_name: String,
    root_description: Option<String>,
    root_key: Option<String>,
    projects: Vec<ExportProject>,
    requests: Vec<ExportRequest>,
}

impl CollectionBuilder {
    fn new(root_name: Option<String>, root_description: Option<String>) -> Self {
        Self {
            root_name: root_name.unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            root_description,
            root_key: None,
            projects: Vec::new(),
            requests: Vec::new(),
        }
    }

    fn root_key(&mut self) -> String {
        if let Some(key) = &self.root_key {
            return key.clone();
        }
        let key = new_key();
        let mut project = ExportProject::new(key.clone(), self.root_name.clone());
        project.description = self.root_description.clone();
        self.projects.insert(0, project);
        self.root_key = Some(key.clone());
        key
    }

    fn add_project(&mut self, name: Option<String>, description: Option<String>) -> String {
        let key = new_key();
        let mut project = ExportProject::new(
            key.clone(),
            name.unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
        );
        project.description = description;
        self.projects.push(project);
        key
    }

    fn add_request(&mut self, mut request: ExportRequest, project_key: String) {
        request.projects = vec![project_key];
        self.requests.push(request);
    }

    fn finish(mut self) -> (Vec<ExportRequest>, Vec<ExportProject>) {
        for (order, project) in self.projects.iter_mut().enumerate() {
            project.order = i64::try_from(order).unwrap_or(i64::MAX);
        }
        link_requests_and_projects(&mut self.requests, &mut self.projects);
        (self.requests, self.projects)
    }
}

/// Transform a v1 collection (`folders` + `requests`)
pub async fn transform_v1(raw: &Value, _options: &TransformOptions) -> Result<ExportObject> {
    let obj = object(raw)?;
    let (requests, projects) = v1_collection(obj);

    let mut export = ExportObject::new(UNKNOWN_VERSION, kinds::IMPORT);
    export.requests = Some(requests);
    export.projects = Some(projects);
    Ok(export)
}

/// Transform a v2.0 or v2.1 collection (`info` + nested `item`)
pub async fn transform_v2(raw: &Value, _options: &TransformOptions) -> Result<ExportObject> {
    let obj = object(raw)?;
    let info = fields::object(obj, "info");
    let name = info.and_then(|i| fields::non_empty_string(i, "name"));

    let mut builder = CollectionBuilder::new(name.clone(), info.and_then(description));

    // Breadth-first walk: (items, owning folder project)
    let mut pending: VecDeque<(&[Value], Option<String>)> = VecDeque::new();
    pending.push_back((fields::array(obj, "item"), None));

    while let Some((items, parent)) = pending.pop_front() {
        for item in items.iter().filter_map(Value::as_object) {
            if let Some(children) = item.get("item").and_then(Value::as_array) {
                let key =
                    builder.add_project(fields::non_empty_string(item, "name"), description(item));
                pending.push_back((children.as_slice(), Some(key)));
                continue;
            }

            let Some(request) = v2_request(item) else {
                continue;
            };
            let project_key = match &parent {
                Some(key) => key.clone(),
                None => builder.root_key(),
            };
            builder.add_request(request, project_key);
        }
    }

    let (requests, projects) = builder.finish();

    let mut export = ExportObject::new(UNKNOWN_VERSION, kinds::IMPORT);
    export.requests = Some(requests);
    export.projects = Some(projects);

    let environment = name.unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    let variables = variables_from(fields::array(obj, "variable"), &environment);
    if !variables.is_empty() {
        export.variables = Some(variables);
    }
    Ok(export)
}

/// Transform a data dump (`version` + `collections`, `environments`, `globals`)
pub async fn transform_backup(raw: &Value, _options: &TransformOptions) -> Result<ExportObject> {
    let obj = object(raw)?;

    let mut requests = Vec::new();
    let mut projects = Vec::new();
    for collection in fields::array(obj, "collections").iter().filter_map(Value::as_object) {
        let (mut collection_requests, mut collection_projects) = v1_collection(collection);
        requests.append(&mut collection_requests);
        projects.append(&mut collection_projects);
    }

    let mut variables = Vec::new();
    for environment in fields::array(obj, "environments").iter().filter_map(Value::as_object) {
        let name = fields::non_empty_string(environment, "name")
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
        variables.extend(variables_from(fields::array(environment, "values"), &name));
    }
    variables.extend(variables_from(fields::array(obj, "globals"), DEFAULT_ENVIRONMENT));

    tracing::debug!(
        requests = requests.len(),
        projects = projects.len(),
        variables = variables.len(),
        "Transformed data dump"
    );

    let mut export = ExportObject::new(UNKNOWN_VERSION, kinds::IMPORT);
    export.requests = Some(requests);
    export.projects = Some(projects);
    if !variables.is_empty() {
        export.variables = Some(variables);
    }
    Ok(export)
}

/// Transform an environment or globals file
pub async fn transform_environment(
    raw: &Value,
    _options: &TransformOptions,
) -> Result<ExportObject> {
    let obj = object(raw)?;

    let scope = fields::string(obj, "_postman_variable_scope");
    let environment = if scope.as_deref() == Some("globals") {
        DEFAULT_ENVIRONMENT.to_string()
    } else {
        fields::non_empty_string(obj, "name").unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
    };

    let mut export = ExportObject::new(UNKNOWN_VERSION, kinds::IMPORT);
    export.variables = Some(variables_from(fields::array(obj, "values"), &environment));
    Ok(export)
}

fn object(raw: &Value) -> Result<&JsonObject> {
    raw.as_object().ok_or_else(|| {
        ArcportError::UnknownFormat("Collection file must be a JSON object".to_string())
    })
}

fn v1_collection(obj: &JsonObject) -> (Vec<ExportRequest>, Vec<ExportProject>) {
    let mut builder =
        CollectionBuilder::new(fields::non_empty_string(obj, "name"), description(obj));

    // Folder id -> project key
    let mut folders: HashMap<String, String> = HashMap::new();
    for folder in fields::array(obj, "folders").iter().filter_map(Value::as_object) {
        let key =
            builder.add_project(fields::non_empty_string(folder, "name"), description(folder));
        if let Some(id) = folder.get("id").and_then(fields::value_as_id) {
            folders.insert(id, key.clone());
        }
        // Folders may also list their requests in `order`
        for request_id in fields::string_list(folder, "order") {
            folders.entry(format!("request:{request_id}")).or_insert_with(|| key.clone());
        }
    }

    for item in fields::array(obj, "requests").iter().filter_map(Value::as_object) {
        let request = v1_request(item);
        let folder_key = item
            .get("folder")
            .and_then(fields::value_as_id)
            .and_then(|id| folders.get(&id))
            .or_else(|| {
                item.get("id")
                    .and_then(fields::value_as_id)
                    .and_then(|id| folders.get(&format!("request:{id}")))
            })
            .cloned();
        let project_key = match folder_key {
            Some(key) => key,
            None => builder.root_key(),
        };
        builder.add_request(request, project_key);
    }

    builder.finish()
}

fn v1_request(item: &JsonObject) -> ExportRequest {
    let mut request = ExportRequest::new(new_key(), kinds::REQUEST);
    request.name = Some(request_name(item));
    request.description = description(item);
    if let Some(method) = fields::non_empty_string(item, "method") {
        request.method = method;
    }
    if let Some(url) = fields::non_empty_string(item, "url") {
        request.url = rewrite_variables(&url);
    }
    let headers = fields::string(item, "headers").unwrap_or_default();
    request.headers = rewrite_variables(&v1_headers(&headers));
    request.payload = rewrite_variables(&v1_payload(item));
    if let Some(time) = fields::timestamp(item, "time") {
        request.created = time;
        request.updated = time;
    }
    request
}

/// Header lines without the ones disabled with a `//` prefix
fn v1_headers(headers: &str) -> String {
    headers
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn v1_payload(item: &JsonObject) -> String {
    match fields::string(item, "dataMode").as_deref() {
        Some("raw") => fields::text(item, "rawModeData").unwrap_or_default(),
        Some("params") | Some("urlencoded") => form_payload(fields::array(item, "data")),
        _ => fields::text(item, "rawModeData").unwrap_or_default(),
    }
}

fn v2_request(item: &JsonObject) -> Option<ExportRequest> {
    let mut request = ExportRequest::new(new_key(), kinds::REQUEST);
    request.name = Some(request_name(item));

    match item.get("request")? {
        Value::String(url) => request.url = rewrite_variables(url),
        Value::Object(spec) => {
            if let Some(method) = fields::non_empty_string(spec, "method") {
                request.method = method;
            }
            if let Some(url) = v2_url(spec.get("url")) {
                request.url = rewrite_variables(&url);
            }
            request.headers = rewrite_variables(&v2_headers(spec.get("header")));
            request.payload = rewrite_variables(&v2_body(fields::object(spec, "body")));
            request.description = description(spec).or_else(|| description(item));
        }
        _ => return None,
    }
    Some(request)
}

fn v2_url(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(url) => fields::non_empty_string(url, "raw"),
        _ => None,
    }
}

fn v2_headers(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(list)) => list
            .iter()
            .filter_map(Value::as_object)
            .filter(|h| !is_disabled(h))
            .filter_map(|h| {
                let name = fields::non_empty_string(h, "key")?;
                let value = fields::string(h, "value").unwrap_or_default();
                Some(format!("{name}: {value}"))
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::String(s)) => v1_headers(s),
        _ => String::new(),
    }
}

fn v2_body(body: Option<&JsonObject>) -> String {
    let Some(body) = body else {
        return String::new();
    };
    match fields::string(body, "mode").as_deref() {
        Some("raw") => fields::text(body, "raw").unwrap_or_default(),
        Some("urlencoded") => form_payload(fields::array(body, "urlencoded")),
        Some("formdata") => form_payload(fields::array(body, "formdata")),
        _ => String::new(),
    }
}

/// `key=value` pairs joined with `&`, skipping disabled and file entries
fn form_payload(params: &[Value]) -> String {
    params
        .iter()
        .filter_map(Value::as_object)
        .filter(|p| !is_disabled(p))
        .filter(|p| fields::string(p, "type").as_deref() != Some("file"))
        .filter_map(|p| {
            let key = fields::non_empty_string(p, "key")?;
            let value = fields::string(p, "value").unwrap_or_default();
            Some(format!("{key}={value}"))
        })
        .collect::<Vec<_>>()
        .join("&")
}

fn variables_from(values: &[Value], environment: &str) -> Vec<ExportVariable> {
    values
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|v| {
            let name = fields::non_empty_string(v, "key")?;
            let value = fields::string(v, "value").unwrap_or_default();
            let mut variable =
                ExportVariable::new(new_key(), environment, name, rewrite_variables(&value));
            variable.enabled = !is_disabled(v);
            Some(variable)
        })
        .collect()
}

fn is_disabled(obj: &JsonObject) -> bool {
    fields::boolean(obj, "disabled").unwrap_or(false)
        || fields::boolean(obj, "enabled") == Some(false)
}

fn request_name(item: &JsonObject) -> String {
    fields::non_empty_string(item, "name").unwrap_or_else(|| DEFAULT_REQUEST_NAME.to_string())
}

/// Description as a string or as `{content}`
fn description(obj: &JsonObject) -> Option<String> {
    match obj.get("description")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(d) => fields::non_empty_string(d, "content"),
        _ => None,
    }
}
