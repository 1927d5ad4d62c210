//! Canonical export object
//!
//! The [`ExportObject`] is the single interchange schema shared by every
//! transformer, the import store and the export processor. Its serialized
//! form is the portable data file.
//!
//! Entity constructors named `from_json` are lenient: malformed or missing
//! fields are defaulted, never rejected.

use crate::domain::errors::ArcportError;
use crate::domain::fields::{self, JsonObject};
use crate::domain::Result;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Kind discriminators
pub mod kinds {
    /// Namespace prefix shared by every kind this application produces
    pub const NAMESPACE: &str = "ARC#";

    pub const REQUEST: &str = "ARC#HttpRequest";
    pub const HISTORY: &str = "ARC#HistoryData";
    pub const PROJECT: &str = "ARC#ProjectData";
    pub const URL_HISTORY: &str = "ARC#UrlHistoryData";
    pub const WEBSOCKET_URL_HISTORY: &str = "ARC#WebsocketHistoryData";
    pub const VARIABLE: &str = "ARC#VariableData";
    pub const AUTH_DATA: &str = "ARC#AuthData";
    pub const HOST_RULE: &str = "ARC#HostRule";
    pub const CLIENT_CERTIFICATE: &str = "ARC#ClientCertificate";
    pub const COOKIE: &str = "ARC#Cookie";

    pub const ALL_DATA_EXPORT: &str = "ARC#AllDataExport";
    pub const IMPORT: &str = "ARC#Import";
    pub const PROJECT_EXPORT: &str = "ARC#ProjectExport";
    pub const SAVED_DATA_EXPORT: &str = "ARC#SavedDataExport";
    pub const HISTORY_DATA_EXPORT: &str = "ARC#HistoryDataExport";
    pub const SAVED_HISTORY_DATA_EXPORT: &str = "ARC#SavedHistoryDataExport";
    pub const SAVED_EXPORT: &str = "ARC#SavedExport";
    pub const HISTORY_EXPORT: &str = "ARC#HistoryExport";
    pub const SESSION_COOKIES: &str = "ARC#SessionCookies";
    pub const HOST_RULES: &str = "ARC#HostRules";

    /// Per-object-store export written by the intermediate schema
    pub const REQUESTS_DATA_EXPORT: &str = "ARC#requestsDataExport";
}

/// Named collection of an export object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportCollection {
    Requests,
    Projects,
    History,
    UrlHistory,
    WebsocketUrlHistory,
    Variables,
    AuthData,
    HostRules,
    ClientCertificates,
    Cookies,
}

impl ExportCollection {
    /// All collections, in wire order
    pub const ALL: [ExportCollection; 10] = [
        Self::Requests,
        Self::Projects,
        Self::History,
        Self::UrlHistory,
        Self::WebsocketUrlHistory,
        Self::Variables,
        Self::AuthData,
        Self::HostRules,
        Self::ClientCertificates,
        Self::Cookies,
    ];

    /// Canonical (camelCase) key
    pub fn key(self) -> &'static str {
        match self {
            Self::Requests => "requests",
            Self::Projects => "projects",
            Self::History => "history",
            Self::UrlHistory => "urlHistory",
            Self::WebsocketUrlHistory => "websocketUrlHistory",
            Self::Variables => "variables",
            Self::AuthData => "authData",
            Self::HostRules => "hostRules",
            Self::ClientCertificates => "clientCertificates",
            Self::Cookies => "cookies",
        }
    }

    /// Accepted input keys, highest priority first
    pub fn input_keys(self) -> &'static [&'static str] {
        match self {
            Self::Requests => &["requests"],
            Self::Projects => &["projects"],
            Self::History => &["history"],
            Self::UrlHistory => &["urlHistory", "url-history", "urlhistory"],
            Self::WebsocketUrlHistory => &[
                "websocketUrlHistory",
                "websocket-url-history",
                "websocketurlhistory",
            ],
            Self::Variables => &["variables"],
            Self::AuthData => &["authData", "auth-data", "authdata"],
            Self::HostRules => &["hostRules", "host-rules", "hostrules"],
            Self::ClientCertificates => &[
                "clientCertificates",
                "client-certificates",
                "clientcertificates",
            ],
            Self::Cookies => &["cookies"],
        }
    }

    /// Kind stamped on every entity of this collection
    pub fn entity_kind(self) -> &'static str {
        match self {
            Self::Requests => kinds::REQUEST,
            Self::Projects => kinds::PROJECT,
            Self::History => kinds::HISTORY,
            Self::UrlHistory => kinds::URL_HISTORY,
            Self::WebsocketUrlHistory => kinds::WEBSOCKET_URL_HISTORY,
            Self::Variables => kinds::VARIABLE,
            Self::AuthData => kinds::AUTH_DATA,
            Self::HostRules => kinds::HOST_RULE,
            Self::ClientCertificates => kinds::CLIENT_CERTIFICATE,
            Self::Cookies => kinds::COOKIE,
        }
    }

    /// Resolve any accepted input key
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.input_keys().contains(&key))
    }

    /// Find the collection array in a raw object, camelCase name first
    pub fn find_in(self, obj: &JsonObject) -> Option<&[Value]> {
        self.input_keys()
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .map(Vec::as_slice)
    }
}

impl fmt::Display for ExportCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Generate a fresh entity key
pub fn new_key() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The canonical interchange unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportObject {
    /// ISO-8601 creation timestamp
    pub created_at: String,

    /// Version of the producing application
    pub version: String,

    /// Top-level semantics discriminator
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_to_workspace: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requests: Option<Vec<ExportRequest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<ExportProject>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<ExportRequest>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url_history: Option<Vec<ExportEntity>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub websocket_url_history: Option<Vec<ExportEntity>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<ExportVariable>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_data: Option<Vec<ExportEntity>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_rules: Option<Vec<ExportEntity>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_certificates: Option<Vec<ExportClientCertificate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cookies: Option<Vec<ExportEntity>>,
}

impl ExportObject {
    /// Create an empty export object stamped with the current time
    pub fn new(version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            version: version.into(),
            kind: kind.into(),
            load_to_workspace: None,
            requests: None,
            projects: None,
            history: None,
            url_history: None,
            websocket_url_history: None,
            variables: None,
            auth_data: None,
            host_rules: None,
            client_certificates: None,
            cookies: None,
        }
    }

    /// Number of entities in a collection; `None` when the collection is absent
    pub fn count(&self, collection: ExportCollection) -> Option<usize> {
        match collection {
            ExportCollection::Requests => self.requests.as_ref().map(Vec::len),
            ExportCollection::Projects => self.projects.as_ref().map(Vec::len),
            ExportCollection::History => self.history.as_ref().map(Vec::len),
            ExportCollection::UrlHistory => self.url_history.as_ref().map(Vec::len),
            ExportCollection::WebsocketUrlHistory => {
                self.websocket_url_history.as_ref().map(Vec::len)
            }
            ExportCollection::Variables => self.variables.as_ref().map(Vec::len),
            ExportCollection::AuthData => self.auth_data.as_ref().map(Vec::len),
            ExportCollection::HostRules => self.host_rules.as_ref().map(Vec::len),
            ExportCollection::ClientCertificates => {
                self.client_certificates.as_ref().map(Vec::len)
            }
            ExportCollection::Cookies => self.cookies.as_ref().map(Vec::len),
        }
    }

    /// Counts of every present collection, in wire order
    pub fn collection_counts(&self) -> Vec<(ExportCollection, usize)> {
        ExportCollection::ALL
            .into_iter()
            .filter_map(|c| self.count(c).map(|n| (c, n)))
            .collect()
    }

    /// Whether no collection holds any entity
    pub fn is_empty(&self) -> bool {
        self.collection_counts().iter().all(|(_, n)| *n == 0)
    }

    /// Mutable access to an opaque entity collection
    pub fn entities_mut(
        &mut self,
        collection: ExportCollection,
    ) -> Option<&mut Option<Vec<ExportEntity>>> {
        match collection {
            ExportCollection::UrlHistory => Some(&mut self.url_history),
            ExportCollection::WebsocketUrlHistory => Some(&mut self.websocket_url_history),
            ExportCollection::AuthData => Some(&mut self.auth_data),
            ExportCollection::HostRules => Some(&mut self.host_rules),
            ExportCollection::Cookies => Some(&mut self.cookies),
            _ => None,
        }
    }

    /// Opaque entity collection
    pub fn entities(&self, collection: ExportCollection) -> Option<&[ExportEntity]> {
        let list = match collection {
            ExportCollection::UrlHistory => &self.url_history,
            ExportCollection::WebsocketUrlHistory => &self.websocket_url_history,
            ExportCollection::AuthData => &self.auth_data,
            ExportCollection::HostRules => &self.host_rules,
            ExportCollection::Cookies => &self.cookies,
            _ => return None,
        };
        list.as_deref()
    }

    /// Serialize to the portable file format
    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let out = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(out)
    }
}

/// Authorization method attached to a request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestAuthorization {
    #[serde(rename = "type")]
    pub auth_type: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

/// Authorization type that references a stored client certificate
pub const CLIENT_CERTIFICATE_AUTH: &str = "client certificate";

impl RequestAuthorization {
    fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            auth_type: fields::string(obj, "type")?,
            enabled: fields::boolean(obj, "enabled").unwrap_or(true),
            config: obj.get("config").cloned().unwrap_or(Value::Null),
        })
    }

    /// Identifier of the referenced client certificate, if any
    pub fn client_certificate_id(&self) -> Option<&str> {
        if self.auth_type != CLIENT_CERTIFICATE_AUTH {
            return None;
        }
        self.config
            .get("id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
    }
}

fn default_true() -> bool {
    true
}

/// Saved request or history entry
///
/// History entries have no `name` and never belong to a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub key: String,

    #[serde(default)]
    pub kind: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub method: String,

    pub url: String,

    /// Newline-joined `Name: value` lines
    #[serde(default)]
    pub headers: String,

    #[serde(default)]
    pub payload: String,

    /// Epoch milliseconds
    #[serde(default)]
    pub created: i64,

    /// Epoch milliseconds
    #[serde(default)]
    pub updated: i64,

    /// Keys of the projects this request belongs to
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub projects: Vec<String>,

    /// Cloud-storage reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drive_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authorization: Vec<RequestAuthorization>,

    /// Fields without a canonical equivalent, passed through untouched
    #[serde(flatten)]
    pub extra: JsonObject,
}

const REQUEST_FIELDS: &[&str] = &[
    "key",
    "kind",
    "name",
    "method",
    "url",
    "headers",
    "payload",
    "created",
    "updated",
    "projects",
    "driveId",
    "description",
    "authorization",
    "_id",
    "_rev",
    "_deleted",
    "legacyProject",
];

/// Default method of a request that does not declare one
pub const DEFAULT_METHOD: &str = "GET";
/// Default URL of a request that does not declare one
pub const DEFAULT_URL: &str = "http://";
/// Default name of a saved request that does not declare one
pub const DEFAULT_REQUEST_NAME: &str = "unnamed";

impl ExportRequest {
    /// Create a request with empty content
    pub fn new(key: impl Into<String>, kind: &str) -> Self {
        let now = fields::now_millis();
        Self {
            key: key.into(),
            kind: kind.to_string(),
            name: None,
            method: DEFAULT_METHOD.to_string(),
            url: DEFAULT_URL.to_string(),
            headers: String::new(),
            payload: String::new(),
            created: now,
            updated: now,
            projects: Vec::new(),
            drive_id: None,
            description: None,
            authorization: Vec::new(),
            extra: JsonObject::new(),
        }
    }

    /// Leniently read a request from a raw JSON object
    ///
    /// The key is taken from `key`, then `_id`, and is left empty when
    /// neither exists. `updated` falls back to `created` and then to now;
    /// `created` falls back to `updated`.
    pub fn from_json(obj: &JsonObject, kind: &str) -> Self {
        let key = fields::non_empty_string(obj, "key")
            .or_else(|| fields::non_empty_string(obj, "_id"))
            .unwrap_or_default();
        let created = fields::timestamp(obj, "created");
        let updated = fields::timestamp(obj, "updated")
            .or(created)
            .unwrap_or_else(fields::now_millis);

        Self {
            key,
            kind: kind.to_string(),
            name: fields::string(obj, "name"),
            method: fields::non_empty_string(obj, "method")
                .unwrap_or_else(|| DEFAULT_METHOD.to_string()),
            url: fields::non_empty_string(obj, "url").unwrap_or_else(|| DEFAULT_URL.to_string()),
            headers: fields::text(obj, "headers").unwrap_or_default(),
            payload: fields::text(obj, "payload").unwrap_or_default(),
            created: created.unwrap_or(updated),
            updated,
            projects: fields::string_list(obj, "projects"),
            drive_id: fields::non_empty_string(obj, "driveId"),
            description: fields::string(obj, "description"),
            authorization: fields::array(obj, "authorization")
                .iter()
                .filter_map(RequestAuthorization::from_json)
                .collect(),
            extra: fields::without(obj, REQUEST_FIELDS),
        }
    }

    /// Identifiers of client certificates referenced by this request
    pub fn client_certificate_ids(&self) -> impl Iterator<Item = &str> {
        self.authorization
            .iter()
            .filter_map(RequestAuthorization::client_certificate_id)
    }

    /// Add a project key unless already present
    pub fn add_project(&mut self, project_key: &str) {
        if !self.projects.iter().any(|p| p == project_key) {
            self.projects.push(project_key.to_string());
        }
    }
}

/// Project grouping saved requests
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportProject {
    pub key: String,

    #[serde(default)]
    pub kind: String,

    pub name: String,

    /// Display order
    #[serde(default)]
    pub order: i64,

    #[serde(default)]
    pub created: i64,

    #[serde(default)]
    pub updated: i64,

    /// Keys of the requests in this project; rebuilt on every transform
    #[serde(default)]
    pub requests: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(flatten)]
    pub extra: JsonObject,
}

const PROJECT_FIELDS: &[&str] = &[
    "key",
    "kind",
    "name",
    "order",
    "created",
    "updated",
    "requests",
    "description",
    "_id",
    "_rev",
    "_deleted",
    "_referenceId",
];

/// Default name of a project that does not declare one
pub const DEFAULT_PROJECT_NAME: &str = "Unnamed project";

impl ExportProject {
    /// Create an empty project
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        let now = fields::now_millis();
        Self {
            key: key.into(),
            kind: kinds::PROJECT.to_string(),
            name: name.into(),
            order: 0,
            created: now,
            updated: now,
            requests: Vec::new(),
            description: None,
            extra: JsonObject::new(),
        }
    }

    /// Leniently read a project from a raw JSON object
    pub fn from_json(obj: &JsonObject) -> Self {
        let key = fields::non_empty_string(obj, "key")
            .or_else(|| fields::non_empty_string(obj, "_id"))
            .unwrap_or_default();
        let created = fields::timestamp(obj, "created");
        let updated = fields::timestamp(obj, "updated")
            .or(created)
            .unwrap_or_else(fields::now_millis);

        Self {
            key,
            kind: kinds::PROJECT.to_string(),
            name: fields::non_empty_string(obj, "name")
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            order: fields::integer(obj, "order").unwrap_or(0),
            created: created.unwrap_or(updated),
            updated,
            requests: fields::string_list(obj, "requests"),
            description: fields::string(obj, "description"),
            extra: fields::without(obj, PROJECT_FIELDS),
        }
    }

    /// Add a request key unless already present
    pub fn add_request(&mut self, request_key: &str) {
        if !self.requests.iter().any(|r| r == request_key) {
            self.requests.push(request_key.to_string());
        }
    }
}

/// Environment variable
///
/// `environment` is the owning environment's name, not its key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportVariable {
    pub key: String,

    #[serde(default)]
    pub kind: String,

    pub environment: String,

    pub name: String,

    #[serde(default)]
    pub value: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(flatten)]
    pub extra: JsonObject,
}

/// Environment every variable belongs to unless stated otherwise
pub const DEFAULT_ENVIRONMENT: &str = "default";

const VARIABLE_FIELDS: &[&str] = &[
    "key",
    "kind",
    "environment",
    "name",
    "variable",
    "value",
    "enabled",
    "_id",
    "_rev",
    "_deleted",
];

impl ExportVariable {
    /// Create an enabled variable
    pub fn new(
        key: impl Into<String>,
        environment: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            kind: kinds::VARIABLE.to_string(),
            environment: environment.into(),
            name: name.into(),
            value: value.into(),
            enabled: true,
            extra: JsonObject::new(),
        }
    }

    /// Leniently read a variable; the legacy `variable` field is accepted for `name`
    pub fn from_json(obj: &JsonObject) -> Self {
        Self {
            key: fields::non_empty_string(obj, "key")
                .or_else(|| fields::non_empty_string(obj, "_id"))
                .unwrap_or_default(),
            kind: kinds::VARIABLE.to_string(),
            environment: fields::non_empty_string(obj, "environment")
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            name: fields::string(obj, "name")
                .or_else(|| fields::string(obj, "variable"))
                .unwrap_or_default(),
            value: fields::text(obj, "value").unwrap_or_default(),
            enabled: fields::boolean(obj, "enabled").unwrap_or(true),
            extra: fields::without(obj, VARIABLE_FIELDS),
        }
    }
}

/// Certificate or private key material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certificate {
    /// Text content, or base64 when `data_type` is `buffer`
    pub data: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passphrase: Option<String>,

    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
}

/// Marks base64-encoded binary certificate data
pub const BUFFER_DATA_TYPE: &str = "buffer";

impl Certificate {
    /// Wrap binary content as base64 `buffer` data
    pub fn from_bytes(bytes: &[u8], passphrase: Option<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            passphrase,
            data_type: Some(BUFFER_DATA_TYPE.to_string()),
        }
    }

    /// Raw certificate bytes
    pub fn bytes(&self) -> Result<Vec<u8>> {
        if self.data_type.as_deref() == Some(BUFFER_DATA_TYPE) {
            BASE64.decode(self.data.as_bytes()).map_err(|e| {
                ArcportError::Validation(format!("Invalid base64 certificate data: {e}"))
            })
        } else {
            Ok(self.data.clone().into_bytes())
        }
    }

    /// Leniently read certificate material
    ///
    /// Accepts a bare string, `{data, passphrase, type}` with string data, or
    /// data serialized as an array of byte values.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self {
                data: s.clone(),
                passphrase: None,
                data_type: None,
            }),
            Value::Object(obj) => {
                let passphrase = fields::string(obj, "passphrase");
                match obj.get("data")? {
                    Value::String(s) if !s.is_empty() => Some(Self {
                        data: s.clone(),
                        passphrase,
                        data_type: fields::non_empty_string(obj, "type"),
                    }),
                    Value::Array(_) => byte_array(obj.get("data")?)
                        .map(|bytes| Self::from_bytes(&bytes, passphrase)),
                    Value::Object(inner) => byte_array(inner.get("data")?)
                        .map(|bytes| Self::from_bytes(&bytes, passphrase)),
                    _ => None,
                }
            }
            _ => None,
        }
    }
}

fn byte_array(value: &Value) -> Option<Vec<u8>> {
    value
        .as_array()?
        .iter()
        .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
        .collect()
}

/// Client certificate with its material joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportClientCertificate {
    pub key: String,

    #[serde(default)]
    pub kind: String,

    pub name: String,

    /// Certificate container type (`p12`, `pem`)
    #[serde(rename = "type")]
    pub cert_type: String,

    #[serde(default)]
    pub created: i64,

    pub cert: Certificate,

    #[serde(rename = "pKey", default, skip_serializing_if = "Option::is_none")]
    pub p_key: Option<Certificate>,
}

impl ExportClientCertificate {
    /// Leniently read a certificate; entries without certificate material are dropped
    pub fn from_json(obj: &JsonObject) -> Option<Self> {
        let cert = Certificate::from_json(obj.get("cert")?)?;
        Some(Self {
            key: fields::non_empty_string(obj, "key")
                .or_else(|| fields::non_empty_string(obj, "_id"))
                .unwrap_or_default(),
            kind: kinds::CLIENT_CERTIFICATE.to_string(),
            name: fields::non_empty_string(obj, "name").unwrap_or_default(),
            cert_type: fields::non_empty_string(obj, "type").unwrap_or_else(|| "p12".to_string()),
            created: fields::timestamp(obj, "created").unwrap_or_else(fields::now_millis),
            cert,
            p_key: obj.get("pKey").and_then(Certificate::from_json),
        })
    }

    /// Split into the index body (listing metadata) and the data body (material)
    ///
    /// The index references the data record through `dataKey`, which is the
    /// same identifier as the index itself.
    pub fn to_store_parts(&self, id: &str) -> Result<(JsonObject, JsonObject)> {
        let mut index = JsonObject::new();
        index.insert("name".to_string(), Value::String(self.name.clone()));
        index.insert("type".to_string(), Value::String(self.cert_type.clone()));
        index.insert("created".to_string(), Value::from(self.created));
        index.insert("dataKey".to_string(), Value::String(id.to_string()));

        let mut data = JsonObject::new();
        data.insert("cert".to_string(), serde_json::to_value(&self.cert)?);
        if let Some(p_key) = &self.p_key {
            data.insert("pKey".to_string(), serde_json::to_value(p_key)?);
        }
        Ok((index, data))
    }

    /// Join an index body and its data body back into one certificate
    pub fn from_store_parts(key: &str, index: &JsonObject, data: &JsonObject) -> Option<Self> {
        let mut merged = index.clone();
        merged.remove("dataKey");
        merged.insert("key".to_string(), Value::String(key.to_string()));
        if let Some(cert) = data.get("cert") {
            merged.insert("cert".to_string(), cert.clone());
        }
        if let Some(p_key) = data.get("pKey") {
            merged.insert("pKey".to_string(), p_key.clone());
        }
        Self::from_json(&merged)
    }
}

/// Entity passed through opaquely (url history, auth data, host rules, cookies)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportEntity {
    pub key: String,

    #[serde(default)]
    pub kind: String,

    #[serde(flatten)]
    pub fields: JsonObject,
}

impl ExportEntity {
    /// Read an opaque entity, dropping storage metadata
    pub fn from_json(obj: &JsonObject, kind: &str) -> Self {
        Self {
            key: fields::non_empty_string(obj, "key")
                .or_else(|| fields::non_empty_string(obj, "_id"))
                .unwrap_or_default(),
            kind: kind.to_string(),
            fields: fields::without(obj, &["key", "kind", "_id", "_rev", "_deleted"]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(value: Value) -> JsonObject {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_collection_keys_and_aliases() {
        assert_eq!(ExportCollection::UrlHistory.key(), "urlHistory");
        assert_eq!(
            ExportCollection::from_key("url-history"),
            Some(ExportCollection::UrlHistory)
        );
        assert_eq!(
            ExportCollection::from_key("clientcertificates"),
            Some(ExportCollection::ClientCertificates)
        );
        assert_eq!(ExportCollection::from_key("headers-sets"), None);
    }

    #[test]
    fn test_find_in_prefers_camel_case() {
        let raw = obj(json!({
            "auth-data": [{"key": "old"}],
            "authData": [{"key": "new"}]
        }));
        let found = ExportCollection::AuthData.find_in(&raw).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0]["key"], "new");
    }

    #[test]
    fn test_absent_collections_are_not_serialized() {
        let mut export = ExportObject::new("1.0.0", kinds::ALL_DATA_EXPORT);
        export.requests = Some(Vec::new());

        let value = serde_json::to_value(&export).unwrap();
        let map = value.as_object().unwrap();
        assert!(map.contains_key("requests"));
        assert!(!map.contains_key("projects"));
        assert!(!map.contains_key("loadToWorkspace"));
        assert_eq!(map["kind"], kinds::ALL_DATA_EXPORT);
        assert!(map["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_request_from_json_defaults() {
        let request = ExportRequest::from_json(&obj(json!({"updated": 5})), kinds::REQUEST);
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "http://");
        assert_eq!(request.created, 5);
        assert_eq!(request.updated, 5);
        assert!(request.key.is_empty());
        assert!(request.name.is_none());
    }

    #[test]
    fn test_request_from_json_preserves_unknown_fields() {
        let request = ExportRequest::from_json(
            &obj(json!({
                "_id": "r1",
                "_rev": "3-abc",
                "url": "http://a",
                "legacyProject": "p1",
                "config": {"timeout": 5}
            })),
            kinds::REQUEST,
        );
        assert_eq!(request.key, "r1");
        assert_eq!(request.extra.len(), 1);
        assert!(request.extra.contains_key("config"));

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["config"]["timeout"], 5);
        assert!(value.get("_rev").is_none());
    }

    #[test]
    fn test_client_certificate_ids() {
        let request = ExportRequest::from_json(
            &obj(json!({
                "authorization": [
                    {"type": "basic", "config": {"username": "u"}},
                    {"type": "client certificate", "enabled": true, "config": {"id": "c1"}},
                    {"type": "client certificate", "config": {}}
                ]
            })),
            kinds::REQUEST,
        );
        let ids: Vec<&str> = request.client_certificate_ids().collect();
        assert_eq!(ids, vec!["c1"]);
    }

    #[test]
    fn test_variable_legacy_name_field() {
        let variable = ExportVariable::from_json(&obj(json!({
            "variable": "host",
            "value": "localhost",
            "environment": "dev"
        })));
        assert_eq!(variable.name, "host");
        assert_eq!(variable.environment, "dev");
        assert!(variable.enabled);
        assert!(variable.extra.is_empty());
    }

    #[test]
    fn test_certificate_byte_array_is_base64() {
        let cert = Certificate::from_json(&json!({"data": [104, 105], "passphrase": "p"})).unwrap();
        assert_eq!(cert.data_type.as_deref(), Some(BUFFER_DATA_TYPE));
        assert_eq!(cert.bytes().unwrap(), b"hi".to_vec());
        assert_eq!(cert.passphrase.as_deref(), Some("p"));
    }

    #[test]
    fn test_client_certificate_without_material_is_dropped() {
        assert!(ExportClientCertificate::from_json(&obj(json!({"name": "x"}))).is_none());
    }

    #[test]
    fn test_client_certificate_store_parts() {
        let cert = ExportClientCertificate::from_json(&obj(json!({
            "key": "c1",
            "name": "My cert",
            "type": "pem",
            "created": 10,
            "cert": {"data": "CERT"},
            "pKey": {"data": "KEY", "passphrase": "secret"}
        })))
        .unwrap();

        let (index, data) = cert.to_store_parts("c1").unwrap();
        assert_eq!(index["dataKey"], "c1");
        assert!(index.get("cert").is_none());
        assert_eq!(data["cert"]["data"], "CERT");

        let joined = ExportClientCertificate::from_store_parts("c1", &index, &data).unwrap();
        assert_eq!(joined, cert);
    }
}
