//! Input format classification
//!
//! Decides which transformer handles a parsed input. The checks are pure
//! predicates over the JSON shape and are total: every JSON value either maps
//! to a [`DataFormat`] or yields [`ArcportError::UnknownFormat`].

use crate::domain::export::kinds;
use crate::domain::fields::{self, JsonObject};
use crate::domain::{ArcportError, Result};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Recognized input format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataFormat {
    /// Foreign-tool collection v1 (`folders` + `requests`)
    PostmanV1,
    /// Foreign-tool collection v2.0
    PostmanV2,
    /// Foreign-tool collection v2.1
    PostmanV21,
    /// Foreign-tool data dump (`version` + `collections`)
    PostmanBackup,
    /// Foreign-tool environment file
    PostmanEnvironment,
    /// Oldest application schema (single request or projects + requests)
    ArcLegacy,
    /// Intermediate per-object-store schema
    ArcDexie,
    /// Previous document-store schema
    ArcPouch,
}

impl DataFormat {
    /// Whether the format comes from the foreign tool
    pub fn is_postman(self) -> bool {
        matches!(
            self,
            Self::PostmanV1
                | Self::PostmanV2
                | Self::PostmanV21
                | Self::PostmanBackup
                | Self::PostmanEnvironment
        )
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::PostmanV1 => "postman-v1",
            Self::PostmanV2 => "postman-v2",
            Self::PostmanV21 => "postman-v2.1",
            Self::PostmanBackup => "postman-backup",
            Self::PostmanEnvironment => "postman-environment",
            Self::ArcLegacy => "arc-legacy",
            Self::ArcDexie => "arc-dexie",
            Self::ArcPouch => "arc-pouch",
        }
    }
}

impl fmt::Display for DataFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataFormat {
    type Err = ArcportError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "postman-v1" => Ok(Self::PostmanV1),
            "postman-v2" => Ok(Self::PostmanV2),
            "postman-v2.1" => Ok(Self::PostmanV21),
            "postman-backup" => Ok(Self::PostmanBackup),
            "postman-environment" => Ok(Self::PostmanEnvironment),
            "arc-legacy" => Ok(Self::ArcLegacy),
            "arc-dexie" => Ok(Self::ArcDexie),
            "arc-pouch" => Ok(Self::ArcPouch),
            _ => Err(ArcportError::Configuration(format!(
                "Invalid data format: {s}"
            ))),
        }
    }
}

/// Kinds produced by the previous document-store versions
const POUCH_KINDS: &[&str] = &[
    kinds::ALL_DATA_EXPORT,
    kinds::SAVED_HISTORY_DATA_EXPORT,
    kinds::SAVED_DATA_EXPORT,
    kinds::SAVED_EXPORT,
    kinds::HISTORY_DATA_EXPORT,
    kinds::HISTORY_EXPORT,
    kinds::PROJECT_EXPORT,
    kinds::SESSION_COOKIES,
    kinds::HOST_RULES,
    kinds::IMPORT,
];

/// Keys that mark the application's own export family
const APP_KEYS: &[&str] = &[
    "projects",
    "requests",
    "history",
    "url-history",
    "websocket-url-history",
    "variables",
    "headers-sets",
    "auth-data",
    "cookies",
];

/// Classify a parsed input
///
/// # Errors
///
/// Returns [`ArcportError::UnknownFormat`] when the value matches no known
/// format.
pub fn classify(data: &Value) -> Result<DataFormat> {
    let obj = data.as_object().ok_or_else(|| {
        ArcportError::UnknownFormat("Input is not a JSON object".to_string())
    })?;

    if let Some(format) = postman_format(obj) {
        return Ok(format);
    }

    if is_app_export(obj) {
        return Ok(app_format(obj));
    }

    Err(ArcportError::UnknownFormat(
        "File format is not recognized".to_string(),
    ))
}

fn postman_format(obj: &JsonObject) -> Option<DataFormat> {
    if obj.contains_key("version") && obj.contains_key("collections") {
        return Some(DataFormat::PostmanBackup);
    }
    if let Some(schema) = fields::object(obj, "info").and_then(|info| info.get("schema")) {
        let schema = schema.as_str().unwrap_or_default();
        return Some(if schema.contains("v2.1") {
            DataFormat::PostmanV21
        } else {
            DataFormat::PostmanV2
        });
    }
    if obj.contains_key("folders") && obj.contains_key("requests") {
        return Some(DataFormat::PostmanV1);
    }
    if obj.contains_key("_postman_variable_scope") {
        return Some(DataFormat::PostmanEnvironment);
    }
    None
}

fn is_app_export(obj: &JsonObject) -> bool {
    if fields::string(obj, "kind").is_some_and(|k| k.starts_with(kinds::NAMESPACE)) {
        return true;
    }
    if APP_KEYS.iter().any(|k| obj.contains_key(*k)) {
        return true;
    }
    is_single_request(obj)
}

/// A bare request object from the oldest schema
pub(crate) fn is_single_request(obj: &JsonObject) -> bool {
    obj.contains_key("headers")
        && obj.contains_key("url")
        && obj.contains_key("method")
        && !obj.contains_key("projects")
        && !obj.contains_key("requests")
        && !obj.contains_key("history")
}

fn app_format(obj: &JsonObject) -> DataFormat {
    match fields::string(obj, "kind").as_deref() {
        Some(kind) if POUCH_KINDS.contains(&kind) => DataFormat::ArcPouch,
        Some(kinds::REQUESTS_DATA_EXPORT) => DataFormat::ArcDexie,
        _ => DataFormat::ArcLegacy,
    }
}
