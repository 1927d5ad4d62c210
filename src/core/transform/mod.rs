//! Import transformation pipeline
//!
//! Raw input is parsed, classified into a [`DataFormat`], and dispatched to
//! the transformer for that format. Every transformer produces the canonical
//! [`ExportObject`]:
//!
//! - **legacy**: the oldest schema, a single request or projects + requests
//! - **dexie**: the intermediate per-object-store schema with embedded HAR logs
//! - **pouch**: the previous document-store schema
//! - **postman**: the foreign tool's collections, data dumps and environments
//!
//! Transformers never mutate their input and only fail on a top-level format
//! mismatch; malformed sub-fields fall back to defaults.

pub mod classify;
pub mod dexie;
pub mod legacy;
pub mod linking;
pub mod postman;
pub mod pouch;

pub use classify::{classify, DataFormat};
pub use linking::link_requests_and_projects;

use crate::config::schema::ImportConfig;
use crate::domain::export::ExportObject;
use crate::domain::{ArcportError, Result};
use serde_json::Value;

/// Version recorded on export objects built from inputs that carry none
pub const UNKNOWN_VERSION: &str = "unknown";

/// Options shared by all transformers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOptions {
    /// Records processed per cooperative tick by chunked transformers
    pub chunk_size: usize,

    /// HAR entry used for saved requests (history always uses the last entry)
    pub har_reference_entry: usize,

    /// Import straight into the workspace instead of the data store flow
    pub load_to_workspace: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            chunk_size: 200,
            har_reference_entry: 0,
            load_to_workspace: false,
        }
    }
}

impl From<&ImportConfig> for TransformOptions {
    fn from(config: &ImportConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(1),
            har_reference_entry: config.har_reference_entry,
            load_to_workspace: config.load_to_workspace,
        }
    }
}

/// Parse raw file content as JSON
///
/// # Errors
///
/// Returns [`ArcportError::Parse`] when the content is not valid JSON.
pub fn parse_input(content: &str) -> Result<Value> {
    serde_json::from_str(content).map_err(|e| ArcportError::Parse(format!("Invalid JSON: {e}")))
}

/// Transform an already classified input
pub async fn transform_as(
    format: DataFormat,
    raw: &Value,
    options: &TransformOptions,
) -> Result<ExportObject> {
    tracing::debug!(format = %format, "Transforming input");

    let mut export = match format {
        DataFormat::ArcLegacy => legacy::transform(raw, options).await?,
        DataFormat::ArcDexie => dexie::transform(raw, options).await?,
        DataFormat::ArcPouch => pouch::transform(raw, options).await?,
        DataFormat::PostmanV1 => postman::transform_v1(raw, options).await?,
        DataFormat::PostmanV2 | DataFormat::PostmanV21 => {
            postman::transform_v2(raw, options).await?
        }
        DataFormat::PostmanBackup => postman::transform_backup(raw, options).await?,
        DataFormat::PostmanEnvironment => postman::transform_environment(raw, options).await?,
    };

    if options.load_to_workspace {
        export.load_to_workspace = Some(true);
    }
    Ok(export)
}

/// Classify and transform a parsed input
///
/// # Errors
///
/// Returns [`ArcportError::UnknownFormat`] when no transformer accepts the input.
pub async fn transform(
    raw: &Value,
    options: &TransformOptions,
) -> Result<(DataFormat, ExportObject)> {
    let format = classify(raw)?;
    let export = transform_as(format, raw, options).await?;
    Ok((format, export))
}
