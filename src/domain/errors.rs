//! Domain error types
//!
//! This module defines the error hierarchy for arcport.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main arcport error type
///
/// This is the primary error type used throughout the application.
/// It wraps specific error types and provides context for error handling.
#[derive(Debug, Error)]
pub enum ArcportError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The input matched none of the known interchange formats
    #[error("Unknown file format: {0}")]
    UnknownFormat(String),

    /// The input could not be parsed as JSON
    #[error("Parse error: {0}")]
    Parse(String),

    /// Document store errors
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Database backend errors (connection, pool, migration)
    #[error("Database error: {0}")]
    Database(String),

    /// Transformation errors that are not format mismatches
    #[error("Transform error: {0}")]
    Transform(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

impl ArcportError {
    /// Whether this error means the input file was not recognized
    pub fn is_unrecognized_input(&self) -> bool {
        matches!(self, Self::UnknownFormat(_) | Self::Parse(_))
    }
}

/// Document store errors
///
/// Errors raised by [`DocumentStore`](crate::adapters::database::DocumentStore)
/// implementations. A conflict is a typed 409: the document exists with a
/// revision other than the one supplied by the writer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Document not found
    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    /// Revision conflict (409)
    #[error("Document update conflict: {collection}/{id}")]
    Conflict { collection: String, id: String },

    /// The document was rejected by the store
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// Backend failure
    #[error("Backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Whether this is a revision conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }

    /// HTTP-like status code of the error
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::Conflict { .. } => 409,
            Self::InvalidDocument(_) => 400,
            Self::Backend(_) => 500,
        }
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ArcportError {
    fn from(err: std::io::Error) -> Self {
        ArcportError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ArcportError {
    fn from(err: serde_json::Error) -> Self {
        ArcportError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ArcportError {
    fn from(err: toml::de::Error) -> Self {
        ArcportError::Configuration(format!("TOML parse error: {err}"))
    }
}
