//! Domain models and types for arcport.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Canonical export object** ([`ExportObject`]) and its entities
//! - **Stored document model** ([`Document`])
//! - **Lenient field readers** ([`fields`]) used when reading foreign or legacy data
//! - **Error types** ([`ArcportError`], [`StoreError`])
//! - **Result type alias** ([`Result`])
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T, ArcportError>`]:
//!
//! ```rust
//! use arcport::domain::{ArcportError, Result};
//!
//! fn example() -> Result<()> {
//!     let config = arcport::config::ArcportConfig::from_file("arcport.toml")?;
//!     Ok(())
//! }
//! ```

pub mod context;
pub mod document;
pub mod errors;
pub mod export;
pub mod fields;
pub mod result;

// Re-export commonly used types for convenience
pub use document::{Document, RevisionInfo};
pub use errors::{ArcportError, StoreError};
pub use export::{
    kinds, Certificate, ExportClientCertificate, ExportCollection, ExportEntity, ExportObject,
    ExportProject, ExportRequest, ExportVariable, RequestAuthorization,
};
pub use result::Result;
