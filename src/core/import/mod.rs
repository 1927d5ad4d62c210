//! Import pipeline
//!
//! This module provides:
//! - The import store: bulk writes with conflict resolution, environment
//!   derivation and search index updates
//! - Import coordination from raw file content
//! - Summary and reporting

pub mod coordinator;
pub mod store;
pub mod summary;

pub use coordinator::ImportCoordinator;
pub use store::ImportStore;
pub use summary::{CollectionResult, ImportError, ImportSummary, IndexType, IndexUpdate};
