//! Document store abstraction layer
//!
//! This module provides a trait-based abstraction over the storage backends
//! (in-memory with JSON snapshots, PostgreSQL).

pub mod factory;
pub mod traits;

pub use factory::create_document_store;
pub use traits::{Collection, DocumentStore, ScanPage, ScanRequest, WriteOutcome, WriteSuccess};
