//! Storage backends for arcport.
//!
//! - [`database`] - Document store abstraction layer (trait-based) and factory
//! - [`memory`] - In-memory store with optional JSON snapshot persistence
//! - [`postgresql`] - PostgreSQL implementation
//!
//! # Design Pattern
//!
//! Adapters isolate the storage engine behind [`database::DocumentStore`] so
//! the import and export pipelines can run against any backend, and tests can
//! use the in-memory store.
//!
//! ```rust,no_run
//! use arcport::adapters::database::{Collection, DocumentStore};
//! use arcport::adapters::memory::MemoryStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryStore::open("arcport-store.json").await?;
//! let saved = store.count(Collection::SavedRequests).await?;
//! println!("{saved} saved requests");
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod memory;
pub mod postgresql;
