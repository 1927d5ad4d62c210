//! PostgreSQL document store backend
//!
//! All collections share one `documents` table keyed by `(collection, id)`.

pub mod adapter;
pub mod client;
pub mod models;

pub use adapter::PostgreSQLAdapter;
pub use client::PostgreSQLClient;
