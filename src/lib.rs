// Arcport - REST client data interchange
// Copyright (c) 2025 Arcport Contributors
// Licensed under the MIT License

//! # arcport - REST client data interchange
//!
//! arcport moves the data of a REST API client (saved requests, projects,
//! history, environments and variables, cookies, host rules, auth data and
//! client certificates) between its document store and portable JSON files.
//!
//! ## Overview
//!
//! This library provides the core functionality for:
//! - **Classifying** input files: the client's own export generations and
//!   foreign collection, dump and environment files
//! - **Transforming** every supported format into one canonical export object
//! - **Importing** export objects into a document store, resolving revision
//!   conflicts and reporting search index updates
//! - **Exporting** selected collections back into the portable format
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - Business logic (transform, import, export)
//! - [`adapters`] - Document stores (in-memory, PostgreSQL)
//! - [`domain`] - Export object model, store documents and errors
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use arcport::adapters::memory::MemoryStore;
//! use arcport::config::ImportConfig;
//! use arcport::core::import::ImportCoordinator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryStore::new());
//!     let coordinator = ImportCoordinator::new(store, &ImportConfig::default());
//!
//!     let summary = coordinator.import_file("postman_collection.json").await?;
//!     println!("Imported {} documents", summary.total_written());
//!     Ok(())
//! }
//! ```
//!
//! ## Format Detection
//!
//! ```rust
//! use arcport::core::transform::{classify, DataFormat};
//! use serde_json::json;
//!
//! let raw = json!({"_postman_variable_scope": "environment", "values": []});
//! assert_eq!(classify(&raw).unwrap(), DataFormat::PostmanEnvironment);
//! ```
//!
//! ## Error Handling
//!
//! arcport uses the [`domain::ArcportError`] type for all errors. Per-document
//! store failures during an import are reported in the
//! [`ImportSummary`](core::import::ImportSummary) instead of failing the call.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
