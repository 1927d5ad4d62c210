//! Core business logic for arcport.
//!
//! # Modules
//!
//! - [`transform`] - Format classification and the per-format transformers
//! - [`import`] - Import store, conflict resolution and import coordination
//! - [`export`] - Paginated reads, export factory, processor and coordination
//!
//! # Import Workflow
//!
//! 1. **Parse**: Read the input file as JSON
//! 2. **Classify**: Detect the source format
//! 3. **Transform**: Convert to the canonical export object
//! 4. **Write**: Bulk write each collection, resolving conflicts in a second pass
//! 5. **Report**: Per-collection counts, errors and search index updates
//!
//! # Example
//!
//! ```rust,no_run
//! use arcport::adapters::database::create_document_store;
//! use arcport::config::load_config;
//! use arcport::core::export::{ExportCoordinator, ExportRequestMap};
//! use arcport::core::import::ImportCoordinator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("arcport.toml")?;
//! let store = create_document_store(&config).await?;
//!
//! let summary = ImportCoordinator::new(store.clone(), &config.import)
//!     .with_page_size(config.export.page_size)
//!     .import_file("backup.json")
//!     .await?;
//! println!("Written: {}", summary.total_written());
//!
//! let (export, _) = ExportCoordinator::new(store, &config)
//!     .export(&ExportRequestMap::all())
//!     .await?;
//! println!("Requests: {:?}", export.requests.map(|r| r.len()));
//! # Ok(())
//! # }
//! ```

pub mod export;
pub mod import;
pub mod transform;
