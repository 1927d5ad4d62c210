//! Logging and observability
//!
//! Structured logging through `tracing`, with console output and optional
//! JSON files rotated by `tracing-appender`.
//!
//! # Example
//!
//! ```no_run
//! use arcport::logging::init_logging;
//! use arcport::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log the start of an import
///
/// # Example
///
/// ```no_run
/// use arcport::log_import_start;
///
/// log_import_start!("ArcPouch", "ARC#AllDataExport");
/// ```
#[macro_export]
macro_rules! log_import_start {
    ($format:expr, $kind:expr) => {
        tracing::info!(
            format = %$format,
            kind = %$kind,
            "Starting import"
        );
    };
}

/// Log the result of writing one collection
///
/// # Example
///
/// ```no_run
/// use arcport::log_collection_written;
///
/// log_collection_written!("saved-requests", 98, 2);
/// ```
#[macro_export]
macro_rules! log_collection_written {
    ($collection:expr, $written:expr, $failed:expr) => {
        tracing::info!(
            collection = %$collection,
            written = $written,
            failed = $failed,
            "Collection written"
        );
    };
}

/// Log a conflict retry pass
///
/// # Example
///
/// ```no_run
/// use arcport::log_retry_attempt;
///
/// log_retry_attempt!("saved-requests", 3);
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($collection:expr, $conflicts:expr) => {
        tracing::debug!(
            collection = %$collection,
            conflicts = $conflicts,
            "Retrying conflicted documents"
        );
    };
}
