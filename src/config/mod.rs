//! Configuration management for arcport.
//!
//! arcport uses TOML configuration files with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `ARCPORT_<SECTION>_<KEY>` environment overrides
//! - Default values for every setting
//! - Per-section validation
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use arcport::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("arcport.toml")?;
//! println!("Store backend: {:?}", config.store.backend);
//! println!("Export page size: {}", config.export.page_size);
//! # Ok(())
//! # }
//! ```
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [store]
//! backend = "postgresql"
//!
//! [postgresql]
//! connection_string = "${ARCPORT_PG_DSN}"
//! max_connections = 10
//!
//! [import]
//! chunk_size = 200
//!
//! [export]
//! page_size = 1000
//! kind = "ARC#AllDataExport"
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

// Re-export commonly used types
pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, ArcportConfig, ExportConfig, ImportConfig, LoggingConfig, MemoryConfig,
    PostgreSQLConfig, StoreBackend, StoreConfig,
};
pub use secret::{redact_credentials, secret_string, SecretString, SecretValue};

impl ArcportConfig {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// See [`load_config`].
    pub fn from_file(path: impl AsRef<std::path::Path>) -> crate::domain::Result<Self> {
        load_config(path)
    }
}
