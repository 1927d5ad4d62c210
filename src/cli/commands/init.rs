//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use super::{EXIT_CONFIG, EXIT_FATAL, EXIT_SUCCESS};
use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "arcport.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing arcport configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(EXIT_CONFIG);
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Set store.backend to 'memory' or 'postgresql'");
                println!("  3. For PostgreSQL, set ARCPORT_PG_DSN in your .env file");
                println!("  4. Validate configuration: arcport validate-config");
                println!("  5. Import a file: arcport import backup.json");
                println!();
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(EXIT_FATAL)
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# arcport configuration file

[application]
log_level = "info"

[store]
backend = "memory"  # memory | postgresql

[memory]
snapshot_path = "arcport-store.json"

# [postgresql]
# connection_string = "${ARCPORT_PG_DSN}"
# max_connections = 10

[import]
chunk_size = 200

[export]
page_size = 1000
kind = "ARC#AllDataExport"

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# arcport configuration file
#
# Every setting has a default; an empty file is a valid configuration.
# Any value can reference environment variables with ${VAR_NAME}, and
# ARCPORT_<SECTION>_<KEY> environment variables override file values.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# Version written into exported files (defaults to the arcport version)
# app_version = "1.0.0"

# ============================================================================
# Document Store
# ============================================================================
[store]
# memory: in-process store, optionally persisted to a JSON snapshot
# postgresql: JSONB document table
backend = "memory"

[memory]
# Snapshot file loaded on start and rewritten after every change
snapshot_path = "arcport-store.json"

# Uncomment this section if using PostgreSQL (store.backend = "postgresql")
#
# [postgresql]
# # Connection string format: postgresql://[user[:password]@][host][:port][/dbname][?params]
# connection_string = "${ARCPORT_PG_DSN}"
#
# # Connection pool settings
# max_connections = 10                # Maximum connections in pool (1-100)
# connection_timeout_seconds = 30     # Timeout for acquiring connection
# statement_timeout_seconds = 60      # Timeout for SQL statement execution
#
# # The documents table is created on first connect (migrations/001_documents.sql)

# ============================================================================
# Import
# ============================================================================
[import]
# Records processed between cooperative yields when reading HAR-based
# exports (1-5000)
chunk_size = 200

# HAR entry used for saved requests that don't name a reference entry
har_reference_entry = 0

# Keep the file's kind instead of marking the data as an import
load_to_workspace = false

# Transform only, don't write to the store
dry_run = false

# ============================================================================
# Export
# ============================================================================
[export]
# Documents read per store page (10-10000)
page_size = 1000

# Kind written into exported files
kind = "ARC#AllDataExport"

# ============================================================================
# Logging
# ============================================================================
[logging]
# Enable JSON log files
local_enabled = false

# Log directory
local_path = "logs"

# Log rotation (daily, hourly, never)
local_rotation = "daily"
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_config_from_str;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "arcport.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "arcport.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_are_valid() {
        let minimal = load_config_from_str(&InitArgs::generate_minimal_config()).unwrap();
        assert_eq!(minimal.import.chunk_size, 200);

        let full = load_config_from_str(&InitArgs::generate_config_with_examples()).unwrap();
        assert_eq!(full.export.page_size, 1000);
    }

    #[tokio::test]
    async fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("arcport.toml");
        std::fs::write(&output, "# existing").unwrap();

        let mut args = InitArgs {
            output: output.to_str().unwrap().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), EXIT_CONFIG);

        args.force = true;
        assert_eq!(args.execute().await.unwrap(), EXIT_SUCCESS);
        assert!(std::fs::read_to_string(&output)
            .unwrap()
            .contains("[import]"));
    }
}
