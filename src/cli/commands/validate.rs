//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the arcport configuration file.

use super::{EXIT_CONFIG, EXIT_SUCCESS};
use crate::config::{load_config, redact_credentials, StoreBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // Loading also validates
        let config = match load_config(config_path) {
            Ok(c) => c,
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(EXIT_CONFIG);
            }
        };

        println!("✅ Configuration is valid");
        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        println!("  App Version: {}", config.application.app_version);

        match config.store.backend {
            StoreBackend::Memory => {
                println!("  Store: memory");
                println!(
                    "  Snapshot: {}",
                    config.memory.snapshot_path.as_deref().unwrap_or("(none)")
                );
            }
            StoreBackend::PostgreSQL => {
                if let Some(ref pg_config) = config.postgresql {
                    use secrecy::ExposeSecret;
                    println!("  Store: postgresql");
                    println!(
                        "  PostgreSQL Connection: {}",
                        redact_credentials(pg_config.connection_string.expose_secret())
                    );
                    println!("  Max Connections: {}", pg_config.max_connections);
                }
            }
        }

        println!("  Import Chunk Size: {}", config.import.chunk_size);
        println!("  Export Page Size: {}", config.export.page_size);
        println!("  Export Kind: {}", config.export.kind);
        println!();
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_validate_missing_file() {
        let code = ValidateArgs {}
            .execute("/nonexistent/arcport.toml")
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }

    #[tokio::test]
    async fn test_validate_valid_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[export]\npage_size = 500\n").unwrap();

        let code = ValidateArgs {}
            .execute(file.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
    }
}
