//! Delete-cert command implementation

use super::{exit_code, load_configuration, open_store, EXIT_SUCCESS};
use crate::core::import::ImportStore;
use clap::Args;

/// Arguments for the delete-cert command
#[derive(Args, Debug)]
pub struct DeleteCertArgs {
    /// Identifier of the certificate index record
    pub id: String,
}

impl DeleteCertArgs {
    /// Execute the delete-cert command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_configuration(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };
        let store = match open_store(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        let importer = ImportStore::new(store);
        let deleted = importer.delete_client_certificate(&self.id).await;
        let deleted = match deleted {
            Ok(()) => importer.store().flush().await,
            Err(e) => Err(e),
        };

        match deleted {
            Ok(()) => {
                println!("✅ Deleted client certificate {}", self.id);
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                tracing::error!(id = %self.id, error = %e, "Certificate deletion failed");
                eprintln!("Failed to delete certificate {}: {e}", self.id);
                Ok(exit_code(&e))
            }
        }
    }
}
