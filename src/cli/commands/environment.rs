//! Rename-env command implementation

use super::{exit_code, load_configuration, open_store, EXIT_SUCCESS};
use crate::core::import::ImportStore;
use clap::Args;

/// Arguments for the rename-env command
#[derive(Args, Debug)]
pub struct RenameEnvArgs {
    /// Current environment name
    pub old_name: String,

    /// New environment name
    pub new_name: String,
}

impl RenameEnvArgs {
    /// Execute the rename-env command
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
        let renamed = match importer
            .rename_environment(&self.old_name, &self.new_name)
            .await
        {
            Ok(n) => n,
            Err(e) => {
                eprintln!("Failed to rename environment: {e}");
                return Ok(exit_code(&e));
            }
        };
        if let Err(e) = importer.store().flush().await {
            eprintln!("Failed to persist store: {e}");
            return Ok(exit_code(&e));
        }

        println!(
            "✅ Renamed '{}' to '{}' ({renamed} variable(s) moved)",
            self.old_name, self.new_name
        );
        Ok(EXIT_SUCCESS)
    }
}
