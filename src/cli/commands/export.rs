//! Export command implementation
//!
//! This module implements the `export` command for writing stored data to a
//! portable data file.

use super::{exit_code, load_configuration, open_store, EXIT_CONFIG, EXIT_SUCCESS};
use crate::core::export::{ExportCoordinator, ExportRequestMap};
use crate::domain::export::ExportCollection;
use clap::Args;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Output file
    #[arg(short, long, default_value = "arcport-export.json")]
    pub output: String,

    /// Collections to export (comma-separated, default all)
    #[arg(long, value_delimiter = ',')]
    pub collections: Vec<String>,

    /// Override the kind written into the file
    #[arg(long)]
    pub kind: Option<String>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,
}

impl ExportArgs {
    /// Build the collection selection from the `--collections` flag
    fn request_map(&self) -> Result<ExportRequestMap, String> {
        if self.collections.is_empty() {
            return Ok(ExportRequestMap::all());
        }

        let collections = self
            .collections
            .iter()
            .map(|name| {
                let name = name.trim();
                ExportCollection::from_key(name).ok_or_else(|| {
                    format!(
                        "Unknown collection '{name}'. Expected one of: {}",
                        ExportCollection::ALL.map(|c| c.key()).join(", ")
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ExportRequestMap::collections(collections))
    }

    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Starting export command");

        let mut config = match load_configuration(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        if let Some(kind) = &self.kind {
            tracing::info!(kind = %kind, "Overriding export kind from CLI");
            config.export.kind = kind.clone();
            if let Err(e) = config.validate() {
                eprintln!("Configuration validation failed: {e}");
                return Ok(EXIT_CONFIG);
            }
        }

        let request = match self.request_map() {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{e}");
                return Ok(EXIT_CONFIG);
            }
        };

        let store = match open_store(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        println!("🚀 Starting export...");
        let coordinator = ExportCoordinator::new(store, &config);
        match coordinator
            .export_to_file(&request, &self.output, self.pretty)
            .await
        {
            Ok(summary) => {
                println!("✅ Export written to {}", self.output);
                for (collection, count) in &summary.collections {
                    println!("  {collection}: {count}");
                }
                println!("  Duration: {:.2}s", summary.duration.as_secs_f64());
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                eprintln!("Export failed: {e}");
                Ok(exit_code(&e))
            }
        }
    }
}
