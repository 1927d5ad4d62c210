//! Import command implementation
//!
//! This module implements the `import` command: detect the format of a data
//! file, transform it and write it into the configured store.

use super::{exit_code, load_configuration, open_store, EXIT_PARTIAL, EXIT_SUCCESS};
use crate::core::import::ImportCoordinator;
use clap::Args;

/// Arguments for the import command
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Data file to import
    pub file: String,

    /// Dry run mode - transform the file without writing to the store
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the file's kind instead of marking the data as an import
    #[arg(long)]
    pub load_to_workspace: bool,

    /// Override the number of records processed between yields
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Print the search index updates as JSON
    #[arg(long)]
    pub print_index: bool,
}

impl ImportArgs {
    /// Execute the import command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(file = %self.file, "Starting import command");

        let mut config = match load_configuration(config_path) {
            Ok(c) => c,
            Err(code) => return Ok(code),
        };

        // Apply CLI overrides
        if self.dry_run {
            tracing::info!("Enabling dry-run mode from CLI");
            config.import.dry_run = true;
        }
        if self.load_to_workspace {
            config.import.load_to_workspace = true;
        }
        if let Some(chunk_size) = self.chunk_size {
            tracing::info!(chunk_size = chunk_size, "Overriding chunk size from CLI");
            config.import.chunk_size = chunk_size.max(1);
        }

        let store = match open_store(&config).await {
            Ok(s) => s,
            Err(code) => return Ok(code),
        };

        if config.import.dry_run {
            println!("🔍 DRY RUN MODE - No data will be written to the store");
            println!();
        }

        let coordinator = ImportCoordinator::new(store, &config.import)
            .with_page_size(config.export.page_size);
        let summary = match coordinator.import_file(&self.file).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Import failed");
                eprintln!("Import failed: {e}");
                return Ok(exit_code(&e));
            }
        };

        if let Some(format) = summary.format {
            println!("📄 Format: {format}");
        }

        if summary.dry_run {
            println!("Planned entities:");
            for (collection, count) in &summary.planned {
                println!("  {collection}: {count}");
            }
            return Ok(EXIT_SUCCESS);
        }

        println!("✅ Import finished in {:.2}s", summary.duration.as_secs_f64());
        for result in &summary.collections {
            println!(
                "  {}: {} written, {} failed",
                result.collection, result.written, result.failed
            );
        }
        if summary.environments_created > 0 {
            println!("  Environments created: {}", summary.environments_created);
        }

        if self.print_index {
            if let Some(updates) = summary.index_updates_or_none() {
                println!("{}", serde_json::to_string_pretty(updates)?);
            }
        }

        if let Some(errors) = summary.errors_or_none() {
            println!();
            println!("⚠️  {} document(s) could not be written:", errors.len());
            for error in errors {
                println!("  {error}");
            }
            return Ok(EXIT_PARTIAL);
        }

        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{EXIT_CONFIG, EXIT_UNRECOGNIZED};
    use std::io::Write;
    use std::path::Path;

    fn args(file: &Path) -> ImportArgs {
        ImportArgs {
            file: file.to_str().unwrap().to_string(),
            dry_run: false,
            load_to_workspace: false,
            chunk_size: None,
            print_index: false,
        }
    }

    /// Config file keeping the memory snapshot inside `dir`
    fn config_in(dir: &Path, extra: &str) -> String {
        let path = dir.join("arcport.toml");
        let snapshot = dir.join("store.json");
        std::fs::write(
            &path,
            format!("[memory]\nsnapshot_path = {:?}\n{extra}", snapshot.to_str().unwrap()),
        )
        .unwrap();
        path.to_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_import_unrecognized_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        std::fs::write(&data, r#"{"something": "else"}"#).unwrap();

        let code = args(&data)
            .execute(&config_in(dir.path(), ""))
            .await
            .unwrap();
        assert_eq!(code, EXIT_UNRECOGNIZED);
    }

    #[tokio::test]
    async fn test_import_legacy_file() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data.json");
        std::fs::write(
            &data,
            r#"{"url": "http://a", "method": "GET", "headers": "", "name": "one"}"#,
        )
        .unwrap();

        let code = args(&data)
            .execute(&config_in(dir.path(), ""))
            .await
            .unwrap();
        assert_eq!(code, EXIT_SUCCESS);
        assert!(dir.path().join("store.json").exists());
    }

    #[tokio::test]
    async fn test_import_invalid_config() {
        let mut config = tempfile::NamedTempFile::new().unwrap();
        write!(config, "[import]\nchunk_size = 0\n").unwrap();

        let code = args(Path::new("data.json"))
            .execute(config.path().to_str().unwrap())
            .await
            .unwrap();
        assert_eq!(code, EXIT_CONFIG);
    }
}
