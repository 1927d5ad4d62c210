//! Detect command implementation

use super::{exit_code, EXIT_SUCCESS};
use crate::core::transform::{classify, parse_input};
use crate::domain::context::ResultExt;
use clap::Args;

/// Arguments for the detect command
#[derive(Args, Debug)]
pub struct DetectArgs {
    /// Data file to inspect
    pub file: String,
}

impl DetectArgs {
    /// Execute the detect command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        let detected = tokio::fs::read_to_string(&self.file)
            .await
            .with_context(|| format!("Failed to read {}", self.file))
            .and_then(|content| parse_input(&content))
            .and_then(|raw| classify(&raw));

        match detected {
            Ok(format) => {
                tracing::info!(file = %self.file, format = %format, "Detected format");
                println!("{format}");
                Ok(EXIT_SUCCESS)
            }
            Err(e) => {
                eprintln!("{}: {e}", self.file);
                Ok(exit_code(&e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::commands::{EXIT_FATAL, EXIT_UNRECOGNIZED};
    use std::io::Write;

    async fn detect(content: &str) -> i32 {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        DetectArgs {
            file: file.path().to_str().unwrap().to_string(),
        }
        .execute()
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_detect_known_format() {
        let code = detect(r#"{"_postman_variable_scope": "environment", "values": []}"#).await;
        assert_eq!(code, EXIT_SUCCESS);
    }

    #[tokio::test]
    async fn test_detect_unknown_and_invalid() {
        assert_eq!(detect("[1, 2]").await, EXIT_UNRECOGNIZED);
        assert_eq!(detect("not json").await, EXIT_UNRECOGNIZED);
    }

    #[tokio::test]
    async fn test_detect_missing_file() {
        let code = DetectArgs {
            file: "/nonexistent/arcport/file.json".to_string(),
        }
        .execute()
        .await
        .unwrap();
        assert_eq!(code, EXIT_FATAL);
    }
}
