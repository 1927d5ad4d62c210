//! CLI command implementations
//!
//! Commands return process exit codes:
//!
//! | Code | Meaning |
//! |------|---------|
//! | 0 | Success |
//! | 1 | Partial failure (some documents were not written) |
//! | 2 | Configuration error |
//! | 3 | Unrecognized input |
//! | 4 | Store connection error |
//! | 5 | Fatal error |

pub mod certificate;
pub mod detect;
pub mod environment;
pub mod export;
pub mod import;
pub mod init;
pub mod validate;

use crate::adapters::database::{create_document_store, DocumentStore};
use crate::config::{load_config_or_default, ArcportConfig};
use crate::domain::ArcportError;
use std::sync::Arc;

/// Exit code: success
pub const EXIT_SUCCESS: i32 = 0;
/// Exit code: some documents failed
pub const EXIT_PARTIAL: i32 = 1;
/// Exit code: invalid configuration
pub const EXIT_CONFIG: i32 = 2;
/// Exit code: the input file is not a known format
pub const EXIT_UNRECOGNIZED: i32 = 3;
/// Exit code: the store could not be opened
pub const EXIT_STORE: i32 = 4;
/// Exit code: anything else
pub const EXIT_FATAL: i32 = 5;

/// Exit code for an error
pub fn exit_code(error: &ArcportError) -> i32 {
    match error {
        ArcportError::Configuration(_) => EXIT_CONFIG,
        ArcportError::UnknownFormat(_) | ArcportError::Parse(_) => EXIT_UNRECOGNIZED,
        ArcportError::Store(_) | ArcportError::Database(_) => EXIT_STORE,
        _ => EXIT_FATAL,
    }
}

/// Load the configuration, printing the error and returning its exit code on failure
pub(crate) fn load_configuration(config_path: &str) -> Result<ArcportConfig, i32> {
    load_config_or_default(config_path).map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        eprintln!("Failed to load configuration: {e}");
        EXIT_CONFIG
    })
}

/// Open the configured store, printing the error and returning its exit code on failure
pub(crate) async fn open_store(config: &ArcportConfig) -> Result<Arc<dyn DocumentStore>, i32> {
    match create_document_store(config).await {
        Ok(store) => Ok(store),
        Err(e) => {
            tracing::error!(error = %e, "Failed to open document store");
            eprintln!("Failed to open document store: {e}");
            Err(match e {
                ArcportError::Configuration(_) => EXIT_CONFIG,
                _ => EXIT_STORE,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StoreError;

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code(&ArcportError::Configuration("x".into())), EXIT_CONFIG);
        assert_eq!(exit_code(&ArcportError::UnknownFormat("x".into())), EXIT_UNRECOGNIZED);
        assert_eq!(exit_code(&ArcportError::Parse("x".into())), EXIT_UNRECOGNIZED);
        assert_eq!(
            exit_code(&ArcportError::Store(StoreError::Backend("down".into()))),
            EXIT_STORE
        );
        assert_eq!(exit_code(&ArcportError::Io("x".into())), EXIT_FATAL);
    }
}
