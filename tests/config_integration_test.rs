//! Integration tests for configuration loading and validation
//!
//! Note: Tests that modify environment variables should be run with --test-threads=1
//! to avoid interference between tests.

use arcport::config::{load_config, load_config_or_default, StoreBackend};
use arcport::domain::kinds;
use secrecy::ExposeSecret;
use std::io::Write;
use std::sync::Mutex;
use tempfile::NamedTempFile;

// Mutex to serialize tests that modify environment variables
static ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Helper function to clean up environment variables
fn cleanup_env_vars() {
    std::env::remove_var("ARCPORT_APPLICATION_LOG_LEVEL");
    std::env::remove_var("ARCPORT_STORE_BACKEND");
    std::env::remove_var("ARCPORT_IMPORT_CHUNK_SIZE");
    std::env::remove_var("ARCPORT_EXPORT_PAGE_SIZE");
    std::env::remove_var("ARCPORT_MEMORY_SNAPSHOT_PATH");
    std::env::remove_var("TEST_ARCPORT_PG_PASSWORD");
}

fn write_config(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_complete_config() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let file = write_config(
        r#"
[application]
log_level = "debug"
app_version = "14.0.0"

[store]
backend = "postgresql"

[postgresql]
connection_string = "postgresql://arc:pw@localhost:5432/arc"
max_connections = 5

[import]
chunk_size = 50
har_reference_entry = 1
load_to_workspace = true

[export]
page_size = 250
kind = "ARC#SavedDataExport"

[logging]
local_enabled = true
local_path = "/tmp/arcport-logs"
local_rotation = "hourly"
"#,
    );

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.application.app_version, "14.0.0");
    assert_eq!(config.store.backend, StoreBackend::PostgreSQL);
    let pg = config.postgresql.as_ref().unwrap();
    assert_eq!(pg.max_connections, 5);
    assert_eq!(pg.connection_timeout_seconds, 30);
    assert_eq!(config.import.chunk_size, 50);
    assert_eq!(config.import.har_reference_entry, 1);
    assert!(config.import.load_to_workspace);
    assert_eq!(config.export.page_size, 250);
    assert_eq!(config.export.kind, kinds::SAVED_DATA_EXPORT);
    assert_eq!(config.logging.local_rotation, "hourly");
}

#[test]
fn test_load_minimal_config_with_defaults() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    let file = write_config("");

    let config = load_config(file.path()).unwrap();
    assert_eq!(config.application.log_level, "info");
    assert_eq!(config.application.app_version, env!("CARGO_PKG_VERSION"));
    assert_eq!(config.store.backend, StoreBackend::Memory);
    assert_eq!(config.import.chunk_size, 200);
    assert_eq!(config.export.page_size, 1000);
    assert_eq!(config.export.kind, kinds::ALL_DATA_EXPORT);
    assert!(!config.logging.local_enabled);
}

#[test]
fn test_missing_file() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let err = load_config("/nonexistent/arcport.toml").unwrap_err();
    assert!(err.to_string().contains("not found"));

    let config = load_config_or_default("/nonexistent/arcport.toml").unwrap();
    assert_eq!(config.store.backend, StoreBackend::Memory);
}

#[test]
fn test_env_var_substitution() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("TEST_ARCPORT_PG_PASSWORD", "s3cret");

    let file = write_config(
        r#"
[store]
backend = "postgresql"

[postgresql]
# password comes from ${TEST_ARCPORT_UNSET_IN_COMMENT}
connection_string = "postgresql://arc:${TEST_ARCPORT_PG_PASSWORD}@db:5432/arc"
"#,
    );

    let config = load_config(file.path()).unwrap();
    let pg = config.postgresql.unwrap();
    assert_eq!(
        &**pg.connection_string.expose_secret(),
        "postgresql://arc:s3cret@db:5432/arc"
    );

    cleanup_env_vars();
}

#[test]
fn test_missing_env_var_is_reported() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config(
        r#"
[postgresql]
connection_string = "postgresql://arc:${TEST_ARCPORT_PG_PASSWORD}@db/arc"
"#,
    );

    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("TEST_ARCPORT_PG_PASSWORD"));
}

#[test]
fn test_env_var_overrides() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();
    std::env::set_var("ARCPORT_APPLICATION_LOG_LEVEL", "trace");
    std::env::set_var("ARCPORT_IMPORT_CHUNK_SIZE", "1000");
    std::env::set_var("ARCPORT_EXPORT_PAGE_SIZE", "20");
    std::env::set_var("ARCPORT_MEMORY_SNAPSHOT_PATH", "");

    let file = write_config("[import]\nchunk_size = 10\n");
    let config = load_config(file.path()).unwrap();

    assert_eq!(config.application.log_level, "trace");
    assert_eq!(config.import.chunk_size, 1000);
    assert_eq!(config.export.page_size, 20);
    assert_eq!(config.memory.snapshot_path, None);

    cleanup_env_vars();
}

#[test]
fn test_invalid_config_validation() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    for content in [
        "[import]\nchunk_size = 0\n",
        "[import]\nchunk_size = 5001\n",
        "[export]\npage_size = 5\n",
        "[export]\nkind = \"AllDataExport\"\n",
        "[store]\nbackend = \"postgresql\"\n",
        "[application]\nlog_level = \"verbose\"\n",
        "[logging]\nlocal_rotation = \"weekly\"\n",
    ] {
        let file = write_config(content);
        let err = load_config(file.path()).unwrap_err();
        assert!(
            err.to_string().contains("Configuration"),
            "expected configuration error for {content:?}, got {err}"
        );
    }
}

#[test]
fn test_invalid_toml() {
    let _lock = ENV_MUTEX.lock().unwrap();
    cleanup_env_vars();

    let file = write_config("[import\nchunk_size = ");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse TOML"));
}
