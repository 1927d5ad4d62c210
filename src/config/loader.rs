//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::{ArcportConfig, PostgreSQLConfig};
use super::secret::secret_string;
use crate::domain::errors::ArcportError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (${VAR} syntax)
/// 3. Parses the TOML into ArcportConfig
/// 4. Applies environment variable overrides (ARCPORT_* prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced variable is not
/// set, parsing fails or validation fails.
///
/// # Examples
///
/// ```no_run
/// use arcport::config::loader::load_config;
///
/// let config = load_config("arcport.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<ArcportConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ArcportError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        ArcportError::Configuration(format!(
            "Failed to read configuration file {}: {e}",
            path.display()
        ))
    })?;

    load_config_from_str(&contents)
}

/// Loads configuration from a file if it exists, otherwise from defaults
///
/// Environment overrides and validation apply in both cases.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<ArcportConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using defaults"
    );
    finish(ArcportConfig::default())
}

/// Parses configuration from TOML text
///
/// # Errors
///
/// Returns an error if substitution, parsing or validation fails.
pub fn load_config_from_str(contents: &str) -> Result<ArcportConfig> {
    let contents = substitute_env_vars(contents)?;

    let config: ArcportConfig = toml::from_str(&contents)
        .map_err(|e| ArcportError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(config)
}

fn finish(mut config: ArcportConfig) -> Result<ArcportConfig> {
    apply_env_overrides(&mut config)?;

    config.validate().map_err(|e| {
        ArcportError::Configuration(format!("Configuration validation failed: {e}"))
    })?;

    Ok(config)
}

fn env_var_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("environment variable pattern is valid")
    })
}

/// Substitutes environment variables in the format ${VAR_NAME}
///
/// Comment lines are copied unchanged.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = env_var_pattern();
    let mut missing_vars: Vec<String> = Vec::new();

    let lines: Vec<String> = input
        .lines()
        .map(|line| {
            if line.trim_start().starts_with('#') {
                return line.to_string();
            }
            re.replace_all(line, |cap: &regex::Captures<'_>| {
                let var_name = &cap[1];
                match std::env::var(var_name) {
                    Ok(value) => value,
                    Err(_) => {
                        if !missing_vars.iter().any(|v| v == var_name) {
                            missing_vars.push(var_name.to_string());
                        }
                        cap[0].to_string()
                    }
                }
            })
            .into_owned()
        })
        .collect();

    if !missing_vars.is_empty() {
        return Err(ArcportError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(lines.join("\n"))
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(val) => val.trim().parse().map(Some).map_err(|_| {
            ArcportError::Configuration(format!("Invalid value for {name}: '{val}'"))
        }),
        Err(_) => Ok(None),
    }
}

/// Applies environment variable overrides using ARCPORT_* prefix
///
/// Environment variables follow the pattern: ARCPORT_<SECTION>_<KEY>
/// For example: ARCPORT_STORE_BACKEND, ARCPORT_EXPORT_PAGE_SIZE
fn apply_env_overrides(config: &mut ArcportConfig) -> Result<()> {
    // Application overrides
    if let Ok(val) = std::env::var("ARCPORT_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("ARCPORT_APPLICATION_APP_VERSION") {
        config.application.app_version = val;
    }

    // Store overrides
    if let Ok(val) = std::env::var("ARCPORT_STORE_BACKEND") {
        config.store.backend = val.parse().map_err(ArcportError::Configuration)?;
    }
    if let Ok(val) = std::env::var("ARCPORT_MEMORY_SNAPSHOT_PATH") {
        config.memory.snapshot_path = if val.is_empty() { None } else { Some(val) };
    }

    // PostgreSQL overrides; a connection string alone is enough to create the section
    if let Ok(val) = std::env::var("ARCPORT_POSTGRESQL_CONNECTION_STRING") {
        match config.postgresql.as_mut() {
            Some(pg) => pg.connection_string = secret_string(val),
            None => {
                config.postgresql = Some(PostgreSQLConfig {
                    connection_string: secret_string(val),
                    max_connections: 10,
                    connection_timeout_seconds: 30,
                    statement_timeout_seconds: 60,
                })
            }
        }
    }
    if let Some(pg) = config.postgresql.as_mut() {
        if let Some(max) = parse_env("ARCPORT_POSTGRESQL_MAX_CONNECTIONS")? {
            pg.max_connections = max;
        }
        if let Some(timeout) = parse_env("ARCPORT_POSTGRESQL_CONNECTION_TIMEOUT_SECONDS")? {
            pg.connection_timeout_seconds = timeout;
        }
        if let Some(timeout) = parse_env("ARCPORT_POSTGRESQL_STATEMENT_TIMEOUT_SECONDS")? {
            pg.statement_timeout_seconds = timeout;
        }
    }

    // Import overrides
    if let Some(size) = parse_env("ARCPORT_IMPORT_CHUNK_SIZE")? {
        config.import.chunk_size = size;
    }
    if let Some(entry) = parse_env("ARCPORT_IMPORT_HAR_REFERENCE_ENTRY")? {
        config.import.har_reference_entry = entry;
    }
    if let Some(flag) = parse_env("ARCPORT_IMPORT_LOAD_TO_WORKSPACE")? {
        config.import.load_to_workspace = flag;
    }
    if let Some(flag) = parse_env("ARCPORT_IMPORT_DRY_RUN")? {
        config.import.dry_run = flag;
    }

    // Export overrides
    if let Some(size) = parse_env("ARCPORT_EXPORT_PAGE_SIZE")? {
        config.export.page_size = size;
    }
    if let Ok(val) = std::env::var("ARCPORT_EXPORT_KIND") {
        config.export.kind = val;
    }

    // Logging overrides
    if let Some(flag) = parse_env("ARCPORT_LOGGING_LOCAL_ENABLED")? {
        config.logging.local_enabled = flag;
    }
    if let Ok(val) = std::env::var("ARCPORT_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
    if let Ok(val) = std::env::var("ARCPORT_LOGGING_LOCAL_ROTATION") {
        config.logging.local_rotation = val;
    }

    Ok(())
}
