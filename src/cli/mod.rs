//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for arcport using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// arcport - REST client data interchange
#[derive(Parser, Debug)]
#[command(name = "arcport")]
#[command(version, about, long_about = None)]
#[command(author = "Arcport Contributors")]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "arcport.toml", env = "ARCPORT_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ARCPORT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Import a data file into the configured store
    Import(commands::import::ImportArgs),

    /// Export stored data to a portable data file
    Export(commands::export::ExportArgs),

    /// Detect the format of a data file
    Detect(commands::detect::DetectArgs),

    /// Rename an environment and move its variables
    RenameEnv(commands::environment::RenameEnvArgs),

    /// Delete a client certificate and its data record
    DeleteCert(commands::certificate::DeleteCertArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}
