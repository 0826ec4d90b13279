//! CLI error types.

use std::io;
use std::path::PathBuf;

use meetsched_core::TracingError;
use meetsched_providers::ScheduleError;
use meetsched_server::ServerError;
use thiserror::Error;

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

/// Errors that end a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// The config file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The config file is not valid TOML for our schema.
    #[error("failed to parse config {}: {source}", .path.display())]
    ParseConfig {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A `pass::` or `env::` reference could not be resolved.
    #[error("failed to resolve {field}: {message}")]
    Secret { field: &'static str, message: String },

    /// Credential or provider setup failed.
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    /// The HTTP server failed.
    #[error(transparent)]
    Server(#[from] ServerError),

    /// Logging could not be initialized.
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
