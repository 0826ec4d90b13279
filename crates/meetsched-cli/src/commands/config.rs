//! Configuration commands.

use std::path::Path;

use tracing::debug;

use crate::config::AppConfig;
use crate::error::{CliError, CliResult};

/// Dumps the effective configuration loaded from `path`, secrets masked.
pub fn dump(path: &Path, config: &AppConfig) -> CliResult<()> {
    println!("{}", dump_text(path, config)?);
    Ok(())
}

/// Validates the configuration, resolving secret references.
pub fn validate(config: &AppConfig) -> CliResult<()> {
    let google = config.google.to_provider_config()?;
    debug!(client_id = %google.oauth.client_id, "Google settings resolved");
    println!("Google credentials are complete.");
    println!("Configuration is valid.");
    Ok(())
}

/// Shows the configuration file path.
pub fn path(path: &Path) -> CliResult<()> {
    println!("config: {}", path.display());
    Ok(())
}

fn dump_text(path: &Path, config: &AppConfig) -> CliResult<String> {
    Ok(format!("# config.toml ({})\n{}", path.display(), render(config)?))
}

fn render(config: &AppConfig) -> CliResult<String> {
    let mut masked = config.clone();
    masked.google.client_secret = masked.google.client_secret.map(|s| mask(&s));
    toml::to_string_pretty(&masked)
        .map_err(|e| CliError::Config(format!("failed to serialize config: {}", e)))
}

/// Keeps secret references readable, hides inline values.
fn mask(value: &str) -> String {
    if value.starts_with("pass::") || value.starts_with("env::") {
        value.to_string()
    } else {
        "********".to_string()
    }
}
