//! Consent URL command.

use std::sync::Arc;

use meetsched_providers::{CredentialManager, ReturnToCaller};

use crate::config::AppConfig;
use crate::error::CliResult;

/// Prints the consent URL without starting a server.
///
/// The code Google redirects back with can only be exchanged by a running
/// `meetsched serve` listening on the redirect URI.
pub fn run(config: &AppConfig) -> CliResult<()> {
    let google = config.google.to_provider_config()?;
    let credentials = CredentialManager::new(&google, Arc::new(ReturnToCaller))?;
    println!("{}", credentials.build_consent_url()?);
    Ok(())
}
