//! Serve command: runs the HTTP server in the foreground.
//!
//! Builds the credential manager and orchestrator from configuration, binds
//! the listener and serves until SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;

use meetsched_providers::{ConsentMode, CredentialManager};
use meetsched_server::{AppState, MeetingOrchestrator, SignalHandler, http};
use tracing::info;

use crate::config::AppConfig;
use crate::error::CliResult;

/// Starts the server and blocks until shutdown.
pub async fn run(
    config: &AppConfig,
    bind: Option<SocketAddr>,
    consent: Option<ConsentMode>,
) -> CliResult<()> {
    let google = config.google.to_provider_config()?;
    let delivery = consent.unwrap_or(config.consent.delivery);

    let credentials = Arc::new(CredentialManager::new(&google, delivery.delivery())?);
    let orchestrator = Arc::new(MeetingOrchestrator::from_google(&google, credentials)?);

    let server_config = config.server.to_server_config(bind);
    let signal_handler = SignalHandler::new();
    signal_handler.spawn_listener();

    let listener = http::bind(&server_config).await?;
    info!(
        calendar = %google.calendar_id,
        consent = %delivery,
        "open /auth/google/refresh-token to authorize the organizer"
    );

    http::serve(
        listener,
        AppState::new(orchestrator),
        &server_config,
        signal_handler.handle(),
    )
    .await?;
    Ok(())
}
