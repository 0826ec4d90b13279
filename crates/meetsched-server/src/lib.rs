//! Meeting orchestrator and HTTP surface.
//!
//! This crate wires the credential manager and the Google clients into the
//! meeting creation workflow and exposes it over HTTP:
//! - [`MeetingOrchestrator`] - validate, insert event, send invitation
//! - [`http`] - axum router with the meeting and consent endpoints
//! - [`SignalHandler`] - SIGINT/SIGTERM driven graceful shutdown
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use meetsched_providers::google::{GoogleConfig, OAuthConfig};
//! use meetsched_providers::{ConsentMode, CredentialManager};
//! use meetsched_server::{AppState, MeetingOrchestrator, ServerConfig, SignalHandler, http};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let google = GoogleConfig::new(OAuthConfig::new(
//!         "id.apps.googleusercontent.com",
//!         "secret",
//!         "http://localhost:3000/auth/google",
//!     ));
//!     let credentials = Arc::new(CredentialManager::new(&google, ConsentMode::Browser.delivery())?);
//!     let orchestrator = Arc::new(MeetingOrchestrator::from_google(&google, credentials)?);
//!
//!     let config = ServerConfig::default();
//!     let signals = SignalHandler::new();
//!     signals.spawn_listener();
//!
//!     let listener = http::bind(&config).await?;
//!     http::serve(listener, AppState::new(orchestrator), &config, signals.handle()).await?;
//!     Ok(())
//! }
//! ```

mod config;
mod error;
pub mod http;
mod ids;
mod orchestrator;
mod signals;

pub use config::{ServerConfig, default_bind_addr};
pub use error::{ApiError, ServerError, ServerResult, status_for};
pub use http::{AppState, router};
pub use ids::{RequestIdGenerator, SequentialRequestIds, UuidRequestIds};
pub use orchestrator::{MeetingOrchestrator, MeetingReport, NotificationOutcome, SkipReason};
pub use signals::{ShutdownHandle, SignalHandler};
