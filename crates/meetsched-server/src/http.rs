//! HTTP surface.
//!
//! | Route                            | Purpose                              |
//! |----------------------------------|--------------------------------------|
//! | `POST /`                         | create a meeting                     |
//! | `GET /auth/google/refresh-token` | start consent                        |
//! | `GET /auth/google?code=...`      | consent redirect, exchanges the code |
//! | `GET /auth/status`               | current authorization state          |

use std::future::IntoFuture;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use meetsched_core::{MeetingRequest, MeetingResult};
use meetsched_providers::{AuthState, ConsentOutcome, ErrorCode, ScheduleError};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::{ApiError, ServerError, ServerResult};
use crate::orchestrator::MeetingOrchestrator;
use crate::signals::ShutdownHandle;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<MeetingOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<MeetingOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", post(create_meeting))
        .route("/auth/google/refresh-token", get(request_consent))
        .route("/auth/google", get(oauth_callback))
        .route("/auth/status", get(auth_status))
        .with_state(state)
}

/// Binds the configured address.
pub async fn bind(config: &ServerConfig) -> ServerResult<TcpListener> {
    TcpListener::bind(config.bind)
        .await
        .map_err(|source| ServerError::Bind {
            addr: config.bind,
            source,
        })
}

/// Serves until shutdown is requested, then drains for at most the
/// configured grace period.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    config: &ServerConfig,
    shutdown: ShutdownHandle,
) -> ServerResult<()> {
    let addr = listener.local_addr()?;
    info!(%addr, "HTTP server listening");

    let graceful = shutdown.clone();
    let server = axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { graceful.wait().await })
        .into_future();

    let grace = config.shutdown_grace;
    tokio::select! {
        result = server => result?,
        _ = async {
            shutdown.wait().await;
            tokio::time::sleep(grace).await;
        } => {
            warn!(grace_secs = grace.as_secs(), "grace period elapsed, dropping open connections");
        }
    }

    info!("HTTP server stopped");
    Ok(())
}

async fn create_meeting(
    State(state): State<AppState>,
    payload: Result<Json<MeetingRequest>, JsonRejection>,
) -> Result<Json<MeetingResult>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        ApiError::new(rejection.status(), ErrorCode::Validation, rejection.body_text())
    })?;

    debug!(summary = %req.summary, attendees = req.attendees_emails.len(), "create meeting");
    let result = state.orchestrator.create_meeting(&req).await?;
    Ok(Json(result))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ConsentUrlBody {
    consent_url: String,
}

async fn request_consent(State(state): State<AppState>) -> Result<Response, ApiError> {
    let credentials = Arc::clone(state.orchestrator.credentials());
    // Browser delivery may spawn a process and wait on it.
    let outcome = tokio::task::spawn_blocking(move || credentials.request_consent())
        .await
        .map_err(|e| ScheduleError::internal(format!("consent delivery task failed: {e}")))??;

    Ok(match outcome {
        ConsentOutcome::ReturnToCaller(url) => Json(ConsentUrlBody {
            consent_url: url.to_string(),
        })
        .into_response(),
        ConsentOutcome::Opened | ConsentOutcome::Printed => StatusCode::NO_CONTENT.into_response(),
    })
}

#[derive(Debug, Deserialize)]
struct CallbackParams {
    code: Option<String>,
    error: Option<String>,
}

async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Result<StatusCode, ApiError> {
    if let Some(error) = params.error {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::AuthExchange,
            format!("consent was not granted: {error}"),
        ));
    }
    let Some(code) = params.code else {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCode::AuthExchange,
            "missing 'code' query parameter",
        ));
    };

    state.orchestrator.credentials().exchange_code(&code).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct StatusBody {
    state: AuthState,
}

async fn auth_status(State(state): State<AppState>) -> Json<StatusBody> {
    Json(StatusBody {
        state: state.orchestrator.credentials().auth_state(),
    })
}
