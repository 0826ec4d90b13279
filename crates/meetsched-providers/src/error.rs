//! Error types for credential and provider operations.
//!
//! Every failure the scheduling workflow can surface is a [`ScheduleError`]
//! carrying an [`ErrorCode`]. The code decides how far the failure travels:
//! everything aborts the current operation except
//! [`ErrorCode::Notification`], which the orchestrator recovers locally.

use std::fmt;

use meetsched_core::ValidationError;
use thiserror::Error;

/// The category of a scheduling error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Missing or invalid setup (client id/secret/redirect URI).
    Configuration,
    /// No access token has been established yet, or it can no longer be
    /// refreshed.
    NotAuthorized,
    /// The authorization code was rejected (invalid, expired, reused).
    AuthExchange,
    /// The meeting request is malformed.
    Validation,
    /// The calendar or token endpoint refused the call or failed.
    ProviderRejected,
    /// A remote call did not finish in time.
    ProviderTimeout,
    /// The invitation email could not be sent.
    Notification,
    /// The provider answered with something we could not parse.
    InvalidResponse,
    /// Unexpected internal state.
    Internal,
}

impl ErrorCode {
    /// Returns a stable snake_case name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "configuration_error",
            Self::NotAuthorized => "not_authorized",
            Self::AuthExchange => "auth_exchange_failed",
            Self::Validation => "validation_error",
            Self::ProviderRejected => "provider_rejected",
            Self::ProviderTimeout => "provider_timeout",
            Self::Notification => "notification_failed",
            Self::InvalidResponse => "invalid_response",
            Self::Internal => "internal_error",
        }
    }

    /// Returns true if an error of this kind is recovered where it happens
    /// instead of failing the caller's operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Notification)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error raised while authorizing or talking to a provider.
#[derive(Debug, Error)]
pub struct ScheduleError {
    code: ErrorCode,
    message: String,
    /// The remote service involved (e.g. "calendar", "gmail", "oauth").
    provider: Option<String>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ScheduleError {
    /// Creates a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider: None,
            source: None,
        }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Configuration, message)
    }

    /// Creates a not-authorized error.
    pub fn not_authorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotAuthorized, message)
    }

    /// Creates an authorization-code exchange error.
    pub fn auth_exchange(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthExchange, message)
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Validation, message)
    }

    /// Creates a provider rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderRejected, message)
    }

    /// Creates a provider timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProviderTimeout, message)
    }

    /// Creates a notification error.
    pub fn notification(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Notification, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidResponse, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }

    /// Maps a transport failure: timeouts become [`ErrorCode::ProviderTimeout`],
    /// everything else [`ErrorCode::ProviderRejected`].
    pub fn from_transport(context: &str, err: reqwest::Error) -> Self {
        let base = if err.is_timeout() {
            Self::timeout(format!("{context}: request timed out"))
        } else if err.is_connect() {
            Self::rejected(format!("{context}: connection failed: {err}"))
        } else {
            Self::rejected(format!("{context}: request failed: {err}"))
        };
        base.with_source(err)
    }

    /// Sets the provider name for this error.
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the provider name, if set.
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref provider) = self.provider {
            write!(f, "[{}] ", provider)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl From<ValidationError> for ScheduleError {
    fn from(err: ValidationError) -> Self {
        Self::validation(err.to_string()).with_source(err)
    }
}

/// A specialized Result type for scheduling operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;
