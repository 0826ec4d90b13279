//! Google provider configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::{ScheduleError, ScheduleResult};

/// Scope granting read/write access to the organizer's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

/// Scope granting permission to send mail as the organizer.
pub const GMAIL_SEND_SCOPE: &str = "https://www.googleapis.com/auth/gmail.send";

/// OAuth 2.0 client settings for the organizer account.
///
/// All three values come from the Google Cloud Console; the redirect URI must
/// match one registered for the client exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthConfig {
    /// The OAuth 2.0 client ID.
    pub client_id: String,
    /// The OAuth 2.0 client secret.
    pub client_secret: String,
    /// Where Google sends the user back with `?code=...`.
    pub redirect_uri: String,
}

/// Structure of Google's OAuth credentials JSON file.
///
/// Either an "installed" or a "web" section; both may list redirect URIs.
#[derive(Debug, Deserialize)]
struct GoogleCredentialsFile {
    installed: Option<NestedCredentials>,
    web: Option<NestedCredentials>,
}

#[derive(Debug, Deserialize)]
struct NestedCredentials {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl OAuthConfig {
    /// Creates a new OAuth configuration.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_uri: redirect_uri.into(),
        }
    }

    /// Builds a configuration from optional parts, as read from the
    /// environment or a config file.
    ///
    /// Fails with [`ErrorCode::Configuration`](crate::ErrorCode) naming every
    /// missing value.
    pub fn from_parts(
        client_id: Option<String>,
        client_secret: Option<String>,
        redirect_uri: Option<String>,
    ) -> ScheduleResult<Self> {
        let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());

        let missing: Vec<&str> = [
            ("client_id", present(&client_id)),
            ("client_secret", present(&client_secret)),
            ("redirect_uri", present(&redirect_uri)),
        ]
        .iter()
        .filter(|(_, ok)| !ok)
        .map(|(name, _)| *name)
        .collect();

        match (client_id, client_secret, redirect_uri) {
            (Some(id), Some(secret), Some(redirect)) if missing.is_empty() => {
                let config = Self::new(id, secret, redirect);
                config.validate()?;
                Ok(config)
            }
            _ => Err(ScheduleError::configuration(format!(
                "missing Google OAuth settings: {}",
                missing.join(", ")
            ))),
        }
    }

    /// Loads client settings from a Google Cloud Console JSON file.
    ///
    /// The first listed redirect URI is used unless `redirect_uri` is given.
    pub fn from_file(
        path: impl AsRef<Path>,
        redirect_uri: Option<String>,
    ) -> ScheduleResult<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ScheduleError::configuration(format!("failed to read credentials file: {}", e))
        })?;
        Self::from_json(&content, redirect_uri)
    }

    /// Parses client settings from a Google credentials JSON string.
    pub fn from_json(json: &str, redirect_uri: Option<String>) -> ScheduleResult<Self> {
        let file: GoogleCredentialsFile = serde_json::from_str(json).map_err(|e| {
            ScheduleError::configuration(format!("failed to parse credentials JSON: {}", e))
        })?;

        let creds = file.web.or(file.installed).ok_or_else(|| {
            ScheduleError::configuration("credentials file must contain a 'web' or 'installed' section")
        })?;

        let redirect = redirect_uri.or_else(|| creds.redirect_uris.into_iter().next());
        Self::from_parts(Some(creds.client_id), Some(creds.client_secret), redirect)
    }

    /// Validates that every value is set and the redirect URI is a URL.
    pub fn validate(&self) -> ScheduleResult<()> {
        if self.client_id.trim().is_empty() {
            return Err(ScheduleError::configuration("client_id is required"));
        }
        if !self.client_id.ends_with(".apps.googleusercontent.com") {
            return Err(ScheduleError::configuration(
                "client_id should end with .apps.googleusercontent.com",
            ));
        }
        if self.client_secret.trim().is_empty() {
            return Err(ScheduleError::configuration("client_secret is required"));
        }
        if self.redirect_uri.trim().is_empty() {
            return Err(ScheduleError::configuration("redirect_uri is required"));
        }
        Url::parse(&self.redirect_uri).map_err(|e| {
            ScheduleError::configuration(format!("redirect_uri is not a valid URL: {}", e))
        })?;
        Ok(())
    }
}

/// Base URLs of the Google endpoints used by the workflow.
///
/// Defaults point at production; tests point them at a mock server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleEndpoints {
    /// Consent page.
    pub auth_url: String,
    /// Token endpoint (code exchange and refresh).
    pub token_url: String,
    /// Calendar API v3 base.
    pub calendar_base: String,
    /// Gmail API base (without the `/gmail/v1` suffix).
    pub gmail_base: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            calendar_base: "https://www.googleapis.com/calendar/v3".to_string(),
            gmail_base: "https://gmail.googleapis.com".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// Points every endpoint at one base URL, laid out like the real APIs.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            auth_url: format!("{base}/o/oauth2/v2/auth"),
            token_url: format!("{base}/token"),
            calendar_base: format!("{base}/calendar/v3"),
            gmail_base: base.to_string(),
        }
    }
}

/// Configuration for the Google-backed workflow.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    /// OAuth client settings.
    pub oauth: OAuthConfig,

    /// Endpoint base URLs.
    pub endpoints: GoogleEndpoints,

    /// Calendar events are created in. Defaults to `primary`.
    pub calendar_id: String,

    /// Timeout applied to every remote call.
    pub timeout: Duration,

    /// User agent string for API requests.
    pub user_agent: String,

    /// OAuth scopes requested at consent.
    pub scopes: Vec<String>,
}

impl GoogleConfig {
    /// Default timeout in seconds.
    pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

    /// Creates a new Google configuration with production endpoints.
    pub fn new(oauth: OAuthConfig) -> Self {
        Self {
            oauth,
            endpoints: GoogleEndpoints::default(),
            calendar_id: "primary".to_string(),
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
            user_agent: format!("meetsched/{}", env!("CARGO_PKG_VERSION")),
            scopes: vec![CALENDAR_SCOPE.to_string(), GMAIL_SEND_SCOPE.to_string()],
        }
    }

    /// Sets the endpoint base URLs.
    pub fn with_endpoints(mut self, endpoints: GoogleEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Sets the calendar ID events are created in.
    pub fn with_calendar_id(mut self, id: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the OAuth scopes.
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Builds an HTTP client honouring the timeout and user agent.
    pub(crate) fn http_client(&self) -> ScheduleResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.clone())
            .build()
            .map_err(|e| {
                ScheduleError::internal(format!("failed to create HTTP client: {}", e))
                    .with_source(e)
            })
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ScheduleResult<()> {
        self.oauth.validate()?;

        if self.scopes.is_empty() {
            return Err(ScheduleError::configuration(
                "at least one OAuth scope is required",
            ));
        }
        if self.calendar_id.trim().is_empty() {
            return Err(ScheduleError::configuration("calendar_id must not be empty"));
        }
        if self.timeout.is_zero() {
            return Err(ScheduleError::configuration("timeout must be positive"));
        }

        Ok(())
    }
}
