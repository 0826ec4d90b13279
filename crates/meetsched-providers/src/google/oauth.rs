//! OAuth 2.0 authorization code flow against Google's endpoints.
//!
//! # Flow Overview
//!
//! 1. Build the consent URL (offline access, forced consent)
//! 2. The organizer grants access; Google redirects to the configured
//!    redirect URI with `?code=...`
//! 3. Exchange the code for an access/refresh token pair
//! 4. Later, trade the refresh token for new access tokens as they expire
//!
//! `prompt=consent` is sent on every consent URL: Google omits the refresh
//! token on repeat authorizations unless consent is forced.

use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use crate::error::{ScheduleError, ScheduleResult};

use super::config::{GoogleConfig, OAuthConfig};
use super::tokens::TokenInfo;

/// OAuth client for the organizer account.
#[derive(Debug)]
pub struct OAuthClient {
    oauth: OAuthConfig,
    auth_url: String,
    token_url: String,
    scopes: Vec<String>,
    http_client: reqwest::Client,
}

impl OAuthClient {
    /// Creates a new OAuth client from the provider configuration.
    pub fn new(config: &GoogleConfig) -> ScheduleResult<Self> {
        Ok(Self {
            oauth: config.oauth.clone(),
            auth_url: config.endpoints.auth_url.clone(),
            token_url: config.endpoints.token_url.clone(),
            scopes: config.scopes.clone(),
            http_client: config.http_client()?,
        })
    }

    /// Returns the client settings this OAuth client was built with.
    pub fn settings(&self) -> &OAuthConfig {
        &self.oauth
    }

    /// Builds the consent URL requesting offline access to the configured
    /// scopes.
    pub fn build_consent_url(&self) -> ScheduleResult<Url> {
        self.oauth.validate()?;

        let scope = self.scopes.join(" ");
        Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.oauth.client_id.as_str()),
                ("redirect_uri", self.oauth.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", scope.as_str()),
                ("access_type", "offline"),
                ("prompt", "consent"),
            ],
        )
        .map_err(|e| {
            ScheduleError::configuration(format!("invalid authorization endpoint: {}", e))
        })
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// A 4xx answer means the code is invalid, expired or already used.
    pub async fn exchange_code(&self, code: &str) -> ScheduleResult<TokenInfo> {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.oauth.redirect_uri.as_str()),
        ];

        debug!(url = %self.token_url, "exchanging authorization code");
        let (status, body) = self.post_form(&params, "token exchange").await?;

        if status.is_client_error() {
            return Err(ScheduleError::auth_exchange(format!(
                "authorization code rejected ({}): {}",
                status,
                describe_oauth_error(&body)
            ))
            .with_provider("oauth"));
        }
        if !status.is_success() {
            return Err(ScheduleError::rejected(format!(
                "token exchange failed ({}): {}",
                status, body
            ))
            .with_provider("oauth"));
        }

        let token_response = parse_token_response(&body)?;
        info!(
            has_refresh_token = token_response.refresh_token.is_some(),
            "obtained tokens from authorization code"
        );
        Ok(TokenInfo::new(
            token_response.access_token,
            token_response.refresh_token,
            token_response.expires_in,
        ))
    }

    /// Refreshes an expired access token.
    ///
    /// Returns the new access token and its lifetime in seconds. A rejected
    /// refresh token surfaces as not-authorized: consent must be repeated.
    pub async fn refresh_token(&self, refresh_token: &str) -> ScheduleResult<(String, Option<i64>)> {
        let params = [
            ("client_id", self.oauth.client_id.as_str()),
            ("client_secret", self.oauth.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let (status, body) = self.post_form(&params, "token refresh").await?;

        if status.is_client_error() {
            return Err(ScheduleError::not_authorized(format!(
                "refresh token rejected ({}): {} - re-authorization required",
                status,
                describe_oauth_error(&body)
            ))
            .with_provider("oauth"));
        }
        if !status.is_success() {
            return Err(ScheduleError::rejected(format!(
                "token refresh failed ({}): {}",
                status, body
            ))
            .with_provider("oauth"));
        }

        let token_response = parse_token_response(&body)?;
        info!("refreshed access token");
        Ok((token_response.access_token, token_response.expires_in))
    }

    async fn post_form(
        &self,
        params: &[(&str, &str)],
        context: &str,
    ) -> ScheduleResult<(reqwest::StatusCode, String)> {
        let response = self
            .http_client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| ScheduleError::from_transport(context, e).with_provider("oauth"))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ScheduleError::from_transport(context, e).with_provider("oauth"))?;
        Ok((status, body))
    }
}

/// Response from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Error body from Google's token endpoint.
#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn parse_token_response(body: &str) -> ScheduleResult<TokenResponse> {
    serde_json::from_str(body).map_err(|e| {
        ScheduleError::invalid_response(format!("invalid token response: {}", e))
            .with_provider("oauth")
            .with_source(e)
    })
}

fn describe_oauth_error(body: &str) -> String {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(OAuthErrorBody {
            error,
            error_description: Some(description),
        }) => format!("{error}: {description}"),
        Ok(OAuthErrorBody { error, .. }) => error,
        Err(_) => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::google::config::{CALENDAR_SCOPE, GMAIL_SEND_SCOPE, GoogleEndpoints};
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base: &str) -> GoogleConfig {
        GoogleConfig::new(OAuthConfig::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
            "http://localhost:3000/auth/google",
        ))
        .with_endpoints(GoogleEndpoints::with_base(base))
    }

    #[test]
    fn consent_url_format() {
        let client = OAuthClient::new(&GoogleConfig::new(OAuthConfig::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
            "http://localhost:3000/auth/google",
        )))
        .unwrap();
        let url = client.build_consent_url().unwrap();

        assert!(url.as_str().starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let get = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("client_id"), Some("test-client.apps.googleusercontent.com"));
        assert_eq!(get("redirect_uri"), Some("http://localhost:3000/auth/google"));
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("access_type"), Some("offline"));
        assert_eq!(get("prompt"), Some("consent"));
        assert_eq!(
            get("scope"),
            Some(format!("{CALENDAR_SCOPE} {GMAIL_SEND_SCOPE}").as_str())
        );
    }

    #[test]
    fn consent_url_requires_complete_settings() {
        let mut config = test_config("http://127.0.0.1:1");
        config.oauth.redirect_uri = String::new();
        let client = OAuthClient::new(&config).unwrap();
        let err = client.build_consent_url().unwrap_err();
        assert_eq!(err.code(), ErrorCode::Configuration);
    }

    #[tokio::test]
    async fn exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .and(body_string_contains("code=good-code"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"access_token": "ya29.access", "refresh_token": "1//refresh", "expires_in": 3599, "token_type": "Bearer"}"#,
                "application/json",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = OAuthClient::new(&test_config(&server.uri())).unwrap();
        let tokens = client.exchange_code("good-code").await.unwrap();

        assert_eq!(tokens.access_token, "ya29.access");
        assert_eq!(tokens.refresh_token.as_deref(), Some("1//refresh"));
        assert!(!tokens.is_expired());
    }

    #[tokio::test]
    async fn exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error": "invalid_grant", "error_description": "Bad Request"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = OAuthClient::new(&test_config(&server.uri())).unwrap();
        let err = client.exchange_code("stale-code").await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::AuthExchange);
        assert!(err.message().contains("invalid_grant: Bad Request"));
    }

    #[tokio::test]
    async fn exchange_code_server_error_is_provider_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = OAuthClient::new(&test_config(&server.uri())).unwrap();
        let err = client.exchange_code("code").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderRejected);
    }

    #[tokio::test]
    async fn refresh_token_success_and_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("refresh_token=good"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                r#"{"access_token": "ya29.fresh", "expires_in": 3599}"#,
                "application/json",
            ))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("refresh_token=revoked"))
            .respond_with(ResponseTemplate::new(400).set_body_raw(
                r#"{"error": "invalid_grant"}"#,
                "application/json",
            ))
            .mount(&server)
            .await;

        let client = OAuthClient::new(&test_config(&server.uri())).unwrap();

        let (access, expires_in) = client.refresh_token("good").await.unwrap();
        assert_eq!(access, "ya29.fresh");
        assert_eq!(expires_in, Some(3599));

        let err = client.refresh_token("revoked").await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::NotAuthorized);
    }

    #[test]
    fn describe_error_bodies() {
        assert_eq!(
            describe_oauth_error(r#"{"error": "invalid_grant", "error_description": "Expired"}"#),
            "invalid_grant: Expired"
        );
        assert_eq!(describe_oauth_error(r#"{"error": "invalid_client"}"#), "invalid_client");
        assert_eq!(describe_oauth_error("plain text"), "plain text");
    }
}
