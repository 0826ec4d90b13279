//! Organizer credential lifecycle.
//!
//! A [`CredentialManager`] exists only once configuration validated, so it
//! starts [`AuthState::Unauthorized`] and becomes [`AuthState::Authorized`]
//! after the first successful code exchange. It stays authorized for the
//! process lifetime; later exchanges replace the token pair.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::consent::{ConsentDelivery, ConsentOutcome};
use crate::error::{ScheduleError, ScheduleResult};
use crate::google::{GoogleConfig, OAuthClient, TokenInfo, TokenStore};

/// Whether the organizer has completed consent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthState {
    /// Configured, but no tokens yet.
    Unauthorized,
    /// Tokens obtained from a code exchange.
    Authorized,
}

/// Snapshot of the client settings and current token pair.
#[derive(Clone, PartialEq, Eq)]
pub struct OAuthCredential {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl fmt::Debug for OAuthCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthCredential")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("redirect_uri", &self.redirect_uri)
            .field("access_token", &"<redacted>")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish()
    }
}

/// Owns the organizer's OAuth client state.
pub struct CredentialManager {
    oauth: OAuthClient,
    delivery: Arc<dyn ConsentDelivery>,
    tokens: TokenStore,
    refresh_guard: Mutex<()>,
}

impl CredentialManager {
    /// Creates a manager from a validated configuration.
    pub fn new(config: &GoogleConfig, delivery: Arc<dyn ConsentDelivery>) -> ScheduleResult<Self> {
        config.validate()?;
        info!(delivery = delivery.name(), "credential manager ready, awaiting consent");
        Ok(Self {
            oauth: OAuthClient::new(config)?,
            delivery,
            tokens: TokenStore::new(),
            refresh_guard: Mutex::new(()),
        })
    }

    /// Builds the provider consent URL.
    pub fn build_consent_url(&self) -> ScheduleResult<Url> {
        self.oauth.build_consent_url()
    }

    /// Builds the consent URL and hands it to the configured delivery.
    pub fn request_consent(&self) -> ScheduleResult<ConsentOutcome> {
        let url = self.build_consent_url()?;
        let outcome = self.delivery.deliver(&url);
        debug!(delivery = self.delivery.name(), ?outcome, "consent URL delivered");
        Ok(outcome)
    }

    /// Exchanges an authorization code and stores the resulting tokens.
    ///
    /// Holds the refresh guard so an in-flight refresh cannot overwrite the
    /// freshly issued pair.
    pub async fn exchange_code(&self, code: &str) -> ScheduleResult<()> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ScheduleError::auth_exchange("authorization code is empty"));
        }

        let _guard = self.refresh_guard.lock().await;
        let tokens = self.oauth.exchange_code(code).await?;
        self.tokens.set(tokens);
        info!("organizer authorized");
        Ok(())
    }

    /// Returns the client settings with the current token pair.
    pub fn current_credential(&self) -> ScheduleResult<OAuthCredential> {
        let tokens = self.held_tokens()?;
        let settings = self.oauth.settings();
        Ok(OAuthCredential {
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            redirect_uri: settings.redirect_uri.clone(),
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
        })
    }

    /// Returns the authorization state.
    pub fn auth_state(&self) -> AuthState {
        if self.tokens.has_tokens() {
            AuthState::Authorized
        } else {
            AuthState::Unauthorized
        }
    }

    /// Returns a usable access token, refreshing it first if it expired.
    ///
    /// Concurrent callers share a single refresh: whoever waited on the
    /// guard re-checks expiry before calling the token endpoint.
    pub async fn access_token(&self) -> ScheduleResult<String> {
        let tokens = self.held_tokens()?;
        if !tokens.is_expired() {
            return Ok(tokens.access_token);
        }

        let _guard = self.refresh_guard.lock().await;

        let tokens = self.held_tokens()?;
        if !tokens.is_expired() {
            debug!("access token refreshed by another caller");
            return Ok(tokens.access_token);
        }

        let refresh_token = tokens.refresh_token.ok_or_else(|| {
            ScheduleError::not_authorized("access token expired and no refresh token is held")
        })?;

        debug!("refreshing expired access token");
        let (access_token, expires_in) = self.oauth.refresh_token(&refresh_token).await?;
        self.tokens.update_access_token(access_token.clone(), expires_in);
        Ok(access_token)
    }

    #[cfg(test)]
    pub(crate) fn store_tokens(&self, tokens: TokenInfo) {
        self.tokens.set(tokens);
    }

    fn held_tokens(&self) -> ScheduleResult<TokenInfo> {
        self.tokens.get().ok_or_else(|| {
            ScheduleError::not_authorized("no access token: complete the Google consent flow first")
        })
    }
}

impl fmt::Debug for CredentialManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialManager")
            .field("delivery", &self.delivery.name())
            .field("state", &self.auth_state())
            .finish_non_exhaustive()
    }
}
