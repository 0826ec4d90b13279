//! OAuth token state held for the lifetime of the process.
//!
//! Tokens are never written to disk; a restart means consenting again.

use std::sync::RwLock;

use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Seconds shaved off `expires_in` so we refresh slightly early.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An access/refresh token pair as issued by the token endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    /// The access token for API requests.
    pub access_token: String,

    /// The refresh token for obtaining new access tokens.
    pub refresh_token: Option<String>,

    /// When the access token expires, if the provider said.
    pub expires_at: Option<DateTime<Utc>>,

    /// When the tokens were last obtained or refreshed.
    pub last_refresh: DateTime<Utc>,
}

impl TokenInfo {
    /// Creates token info from token endpoint data.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in_secs: Option<i64>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
            expires_at: expires_in_secs.map(expiry_from_now),
            last_refresh: Utc::now(),
        }
    }

    /// Returns true if the access token is expired or about to expire.
    ///
    /// Tokens without a known expiry are treated as valid.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }

    /// Replaces the access token after a refresh, keeping the refresh token.
    pub fn update_access_token(
        &mut self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) {
        self.access_token = access_token.into();
        self.expires_at = expires_in_secs.map(expiry_from_now);
        self.last_refresh = Utc::now();
    }
}

fn expiry_from_now(secs: i64) -> DateTime<Utc> {
    Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS)
}

/// In-memory holder of the current token pair.
///
/// Readers get clones, so a caller keeps a consistent snapshot even if the
/// pair is replaced while its request is in flight.
#[derive(Debug, Default)]
pub struct TokenStore {
    tokens: RwLock<Option<TokenInfo>>,
}

impl TokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a clone of the current tokens, if any.
    pub fn get(&self) -> Option<TokenInfo> {
        self.tokens
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Stores a freshly exchanged pair.
    ///
    /// If the new pair carries no refresh token, the previous one is kept:
    /// Google only returns it on forced consent.
    pub fn set(&self, mut tokens: TokenInfo) {
        let mut guard = self
            .tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if tokens.refresh_token.is_none() {
            tokens.refresh_token = guard.as_ref().and_then(|t| t.refresh_token.clone());
        }
        debug!(
            has_refresh_token = tokens.refresh_token.is_some(),
            "stored new token pair"
        );
        *guard = Some(tokens);
    }

    /// Updates the access token after a refresh.
    ///
    /// Returns false if there was nothing to update.
    pub fn update_access_token(
        &self,
        access_token: impl Into<String>,
        expires_in_secs: Option<i64>,
    ) -> bool {
        let mut guard = self
            .tokens
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match guard.as_mut() {
            Some(tokens) => {
                tokens.update_access_token(access_token, expires_in_secs);
                true
            }
            None => false,
        }
    }

    /// Returns true if an access token is held.
    pub fn has_tokens(&self) -> bool {
        self.get().is_some()
    }
}
