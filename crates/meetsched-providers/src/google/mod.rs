//! Google implementation of the scheduling backends.
//!
//! - [`OAuthClient`]: consent URL, code exchange and refresh
//! - [`GoogleCalendarClient`]: events.insert with a Meet conference request
//! - [`GmailClient`]: messages.send with a raw base64url message
//!
//! All three share one [`GoogleConfig`], whose [`GoogleEndpoints`] can be
//! pointed at a local server.

mod calendar;
mod config;
mod gmail;
mod oauth;
mod tokens;

pub use calendar::GoogleCalendarClient;
pub use config::{CALENDAR_SCOPE, GMAIL_SEND_SCOPE, GoogleConfig, GoogleEndpoints, OAuthConfig};
pub use gmail::GmailClient;
pub use oauth::OAuthClient;
pub use tokens::{TokenInfo, TokenStore};
