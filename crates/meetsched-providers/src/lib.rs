//! OAuth credential lifecycle and provider clients for meeting scheduling.
//!
//! - [`CredentialManager`] - consent, code exchange and token refresh
//! - [`CalendarProvider`] / [`MailProvider`] - backend seams used by the
//!   orchestrator
//! - [`google`] - Google Calendar, Gmail and OAuth implementations
//! - [`ScheduleError`] - the error type shared by all of the above
//!
//! # Architecture
//!
//! ```text
//!   consent URL ──► organizer ──► ?code= ──► CredentialManager
//!                                                  │ access token
//!                                                  ▼
//!                              ┌──────────────────────────────────┐
//!                              │ CalendarProvider   MailProvider  │
//!                              └────────┬─────────────────┬───────┘
//!                                       ▼                 ▼
//!                               Calendar API v3      Gmail API v1
//! ```

pub mod consent;
pub mod credentials;
pub mod error;
pub mod google;
pub mod provider;

pub use consent::{
    BrowserDelivery, ConsentDelivery, ConsentMode, ConsentOutcome, ConsoleDelivery, ReturnToCaller,
};
pub use credentials::{AuthState, CredentialManager, OAuthCredential};
pub use error::{ErrorCode, ScheduleError, ScheduleResult};
pub use provider::{
    BoxFuture, CalendarProvider, CreatedEvent, EntryPoint, MailProvider, NewEvent, SentMessage,
};
