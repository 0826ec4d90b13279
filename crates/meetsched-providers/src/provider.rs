//! Calendar and mail provider abstractions.
//!
//! The orchestrator talks to remote services only through these two traits,
//! so tests can swap in recording fakes and the Google clients stay
//! replaceable. Both take the bearer token per call: providers never hold
//! credentials themselves.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};

use crate::error::ScheduleResult;

/// A boxed future for async trait methods.
///
/// Boxed futures keep the traits object-safe so they can be shared as
/// `Arc<dyn CalendarProvider>`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// An event to insert, with a request for a generated conference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    /// Target calendar (usually `primary`).
    pub calendar_id: String,
    /// Event title.
    pub summary: String,
    /// Event description.
    pub description: String,
    /// Start of the event.
    pub start: DateTime<Utc>,
    /// End of the event.
    pub end: DateTime<Utc>,
    /// Attendee email addresses.
    pub attendees: Vec<String>,
    /// Unique key for the conference creation request.
    pub conference_request_id: String,
}

/// A joinable entry point of a conference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    /// Entry point type (`video`, `phone`, `more`, ...).
    pub entry_point_type: String,
    /// Join URI, if the entry point has one.
    pub uri: Option<String>,
}

/// The event as stored by the calendar provider.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CreatedEvent {
    /// Provider event id.
    pub id: Option<String>,
    /// Stored title.
    pub summary: Option<String>,
    /// Stored start time.
    pub start: Option<DateTime<Utc>>,
    /// Conference entry points in provider order.
    pub entry_points: Vec<EntryPoint>,
}

impl CreatedEvent {
    /// Returns the URI of the first entry point that has one.
    pub fn first_join_uri(&self) -> Option<&str> {
        self.entry_points.iter().find_map(|ep| ep.uri.as_deref())
    }
}

/// Confirmation returned by the mail provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Provider message id.
    pub id: String,
    /// Thread the message was filed under, if reported.
    pub thread_id: Option<String>,
}

/// A calendar backend able to create events with conferences.
pub trait CalendarProvider: Send + Sync {
    /// Returns a short name used in logs and errors.
    fn name(&self) -> &str;

    /// Inserts an event and asks for a generated conference.
    fn insert_event<'a>(
        &'a self,
        access_token: &'a str,
        event: &'a NewEvent,
    ) -> BoxFuture<'a, ScheduleResult<CreatedEvent>>;
}

/// A mail backend able to send a pre-encoded message.
pub trait MailProvider: Send + Sync {
    /// Returns a short name used in logs and errors.
    fn name(&self) -> &str;

    /// Sends `raw`, an unpadded base64url RFC 2822 message.
    fn send_raw<'a>(
        &'a self,
        access_token: &'a str,
        raw: &'a str,
    ) -> BoxFuture<'a, ScheduleResult<SentMessage>>;
}
