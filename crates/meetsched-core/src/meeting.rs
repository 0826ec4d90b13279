//! Meeting request and result types.
//!
//! - [`MeetingRequest`]: what a caller asks for (title, window, attendees)
//! - [`MeetingResult`]: what the caller gets back once the event exists
//!
//! Both use camelCase on the wire, matching the HTTP body accepted by the
//! server: `{summary, description, startDate, endDate, attendeesEmails?}`.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Loose address check: one `@`, a dot in the domain, and nothing that
/// would split or quote an address inside a `To` header.
static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^[^@\s,;<>"]+@[^@\s,;<>"]+\.[^@\s,;<>"]+$"#).expect("Invalid email regex")
});

/// Reasons a meeting request is rejected before any remote call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The summary is empty or whitespace.
    #[error("summary must not be empty")]
    EmptySummary,

    /// The summary spans several lines; it ends up in a mail header.
    #[error("summary must be a single line")]
    MultilineSummary,

    /// The end of the window is not after its start.
    #[error("startDate ({start}) must be before endDate ({end})")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// An attendee address is malformed.
    #[error("invalid attendee email address: {0:?}")]
    InvalidEmail(String),
}

/// A request to schedule a meeting with a video-conferencing link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRequest {
    /// Event title.
    pub summary: String,
    /// Free-form event description.
    #[serde(default)]
    pub description: String,
    /// Start of the meeting.
    pub start_date: DateTime<Utc>,
    /// End of the meeting.
    pub end_date: DateTime<Utc>,
    /// Attendees to invite, in the order given.
    #[serde(default)]
    pub attendees_emails: Vec<String>,
}

impl MeetingRequest {
    /// Creates a request without attendees.
    pub fn new(
        summary: impl Into<String>,
        description: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Self {
        Self {
            summary: summary.into(),
            description: description.into(),
            start_date,
            end_date,
            attendees_emails: Vec::new(),
        }
    }

    /// Builder method to set the attendees.
    pub fn with_attendees<I, S>(mut self, attendees: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attendees_emails = attendees.into_iter().map(Into::into).collect();
        self
    }

    /// Returns true if at least one attendee was requested.
    pub fn has_attendees(&self) -> bool {
        !self.attendees_emails.is_empty()
    }

    /// Checks the request is well formed.
    ///
    /// Attendees are checked in order and the first malformed address is
    /// reported.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.summary.trim().is_empty() {
            return Err(ValidationError::EmptySummary);
        }
        if self.summary.contains(['\r', '\n']) {
            return Err(ValidationError::MultilineSummary);
        }

        if self.start_date >= self.end_date {
            return Err(ValidationError::InvalidWindow {
                start: self.start_date,
                end: self.end_date,
            });
        }

        if let Some(bad) = self
            .attendees_emails
            .iter()
            .find(|email| !is_valid_email(email))
        {
            return Err(ValidationError::InvalidEmail(bad.clone()));
        }

        Ok(())
    }
}

/// Returns true if `email` looks like a deliverable address.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

/// The outcome of scheduling a meeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResult {
    /// Event title as stored by the calendar.
    pub summary: String,
    /// Event start as stored by the calendar.
    pub start: DateTime<Utc>,
    /// Join link of the generated conference, if one was allocated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn sync_request() -> MeetingRequest {
        MeetingRequest::new("Sync", "weekly", at(10, 0), at(10, 30))
    }

    #[test]
    fn valid_request_passes() {
        let req = sync_request().with_attendees(["a@x.com", "b@x.com"]);
        assert!(req.validate().is_ok());
        assert!(req.has_attendees());
    }

    #[test]
    fn empty_summary_rejected() {
        let mut req = sync_request();
        req.summary = "   ".to_string();
        assert_eq!(req.validate(), Err(ValidationError::EmptySummary));
    }

    #[test]
    fn summary_with_line_breaks_rejected() {
        for summary in ["Sync\r\nBcc: someone@else.example", "Sync\nx", "Sync\r"] {
            let mut req = sync_request();
            req.summary = summary.to_string();
            assert_eq!(req.validate(), Err(ValidationError::MultilineSummary));
        }
    }

    #[test]
    fn window_must_be_increasing() {
        let mut req = sync_request();
        req.end_date = req.start_date;
        assert!(matches!(
            req.validate(),
            Err(ValidationError::InvalidWindow { .. })
        ));

        req.end_date = at(9, 0);
        assert!(req.validate().is_err());
    }

    #[test]
    fn first_bad_email_is_reported() {
        let req = sync_request().with_attendees(["a@x.com", "not-an-email", "b c@x.com"]);
        assert_eq!(
            req.validate(),
            Err(ValidationError::InvalidEmail("not-an-email".to_string()))
        );
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last+tag@sub.example.org"));
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("a@@x.com"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a,b@x.com"));
        assert!(!is_valid_email("a@x.com;b@y.com"));
        assert!(!is_valid_email("<a@x.com>"));
        assert!(!is_valid_email("\"a\"@x.com"));
    }

    #[test]
    fn deserialize_http_body_defaults_attendees() {
        let json = r#"{
            "summary": "Sync",
            "description": "weekly",
            "startDate": "2024-01-01T10:00:00Z",
            "endDate": "2024-01-01T10:30:00Z"
        }"#;
        let req: MeetingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req, sync_request());
        assert!(req.attendees_emails.is_empty());
    }

    #[test]
    fn deserialize_offset_timestamps_as_utc() {
        let json = r#"{
            "summary": "Sync",
            "description": "",
            "startDate": "2024-01-01T11:00:00+01:00",
            "endDate": "2024-01-01T11:30:00+01:00",
            "attendeesEmails": ["a@x.com"]
        }"#;
        let req: MeetingRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.start_date, at(10, 0));
        assert_eq!(req.attendees_emails, vec!["a@x.com".to_string()]);
    }

    #[test]
    fn result_wire_shape() {
        let result = MeetingResult {
            summary: "Sync".to_string(),
            start: at(10, 0),
            meet_link: Some("https://meet.example/abc".to_string()),
        };
        insta::assert_json_snapshot!(result, @r#"
        {
          "summary": "Sync",
          "start": "2024-01-01T10:00:00Z",
          "meetLink": "https://meet.example/abc"
        }
        "#);
    }

    #[test]
    fn result_without_link_omits_field() {
        let result = MeetingResult {
            summary: "Sync".to_string(),
            start: at(10, 0),
            meet_link: None,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("meetLink").is_none());
    }
}
