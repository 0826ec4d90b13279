//! Invitation emails for newly scheduled meetings.
//!
//! An invitation is a plain-text message addressed to every attendee at once
//! (a single `To` header, never one message per recipient). The mail API
//! wants the RFC 2822 text as unpadded base64url in its `raw` field, see
//! [`EmailNotification::encode_raw`].

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Prefix of every invitation subject line.
pub const SUBJECT_PREFIX: &str = "Meeting Invitation: ";

/// An invitation ready to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailNotification {
    /// Recipients in request order; duplicates are kept as given.
    pub recipients: Vec<String>,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub body: String,
}

impl EmailNotification {
    /// Renders the message: headers, blank line, body. Lines end in CRLF.
    pub fn to_message(&self) -> String {
        let mut message = String::new();
        message.push_str(&format!("To: {}\r\n", self.recipients.join(", ")));
        message.push_str("Content-Type: text/plain; charset=UTF-8\r\n");
        message.push_str(&format!("Subject: {}\r\n", self.subject));
        message.push_str("\r\n");
        message.push_str(&self.body);
        message
    }

    /// Renders the message and encodes it as unpadded base64url.
    pub fn encode_raw(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_message().as_bytes())
    }
}

/// Builds the invitation for `event_title` pointing at `meet_link`.
pub fn compose_invite(
    recipients: &[String],
    event_title: &str,
    meet_link: &str,
) -> EmailNotification {
    EmailNotification {
        recipients: recipients.to_vec(),
        subject: format!("{SUBJECT_PREFIX}{}", single_line(event_title)),
        body: invite_body(event_title, meet_link),
    }
}

/// Folds CR and LF into spaces so a title cannot start a new header.
fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

fn invite_body(event_title: &str, meet_link: &str) -> String {
    format!(
        "🦄 Hello!\n\
         \n\
         You're invited to a Google Meet session.\n\
         \n\
         Topic: {event_title}  \n\
         Join the meeting: {meet_link}\n\
         \n\
         We’re looking forward to seeing you there!\n\
         \n\
         Best regards,  \n\
         Your Team"
    )
}
