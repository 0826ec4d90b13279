//! Meeting creation workflow.
//!
//! Validate, authorize, insert the calendar event with a Meet conference,
//! then send one joint invitation. The invitation is best effort: once the
//! event exists, nothing that happens while mailing can fail the call.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use meetsched_core::{MeetingRequest, MeetingResult, compose_invite};
use meetsched_providers::google::{GmailClient, GoogleCalendarClient, GoogleConfig};
use meetsched_providers::{
    CalendarProvider, CredentialManager, MailProvider, NewEvent, ScheduleError, ScheduleResult,
    SentMessage,
};
use tracing::{debug, info, warn};

use crate::ids::{RequestIdGenerator, UuidRequestIds};

/// Why no invitation was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoAttendees,
    NoMeetLink,
}

/// What happened to the invitation email.
#[derive(Debug)]
pub enum NotificationOutcome {
    Skipped(SkipReason),
    Sent(SentMessage),
    /// Sending failed; the meeting was still created.
    Failed(ScheduleError),
}

impl NotificationOutcome {
    /// Returns true if the invitation went out.
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }
}

/// Full outcome of a meeting creation.
#[derive(Debug)]
pub struct MeetingReport {
    /// What the caller gets back.
    pub result: MeetingResult,
    /// Provider event id, if reported.
    pub event_id: Option<String>,
    pub notification: NotificationOutcome,
}

/// Creates meetings on behalf of the organizer.
pub struct MeetingOrchestrator {
    credentials: Arc<CredentialManager>,
    calendar: Arc<dyn CalendarProvider>,
    mail: Arc<dyn MailProvider>,
    ids: Arc<dyn RequestIdGenerator>,
    calendar_id: String,
    call_timeout: Duration,
}

impl MeetingOrchestrator {
    /// Default bound on each remote call.
    pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

    /// Creates an orchestrator writing to the `primary` calendar.
    pub fn new(
        credentials: Arc<CredentialManager>,
        calendar: Arc<dyn CalendarProvider>,
        mail: Arc<dyn MailProvider>,
    ) -> Self {
        Self {
            credentials,
            calendar,
            mail,
            ids: Arc::new(UuidRequestIds),
            calendar_id: "primary".to_string(),
            call_timeout: Self::DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Creates an orchestrator backed by Google Calendar and Gmail.
    pub fn from_google(
        config: &GoogleConfig,
        credentials: Arc<CredentialManager>,
    ) -> ScheduleResult<Self> {
        let calendar = Arc::new(GoogleCalendarClient::new(config)?);
        let mail = Arc::new(GmailClient::new(config)?);
        Ok(Self::new(credentials, calendar, mail)
            .with_calendar_id(config.calendar_id.clone())
            .with_call_timeout(config.timeout))
    }

    /// Builder: set the conference request id generator.
    pub fn with_request_ids(mut self, ids: Arc<dyn RequestIdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    /// Builder: set the target calendar.
    pub fn with_calendar_id(mut self, calendar_id: impl Into<String>) -> Self {
        self.calendar_id = calendar_id.into();
        self
    }

    /// Builder: set the bound on each remote call.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    /// Returns the credential manager this orchestrator draws tokens from.
    pub fn credentials(&self) -> &Arc<CredentialManager> {
        &self.credentials
    }

    /// Creates a meeting and returns what the caller should see.
    pub async fn create_meeting(&self, req: &MeetingRequest) -> ScheduleResult<MeetingResult> {
        self.create_meeting_with_report(req)
            .await
            .map(|report| report.result)
    }

    /// Creates a meeting and reports the invitation outcome alongside.
    pub async fn create_meeting_with_report(
        &self,
        req: &MeetingRequest,
    ) -> ScheduleResult<MeetingReport> {
        req.validate()?;

        let access_token = self
            .bounded("access token", self.credentials.access_token())
            .await?;

        let event = NewEvent {
            calendar_id: self.calendar_id.clone(),
            summary: req.summary.clone(),
            description: req.description.clone(),
            start: req.start_date,
            end: req.end_date,
            attendees: req.attendees_emails.clone(),
            conference_request_id: self.ids.next_id(),
        };
        debug!(
            provider = self.calendar.name(),
            request_id = %event.conference_request_id,
            "creating calendar event"
        );

        let created = self
            .bounded("calendar insert", self.calendar.insert_event(&access_token, &event))
            .await?;

        let meet_link = created.first_join_uri().map(String::from);
        if meet_link.is_none() {
            warn!(event_id = ?created.id, "provider returned no conference entry point");
        }

        let result = MeetingResult {
            summary: created.summary.clone().unwrap_or_else(|| req.summary.clone()),
            start: created.start.unwrap_or(req.start_date),
            meet_link,
        };

        let notification = self
            .notify(&req.attendees_emails, &result, &access_token)
            .await;

        info!(
            event_id = ?created.id,
            has_meet_link = result.meet_link.is_some(),
            invite_sent = notification.is_sent(),
            "meeting created"
        );

        Ok(MeetingReport {
            result,
            event_id: created.id,
            notification,
        })
    }

    async fn notify(
        &self,
        attendees: &[String],
        result: &MeetingResult,
        access_token: &str,
    ) -> NotificationOutcome {
        if attendees.is_empty() {
            return NotificationOutcome::Skipped(SkipReason::NoAttendees);
        }
        let Some(link) = result.meet_link.as_deref() else {
            return NotificationOutcome::Skipped(SkipReason::NoMeetLink);
        };

        let raw = compose_invite(attendees, &result.summary, link).encode_raw();
        match self
            .bounded("invite send", self.mail.send_raw(access_token, &raw))
            .await
        {
            Ok(sent) => {
                debug!(provider = self.mail.name(), message_id = %sent.id, "invitation sent");
                NotificationOutcome::Sent(sent)
            }
            Err(err) => {
                warn!(
                    provider = self.mail.name(),
                    recipients = attendees.len(),
                    error = %err,
                    "failed to send invitation, meeting kept"
                );
                NotificationOutcome::Failed(err)
            }
        }
    }

    async fn bounded<T, F>(&self, what: &str, fut: F) -> ScheduleResult<T>
    where
        F: Future<Output = ScheduleResult<T>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| {
                ScheduleError::timeout(format!(
                    "{what} did not complete within {}s",
                    self.call_timeout.as_secs_f32()
                ))
            })?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialRequestIds;
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use chrono::{DateTime, TimeZone, Utc};
    use meetsched_providers::google::{GoogleEndpoints, OAuthConfig};
    use meetsched_providers::{
        BoxFuture, CreatedEvent, EntryPoint, ErrorCode, ReturnToCaller,
    };
    use std::sync::Mutex;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // Fakes

    #[derive(Default)]
    struct FakeCalendar {
        calls: Mutex<Vec<(String, NewEvent)>>,
        response: CreatedEvent,
        delay: Option<Duration>,
        fail: bool,
    }

    impl FakeCalendar {
        fn with_links(links: &[&str]) -> Self {
            Self {
                response: CreatedEvent {
                    id: Some("evt1".to_string()),
                    summary: Some("Sync".to_string()),
                    start: Some(at(10)),
                    entry_points: links
                        .iter()
                        .map(|uri| EntryPoint {
                            entry_point_type: "video".to_string(),
                            uri: Some(uri.to_string()),
                        })
                        .collect(),
                },
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<(String, NewEvent)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CalendarProvider for FakeCalendar {
        fn name(&self) -> &str {
            "fake-calendar"
        }

        fn insert_event<'a>(
            &'a self,
            access_token: &'a str,
            event: &'a NewEvent,
        ) -> BoxFuture<'a, ScheduleResult<CreatedEvent>> {
            Box::pin(async move {
                self.calls
                    .lock()
                    .unwrap()
                    .push((access_token.to_string(), event.clone()));
                if let Some(delay) = self.delay {
                    tokio::time::sleep(delay).await;
                }
                if self.fail {
                    return Err(ScheduleError::rejected("calendar says no"));
                }
                Ok(self.response.clone())
            })
        }
    }

    #[derive(Default)]
    struct FakeMail {
        sent: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    impl FakeMail {
        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl MailProvider for FakeMail {
        fn name(&self) -> &str {
            "fake-mail"
        }

        fn send_raw<'a>(
            &'a self,
            access_token: &'a str,
            raw: &'a str,
        ) -> BoxFuture<'a, ScheduleResult<SentMessage>> {
            Box::pin(async move {
                self.sent
                    .lock()
                    .unwrap()
                    .push((access_token.to_string(), raw.to_string()));
                if self.fail {
                    return Err(ScheduleError::notification("smtp on fire").with_provider("gmail"));
                }
                Ok(SentMessage {
                    id: "msg-1".to_string(),
                    thread_id: None,
                })
            })
        }
    }

    // Helpers

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    fn google_config(base: &str) -> GoogleConfig {
        GoogleConfig::new(OAuthConfig::new(
            "test-client.apps.googleusercontent.com",
            "test-secret",
            "http://localhost:3000/auth/google",
        ))
        .with_endpoints(GoogleEndpoints::with_base(base))
    }

    async fn mount_token_endpoint(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "test-token",
                "refresh_token": "test-refresh",
                "expires_in": 3599
            })))
            .mount(server)
            .await;
    }

    async fn authorized(server: &MockServer) -> Arc<CredentialManager> {
        mount_token_endpoint(server).await;
        let manager =
            CredentialManager::new(&google_config(&server.uri()), Arc::new(ReturnToCaller))
                .unwrap();
        manager.exchange_code("auth-code").await.unwrap();
        Arc::new(manager)
    }

    fn unauthorized() -> Arc<CredentialManager> {
        Arc::new(
            CredentialManager::new(&google_config("http://127.0.0.1:1"), Arc::new(ReturnToCaller))
                .unwrap(),
        )
    }

    fn sync_request() -> MeetingRequest {
        MeetingRequest::new("Sync", "Weekly sync", at(10), at(11)).with_attendees(["a@x.com"])
    }

    fn orchestrator(
        credentials: Arc<CredentialManager>,
        calendar: &Arc<FakeCalendar>,
        mail: &Arc<FakeMail>,
    ) -> MeetingOrchestrator {
        MeetingOrchestrator::new(credentials, calendar.clone(), mail.clone())
            .with_request_ids(Arc::new(SequentialRequestIds::new("req")))
    }

    // Tests

    #[tokio::test]
    async fn sync_example() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.google.com/abc-defg-hij"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let result = orch.create_meeting(&sync_request()).await.unwrap();

        assert_eq!(
            result,
            MeetingResult {
                summary: "Sync".to_string(),
                start: at(10),
                meet_link: Some("https://meet.google.com/abc-defg-hij".to_string()),
            }
        );

        let calls = calendar.calls();
        assert_eq!(calls.len(), 1);
        let (token, event) = &calls[0];
        assert_eq!(token, "test-token");
        assert_eq!(event.calendar_id, "primary");
        assert_eq!(event.attendees, vec!["a@x.com"]);
        assert_eq!(event.conference_request_id, "req-1");

        let sent = mail.sent();
        assert_eq!(sent.len(), 1);
        let message = String::from_utf8(URL_SAFE_NO_PAD.decode(&sent[0].1).unwrap()).unwrap();
        assert!(message.starts_with("To: a@x.com\r\n"));
        assert!(message.contains("Subject: Meeting Invitation: Sync\r\n"));
        assert!(message.contains("Join the meeting: https://meet.google.com/abc-defg-hij"));
    }

    #[tokio::test]
    async fn no_attendees_means_no_send() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let req = MeetingRequest::new("Solo", "", at(10), at(11));
        let report = orch.create_meeting_with_report(&req).await.unwrap();

        assert!(matches!(
            report.notification,
            NotificationOutcome::Skipped(SkipReason::NoAttendees)
        ));
        assert!(mail.sent().is_empty());
        assert_eq!(report.result.meet_link.as_deref(), Some("https://meet.example/x"));
    }

    #[tokio::test]
    async fn attendees_get_one_joint_invite() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let req = MeetingRequest::new("Sync", "", at(10), at(11))
            .with_attendees(["a@x.com", "b@y.org", "a@x.com"]);
        let report = orch.create_meeting_with_report(&req).await.unwrap();

        assert!(report.notification.is_sent());
        let sent = mail.sent();
        assert_eq!(sent.len(), 1);

        let expected = compose_invite(&req.attendees_emails, "Sync", "https://meet.example/x");
        let decoded = URL_SAFE_NO_PAD.decode(&sent[0].1).unwrap();
        assert_eq!(decoded, expected.to_message().into_bytes());
        assert!(expected.to_message().starts_with("To: a@x.com, b@y.org, a@x.com\r\n"));
    }

    #[tokio::test]
    async fn send_failure_keeps_the_link() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail {
            fail: true,
            ..Default::default()
        });
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let report = orch.create_meeting_with_report(&sync_request()).await.unwrap();

        assert_eq!(report.result.meet_link.as_deref(), Some("https://meet.example/x"));
        match report.notification {
            NotificationOutcome::Failed(err) => assert_eq!(err.code(), ErrorCode::Notification),
            other => panic!("expected failed notification, got {other:?}"),
        }
        assert_eq!(mail.sent().len(), 1);
    }

    #[tokio::test]
    async fn no_entry_points_means_no_link_and_no_send() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&[]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let report = orch.create_meeting_with_report(&sync_request()).await.unwrap();

        assert_eq!(report.result.meet_link, None);
        assert!(matches!(
            report.notification,
            NotificationOutcome::Skipped(SkipReason::NoMeetLink)
        ));
        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn first_entry_point_with_uri_wins() {
        let server = MockServer::start().await;
        let mut fake = FakeCalendar::with_links(&["https://meet.example/first", "tel:+1"]);
        fake.response.entry_points.insert(
            0,
            EntryPoint {
                entry_point_type: "more".to_string(),
                uri: None,
            },
        );
        let calendar = Arc::new(fake);
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let result = orch.create_meeting(&sync_request()).await.unwrap();
        assert_eq!(result.meet_link.as_deref(), Some("https://meet.example/first"));
    }

    #[tokio::test]
    async fn missing_summary_and_start_fall_back_to_request() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::default());
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let result = orch.create_meeting(&sync_request()).await.unwrap();
        assert_eq!(result.summary, "Sync");
        assert_eq!(result.start, at(10));
    }

    #[tokio::test]
    async fn create_before_exchange_is_not_authorized_without_remote_calls() {
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(unauthorized(), &calendar, &mail);

        let err = orch.create_meeting(&sync_request()).await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::NotAuthorized);
        assert!(calendar.calls().is_empty());
        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_auth() {
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(unauthorized(), &calendar, &mail);

        let backwards = MeetingRequest::new("Sync", "", at(11), at(10));
        let err = orch.create_meeting(&backwards).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        let bad_email = sync_request().with_attendees(["not-an-email"]);
        let err = orch.create_meeting(&bad_email).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Validation);

        assert!(calendar.calls().is_empty());
    }

    #[tokio::test]
    async fn calendar_failure_aborts_without_send() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar {
            fail: true,
            ..Default::default()
        });
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail);

        let err = orch.create_meeting(&sync_request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderRejected);
        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn slow_calendar_times_out() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar {
            delay: Some(Duration::from_millis(500)),
            ..FakeCalendar::with_links(&["https://meet.example/x"])
        });
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail)
            .with_call_timeout(Duration::from_millis(20));

        let err = orch.create_meeting(&sync_request()).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ProviderTimeout);
        assert!(mail.sent().is_empty());
    }

    #[tokio::test]
    async fn fresh_request_id_per_meeting() {
        let server = MockServer::start().await;
        let calendar = Arc::new(FakeCalendar::with_links(&["https://meet.example/x"]));
        let mail = Arc::new(FakeMail::default());
        let orch = orchestrator(authorized(&server).await, &calendar, &mail)
            .with_calendar_id("team@example.com");

        orch.create_meeting(&sync_request()).await.unwrap();
        orch.create_meeting(&sync_request()).await.unwrap();

        let ids: Vec<String> = calendar
            .calls()
            .into_iter()
            .map(|(_, e)| {
                assert_eq!(e.calendar_id, "team@example.com");
                e.conference_request_id
            })
            .collect();
        assert_eq!(ids, vec!["req-1", "req-2"]);
    }

    #[tokio::test]
    async fn end_to_end_against_google_endpoints() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/calendar/v3/calendars/primary/events"))
            .and(query_param("conferenceDataVersion", "1"))
            .and(header("authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "evt1",
                "summary": "Sync",
                "start": {"dateTime": "2024-01-01T10:00:00Z"},
                "conferenceData": {"entryPoints": [
                    {"entryPointType": "video", "uri": "https://meet.google.com/abc-defg-hij"}
                ]}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let expected_raw = compose_invite(
            &["a@x.com".to_string()],
            "Sync",
            "https://meet.google.com/abc-defg-hij",
        )
        .encode_raw();
        Mock::given(method("POST"))
            .and(path("/gmail/v1/users/me/messages/send"))
            .and(header("authorization", "Bearer test-token"))
            .and(body_string_contains(expected_raw.as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg-1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let config = google_config(&server.uri());
        let orch = MeetingOrchestrator::from_google(&config, authorized(&server).await).unwrap();

        let report = orch.create_meeting_with_report(&sync_request()).await.unwrap();
        assert_eq!(report.event_id.as_deref(), Some("evt1"));
        assert!(report.notification.is_sent());
        insta::assert_json_snapshot!(report.result, @r###"
        {
          "summary": "Sync",
          "start": "2024-01-01T10:00:00Z",
          "meetLink": "https://meet.google.com/abc-defg-hij"
        }
        "###);
    }
}
