//! Google Calendar API client.
//!
//! Inserts events with a Google Meet conference request attached. The
//! conference is only generated when `conferenceDataVersion=1` is passed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::provider::{BoxFuture, CalendarProvider, CreatedEvent, EntryPoint, NewEvent};

use super::config::GoogleConfig;

/// Conference solution requested for every event.
const MEET_SOLUTION: &str = "hangoutsMeet";

/// Google Calendar API client.
#[derive(Debug)]
pub struct GoogleCalendarClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl GoogleCalendarClient {
    /// Creates a client for the configured calendar endpoint.
    pub fn new(config: &GoogleConfig) -> ScheduleResult<Self> {
        Ok(Self {
            http_client: config.http_client()?,
            base_url: config.endpoints.calendar_base.trim_end_matches('/').to_string(),
        })
    }

    async fn insert(&self, access_token: &str, event: &NewEvent) -> ScheduleResult<CreatedEvent> {
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(&event.calendar_id)
        );
        let body = ApiEventInsert::from(event);

        debug!(
            calendar = %event.calendar_id,
            attendees = event.attendees.len(),
            "inserting calendar event"
        );

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .query(&[("conferenceDataVersion", "1")])
            .json(&body)
            .send()
            .await
            .map_err(|e| ScheduleError::from_transport("event insert", e).with_provider("calendar"))?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(
                ScheduleError::not_authorized("access token expired or invalid")
                    .with_provider("calendar"),
            );
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ScheduleError::rejected(format!("API error ({}): {}", status, body))
                    .with_provider("calendar"),
            );
        }

        let body = response.text().await.map_err(|e| {
            ScheduleError::from_transport("event insert", e).with_provider("calendar")
        })?;

        let api_event: ApiEvent = serde_json::from_str(&body).map_err(|e| {
            ScheduleError::invalid_response(format!("failed to parse response: {}", e))
                .with_provider("calendar")
                .with_source(e)
        })?;

        Ok(api_event.into_created())
    }
}

impl CalendarProvider for GoogleCalendarClient {
    fn name(&self) -> &str {
        "google-calendar"
    }

    fn insert_event<'a>(
        &'a self,
        access_token: &'a str,
        event: &'a NewEvent,
    ) -> BoxFuture<'a, ScheduleResult<CreatedEvent>> {
        Box::pin(self.insert(access_token, event))
    }
}

/// Request body for events.insert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventInsert<'a> {
    summary: &'a str,
    description: &'a str,
    start: ApiEventTimeOut,
    end: ApiEventTimeOut,
    attendees: Vec<ApiAttendeeOut<'a>>,
    conference_data: ApiConferenceRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTimeOut {
    date_time: String,
}

#[derive(Debug, Serialize)]
struct ApiAttendeeOut<'a> {
    email: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceRequest<'a> {
    create_request: ApiCreateRequest<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiCreateRequest<'a> {
    request_id: &'a str,
    conference_solution_key: ApiSolutionKey,
}

#[derive(Debug, Serialize)]
struct ApiSolutionKey {
    #[serde(rename = "type")]
    solution_type: &'static str,
}

impl<'a> From<&'a NewEvent> for ApiEventInsert<'a> {
    fn from(event: &'a NewEvent) -> Self {
        Self {
            summary: &event.summary,
            description: &event.description,
            start: ApiEventTimeOut {
                date_time: event.start.to_rfc3339(),
            },
            end: ApiEventTimeOut {
                date_time: event.end.to_rfc3339(),
            },
            attendees: event
                .attendees
                .iter()
                .map(|email| ApiAttendeeOut { email })
                .collect(),
            conference_data: ApiConferenceRequest {
                create_request: ApiCreateRequest {
                    request_id: &event.conference_request_id,
                    conference_solution_key: ApiSolutionKey {
                        solution_type: MEET_SOLUTION,
                    },
                },
            },
        }
    }
}

/// An event as returned by events.insert.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: Option<String>,
    summary: Option<String>,
    #[serde(default)]
    start: Option<ApiEventTime>,
    conference_data: Option<ApiConferenceData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiConferenceData {
    entry_points: Option<Vec<ApiEntryPoint>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEntryPoint {
    #[serde(default)]
    entry_point_type: String,
    uri: Option<String>,
}

impl ApiEvent {
    fn into_created(self) -> CreatedEvent {
        let start = self
            .start
            .and_then(|s| s.date_time)
            .and_then(|dt| {
                DateTime::parse_from_rfc3339(&dt)
                    .map_err(|e| warn!("failed to parse start time: {}", e))
                    .ok()
            })
            .map(|dt| dt.with_timezone(&Utc));

        let entry_points = self
            .conference_data
            .and_then(|cd| cd.entry_points)
            .unwrap_or_default()
            .into_iter()
            .map(|ep| EntryPoint {
                entry_point_type: ep.entry_point_type,
                uri: ep.uri,
            })
            .collect();

        CreatedEvent {
            id: self.id,
            summary: self.summary,
            start,
            entry_points,
        }
    }
}
