//! Gmail API client for sending pre-encoded messages.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ScheduleError, ScheduleResult};
use crate::provider::{BoxFuture, MailProvider, SentMessage};

use super::config::GoogleConfig;

/// Gmail API client.
///
/// Every failure, transport included, is reported as
/// [`ErrorCode::Notification`](crate::ErrorCode::Notification).
#[derive(Debug)]
pub struct GmailClient {
    http_client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    raw: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    id: String,
    thread_id: Option<String>,
}

impl GmailClient {
    /// Creates a client for the configured Gmail endpoint.
    pub fn new(config: &GoogleConfig) -> ScheduleResult<Self> {
        Ok(Self {
            http_client: config.http_client()?,
            base_url: config.endpoints.gmail_base.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, access_token: &str, raw: &str) -> ScheduleResult<SentMessage> {
        let url = format!("{}/gmail/v1/users/me/messages/send", self.base_url);

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(access_token)
            .json(&SendRequest { raw })
            .send()
            .await
            .map_err(|e| {
                ScheduleError::notification(format!("send request failed: {}", e))
                    .with_provider("gmail")
                    .with_source(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(
                ScheduleError::notification(format!("send rejected ({}): {}", status, body))
                    .with_provider("gmail"),
            );
        }

        let body = response.text().await.map_err(|e| {
            ScheduleError::notification(format!("failed to read send response: {}", e))
                .with_provider("gmail")
                .with_source(e)
        })?;
        let sent: SendResponse = serde_json::from_str(&body).map_err(|e| {
            ScheduleError::notification(format!("unexpected send response: {}", e))
                .with_provider("gmail")
                .with_source(e)
        })?;

        debug!(message_id = %sent.id, "invitation sent");
        Ok(SentMessage {
            id: sent.id,
            thread_id: sent.thread_id,
        })
    }
}

impl MailProvider for GmailClient {
    fn name(&self) -> &str {
        "gmail"
    }

    fn send_raw<'a>(
        &'a self,
        access_token: &'a str,
        raw: &'a str,
    ) -> BoxFuture<'a, ScheduleResult<SentMessage>> {
        Box::pin(self.send(access_token, raw))
    }
}
