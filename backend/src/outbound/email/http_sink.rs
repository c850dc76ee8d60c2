//! Reqwest-backed transactional email sink.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroizing;

use crate::domain::Notification;
use crate::domain::ports::{DeliveryReceipt, NotificationSink, NotificationSinkError};

/// Connection settings for the email API.
pub struct HttpEmailSinkConfig {
    /// Endpoint accepting `POST` requests with the message body.
    pub endpoint: Url,
    /// Bearer API key.
    pub api_key: Zeroizing<String>,
    /// Sender address.
    pub from: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

/// Sends notifications through an HTTP email API.
pub struct HttpEmailSink {
    client: Client,
    endpoint: Url,
    api_key: Zeroizing<String>,
    from: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailDto<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    template_data: &'a Value,
}

#[derive(Debug, Default, Deserialize)]
struct SendEmailResponseDto {
    #[serde(default)]
    id: Option<String>,
}

impl HttpEmailSink {
    /// Build a sink with its own reqwest client.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(config: HttpEmailSinkConfig) -> Result<Self, NotificationSinkError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| NotificationSinkError::transport(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: config.endpoint,
            api_key: config.api_key,
            from: config.from,
        })
    }
}

#[async_trait]
impl NotificationSink for HttpEmailSink {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<DeliveryReceipt, NotificationSinkError> {
        let body = SendEmailDto {
            from: self.from.as_str(),
            to: notification.to.as_str(),
            subject: notification.subject.as_str(),
            template_data: &notification.template_data,
        };
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(self.api_key.as_str())
            .json(&body)
            .send()
            .await
            .map_err(|err| NotificationSinkError::transport(err.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| NotificationSinkError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status));
        }
        Ok(parse_receipt(bytes.as_ref()))
    }
}

fn map_status_error(status: StatusCode) -> NotificationSinkError {
    let message = format!("status {}", status.as_u16());
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        NotificationSinkError::transport(message)
    } else {
        NotificationSinkError::delivery(message)
    }
}

// Providers differ in what they return; a missing or unreadable id is not a
// delivery failure.
fn parse_receipt(body: &[u8]) -> DeliveryReceipt {
    let decoded: SendEmailResponseDto = serde_json::from_slice(body).unwrap_or_default();
    DeliveryReceipt {
        message_id: decoded.id,
    }
}
