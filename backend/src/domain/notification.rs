//! Post-commit registration confirmations.
//!
//! Engines collect a [`RegistrationNotice`] per recipient while the
//! transaction is open, then hand them to a [`NotificationDispatcher`] after
//! commit. Delivery runs on detached tasks; failures are logged and never
//! reach the caller.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use super::ports::NotificationSink;
use super::{EventShape, Money, TraceId};

/// Team details included in a confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeTeam {
    /// Team name.
    pub name: String,
    /// Join code to share with teammates.
    pub code: String,
    /// Whether the recipient leads the team.
    pub is_lead: bool,
}

/// One confirmation destined for one registrant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationNotice {
    /// Recipient display name.
    pub recipient_name: String,
    /// Recipient email address.
    pub recipient_email: String,
    /// Event display name.
    pub event_name: String,
    /// Solo or team shape of the event.
    pub shape: EventShape,
    /// Fee per capacity unit.
    pub fee: Money,
    /// Team details for team events.
    pub team: Option<NoticeTeam>,
    /// Recipient's accommodation label.
    pub accommodation: Option<String>,
    /// Recipient's food preference.
    pub food_preference: String,
}

/// Rendered message handed to a notification sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Structured data for the sink's template.
    pub template_data: Value,
}

impl From<&RegistrationNotice> for Notification {
    fn from(notice: &RegistrationNotice) -> Self {
        Self {
            to: notice.recipient_email.clone(),
            subject: format!("Registration confirmed: {}", notice.event_name),
            template_data: json!({
                "userName": notice.recipient_name,
                "eventName": notice.event_name,
                "eventType": notice.shape.label(),
                "feeAmount": notice.fee.to_string(),
                "team": notice.team,
                "accommodation": notice.accommodation,
                "foodPreference": notice.food_preference,
            }),
        }
    }
}

/// Fire-and-forget fan-out of confirmations to a [`NotificationSink`].
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    /// Dispatch through `sink`.
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    /// Spawn one delivery task per notice and return immediately.
    ///
    /// Tasks run under the caller's trace identifier. Must be called from
    /// within a Tokio runtime.
    pub fn dispatch(&self, notices: Vec<RegistrationNotice>) {
        for notice in notices {
            let sink = Arc::clone(&self.sink);
            let notification = Notification::from(&notice);
            tokio::spawn(TraceId::propagate(async move {
                match sink.send(&notification).await {
                    Ok(receipt) => info!(
                        to = %notification.to,
                        message_id = receipt.message_id.as_deref().unwrap_or("-"),
                        "registration confirmation sent"
                    ),
                    Err(error) => warn!(
                        to = %notification.to,
                        %error,
                        "registration confirmation failed"
                    ),
                }
            }));
        }
    }
}
