//! Port for delivering registration confirmations.

use async_trait::async_trait;

use crate::domain::Notification;

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification sinks.
    pub enum NotificationSinkError {
        /// The provider could not be reached.
        Transport { message: String } => "notification transport failed: {message}",
        /// The provider refused the message.
        Delivery { message: String } => "notification delivery failed: {message}",
    }
}

/// Provider acknowledgement of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeliveryReceipt {
    /// Provider message id, when reported.
    pub message_id: Option<String>,
}

/// Deliver rendered notifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Send one notification.
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<DeliveryReceipt, NotificationSinkError>;
}
