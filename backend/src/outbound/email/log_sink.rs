//! Sink that writes notifications to the log instead of sending them.

use async_trait::async_trait;
use tracing::info;

use crate::domain::Notification;
use crate::domain::ports::{DeliveryReceipt, NotificationSink, NotificationSinkError};

/// Logs each notification at `info` level and reports success.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotificationSink;

#[async_trait]
impl NotificationSink for LogNotificationSink {
    async fn send(
        &self,
        notification: &Notification,
    ) -> Result<DeliveryReceipt, NotificationSinkError> {
        info!(
            to = %notification.to,
            subject = %notification.subject,
            template_data = %notification.template_data,
            "email delivery disabled; notification logged"
        );
        Ok(DeliveryReceipt::default())
    }
}
