//! Test utilities for the backend crate.
//!
//! Shared doubles for unit tests in `src/`. Only compiled for tests.

pub mod clock {
    //! Deterministic clocks.

    use std::sync::Arc;

    use chrono::{DateTime, Local, TimeZone, Utc};
    use mockable::Clock;

    /// Clock frozen at a fixed instant.
    pub struct FixtureClock {
        utc_now: DateTime<Utc>,
    }

    impl Clock for FixtureClock {
        fn local(&self) -> DateTime<Local> {
            self.utc_now.with_timezone(&Local)
        }

        fn utc(&self) -> DateTime<Utc> {
            self.utc_now
        }
    }

    /// Instant every fixture clock reports.
    pub fn fixture_timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
            .single()
            .expect("valid fixture timestamp")
    }

    /// Shared fixture clock.
    pub fn fixture_clock() -> Arc<dyn Clock> {
        Arc::new(FixtureClock {
            utc_now: fixture_timestamp(),
        })
    }
}

pub mod notifications {
    //! Notification sink doubles.

    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use crate::domain::ports::{DeliveryReceipt, NotificationSink, NotificationSinkError};
    use crate::domain::{Notification, NotificationDispatcher};

    /// Sink forwarding every notification to a channel.
    pub struct RecordingSink(mpsc::UnboundedSender<Notification>);

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn send(
            &self,
            notification: &Notification,
        ) -> Result<DeliveryReceipt, NotificationSinkError> {
            self.0
                .send(notification.clone())
                .map_err(|err| NotificationSinkError::transport(err.to_string()))?;
            Ok(DeliveryReceipt::default())
        }
    }

    /// Dispatcher wired to a channel the test can drain.
    pub fn recording_dispatcher() -> (NotificationDispatcher, mpsc::UnboundedReceiver<Notification>)
    {
        let (tx, rx) = mpsc::unbounded_channel();
        (NotificationDispatcher::new(Arc::new(RecordingSink(tx))), rx)
    }
}

pub mod identities {
    //! Sample callers.

    use crate::domain::{Identity, UserId, UserRole};

    /// Student caller with the given id and display name.
    pub fn student(id: i64, name: &str) -> Identity {
        Identity {
            user_id: UserId::new(id),
            name: name.to_owned(),
            email: format!("{}@example.edu", name.to_lowercase()),
            role: UserRole::Student,
        }
    }

    /// Staff caller allowed to run the check-in desk.
    pub fn admin(id: i64) -> Identity {
        Identity {
            user_id: UserId::new(id),
            name: "Desk".to_owned(),
            email: "desk@example.edu".to_owned(),
            role: UserRole::Admin,
        }
    }
}
