//! Driving port for reading registration state.

use async_trait::async_trait;

use crate::domain::{Accommodation, Error, EventId, RegistrationStatus, UserId};

/// Read-only registration queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistrationQuery: Send + Sync {
    /// Caller's registration and team state for an event.
    async fn status(&self, user_id: UserId, event_id: EventId)
    -> Result<RegistrationStatus, Error>;

    /// Accommodation options ordered by name.
    async fn accommodations(&self) -> Result<Vec<Accommodation>, Error>;
}
