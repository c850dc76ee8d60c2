//! Port for reading the event listing.

use async_trait::async_trait;

use crate::domain::{EventId, EventListing};

use super::define_port_error;

define_port_error! {
    /// Errors raised by event repository adapters.
    pub enum EventRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "event repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "event repository query failed: {message}",
    }
}

/// Read-only access to events and their taken capacity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Every event ordered by scheduled start, unscheduled events last.
    async fn list_events(&self) -> Result<Vec<EventListing>, EventRepositoryError>;

    /// One event, or `None` when it does not exist.
    async fn find_event(
        &self,
        event_id: EventId,
    ) -> Result<Option<EventListing>, EventRepositoryError>;
}

/// Fixture repository with no events.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureEventRepository;

#[async_trait]
impl EventRepository for FixtureEventRepository {
    async fn list_events(&self) -> Result<Vec<EventListing>, EventRepositoryError> {
        Ok(Vec::new())
    }

    async fn find_event(
        &self,
        _event_id: EventId,
    ) -> Result<Option<EventListing>, EventRepositoryError> {
        Ok(None)
    }
}
