//! Driving port for the public event listing.

use async_trait::async_trait;

use crate::domain::{Error, EventCatalogue, EventId, ListedEvent};

/// Read-only event queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventQuery: Send + Sync {
    /// Every event grouped into upcoming, ongoing, and past.
    async fn catalogue(&self) -> Result<EventCatalogue, Error>;

    /// One event with its flags resolved now.
    async fn event_details(&self, event_id: EventId) -> Result<ListedEvent, Error>;
}
