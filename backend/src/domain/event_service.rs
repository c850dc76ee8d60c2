//! Public event listing service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{EventQuery, EventRepository, EventRepositoryError};
use crate::domain::{Error, EventCatalogue, EventId, ListedEvent, RegistrationRejection};

fn map_event_error(error: EventRepositoryError) -> Error {
    match error {
        EventRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("event repository unavailable: {message}"))
        }
        EventRepositoryError::Query { message } => {
            Error::internal(format!("event repository error: {message}"))
        }
    }
}

/// Event listing implementing [`EventQuery`].
#[derive(Clone)]
pub struct EventService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> EventService<R> {
    /// Create a new service.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

#[async_trait]
impl<R> EventQuery for EventService<R>
where
    R: EventRepository,
{
    async fn catalogue(&self) -> Result<EventCatalogue, Error> {
        let listings = self.repo.list_events().await.map_err(map_event_error)?;
        Ok(EventCatalogue::group(listings, self.clock.utc()))
    }

    async fn event_details(&self, event_id: EventId) -> Result<ListedEvent, Error> {
        let listing = self
            .repo
            .find_event(event_id)
            .await
            .map_err(map_event_error)?
            .ok_or_else(|| RegistrationRejection::EventNotFound.into_error())?;
        Ok(ListedEvent::at(listing, self.clock.utc()))
    }
}
