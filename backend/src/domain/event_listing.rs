//! Public event listing.
//!
//! The listing pairs an [`Event`] with its schedule and the number of
//! capacity units already taken. Time-dependent flags are derived at a
//! caller-supplied instant so the same rows can be rendered for any clock.

use chrono::{DateTime, Utc};

use super::Event;

/// Schedule and presentation fields of an event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventSchedule {
    /// Free-form description.
    pub description: String,
    /// Where the event takes place.
    pub venue: Option<String>,
    /// Scheduled start; unscheduled events are listed as upcoming.
    pub starts_at: Option<DateTime<Utc>>,
    /// Scheduled end; an event with a start but no end runs indefinitely.
    pub ends_at: Option<DateTime<Utc>>,
}

/// Event row together with its schedule and taken capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventListing {
    /// Registration-relevant definition.
    pub event: Event,
    /// Schedule and presentation fields.
    pub schedule: EventSchedule,
    /// Capacity units already taken: paid registrations for solo events,
    /// teams with a paid lead for team events.
    pub registrations_count: i64,
}

/// Where an event sits relative to now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventPhase {
    /// Not started yet, or not scheduled.
    Upcoming,
    /// Started and not yet ended.
    Ongoing,
    /// Ended.
    Past,
}

impl EventListing {
    /// Phase of the event at `now`. Both schedule bounds are inclusive.
    #[must_use]
    pub fn phase(&self, now: DateTime<Utc>) -> EventPhase {
        match (self.schedule.starts_at, self.schedule.ends_at) {
            (None, _) => EventPhase::Upcoming,
            (Some(start), _) if now < start => EventPhase::Upcoming,
            (Some(_), Some(end)) if now > end => EventPhase::Past,
            (Some(_), _) => EventPhase::Ongoing,
        }
    }

    /// Whether a registration submitted at `now` would pass the publication
    /// and window checks.
    #[must_use]
    pub fn registration_open(&self, now: DateTime<Utc>) -> bool {
        self.event.ensure_accepting(now).is_ok()
    }

    /// Whether every capacity unit is taken. Uncapped events are never full.
    #[must_use]
    pub fn registration_full(&self) -> bool {
        self.event
            .max_registrations
            .is_some_and(|cap| self.registrations_count >= i64::from(cap))
    }

    /// Calendar days between the start and end dates, when both are set.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use portal_backend::domain::{
    ///     Event, EventId, EventListing, EventSchedule, EventStatus, Money,
    /// };
    ///
    /// let listing = EventListing {
    ///     event: Event {
    ///         id: EventId::new(1),
    ///         name: "Hackathon".to_owned(),
    ///         min_team_size: 2,
    ///         max_team_size: 4,
    ///         registration_opens: None,
    ///         registration_closes: None,
    ///         fee: Money::ZERO,
    ///         max_registrations: None,
    ///         status: EventStatus::Active,
    ///     },
    ///     schedule: EventSchedule {
    ///         starts_at: Utc.with_ymd_and_hms(2026, 3, 6, 18, 0, 0).single(),
    ///         ends_at: Utc.with_ymd_and_hms(2026, 3, 8, 9, 0, 0).single(),
    ///         ..EventSchedule::default()
    ///     },
    ///     registrations_count: 0,
    /// };
    /// assert_eq!(listing.duration_days(), Some(2));
    /// ```
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        let start = self.schedule.starts_at?;
        let end = self.schedule.ends_at?;
        Some((end.date_naive() - start.date_naive()).num_days())
    }
}

/// Listing entry with its flags resolved at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedEvent {
    /// Underlying listing.
    pub listing: EventListing,
    /// Phase at the resolution instant.
    pub phase: EventPhase,
    /// Whether registration is accepted at the resolution instant.
    pub registration_open: bool,
    /// Whether every capacity unit is taken.
    pub registration_full: bool,
}

impl ListedEvent {
    /// Resolve the time-dependent flags of `listing` at `now`.
    #[must_use]
    pub fn at(listing: EventListing, now: DateTime<Utc>) -> Self {
        Self {
            phase: listing.phase(now),
            registration_open: listing.registration_open(now),
            registration_full: listing.registration_full(),
            listing,
        }
    }
}

/// Events grouped by phase, each group in repository order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventCatalogue {
    pub upcoming: Vec<ListedEvent>,
    pub ongoing: Vec<ListedEvent>,
    pub past: Vec<ListedEvent>,
}

impl EventCatalogue {
    /// Resolve and group `listings` at `now`.
    #[must_use]
    pub fn group(listings: impl IntoIterator<Item = EventListing>, now: DateTime<Utc>) -> Self {
        let mut catalogue = Self::default();
        for listing in listings {
            let listed = ListedEvent::at(listing, now);
            match listed.phase {
                EventPhase::Upcoming => catalogue.upcoming.push(listed),
                EventPhase::Ongoing => catalogue.ongoing.push(listed),
                EventPhase::Past => catalogue.past.push(listed),
            }
        }
        catalogue
    }
}
