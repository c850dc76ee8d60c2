//! Row seeding for repository suites.

use chrono::{DateTime, Duration, Utc};
use postgres::{Client, NoTls};

use super::format_postgres_error;

/// Event row to insert.
#[derive(Debug, Clone)]
pub struct EventSeed {
    pub name: &'static str,
    pub min_team_size: i32,
    pub max_team_size: i32,
    pub fee_minor: i64,
    pub max_registrations: Option<i32>,
    pub opens_at: Option<DateTime<Utc>>,
    pub closes_at: Option<DateTime<Utc>>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl EventSeed {
    /// Open solo event.
    pub fn solo(name: &'static str, fee_minor: i64) -> Self {
        Self {
            name,
            min_team_size: 1,
            max_team_size: 1,
            fee_minor,
            max_registrations: None,
            opens_at: None,
            closes_at: None,
            starts_at: None,
            ends_at: None,
        }
    }

    /// Open team event accepting teams of `min..=max` members.
    pub fn team(name: &'static str, fee_minor: i64, min: i32, max: i32) -> Self {
        Self {
            min_team_size: min,
            max_team_size: max,
            ..Self::solo(name, fee_minor)
        }
    }

    /// Cap the number of capacity units.
    pub fn capped(mut self, max_registrations: i32) -> Self {
        self.max_registrations = Some(max_registrations);
        self
    }

    /// Schedule the event between `starts_at` and `ends_at`.
    pub fn scheduled(mut self, starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> Self {
        self.starts_at = Some(starts_at);
        self.ends_at = Some(ends_at);
        self
    }

    /// Window that closed an hour before `now`.
    pub fn closed_before(mut self, now: DateTime<Utc>) -> Self {
        self.opens_at = Some(now - Duration::days(2));
        self.closes_at = Some(now - Duration::hours(1));
        self
    }
}

/// Synchronous seeding connection.
pub struct Seeder {
    client: Client,
}

impl Seeder {
    /// Connect to the database at `url`.
    pub fn connect(url: &str) -> Result<Self, String> {
        let client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
        Ok(Self { client })
    }

    /// Insert a user and return its id.
    pub fn user(&mut self, name: &str, role: &str) -> i64 {
        let email = format!("{}@college.test", name.to_lowercase().replace(' ', "."));
        self.client
            .query_one(
                "INSERT INTO users (name, email, role) VALUES ($1, $2, $3) RETURNING user_id",
                &[&name, &email, &role],
            )
            .map(|row| row.get(0))
            .expect("insert user")
    }

    /// Insert an event and return its id.
    pub fn event(&mut self, seed: &EventSeed) -> i64 {
        self.client
            .query_one(
                "INSERT INTO events (event_name, min_team_size, max_team_size, fee_amount_minor, \
                 max_registrations, reg_start_time, reg_end_time, event_start_time, \
                 event_end_time) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) RETURNING event_id",
                &[
                    &seed.name,
                    &seed.min_team_size,
                    &seed.max_team_size,
                    &seed.fee_minor,
                    &seed.max_registrations,
                    &seed.opens_at,
                    &seed.closes_at,
                    &seed.starts_at,
                    &seed.ends_at,
                ],
            )
            .map(|row| row.get(0))
            .expect("insert event")
    }

    /// Insert an accommodation option and return its id.
    pub fn accommodation(&mut self, name: &str) -> i32 {
        self.client
            .query_one(
                "INSERT INTO accommodations (accommodation) VALUES ($1) RETURNING accommodation_id",
                &[&name],
            )
            .map(|row| row.get(0))
            .expect("insert accommodation")
    }

    /// Run a scalar count query.
    pub fn count(&mut self, sql: &str, params: &[&(dyn postgres::types::ToSql + Sync)]) -> i64 {
        self.client
            .query_one(sql, params)
            .map(|row| row.get(0))
            .expect("count query")
    }
}
