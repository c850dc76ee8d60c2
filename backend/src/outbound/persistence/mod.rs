//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the domain's driven ports backed by
//! PostgreSQL through `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! - **Thin adapters**: repositories load and lock rows, then defer every
//!   business decision to [`crate::domain::registration_rules`].
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) never leak into the domain layer.
//! - **Serializable writes**: register, join, initiate, and verify each run
//!   in one serializable transaction with explicit `FOR UPDATE` locks.
//! - **Snapshot reads**: the event listing and the staff report read inside
//!   read-only repeatable-read transactions.
//! - **Strongly typed errors**: database failures are classified once in
//!   `diesel_helpers` and mapped onto each port's error enum.
//!
//! # Example
//!
//! ```ignore
//! use portal_backend::outbound::persistence::{DbPool, PoolConfig, DieselRegistrationRepository};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/portal")).await?;
//! let repo = DieselRegistrationRepository::new(pool);
//! ```

mod diesel_attendance_repository;
mod diesel_event_repository;
pub(crate) mod diesel_helpers;
mod diesel_payment_repository;
mod diesel_registration_repository;
mod diesel_user_directory;
mod engine_queries;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_attendance_repository::DieselAttendanceRepository;
pub use diesel_event_repository::DieselEventRepository;
pub use diesel_payment_repository::DieselPaymentRepository;
pub use diesel_registration_repository::DieselRegistrationRepository;
pub use diesel_user_directory::DieselUserDirectory;
pub use migrations::{MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
