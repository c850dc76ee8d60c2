//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **razorpay**: payment gateway over the Razorpay Orders API
//! - **email**: notification sinks for registration confirmations
//! - **identity**: bearer token verification
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod email;
pub mod identity;
pub mod persistence;
pub mod razorpay;
