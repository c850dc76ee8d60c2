//! College event portal backend.
//!
//! Hexagonal layout: `domain` holds the registration model, decision rules,
//! services and ports; `inbound` adapts HTTP onto the driving ports;
//! `outbound` implements the driven ports against PostgreSQL, Razorpay, the
//! email API and JWT verification.

pub mod config;
pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

#[cfg(test)]
pub(crate) mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
