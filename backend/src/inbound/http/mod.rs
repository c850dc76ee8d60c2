//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod accommodations;
pub mod attendance;
pub mod auth;
pub mod error;
pub mod events;
pub mod health;
pub mod payments;
pub mod registrations;
pub mod registrations_dto;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub(crate) mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(registrations::register)
        .service(registrations::join_team)
        .service(registrations::registration_status)
        .service(payments::initiate_payment)
        .service(payments::verify_payment)
        .service(payments::payment_status)
        .service(accommodations::list_accommodations)
        .service(attendance::lookup_attendance)
        .service(attendance::mark_present)
        .service(attendance::registration_report)
        .service(events::list_events)
        .service(events::event_details);
}
