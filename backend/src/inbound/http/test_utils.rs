//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};

use crate::domain::ports::{
    FixtureIdentityResolver, IdentityResolver, MockAttendanceCommand, MockEventQuery,
    MockPaymentCommand, MockPaymentQuery, MockRegistrationCommand, MockRegistrationQuery,
    MockTeamJoinCommand,
};
use crate::inbound::http::state::{HttpState, HttpStatePorts};

/// Authorization header accepted by [`FixtureIdentityResolver`] for user 5.
pub const STUDENT_TOKEN: &str = "Bearer 5";

/// Mocked driving ports; unset expectations fail the test when called.
#[derive(Default)]
pub struct TestPorts {
    pub registrations: MockRegistrationCommand,
    pub team_join: MockTeamJoinCommand,
    pub registration_query: MockRegistrationQuery,
    pub payments: MockPaymentCommand,
    pub payment_query: MockPaymentQuery,
    pub attendance: MockAttendanceCommand,
    pub events: MockEventQuery,
}

impl TestPorts {
    /// Build state that authenticates with numeric fixture tokens.
    pub fn into_state(self) -> HttpState {
        self.into_state_with_identity(Arc::new(FixtureIdentityResolver))
    }

    /// Build state with a custom identity resolver.
    pub fn into_state_with_identity(self, identity: Arc<dyn IdentityResolver>) -> HttpState {
        HttpState::new(HttpStatePorts {
            registrations: Arc::new(self.registrations),
            team_join: Arc::new(self.team_join),
            registration_query: Arc::new(self.registration_query),
            payments: Arc::new(self.payments),
            payment_query: Arc::new(self.payment_query),
            attendance: Arc::new(self.attendance),
            events: Arc::new(self.events),
            identity,
        })
    }
}

/// State whose driving ports expect no calls.
pub fn state_with_identity(identity: Arc<dyn IdentityResolver>) -> HttpState {
    TestPorts::default().into_state_with_identity(identity)
}

/// Application exposing every API handler under `/api/v1`.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api/v1").configure(super::configure_api))
}
