//! Builders wiring driving-port services onto fixture or Diesel adapters.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use portal_backend::domain::ports::{
    AttendanceRepository, EventRepository, FixtureAttendanceRepository, FixtureEventRepository,
    FixtureIdentityResolver, FixturePaymentRepository, FixtureRegistrationRepository,
    IdentityResolver, PaymentRepository, RegistrationRepository,
};
use portal_backend::domain::{
    AttendanceService, EventService, NotificationDispatcher, PaymentService,
    PaymentSignatureVerifier, RegistrationService, TeamJoinService,
};
use portal_backend::inbound::http::state::{HttpState, HttpStatePorts};
use portal_backend::outbound::persistence::{
    DieselAttendanceRepository, DieselEventRepository, DieselPaymentRepository,
    DieselRegistrationRepository,
};

use super::ServerConfig;

/// Driven adapters of one wiring mode.
struct Repositories<Reg, Pay, Att, Evt> {
    registrations: Arc<Reg>,
    payments: Arc<Pay>,
    attendance: Arc<Att>,
    events: Arc<Evt>,
    identity: Arc<dyn IdentityResolver>,
}

fn wire<Reg, Pay, Att, Evt>(
    config: &ServerConfig,
    repos: Repositories<Reg, Pay, Att, Evt>,
) -> HttpState
where
    Reg: RegistrationRepository + 'static,
    Pay: PaymentRepository + 'static,
    Att: AttendanceRepository + 'static,
    Evt: EventRepository + 'static,
{
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let dispatcher = NotificationDispatcher::new(config.notifications.clone());
    let registration = Arc::new(RegistrationService::new(
        repos.registrations.clone(),
        dispatcher.clone(),
        clock.clone(),
    ));
    let team_join = Arc::new(TeamJoinService::new(
        repos.registrations,
        dispatcher.clone(),
        clock.clone(),
    ));
    let payment = Arc::new(PaymentService::new(
        repos.payments,
        PaymentSignatureVerifier::new(config.signature_secret.as_str()),
        config.razorpay_key_id.clone(),
        dispatcher,
        clock.clone(),
    ));
    HttpState::new(HttpStatePorts {
        registrations: registration.clone(),
        team_join,
        registration_query: registration,
        payments: payment.clone(),
        payment_query: payment,
        attendance: Arc::new(AttendanceService::new(repos.attendance)),
        events: Arc::new(EventService::new(repos.events, clock)),
        identity: repos.identity,
    })
}

/// Build the HTTP state, using Diesel adapters when persistence is
/// configured and fixtures otherwise.
pub(super) fn build_http_state(config: &ServerConfig) -> HttpState {
    match &config.persistence {
        Some(persistence) => wire(
            config,
            Repositories {
                registrations: Arc::new(DieselRegistrationRepository::new(
                    persistence.pool.clone(),
                )),
                payments: Arc::new(DieselPaymentRepository::new(
                    persistence.pool.clone(),
                    persistence.gateway.clone(),
                )),
                attendance: Arc::new(DieselAttendanceRepository::new(persistence.pool.clone())),
                events: Arc::new(DieselEventRepository::new(persistence.pool.clone())),
                identity: persistence.identity.clone(),
            },
        ),
        None => wire(
            config,
            Repositories {
                registrations: Arc::new(FixtureRegistrationRepository),
                payments: Arc::new(FixturePaymentRepository),
                attendance: Arc::new(FixtureAttendanceRepository),
                events: Arc::new(FixtureEventRepository),
                identity: Arc::new(FixtureIdentityResolver),
            },
        ),
    }
}
