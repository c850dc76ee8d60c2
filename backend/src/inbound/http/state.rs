//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    AttendanceCommand, EventQuery, IdentityResolver, PaymentCommand, PaymentQuery,
    RegistrationCommand, RegistrationQuery, TeamJoinCommand,
};

/// Parameter object bundling all port implementations for HTTP handlers.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub registrations: Arc<dyn RegistrationCommand>,
    pub team_join: Arc<dyn TeamJoinCommand>,
    pub registration_query: Arc<dyn RegistrationQuery>,
    pub payments: Arc<dyn PaymentCommand>,
    pub payment_query: Arc<dyn PaymentQuery>,
    pub attendance: Arc<dyn AttendanceCommand>,
    pub events: Arc<dyn EventQuery>,
    pub identity: Arc<dyn IdentityResolver>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub registrations: Arc<dyn RegistrationCommand>,
    pub team_join: Arc<dyn TeamJoinCommand>,
    pub registration_query: Arc<dyn RegistrationQuery>,
    pub payments: Arc<dyn PaymentCommand>,
    pub payment_query: Arc<dyn PaymentQuery>,
    pub attendance: Arc<dyn AttendanceCommand>,
    pub events: Arc<dyn EventQuery>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        Self::new(ports)
    }
}

impl HttpState {
    /// Construct state from a ports bundle.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use portal_backend::domain::ports::{
    ///     FixtureAttendanceRepository, FixtureEventRepository, FixtureIdentityResolver,
    ///     FixturePaymentRepository, FixtureRegistrationRepository,
    /// };
    /// use portal_backend::domain::{
    ///     AttendanceService, EventService, NotificationDispatcher, PaymentService,
    ///     PaymentSignatureVerifier, RegistrationService, TeamJoinService,
    /// };
    /// use portal_backend::inbound::http::state::{HttpState, HttpStatePorts};
    /// use portal_backend::outbound::email::LogNotificationSink;
    ///
    /// let dispatcher = NotificationDispatcher::new(Arc::new(LogNotificationSink));
    /// let registrations = Arc::new(FixtureRegistrationRepository);
    /// let payments = Arc::new(PaymentService::new(
    ///     Arc::new(FixturePaymentRepository),
    ///     PaymentSignatureVerifier::new("secret"),
    ///     "rzp_test_key",
    ///     dispatcher.clone(),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let register = Arc::new(RegistrationService::new(
    ///     registrations.clone(),
    ///     dispatcher.clone(),
    ///     Arc::new(DefaultClock),
    /// ));
    /// let state = HttpState::new(HttpStatePorts {
    ///     registrations: register.clone(),
    ///     team_join: Arc::new(TeamJoinService::new(
    ///         registrations,
    ///         dispatcher,
    ///         Arc::new(DefaultClock),
    ///     )),
    ///     registration_query: register,
    ///     payments: payments.clone(),
    ///     payment_query: payments,
    ///     attendance: Arc::new(AttendanceService::new(Arc::new(FixtureAttendanceRepository))),
    ///     events: Arc::new(EventService::new(
    ///         Arc::new(FixtureEventRepository),
    ///         Arc::new(DefaultClock),
    ///     )),
    ///     identity: Arc::new(FixtureIdentityResolver),
    /// });
    /// let _identity = state.identity.clone();
    /// ```
    pub fn new(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            registrations,
            team_join,
            registration_query,
            payments,
            payment_query,
            attendance,
            events,
            identity,
        } = ports;
        Self {
            registrations,
            team_join,
            registration_query,
            payments,
            payment_query,
            attendance,
            events,
            identity,
        }
    }
}
