//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`*Command`, `*Query`) are consumed by inbound adapters.
//! Driven ports (`*Repository`, gateways, sinks) are implemented by outbound
//! adapters. Every trait is automocked for unit tests.

mod macros;
pub(crate) use macros::define_port_error;

mod attendance_command;
mod attendance_repository;
mod event_query;
mod event_repository;
mod identity_resolver;
mod notification_sink;
mod payment_command;
mod payment_gateway;
mod payment_query;
mod payment_repository;
mod registration_command;
mod registration_query;
mod registration_repository;
mod team_join_command;
mod user_directory;

#[cfg(test)]
pub use attendance_command::MockAttendanceCommand;
pub use attendance_command::AttendanceCommand;
#[cfg(test)]
pub use attendance_repository::MockAttendanceRepository;
pub use attendance_repository::{
    AttendanceRepository, AttendanceRepositoryError, FixtureAttendanceRepository,
};
#[cfg(test)]
pub use event_query::MockEventQuery;
pub use event_query::EventQuery;
#[cfg(test)]
pub use event_repository::MockEventRepository;
pub use event_repository::{EventRepository, EventRepositoryError, FixtureEventRepository};
#[cfg(test)]
pub use identity_resolver::MockIdentityResolver;
pub use identity_resolver::{FixtureIdentityResolver, IdentityError, IdentityResolver};
#[cfg(test)]
pub use notification_sink::MockNotificationSink;
pub use notification_sink::{DeliveryReceipt, NotificationSink, NotificationSinkError};
#[cfg(test)]
pub use payment_command::MockPaymentCommand;
pub use payment_command::{InitiatePaymentRequest, PaymentCommand, VerifyPaymentRequest};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    FixturePaymentGateway, GatewayOrder, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use payment_query::MockPaymentQuery;
pub use payment_query::PaymentQuery;
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use payment_repository::{
    FixturePaymentRepository, InitiatePayment, PaymentLookup, PaymentRepository,
    PaymentRepositoryError, PendingOrder,
};
#[cfg(test)]
pub use registration_command::MockRegistrationCommand;
pub use registration_command::{RegisterRequest, RegistrationCommand};
#[cfg(test)]
pub use registration_query::MockRegistrationQuery;
pub use registration_query::RegistrationQuery;
#[cfg(test)]
pub use registration_repository::MockRegistrationRepository;
pub use registration_repository::{
    FixtureRegistrationRepository, JoinDraft, RegistrationDraft, RegistrationRepository,
    RegistrationRepositoryError,
};
#[cfg(test)]
pub use team_join_command::MockTeamJoinCommand;
pub use team_join_command::{JoinTeamRequest, TeamJoinCommand};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};
