//! Domain primitives, decision rules, services, and ports.
//!
//! Purpose: model event registration, team formation, and payment-gated
//! activation independently of transport and storage. Types are immutable
//! once built and document their invariants in Rustdoc.
//!
//! Public surface:
//! - Error / ErrorCode: transport-agnostic failure payload.
//! - Event, Team*, Registration*, Payment*: registration workflow model.
//! - EventListing / EventCatalogue: public listing with derived flags.
//! - RegistrationRejection: business-rule failures raised in transactions.
//! - *Service: driving port implementations.

pub mod attendance;
pub mod attendance_service;
pub mod error;
pub mod event;
pub mod event_listing;
pub mod event_service;
pub(crate) mod identifier;
pub mod money;
pub mod notification;
pub mod payment;
pub mod payment_service;
pub mod ports;
pub mod registration;
pub mod registration_rules;
pub mod registration_service;
pub mod team;
pub mod trace_id;
pub mod user;

pub use self::attendance::{AttendanceRecord, RegistrationReportEntry, ReportTeam};
pub use self::attendance_service::AttendanceService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::event::{Event, EventId, EventShape, EventStatus, UnknownEventStatusError};
pub use self::event_listing::{EventCatalogue, EventListing, EventPhase, EventSchedule, ListedEvent};
pub use self::event_service::EventService;
pub use self::money::{CURRENCY_INR, Money, MoneyError};
pub use self::notification::{
    NoticeTeam, Notification, NotificationDispatcher, RegistrationNotice,
};
pub use self::payment::{
    EmptyReferenceError, InitiatedOrder, OrderNotes, OrderReference, OrderRequest,
    PaymentActivation, PaymentDetails, PaymentId, PaymentOverview, PaymentReference,
    PaymentSignature, PaymentSignatureVerifier, PaymentStatus, SignatureMismatch,
    UnknownPaymentStatusError, VerifiedPayment,
};
pub use self::payment_service::PaymentService;
pub use self::registration::{
    Accommodation, AccommodationId, ActivationState, AttendanceStatus, DEFAULT_FOOD_PREFERENCE,
    ExistingRegistration, FoodPreference, JoinOutcome, RegistrationId, RegistrationOutcome,
    RegistrationSnapshot, RegistrationStatus, TeamAssignment, UnknownAttendanceStatusError,
};
pub use self::registration_rules::{
    Admission, PayabilityFacts, RegistrationRejection, RejectionKind, admit_event, admit_join,
    check_payable, ensure_capacity, resolve_existing,
};
pub use self::registration_service::{
    NAME_COLLISION_ATTEMPTS, RegistrationService, TeamJoinService,
};
pub use self::team::{
    STORED_TEAM_NAME_MAX, TEAM_CODE_ATTEMPTS, TEAM_CODE_LEN, TEAM_NAME_MAX, TeamCode, TeamId,
    TeamMember, TeamName, TeamNameChoice, TeamSummary, TeamValidationError, next_available_name,
};
pub use self::trace_id::TraceId;
pub use self::user::{BearerCredential, Identity, UnknownRoleError, UserId, UserRole};

/// Header carrying the request trace identifier.
pub const TRACE_ID_HEADER: &str = "trace-id";

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use portal_backend::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
