//! Port for payment-gated activation storage.
//!
//! Adapters own a [`super::PaymentGateway`] so the order is created inside
//! the initiating transaction: if the gateway call fails, no payment row is
//! written.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    Money, OrderReference, PaymentActivation, PaymentOverview, PaymentStatus, RegistrationId,
    RegistrationRejection, UserId, VerifiedPayment,
};

use super::{PaymentGatewayError, define_port_error};

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payment repository query failed: {message}",
        /// The store aborted the transaction. Safe to retry.
        Conflict { message: String } =>
            "payment transaction aborted: {message}",
        /// Order creation failed; nothing was written.
        Gateway { error: PaymentGatewayError } => "{error}",
        /// A business rule rejected the request.
        Rejected { rejection: RegistrationRejection } => "{rejection}",
    }
}

impl From<RegistrationRejection> for PaymentRepositoryError {
    fn from(rejection: RegistrationRejection) -> Self {
        Self::Rejected { rejection }
    }
}

/// Input for opening a payment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiatePayment {
    /// Caller; must own the registration and lead its team.
    pub user_id: UserId,
    /// Registration to pay for.
    pub registration_id: RegistrationId,
    /// Clock reading for row timestamps.
    pub now: DateTime<Utc>,
}

/// Pending order written by [`PaymentRepository::initiate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingOrder {
    /// Registration being paid for.
    pub registration_id: RegistrationId,
    /// Gateway order id.
    pub order_id: OrderReference,
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Event display name.
    pub event_name: String,
    /// Payer display name.
    pub user_name: String,
    /// Payer email.
    pub user_email: String,
}

/// Unlocked read of a payment row by order reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentLookup {
    /// Registration the payment belongs to.
    pub registration_id: RegistrationId,
    /// Owner of that registration.
    pub owner: UserId,
    /// Current lifecycle state.
    pub status: PaymentStatus,
}

/// Transactional payment storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Lock the registration, check it may be paid, create a gateway order,
    /// and upsert a pending payment row.
    async fn initiate(
        &self,
        request: InitiatePayment,
    ) -> Result<PendingOrder, PaymentRepositoryError>;

    /// Read a payment by its gateway order id without locking.
    async fn find_by_order(
        &self,
        order: &OrderReference,
    ) -> Result<Option<PaymentLookup>, PaymentRepositoryError>;

    /// Lock the payment, mark it completed, mark the registration paid, and
    /// materialize the lead's team when one is pending.
    ///
    /// Rejects with `AlreadyVerified` if the payment completed concurrently
    /// and with `EventFull` if capacity was exhausted meanwhile; either way
    /// nothing is written.
    async fn complete(
        &self,
        proof: &VerifiedPayment,
        now: DateTime<Utc>,
    ) -> Result<PaymentActivation, PaymentRepositoryError>;

    /// Payment view of a registration owned by `user_id`.
    async fn overview(
        &self,
        user_id: UserId,
        registration_id: RegistrationId,
    ) -> Result<Option<PaymentOverview>, PaymentRepositoryError>;
}

/// Fixture repository where no registration can be paid.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentRepository;

#[async_trait]
impl PaymentRepository for FixturePaymentRepository {
    async fn initiate(
        &self,
        _request: InitiatePayment,
    ) -> Result<PendingOrder, PaymentRepositoryError> {
        Err(RegistrationRejection::RegistrationNotFound.into())
    }

    async fn find_by_order(
        &self,
        _order: &OrderReference,
    ) -> Result<Option<PaymentLookup>, PaymentRepositoryError> {
        Ok(None)
    }

    async fn complete(
        &self,
        _proof: &VerifiedPayment,
        _now: DateTime<Utc>,
    ) -> Result<PaymentActivation, PaymentRepositoryError> {
        Err(RegistrationRejection::PaymentNotFound.into())
    }

    async fn overview(
        &self,
        _user_id: UserId,
        _registration_id: RegistrationId,
    ) -> Result<Option<PaymentOverview>, PaymentRepositoryError> {
        Ok(None)
    }
}
