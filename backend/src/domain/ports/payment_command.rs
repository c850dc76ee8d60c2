//! Driving port for paying for registrations.

use async_trait::async_trait;

use crate::domain::{
    Error, InitiatedOrder, OrderReference, PaymentActivation, PaymentReference, PaymentSignature,
    RegistrationId, UserId,
};

/// Request to open a payment order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitiatePaymentRequest {
    /// Caller.
    pub user_id: UserId,
    /// Registration to pay for.
    pub registration_id: RegistrationId,
}

/// Gateway callback forwarded by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPaymentRequest {
    /// Caller.
    pub user_id: UserId,
    /// Gateway order id.
    pub order: OrderReference,
    /// Gateway payment id.
    pub payment: PaymentReference,
    /// Signature presented by the client.
    pub signature: PaymentSignature,
}

/// Payment-gated activation entry point.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentCommand: Send + Sync {
    /// Create a gateway order for the caller's registration.
    async fn initiate(&self, request: InitiatePaymentRequest) -> Result<InitiatedOrder, Error>;

    /// Verify a gateway callback and activate the registration.
    ///
    /// # Errors
    ///
    /// Returns `invalid_signature` on a signature mismatch; the payment stays
    /// pending and the registration unpaid.
    async fn verify(&self, request: VerifyPaymentRequest) -> Result<PaymentActivation, Error>;
}
