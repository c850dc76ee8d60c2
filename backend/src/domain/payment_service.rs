//! Payment-gated activation.
//!
//! `verify` checks the gateway signature before any write. Only a
//! [`VerifiedPayment`] proof reaches the repository, so a tampered callback
//! can never flip a registration to paid.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::ports::{
    InitiatePayment, InitiatePaymentRequest, PaymentCommand, PaymentGatewayError, PaymentQuery,
    PaymentRepository, PaymentRepositoryError, PendingOrder, VerifyPaymentRequest,
};
use crate::domain::{
    Error, InitiatedOrder, NotificationDispatcher, PaymentActivation, PaymentOverview,
    PaymentSignatureVerifier, PaymentStatus, RegistrationId, RegistrationRejection, UserId,
    VerifiedPayment,
};

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::Transport { .. }
        | PaymentGatewayError::Timeout { .. }
        | PaymentGatewayError::RateLimited { .. } => {
            Error::service_unavailable(format!("payment gateway unavailable: {error}"))
        }
        PaymentGatewayError::InvalidRequest { .. } | PaymentGatewayError::Decode { .. } => {
            Error::internal(format!("payment gateway error: {error}"))
        }
    }
}

fn map_payment_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
        PaymentRepositoryError::Conflict { message } => {
            debug!(%message, "payment transaction aborted");
            Error::retryable_conflict("Payment conflicted with a concurrent request. Please retry.")
        }
        PaymentRepositoryError::Gateway { error } => map_gateway_error(error),
        PaymentRepositoryError::Rejected { rejection } => rejection.into_error(),
    }
}

/// Payment service implementing [`PaymentCommand`] and [`PaymentQuery`].
#[derive(Clone)]
pub struct PaymentService<R> {
    repo: Arc<R>,
    verifier: PaymentSignatureVerifier,
    key_id: String,
    dispatcher: NotificationDispatcher,
    clock: Arc<dyn Clock>,
}

impl<R> PaymentService<R> {
    /// Create a new service.
    ///
    /// `key_id` is the public gateway key returned to clients so they can
    /// open the checkout.
    pub fn new(
        repo: Arc<R>,
        verifier: PaymentSignatureVerifier,
        key_id: impl Into<String>,
        dispatcher: NotificationDispatcher,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repo,
            verifier,
            key_id: key_id.into(),
            dispatcher,
            clock,
        }
    }

    fn initiated(&self, pending: PendingOrder) -> InitiatedOrder {
        InitiatedOrder {
            registration_id: pending.registration_id,
            order_id: pending.order_id,
            amount: pending.amount,
            currency: pending.currency,
            key_id: self.key_id.clone(),
            event_name: pending.event_name,
            user_name: pending.user_name,
            user_email: pending.user_email,
        }
    }
}

impl<R> PaymentService<R>
where
    R: PaymentRepository,
{
    /// Surface missing, foreign, and already-completed payments before the
    /// signature check so callers get a precise answer.
    async fn ensure_verifiable(&self, request: &VerifyPaymentRequest) -> Result<(), Error> {
        let lookup = self
            .repo
            .find_by_order(&request.order)
            .await
            .map_err(map_payment_error)?
            .filter(|lookup| lookup.owner == request.user_id)
            .ok_or_else(|| RegistrationRejection::PaymentNotFound.into_error())?;
        if lookup.status == PaymentStatus::Completed {
            return Err(RegistrationRejection::AlreadyVerified.into_error());
        }
        Ok(())
    }

    fn check_signature(&self, request: VerifyPaymentRequest) -> Result<VerifiedPayment, Error> {
        let order = request.order.clone();
        self.verifier
            .verify(request.order, request.payment, request.signature)
            .map_err(|mismatch| {
                warn!(order_id = %order, "payment signature mismatch");
                Error::invalid_signature(mismatch.to_string())
                    .with_details(json!({ "retryable": false }))
            })
    }
}

#[async_trait]
impl<R> PaymentCommand for PaymentService<R>
where
    R: PaymentRepository,
{
    async fn initiate(&self, request: InitiatePaymentRequest) -> Result<InitiatedOrder, Error> {
        let pending = self
            .repo
            .initiate(InitiatePayment {
                user_id: request.user_id,
                registration_id: request.registration_id,
                now: self.clock.utc(),
            })
            .await
            .map_err(map_payment_error)?;
        info!(
            registration_id = %pending.registration_id,
            order_id = %pending.order_id,
            amount = %pending.amount,
            "payment order created"
        );
        Ok(self.initiated(pending))
    }

    async fn verify(&self, request: VerifyPaymentRequest) -> Result<PaymentActivation, Error> {
        self.ensure_verifiable(&request).await?;
        let proof = self.check_signature(request)?;
        let activation = self
            .repo
            .complete(&proof, self.clock.utc())
            .await
            .map_err(map_payment_error)?;

        info!(
            registration_id = %activation.registration_id,
            order_id = %proof.order(),
            team_id = activation.team.as_ref().map(|team| team.id.get()),
            recipients = activation.notices.len(),
            "payment verified"
        );
        self.dispatcher.dispatch(activation.notices.clone());
        Ok(activation)
    }
}

#[async_trait]
impl<R> PaymentQuery for PaymentService<R>
where
    R: PaymentRepository,
{
    async fn status(
        &self,
        user_id: UserId,
        registration_id: RegistrationId,
    ) -> Result<PaymentOverview, Error> {
        self.repo
            .overview(user_id, registration_id)
            .await
            .map_err(map_payment_error)?
            .ok_or_else(|| RegistrationRejection::RegistrationNotFound.into_error())
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
