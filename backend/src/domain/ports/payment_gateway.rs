//! Port for the external payment gateway.

use async_trait::async_trait;

use crate::domain::{Money, OrderReference, OrderRequest};

use super::define_port_error;

define_port_error! {
    /// Errors raised while talking to the payment gateway.
    pub enum PaymentGatewayError {
        /// The gateway could not be reached.
        Transport { message: String } => "payment gateway transport failed: {message}",
        /// The gateway did not answer in time.
        Timeout { message: String } => "payment gateway timed out: {message}",
        /// The gateway throttled the request.
        RateLimited { message: String } => "payment gateway rate limited: {message}",
        /// The gateway rejected the order.
        InvalidRequest { message: String } => "payment gateway rejected order: {message}",
        /// The gateway answered with an unreadable body.
        Decode { message: String } => "payment gateway response invalid: {message}",
    }
}

/// Order as acknowledged by the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrder {
    /// Gateway order id.
    pub order_id: OrderReference,
    /// Amount the gateway will collect.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
}

/// Creates payment orders with the external gateway.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for `request.amount`.
    async fn create_order(&self, request: &OrderRequest)
    -> Result<GatewayOrder, PaymentGatewayError>;
}

/// Fixture gateway that derives the order id from the receipt.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let order_id = OrderReference::new(format!("order_{}", request.receipt))
            .map_err(|err| PaymentGatewayError::invalid_request(err.to_string()))?;
        Ok(GatewayOrder {
            order_id,
            amount: request.amount,
            currency: request.currency.to_owned(),
        })
    }
}
