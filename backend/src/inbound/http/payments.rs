//! Payment HTTP handlers.
//!
//! ```text
//! POST /api/v1/payments/initiate
//! POST /api/v1/payments/verify
//! GET  /api/v1/payments/status/{registrationId}
//! ```
//!
//! The verify body uses the field names the Razorpay checkout callback
//! produces; the shorter `orderRef`, `paymentRef` and `signature` names are
//! accepted as aliases.

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{InitiatePaymentRequest, VerifyPaymentRequest};
use crate::domain::{
    InitiatedOrder, OrderReference, PaymentActivation, PaymentDetails, PaymentOverview,
    PaymentReference, PaymentSignature, RegistrationId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::registrations_dto::TeamInfoResponse;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_reference, require};

const REGISTRATION_ID: FieldName = FieldName::new("registrationId");
const ORDER_ID: FieldName = FieldName::new("razorpay_order_id");
const PAYMENT_ID: FieldName = FieldName::new("razorpay_payment_id");
const SIGNATURE: FieldName = FieldName::new("razorpay_signature");

/// Body of `POST /payments/initiate`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePaymentBody {
    /// Registration to pay for.
    pub registration_id: Option<i64>,
}

/// Body of `POST /payments/verify`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct VerifyPaymentBody {
    /// Gateway order id.
    #[serde(alias = "orderRef")]
    pub razorpay_order_id: Option<String>,
    /// Gateway payment id.
    #[serde(alias = "paymentRef")]
    pub razorpay_payment_id: Option<String>,
    /// Hex HMAC-SHA256 of `order_id|payment_id`.
    #[serde(alias = "signature")]
    pub razorpay_signature: Option<String>,
}

/// Order handle for the checkout widget.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InitiatedOrderResponse {
    pub registration_id: i64,
    pub order_id: String,
    /// Amount in minor units, as the checkout widget expects.
    pub amount: i64,
    pub currency: String,
    pub key_id: String,
    pub event_name: String,
    pub user_name: String,
    pub user_email: String,
}

impl From<InitiatedOrder> for InitiatedOrderResponse {
    fn from(value: InitiatedOrder) -> Self {
        Self {
            registration_id: value.registration_id.get(),
            order_id: value.order_id.into(),
            amount: value.amount.minor_units(),
            currency: value.currency,
            key_id: value.key_id,
            event_name: value.event_name,
            user_name: value.user_name,
            user_email: value.user_email,
        }
    }
}

/// Result of a verified payment.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerifiedResponse {
    pub registration_id: i64,
    pub event_name: String,
    #[schema(value_type = String, example = "500.00")]
    pub amount: String,
    pub payment_id: String,
    /// Team materialized by this payment, for team events.
    pub team: Option<TeamInfoResponse>,
}

impl From<PaymentActivation> for PaymentVerifiedResponse {
    fn from(value: PaymentActivation) -> Self {
        Self {
            registration_id: value.registration_id.get(),
            event_name: value.event_name,
            amount: value.amount.to_string(),
            payment_id: value.payment_id.into(),
            team: value.team.as_ref().map(TeamInfoResponse::for_lead),
        }
    }
}

/// Stored payment attempt.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetailsResponse {
    pub payment_id: i64,
    pub order_id: String,
    pub gateway_payment_id: Option<String>,
    #[schema(value_type = String, example = "500.00")]
    pub amount: String,
    /// `pending`, `completed`, `failed` or `refunded`.
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PaymentDetails> for PaymentDetailsResponse {
    fn from(value: PaymentDetails) -> Self {
        Self {
            payment_id: value.payment_id.get(),
            order_id: value.order_id,
            gateway_payment_id: value.gateway_payment_id,
            amount: value.amount.to_string(),
            status: value.status.as_str().to_owned(),
            created_at: value.created_at.to_rfc3339(),
            updated_at: value.updated_at.to_rfc3339(),
        }
    }
}

/// Payment view of one registration.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusResponse {
    pub registration_id: i64,
    pub event_name: String,
    #[schema(value_type = String, example = "500.00")]
    pub fee_amount: String,
    pub payment_required: bool,
    pub payment_status: bool,
    pub payment_details: Option<PaymentDetailsResponse>,
}

impl From<PaymentOverview> for PaymentStatusResponse {
    fn from(value: PaymentOverview) -> Self {
        Self {
            payment_required: value.payment_required(),
            registration_id: value.registration_id.get(),
            event_name: value.event_name,
            fee_amount: value.fee.to_string(),
            payment_status: value.payment_status,
            payment_details: value.details.map(PaymentDetailsResponse::from),
        }
    }
}

/// Open a gateway order for the caller's registration.
#[utoipa::path(
    post,
    path = "/api/v1/payments/initiate",
    request_body = InitiatePaymentBody,
    responses(
        (status = 200, description = "Order created", body = InitiatedOrderResponse),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Only the team lead may pay", body = ErrorSchema),
        (status = 404, description = "Registration not found", body = ErrorSchema),
        (status = 409, description = "Already paid, free event, or event full", body = ErrorSchema),
        (status = 503, description = "Payment gateway unavailable", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "initiatePayment",
    security(("bearerAuth" = []))
)]
#[post("/payments/initiate")]
pub async fn initiate_payment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<InitiatePaymentBody>,
) -> ApiResult<HttpResponse> {
    let registration_id = require(payload.registration_id, REGISTRATION_ID)?;
    let order = state
        .payments
        .initiate(InitiatePaymentRequest {
            user_id: user.identity().user_id,
            registration_id: RegistrationId::new(registration_id),
        })
        .await?;
    Ok(HttpResponse::Ok().json(InitiatedOrderResponse::from(order)))
}

/// Verify a checkout callback and activate the registration.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentBody,
    responses(
        (status = 200, description = "Payment verified", body = PaymentVerifiedResponse),
        (status = 400, description = "Invalid request or signature", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Payment not found", body = ErrorSchema),
        (status = 409, description = "Already verified or retryable conflict", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "verifyPayment",
    security(("bearerAuth" = []))
)]
#[post("/payments/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<VerifyPaymentBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let request = VerifyPaymentRequest {
        user_id: user.identity().user_id,
        order: parse_reference(body.razorpay_order_id, ORDER_ID, OrderReference::new)?,
        payment: parse_reference(body.razorpay_payment_id, PAYMENT_ID, PaymentReference::new)?,
        signature: parse_reference(body.razorpay_signature, SIGNATURE, PaymentSignature::new)?,
    };
    let activation = state.payments.verify(request).await?;
    Ok(HttpResponse::Ok().json(PaymentVerifiedResponse::from(activation)))
}

/// Payment state of a registration owned by the caller.
#[utoipa::path(
    get,
    path = "/api/v1/payments/status/{registrationId}",
    params(("registrationId" = i64, Path, description = "Registration identifier")),
    responses(
        (status = 200, description = "Payment status", body = PaymentStatusResponse),
        (status = 400, description = "Invalid registration id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Registration not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "paymentStatus",
    security(("bearerAuth" = []))
)]
#[get("/payments/status/{registrationId}")]
pub async fn payment_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let registration_id: RegistrationId = parse_id(&path, REGISTRATION_ID)?;
    let overview = state
        .payment_query
        .status(user.identity().user_id, registration_id)
        .await?;
    Ok(HttpResponse::Ok()
        .insert_header(("Cache-Control", "private, no-cache"))
        .json(PaymentStatusResponse::from(overview)))
}

#[cfg(test)]
#[path = "payments_tests.rs"]
mod tests;
