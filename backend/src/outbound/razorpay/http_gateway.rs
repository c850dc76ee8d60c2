//! Reqwest-backed Razorpay gateway adapter.
//!
//! This adapter owns transport details only: basic authentication, request
//! serialisation, timeout and HTTP error mapping, and JSON decoding into
//! gateway orders.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use zeroize::Zeroizing;

use super::dto::{CreateOrderDto, OrderDto};
use crate::domain::OrderRequest;
use crate::domain::ports::{GatewayOrder, PaymentGateway, PaymentGatewayError};

/// API key pair issued by Razorpay.
pub struct RazorpayCredentials {
    /// Public key id, also handed to the checkout widget.
    pub key_id: String,
    /// Private key secret.
    pub key_secret: Zeroizing<String>,
}

/// Payment gateway adapter that creates orders against one Razorpay endpoint.
pub struct RazorpayHttpGateway {
    client: Client,
    orders_url: Url,
    credentials: RazorpayCredentials,
}

impl RazorpayHttpGateway {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// `base_url` is the API root, for example `https://api.razorpay.com/v1`.
    ///
    /// # Errors
    ///
    /// Returns an error when the orders URL cannot be derived from `base_url`
    /// or the reqwest client cannot be constructed.
    pub fn new(
        base_url: &Url,
        credentials: RazorpayCredentials,
        timeout: Duration,
    ) -> Result<Self, PaymentGatewayError> {
        let orders_url = orders_url(base_url)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        Ok(Self {
            client,
            orders_url,
            credentials,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayHttpGateway {
    async fn create_order(
        &self,
        request: &OrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let response = self
            .client
            .post(self.orders_url.clone())
            .basic_auth(
                self.credentials.key_id.as_str(),
                Some(self.credentials.key_secret.as_str()),
            )
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&CreateOrderDto::from(request))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_order(body.as_ref())
    }
}

fn orders_url(base_url: &Url) -> Result<Url, PaymentGatewayError> {
    let mut root = base_url.clone();
    if !root.path().ends_with('/') {
        let path = format!("{}/", root.path());
        root.set_path(&path);
    }
    root.join("orders")
        .map_err(|err| PaymentGatewayError::invalid_request(format!("invalid base url: {err}")))
}

fn parse_order(body: &[u8]) -> Result<GatewayOrder, PaymentGatewayError> {
    let decoded: OrderDto = serde_json::from_slice(body).map_err(|error| {
        PaymentGatewayError::decode(format!("invalid Razorpay JSON payload: {error}"))
    })?;
    decoded
        .into_gateway_order()
        .map_err(PaymentGatewayError::decode)
}

fn map_transport_error(error: reqwest::Error) -> PaymentGatewayError {
    if error.is_timeout() {
        PaymentGatewayError::timeout(error.to_string())
    } else {
        PaymentGatewayError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let body_preview = body_preview(body);
    let message = if body_preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), body_preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => PaymentGatewayError::rate_limited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            PaymentGatewayError::timeout(message)
        }
        _ if status.is_client_error() => PaymentGatewayError::invalid_request(message),
        _ => PaymentGatewayError::transport(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
