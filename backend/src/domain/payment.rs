//! Payment orders, gateway signatures, and verification results.
//!
//! Signature checks happen here rather than in the gateway adapter so the
//! HMAC contract is enforced identically whichever gateway is wired in. A
//! successful check yields a [`VerifiedPayment`], the only value the payment
//! repository accepts when completing a payment.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use super::identifier::define_numeric_id;
use super::{CURRENCY_INR, Money, RegistrationId, TeamSummary};
use super::notification::RegistrationNotice;

type HmacSha256 = Hmac<Sha256>;

define_numeric_id! {
    /// Internal payment row identifier.
    pub struct PaymentId(i64);
}

/// Lifecycle of a payment row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// Order created, awaiting verification.
    Pending,
    /// Signature verified.
    Completed,
    /// Gateway reported failure.
    Failed,
    /// Refunded out of band.
    Refunded,
}

impl PaymentStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

/// Error returned when parsing an unknown payment status.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown payment status: {0}")]
pub struct UnknownPaymentStatusError(pub String);

impl FromStr for PaymentStatus {
    type Err = UnknownPaymentStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownPaymentStatusError(other.to_owned())),
        }
    }
}

/// Validation error for gateway references.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} must not be empty")]
pub struct EmptyReferenceError {
    /// Offending field name.
    pub field: &'static str,
}

macro_rules! define_reference {
    ($(#[$outer:meta])* $name:ident, $field:literal) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Trim and reject empty references.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, EmptyReferenceError> {
                let trimmed = raw.as_ref().trim();
                if trimmed.is_empty() {
                    return Err(EmptyReferenceError { field: $field });
                }
                Ok(Self(trimmed.to_owned()))
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = EmptyReferenceError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

define_reference!(
    /// Gateway order id (`order_...`).
    OrderReference,
    "orderRef"
);
define_reference!(
    /// Gateway payment id (`pay_...`).
    PaymentReference,
    "paymentRef"
);
define_reference!(
    /// Hex-encoded HMAC presented by the client.
    PaymentSignature,
    "signature"
);

/// Signature did not match the expected HMAC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("Invalid payment signature")]
pub struct SignatureMismatch;

/// Proof that a gateway callback carried a valid signature.
///
/// Only [`PaymentSignatureVerifier::verify`] constructs this value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPayment {
    order: OrderReference,
    payment: PaymentReference,
    signature: PaymentSignature,
}

impl VerifiedPayment {
    /// Order the payment settles.
    #[must_use]
    pub const fn order(&self) -> &OrderReference {
        &self.order
    }

    /// Gateway payment id.
    #[must_use]
    pub const fn payment(&self) -> &PaymentReference {
        &self.payment
    }

    /// Verified signature, stored for audit.
    #[must_use]
    pub const fn signature(&self) -> &PaymentSignature {
        &self.signature
    }
}

/// Checks `HMAC-SHA256(secret, "{order}|{payment}")` against a presented
/// signature.
#[derive(Clone)]
pub struct PaymentSignatureVerifier {
    secret: Zeroizing<String>,
}

impl fmt::Debug for PaymentSignatureVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentSignatureVerifier")
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl PaymentSignatureVerifier {
    /// Build a verifier around the gateway key secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Zeroizing::new(secret.into()),
        }
    }

    /// Hex-encoded signature the gateway would produce for the pair.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{OrderReference, PaymentReference, PaymentSignatureVerifier};
    ///
    /// let verifier = PaymentSignatureVerifier::new("secret");
    /// let order = OrderReference::new("order_1").expect("order");
    /// let payment = PaymentReference::new("pay_1").expect("payment");
    /// assert_eq!(verifier.sign(&order, &payment).len(), 64);
    /// ```
    #[must_use]
    pub fn sign(&self, order: &OrderReference, payment: &PaymentReference) -> String {
        // HMAC accepts keys of any length, so construction cannot fail.
        let mut mac = match HmacSha256::new_from_slice(self.secret.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return String::new(),
        };
        mac.update(order.as_ref().as_bytes());
        mac.update(b"|");
        mac.update(payment.as_ref().as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Compare the presented signature in constant time.
    pub fn verify(
        &self,
        order: OrderReference,
        payment: PaymentReference,
        signature: PaymentSignature,
    ) -> Result<VerifiedPayment, SignatureMismatch> {
        let expected = self.sign(&order, &payment);
        let presented = signature.as_ref().to_ascii_lowercase();
        let matches = !expected.is_empty()
            && bool::from(expected.as_bytes().ct_eq(presented.as_bytes()));
        if !matches {
            return Err(SignatureMismatch);
        }
        Ok(VerifiedPayment {
            order,
            payment,
            signature,
        })
    }
}

/// Notes attached to a gateway order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderNotes {
    /// Registration being paid for.
    pub registration_id: String,
    /// Event display name.
    pub event_name: String,
    /// Payer display name.
    pub user_name: String,
}

/// Order creation request sent to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRequest {
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: &'static str,
    /// Receipt reference, `reg_{registration_id}`.
    pub receipt: String,
    /// Free-form notes.
    pub notes: OrderNotes,
}

impl OrderRequest {
    /// Build the order for a registration's fee.
    ///
    /// # Examples
    /// ```
    /// use portal_backend::domain::{Money, OrderRequest, RegistrationId};
    ///
    /// let fee = Money::from_minor(50_000).expect("fee");
    /// let order =
    ///     OrderRequest::for_registration(RegistrationId::new(12), fee, "Robo Race", "Ada");
    /// assert_eq!(order.receipt, "reg_12");
    /// assert_eq!(order.currency, "INR");
    /// ```
    #[must_use]
    pub fn for_registration(
        registration_id: RegistrationId,
        amount: Money,
        event_name: impl Into<String>,
        user_name: impl Into<String>,
    ) -> Self {
        Self {
            amount,
            currency: CURRENCY_INR,
            receipt: format!("reg_{registration_id}"),
            notes: OrderNotes {
                registration_id: registration_id.to_string(),
                event_name: event_name.into(),
                user_name: user_name.into(),
            },
        }
    }
}

/// Order handed back to the client to open the checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiatedOrder {
    /// Registration being paid for.
    pub registration_id: RegistrationId,
    /// Gateway order id.
    pub order_id: OrderReference,
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Public gateway key for the checkout widget.
    pub key_id: String,
    /// Event display name.
    pub event_name: String,
    /// Payer display name.
    pub user_name: String,
    /// Payer email.
    pub user_email: String,
}

/// Result of a completed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentActivation {
    /// Registration marked paid.
    pub registration_id: RegistrationId,
    /// Event display name.
    pub event_name: String,
    /// Amount settled.
    pub amount: Money,
    /// Gateway payment id.
    pub payment_id: PaymentReference,
    /// Team materialized or reused for team events.
    pub team: Option<TeamSummary>,
    /// One notice per member to confirm.
    pub notices: Vec<RegistrationNotice>,
}

/// Stored payment row as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentDetails {
    /// Internal id.
    pub payment_id: PaymentId,
    /// Gateway order id.
    pub order_id: String,
    /// Gateway payment id once verified.
    pub gateway_payment_id: Option<String>,
    /// Amount in minor units.
    pub amount: Money,
    /// Lifecycle state.
    pub status: PaymentStatus,
    /// Row creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

/// Payment view of a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentOverview {
    /// Registration inspected.
    pub registration_id: RegistrationId,
    /// Event display name.
    pub event_name: String,
    /// Fee per capacity unit.
    pub fee: Money,
    /// Whether the registration is paid.
    pub payment_status: bool,
    /// Latest payment row, if one was initiated.
    pub details: Option<PaymentDetails>,
}

impl PaymentOverview {
    /// Whether the event charges a fee.
    #[must_use]
    pub const fn payment_required(&self) -> bool {
        !self.fee.is_free()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn verifier() -> PaymentSignatureVerifier {
        PaymentSignatureVerifier::new("razor-secret")
    }

    fn refs() -> (OrderReference, PaymentReference) {
        (
            OrderReference::new("order_9A33XWu170gUtm").expect("order"),
            PaymentReference::new("pay_29QQoUBi66xm2f").expect("payment"),
        )
    }

    #[rstest]
    fn matching_signature_verifies(verifier: PaymentSignatureVerifier) {
        let (order, payment) = refs();
        let signature = PaymentSignature::new(verifier.sign(&order, &payment)).expect("sig");
        let proof = verifier
            .verify(order.clone(), payment, signature)
            .expect("signature matches");
        assert_eq!(proof.order(), &order);
    }

    #[rstest]
    fn uppercase_hex_is_accepted(verifier: PaymentSignatureVerifier) {
        let (order, payment) = refs();
        let upper = verifier.sign(&order, &payment).to_uppercase();
        let signature = PaymentSignature::new(upper).expect("sig");
        assert!(verifier.verify(order, payment, signature).is_ok());
    }

    #[rstest]
    fn tampered_signature_is_rejected(verifier: PaymentSignatureVerifier) {
        let (order, payment) = refs();
        let mut forged = verifier.sign(&order, &payment);
        forged.replace_range(0..1, if forged.starts_with('0') { "1" } else { "0" });
        let signature = PaymentSignature::new(forged).expect("sig");
        assert_eq!(
            verifier.verify(order, payment, signature),
            Err(SignatureMismatch)
        );
    }

    #[rstest]
    fn signature_binds_both_references(verifier: PaymentSignatureVerifier) {
        let (order, payment) = refs();
        let signature = PaymentSignature::new(verifier.sign(&order, &payment)).expect("sig");
        let other = PaymentReference::new("pay_other").expect("payment");
        assert!(verifier.verify(order, other, signature).is_err());
    }

    #[rstest]
    fn known_vector_matches() {
        let verifier = PaymentSignatureVerifier::new("key");
        let order = OrderReference::new("order_1").expect("order");
        let payment = PaymentReference::new("pay_1").expect("payment");
        assert_eq!(
            verifier.sign(&order, &payment),
            "65219a93f3f6ab8a5f6962209ec83d04e29cd18b30fffd7e1a2aade3a72c199e"
        );
    }

    #[rstest]
    #[case::order(OrderReference::new("  ").map(|_| ()), "orderRef")]
    #[case::payment(PaymentReference::new("").map(|_| ()), "paymentRef")]
    #[case::signature(PaymentSignature::new("\t").map(|_| ()), "signature")]
    fn empty_references_are_rejected(
        #[case] result: Result<(), EmptyReferenceError>,
        #[case] field: &str,
    ) {
        assert_eq!(result.expect_err("empty").field, field);
    }

    #[rstest]
    fn debug_redacts_secret(verifier: PaymentSignatureVerifier) {
        let rendered = format!("{verifier:?}");
        assert!(!rendered.contains("razor-secret"));
    }

    #[rstest]
    #[case::pending("pending", PaymentStatus::Pending)]
    #[case::completed("completed", PaymentStatus::Completed)]
    #[case::failed("failed", PaymentStatus::Failed)]
    #[case::refunded("refunded", PaymentStatus::Refunded)]
    fn payment_status_parses(#[case] raw: &str, #[case] expected: PaymentStatus) {
        assert_eq!(raw.parse::<PaymentStatus>(), Ok(expected));
        assert_eq!(expected.as_str(), raw);
    }
}
