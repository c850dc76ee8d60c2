//! DTOs for the Razorpay Orders API.
//!
//! Requests are serialised straight from domain order requests; responses are
//! decoded here first and mapped into [`GatewayOrder`] in one pass.

use serde::{Deserialize, Serialize};

use crate::domain::ports::GatewayOrder;
use crate::domain::{Money, OrderReference, OrderRequest};

#[derive(Debug, Serialize)]
pub(super) struct CreateOrderDto<'a> {
    pub(super) amount: i64,
    pub(super) currency: &'a str,
    pub(super) receipt: &'a str,
    pub(super) notes: OrderNotesDto<'a>,
}

#[derive(Debug, Serialize)]
pub(super) struct OrderNotesDto<'a> {
    pub(super) registration_id: &'a str,
    pub(super) event_name: &'a str,
    pub(super) user_name: &'a str,
}

impl<'a> From<&'a OrderRequest> for CreateOrderDto<'a> {
    fn from(request: &'a OrderRequest) -> Self {
        Self {
            amount: request.amount.minor_units(),
            currency: request.currency,
            receipt: request.receipt.as_str(),
            notes: OrderNotesDto {
                registration_id: request.notes.registration_id.as_str(),
                event_name: request.notes.event_name.as_str(),
                user_name: request.notes.user_name.as_str(),
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct OrderDto {
    pub(super) id: String,
    pub(super) amount: i64,
    pub(super) currency: String,
}

impl OrderDto {
    pub(super) fn into_gateway_order(self) -> Result<GatewayOrder, String> {
        let order_id =
            OrderReference::new(&self.id).map_err(|_| "order id is empty".to_owned())?;
        let amount = Money::from_minor(self.amount)
            .map_err(|err| format!("order {} has invalid amount: {err}", self.id))?;
        Ok(GatewayOrder {
            order_id,
            amount,
            currency: self.currency,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Decoding coverage for Razorpay order payloads.

    use super::*;
    use crate::domain::RegistrationId;
    use serde_json::json;

    #[test]
    fn serialises_order_request_in_minor_units() {
        let fee = Money::from_minor(50_000).expect("fee");
        let request =
            OrderRequest::for_registration(RegistrationId::new(9), fee, "Robo Race", "Ada");
        let value = serde_json::to_value(CreateOrderDto::from(&request)).expect("serialise");
        assert_eq!(
            value,
            json!({
                "amount": 50_000,
                "currency": "INR",
                "receipt": "reg_9",
                "notes": {
                    "registration_id": "9",
                    "event_name": "Robo Race",
                    "user_name": "Ada",
                },
            })
        );
    }

    #[test]
    fn decodes_order_and_ignores_extra_fields() {
        let dto: OrderDto = serde_json::from_value(json!({
            "id": "order_Kx1",
            "entity": "order",
            "amount": 50_000,
            "currency": "INR",
            "status": "created",
        }))
        .expect("decode");
        let order = dto.into_gateway_order().expect("valid order");
        assert_eq!(order.order_id.as_ref(), "order_Kx1");
        assert_eq!(order.amount.minor_units(), 50_000);
    }

    #[test]
    fn rejects_empty_order_id() {
        let dto = OrderDto {
            id: "  ".to_owned(),
            amount: 100,
            currency: "INR".to_owned(),
        };
        assert!(dto.into_gateway_order().is_err());
    }
}
