//! Tests for payment HTTP handlers.

use super::*;
use crate::domain::{
    Error, Money, PaymentId, PaymentStatus, TeamCode, TeamId, TeamSummary, UserId,
};
use crate::inbound::http::test_utils::{STUDENT_TOKEN, TestPorts, test_app};
use crate::test_support::clock::fixture_timestamp;
use actix_web::http::StatusCode;
use actix_web::http::header::AUTHORIZATION;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

fn fee() -> Money {
    Money::from_minor(50_000).expect("valid fee")
}

async fn send(ports: TestPorts, request: actix_test::TestRequest) -> (StatusCode, Value) {
    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let request = request.insert_header((AUTHORIZATION, STUDENT_TOKEN)).to_request();
    let response = actix_test::call_service(&app, request).await;
    let status = response.status();
    let body: Value = actix_test::read_body_json(response).await;
    (status, body)
}

#[actix_web::test]
async fn initiate_returns_checkout_handle_in_minor_units() {
    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_initiate()
        .withf(|request| {
            request.user_id == UserId::new(5) && request.registration_id == RegistrationId::new(101)
        })
        .times(1)
        .returning(|request| {
            Ok(InitiatedOrder {
                registration_id: request.registration_id,
                order_id: OrderReference::new("order_Rk1").expect("order id"),
                amount: fee(),
                currency: "INR".to_owned(),
                key_id: "rzp_test_key".to_owned(),
                event_name: "Robo Race".to_owned(),
                user_name: "Student 5".to_owned(),
                user_email: "student5@example.test".to_owned(),
            })
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/initiate")
            .set_json(json!({"registrationId": 101})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderId"], "order_Rk1");
    assert_eq!(body["amount"], 50_000);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["keyId"], "rzp_test_key");
}

#[actix_web::test]
async fn initiate_requires_registration_id() {
    let mut ports = TestPorts::default();
    ports.payments.expect_initiate().never();

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/initiate")
            .set_json(json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "registrationId");
}

fn activation() -> PaymentActivation {
    PaymentActivation {
        registration_id: RegistrationId::new(101),
        event_name: "Robo Race".to_owned(),
        amount: fee(),
        payment_id: PaymentReference::new("pay_Q9").expect("payment id"),
        team: Some(TeamSummary {
            id: TeamId::new(11),
            name: "Rocket".to_owned(),
            code: TeamCode::parse("RCKT01").expect("valid code"),
            lead_id: UserId::new(5),
            current_members: 1,
            min_members: 2,
            max_members: 4,
        }),
        notices: Vec::new(),
    }
}

#[rstest]
#[case::checkout_names(json!({
    "razorpay_order_id": "order_Rk1",
    "razorpay_payment_id": "pay_Q9",
    "razorpay_signature": "ab12",
}))]
#[case::short_names(json!({
    "orderRef": "order_Rk1",
    "paymentRef": "pay_Q9",
    "signature": "ab12",
}))]
#[actix_web::test]
async fn verify_accepts_both_field_spellings(#[case] payload: Value) {
    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_verify()
        .withf(|request| {
            request.order.as_ref() == "order_Rk1"
                && request.payment.as_ref() == "pay_Q9"
                && request.signature.as_ref() == "ab12"
        })
        .times(1)
        .returning(|_| Ok(activation()));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/verify")
            .set_json(payload),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentId"], "pay_Q9");
    assert_eq!(body["amount"], "500.00");
    assert_eq!(body["team"]["teamCode"], "RCKT01");
    assert_eq!(body["team"]["isTeamLead"], true);
}

#[actix_web::test]
async fn verify_reports_missing_signature() {
    let mut ports = TestPorts::default();
    ports.payments.expect_verify().never();

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/verify")
            .set_json(json!({"razorpay_order_id": "order_Rk1", "razorpay_payment_id": "pay_Q9"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"]["field"], "razorpay_signature");
}

#[actix_web::test]
async fn verify_maps_signature_mismatch_to_bad_request() {
    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_verify()
        .returning(|_| Err(Error::invalid_signature("Invalid payment signature")));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/verify")
            .set_json(json!({
                "razorpay_order_id": "order_Rk1",
                "razorpay_payment_id": "pay_Q9",
                "razorpay_signature": "00",
            })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_signature");
}

#[actix_web::test]
async fn status_includes_latest_payment_attempt() {
    let mut ports = TestPorts::default();
    ports
        .payment_query
        .expect_status()
        .withf(|user_id, registration_id| {
            *user_id == UserId::new(5) && *registration_id == RegistrationId::new(101)
        })
        .returning(|_, registration_id| {
            Ok(PaymentOverview {
                registration_id,
                event_name: "Robo Race".to_owned(),
                fee: fee(),
                payment_status: false,
                details: Some(PaymentDetails {
                    payment_id: PaymentId::new(7),
                    order_id: "order_Rk1".to_owned(),
                    gateway_payment_id: None,
                    amount: fee(),
                    status: PaymentStatus::Pending,
                    created_at: fixture_timestamp(),
                    updated_at: fixture_timestamp(),
                }),
            })
        });

    let (status, body) = send(
        ports,
        actix_test::TestRequest::get().uri("/api/v1/payments/status/101"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["paymentRequired"], true);
    assert_eq!(body["paymentStatus"], false);
    assert_eq!(body["paymentDetails"]["status"], "pending");
    assert_eq!(body["paymentDetails"]["gatewayPaymentId"], Value::Null);
}

#[actix_web::test]
async fn status_propagates_not_found() {
    let mut ports = TestPorts::default();
    ports
        .payment_query
        .expect_status()
        .returning(|_, _| Err(Error::not_found("Registration not found")));

    let (status, body) = send(
        ports,
        actix_test::TestRequest::get().uri("/api/v1/payments/status/999"),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Registration not found");
}
