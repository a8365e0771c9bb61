//! Tests for checkout handlers.

use super::*;
use crate::domain::ports::{CheckoutCompleted, CheckoutStarted};
use crate::domain::{EnrollmentOutcome, UserId};
use crate::inbound::http::test_utils::{MockPorts, TEST_BASE_URL, session_cookie, test_app};
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use rust_decimal_macros::dec;
use serde_json::json;

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(capture_paypal)
        .service(stripe_success)
        .service(mpesa_callback)
        .service(payment_status)
        .service(start_checkout);
}

fn location(response: &actix_web::dev::ServiceResponse) -> String {
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .expect("location header")
        .to_owned()
}

#[actix_web::test]
async fn checkout_requires_a_session() {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/stripe")
            .set_json(json!({ "courseId": CourseId::random().to_string() }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn paypal_checkout_returns_approval_url() {
    let user_id = UserId::random();
    let course_id = CourseId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_start_checkout()
        .withf(move |user, request| {
            *user == user_id
                && request.provider == PaymentProvider::PayPal
                && request.course_id == course_id
                && request.price == Some(dec!(29.99))
                && request.phone.is_none()
        })
        .times(1)
        .return_once(|_, _| {
            Ok(CheckoutStarted {
                provider: PaymentProvider::PayPal,
                order_id: "ORDER-1".to_owned(),
                approval_url: Some("https://paypal.example/approve".to_owned()),
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &user_id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/paypal")
            .cookie(cookie)
            .set_json(json!({ "courseId": course_id.to_string(), "price": 29.99 }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["orderId"], "ORDER-1");
    assert_eq!(value["approvalUrl"], "https://paypal.example/approve");
    assert_eq!(value["provider"], "paypal");
}

#[actix_web::test]
async fn mpesa_checkout_normalises_phone_number() {
    let user_id = UserId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_start_checkout()
        .withf(|_, request| {
            request
                .phone
                .as_ref()
                .is_some_and(|phone| phone.as_str() == "254712345678")
        })
        .times(1)
        .return_once(|_, _| {
            Ok(CheckoutStarted {
                provider: PaymentProvider::Mpesa,
                order_id: "ws_CO_1".to_owned(),
                approval_url: None,
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &user_id).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/mpesa")
            .cookie(cookie)
            .set_json(json!({
                "courseId": CourseId::random().to_string(),
                "phoneNumber": "0712 345 678"
            }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert!(value.get("approvalUrl").is_none());
}

#[rstest]
#[case("/api/v1/checkout/bitcoin", json!({ "courseId": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }), "provider")]
#[case("/api/v1/checkout/mpesa", json!({ "courseId": "3fa85f64-5717-4562-b3fc-2c963f66afa6" }), "phoneNumber")]
#[case("/api/v1/checkout/mpesa", json!({ "courseId": "3fa85f64-5717-4562-b3fc-2c963f66afa6", "phoneNumber": "0812345678" }), "phoneNumber")]
#[case("/api/v1/checkout/stripe", json!({ "courseId": "nope" }), "courseId")]
#[actix_web::test]
async fn checkout_input_is_validated(#[case] uri: &str, #[case] body: Value, #[case] field: &str) {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(uri)
            .cookie(cookie)
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["details"]["field"], field);
}

#[actix_web::test]
async fn owned_courses_report_already_purchased() {
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_start_checkout()
        .return_once(|_, _| Err(Error::already_purchased("course already purchased")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/stripe")
            .cookie(cookie)
            .set_json(json!({ "courseId": CourseId::random().to_string() }))
            .to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["code"], "already_purchased");
}

#[actix_web::test]
async fn paypal_capture_reports_outcome() {
    let course_id = CourseId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_complete_checkout()
        .withf(|_, request| {
            request.provider == PaymentProvider::PayPal
                && request.reference == "ORDER-1"
                && request.course_id.is_none()
        })
        .times(1)
        .return_once(move |_, _| {
            Ok(CheckoutCompleted {
                course_id,
                outcome: EnrollmentOutcome::AlreadyEnrolled,
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/paypal/capture")
            .cookie(cookie)
            .set_json(json!({ "orderId": " ORDER-1 " }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["status"], "already_enrolled");
    assert_eq!(value["courseId"], course_id.to_string());
}

#[actix_web::test]
async fn stripe_success_redirects_to_course_page() {
    let course_id = CourseId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_complete_checkout()
        .withf(move |_, request| {
            request.provider == PaymentProvider::Stripe
                && request.reference == "cs_test_1"
                && request.course_id == Some(course_id)
        })
        .return_once(move |_, _| {
            Ok(CheckoutCompleted {
                course_id,
                outcome: EnrollmentOutcome::Enrolled,
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/checkout/stripe/success?session_id=cs_test_1&course_id={course_id}"
            ))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("{TEST_BASE_URL}/courses/{course_id}?payment=success")
    );
}

#[actix_web::test]
async fn stripe_failures_redirect_to_failure_page() {
    let course_id = CourseId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_complete_checkout()
        .return_once(|_, _| Err(Error::invalid_request("payment not completed")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!(
                "/api/v1/checkout/stripe/success?session_id=cs_test_1&course_id={course_id}"
            ))
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        format!("{TEST_BASE_URL}/courses/{course_id}?payment=failed")
    );
}

#[rstest]
#[case("/api/v1/checkout/stripe/success")]
#[case("/api/v1/checkout/stripe/success?session_id=&course_id=garbage")]
#[actix_web::test]
async fn stripe_return_without_session_fails_without_calling_checkout(#[case] uri: &str) {
    let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;
    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get().uri(uri).cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("{TEST_BASE_URL}/?payment=failed"));
}

#[rstest]
fn daraja_envelopes_are_parsed() {
    let body = json!({
        "Body": { "stkCallback": {
            "MerchantRequestID": "29115-34620561-1",
            "CheckoutRequestID": "ws_CO_191220191020363925",
            "ResultCode": 0,
            "ResultDesc": "The service request is processed successfully.",
            "CallbackMetadata": { "Item": [{ "Name": "Amount", "Value": 1.0 }] }
        }}
    });
    let callback = parse_mpesa_callback(&body).expect("callback parses");
    assert_eq!(callback.checkout_request_id, "ws_CO_191220191020363925");
    assert_eq!(callback.result_code, 0);
    assert_eq!(callback.metadata["Item"][0]["Name"], "Amount");
}

#[rstest]
#[case(json!({}))]
#[case(json!({ "Body": { "stkCallback": { "ResultCode": 0 } } }))]
#[case(json!({ "Body": { "stkCallback": { "CheckoutRequestID": "x", "ResultCode": [] } } }))]
fn malformed_envelopes_are_ignored(#[case] body: Value) {
    assert!(parse_mpesa_callback(&body).is_none());
}

#[actix_web::test]
async fn mpesa_callback_is_always_acknowledged() {
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_handle_mpesa_callback()
        .withf(|callback| callback.result_code == 1032)
        .times(1)
        .return_once(|_| Err(Error::service_unavailable("store down")));
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/checkout/mpesa/callback")
            .set_json(json!({
                "Body": { "stkCallback": {
                    "MerchantRequestID": "m-1",
                    "CheckoutRequestID": "ws_CO_1",
                    "ResultCode": 1032,
                    "ResultDesc": "Request cancelled by user"
                }}
            }))
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value, json!({ "ResultCode": 0, "ResultDesc": "Accepted" }));
}

#[actix_web::test]
async fn payment_status_is_reported() {
    let course_id = CourseId::random();
    let mut ports = MockPorts::default();
    ports
        .checkout
        .expect_payment_status()
        .withf(|_, provider, reference| *provider == PaymentProvider::Mpesa && reference.to_string() == "ws_CO_1")
        .return_once(move |_, provider, reference| {
            Ok(PaymentStatusView {
                provider,
                reference: reference.to_owned(),
                course_id,
                status: PaymentStatus::Pending,
                enrolled: false,
            })
        });
    let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
    let cookie = session_cookie(&app, &UserId::random()).await;

    let response = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/checkout/mpesa/status/ws_CO_1")
            .cookie(cookie)
            .to_request(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(response).await;
    assert_eq!(value["status"], "pending");
    assert_eq!(value["enrolled"], false);
    assert_eq!(value["courseId"], course_id.to_string());
}
