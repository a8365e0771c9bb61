//! Account lifecycle and cookie cart behaviour over the full API surface.

#[expect(dead_code, reason = "shared helpers not used by every test binary")]
mod support;

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use coursehub::test_support::TestBackend;
use serde_json::json;

use support::{Browser, PASSWORD, admin_and_teacher, publish_course, string_field};

#[actix_web::test]
async fn registration_signs_the_user_in() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let mut ada = Browser::new(&app);

    ada.register("Ada@Example.com", "Ada").await;
    let me = ada.get("/api/v1/users/me").await.expect(StatusCode::OK);

    assert_eq!(me["email"], "ada@example.com");
    assert_eq!(me["displayName"], "Ada");
    assert_eq!(me["role"], "student");
}

#[actix_web::test]
async fn duplicate_emails_conflict() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    Browser::new(&app).register("ada@example.com", "Ada").await;

    let reply = Browser::new(&app)
        .post(
            "/api/v1/users",
            json!({ "email": "ADA@example.com", "password": PASSWORD, "displayName": "Other" }),
        )
        .await;

    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["code"], "conflict");
}

#[actix_web::test]
async fn login_logout_and_profile_updates() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    Browser::new(&app).register("ada@example.com", "Ada").await;

    let mut ada = Browser::new(&app);
    let wrong = ada
        .post(
            "/api/v1/login",
            json!({ "email": "ada@example.com", "password": "not the password" }),
        )
        .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    ada.post(
        "/api/v1/login",
        json!({ "email": "ada@example.com", "password": PASSWORD }),
    )
    .await
    .expect(StatusCode::OK);
    let updated = ada
        .patch(
            "/api/v1/users/me",
            json!({ "displayName": "Ada L.", "imageUrl": "https://img.example/ada.png" }),
        )
        .await
        .expect(StatusCode::OK);
    assert_eq!(updated["displayName"], "Ada L.");
    assert_eq!(updated["imageUrl"], "https://img.example/ada.png");

    ada.post("/api/v1/logout", json!({}))
        .await
        .expect(StatusCode::NO_CONTENT);
    let after = ada.get("/api/v1/users/me").await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn allow_listed_emails_register_as_admin() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let (mut admin, _teacher) = admin_and_teacher(&app).await;

    let me = admin.get("/api/v1/users/me").await.expect(StatusCode::OK);
    assert_eq!(me["role"], "admin");
    let users = admin
        .get("/api/v1/admin/users")
        .await
        .expect(StatusCode::OK);
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}

#[actix_web::test]
async fn students_cannot_use_admin_routes() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let mut ada = Browser::new(&app);
    ada.register("ada@example.com", "Ada").await;

    let reply = ada.get("/api/v1/admin/users").await;
    assert_eq!(reply.status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn anonymous_cart_merges_into_the_user_cart_on_login() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let (_admin, mut teacher) = admin_and_teacher(&app).await;
    let rust = publish_course(&mut teacher, "Rust", "29.99", "USD", 1).await;
    let sql = publish_course(&mut teacher, "SQL", "10.00", "USD", 1).await;
    Browser::new(&app).register("ada@example.com", "Ada").await;

    let mut visitor = Browser::new(&app);
    visitor
        .post("/api/v1/cart/items", json!({ "courseId": rust.id }))
        .await
        .expect(StatusCode::NO_CONTENT);
    visitor
        .post("/api/v1/cart/items", json!({ "courseId": sql.id }))
        .await
        .expect(StatusCode::NO_CONTENT);
    visitor
        .delete(&format!("/api/v1/cart/items/{}", sql.id))
        .await
        .expect(StatusCode::NO_CONTENT);
    assert!(visitor.has_cookie("cart"));

    let user = visitor
        .post(
            "/api/v1/login",
            json!({ "email": "ada@example.com", "password": PASSWORD }),
        )
        .await
        .expect(StatusCode::OK);
    let user_id = string_field(&user, "id");

    assert!(!visitor.has_cookie("cart"));
    assert!(visitor.has_cookie(&format!("cart_{user_id}")));
    let cart = visitor.get("/api/v1/cart").await.expect(StatusCode::OK);
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));
    assert_eq!(cart["items"][0]["course"]["id"], rust.id.as_str());
    assert_eq!(cart["totals"][0]["currency"], "USD");
}

#[actix_web::test]
async fn unknown_courses_cannot_enter_the_cart() {
    let backend = TestBackend::new();
    let app = actix_test::init_service(backend.app()).await;
    let mut visitor = Browser::new(&app);

    let reply = visitor
        .post(
            "/api/v1/cart/items",
            json!({ "courseId": "6f1c2d1e-8a43-4c1b-9d2f-0b5a7e3c0000" }),
        )
        .await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
    assert!(!visitor.has_cookie("cart"));
}
