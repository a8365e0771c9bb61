//! Administration handlers.
//!
//! ```text
//! GET  /api/v1/admin/users
//! PUT  /api/v1/admin/users/{userId}/role {"role":"teacher"}
//! POST /api/v1/admin/emails {"to":"ada@example.com","subject":"Hi","html":"<p>Hi</p>"}
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Email, EmailMessage, Error, Role, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::UserResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::users::map_user_validation_error;
use crate::inbound::http::validation::{FieldName, invalid_value_error, parse_id, require_text};

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SetRoleRequest {
    #[schema(example = "teacher")]
    pub role: String,
}

/// Transactional email body. Fields are optional so a missing one is
/// reported with `missing_field` rather than a JSON parse failure.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct SendEmailRequest {
    pub to: Option<String>,
    pub subject: Option<String>,
    pub html: Option<String>,
}

impl TryFrom<SendEmailRequest> for EmailMessage {
    type Error = Error;

    fn try_from(value: SendEmailRequest) -> Result<Self, Self::Error> {
        let to = require_text(value.to, FieldName::new("to"))?;
        let to = Email::new(&to).map_err(|err| invalid_value_error(FieldName::new("to"), err))?;
        Ok(Self {
            to: to.to_string(),
            subject: require_text(value.subject, FieldName::new("subject"))?,
            html: require_text(value.html, FieldName::new("html"))?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Admin role required", body = Error)
    ),
    tags = ["admin"],
    operation_id = "listUsers",
    security(("SessionCookie" = []))
)]
#[get("/admin/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<UserResponse>>> {
    let actor = session.require_user_id()?;
    let users = state.admin.list_users(&actor).await?;
    Ok(web::Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Change a user's role. Admins cannot demote themselves.
#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{user_id}/role",
    params(("user_id" = String, Path, description = "User identifier")),
    request_body = SetRoleRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Unknown role or self-demotion", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 404, description = "User not found", body = Error)
    ),
    tags = ["admin"],
    operation_id = "setUserRole",
    security(("SessionCookie" = []))
)]
#[put("/admin/users/{user_id}/role")]
pub async fn set_role(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SetRoleRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let actor = session.require_user_id()?;
    let target: UserId = parse_id(&path, FieldName::new("userId"))?;
    let role: Role = payload.role.parse().map_err(map_user_validation_error)?;
    let user = state.admin.set_role(&actor, &target, role).await?;
    Ok(web::Json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/emails",
    request_body = SendEmailRequest,
    responses(
        (status = 202, description = "Email handed to the mail provider"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Admin role required", body = Error),
        (status = 503, description = "Mail provider unavailable", body = Error)
    ),
    tags = ["admin"],
    operation_id = "sendEmail",
    security(("SessionCookie" = []))
)]
#[post("/admin/emails")]
pub async fn send_email(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SendEmailRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let message = EmailMessage::try_from(payload.into_inner())?;
    state.admin.send_email(&actor, message).await?;
    Ok(HttpResponse::Accepted().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::service_fixtures::user_with_role;
    use crate::inbound::http::test_utils::{MockPorts, session_cookie, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.service(list_users).service(set_role).service(send_email);
    }

    #[actix_web::test]
    async fn admins_list_users() {
        let admin = user_with_role(Role::Admin);
        let admin_id = *admin.id();
        let student = user_with_role(Role::Student);
        let mut ports = MockPorts::default();
        ports
            .admin
            .expect_list_users()
            .withf(move |actor| *actor == admin_id)
            .times(1)
            .return_once(move |_| Ok(vec![admin, student]));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, &admin_id).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/admin/users")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value.as_array().map(Vec::len), Some(2));
        assert_eq!(value[1]["role"], "student");
    }

    #[actix_web::test]
    async fn listing_users_requires_session() {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get().uri("/api/v1/admin/users").to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn role_changes_are_applied() {
        let promoted = user_with_role(Role::Student).with_role(Role::Teacher);
        let target = *promoted.id();
        let mut ports = MockPorts::default();
        ports
            .admin
            .expect_set_role()
            .withf(move |_, user, role| *user == target && *role == Role::Teacher)
            .times(1)
            .return_once(move |_, _, _| Ok(promoted));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/admin/users/{target}/role"))
                .cookie(cookie)
                .set_json(json!({ "role": "Teacher" }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["role"], "teacher");
    }

    #[actix_web::test]
    async fn unknown_roles_are_rejected() {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
        let cookie = session_cookie(&app, &UserId::random()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/admin/users/{}/role", UserId::random()))
                .cookie(cookie)
                .set_json(json!({ "role": "owner" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["details"]["field"], "role");
        assert_eq!(value["details"]["code"], "unknown_role");
    }

    #[actix_web::test]
    async fn emails_are_accepted() {
        let mut ports = MockPorts::default();
        ports
            .admin
            .expect_send_email()
            .withf(|_, message| message.to == "ada@example.com" && message.subject == "Welcome")
            .times(1)
            .return_once(|_, _| Ok(()));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, &UserId::random()).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/admin/emails")
                .cookie(cookie)
                .set_json(json!({
                    "to": "ada@example.com",
                    "subject": "Welcome",
                    "html": "<p>Hello</p>"
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[rstest]
    #[case(json!({ "subject": "Hi", "html": "<p>Hi</p>" }), "to", "missing_field")]
    #[case(json!({ "to": "not-an-email", "subject": "Hi", "html": "<p>Hi</p>" }), "to", "invalid_value")]
    #[case(json!({ "to": "ada@example.com", "subject": "  ", "html": "<p>Hi</p>" }), "subject", "missing_field")]
    #[actix_web::test]
    async fn malformed_emails_are_rejected(
        #[case] body: Value,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(test_app(MockPorts::default().into_state(), routes)).await;
        let cookie = session_cookie(&app, &UserId::random()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/admin/emails")
                .cookie(cookie)
                .set_json(body)
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let value: Value = actix_test::read_body_json(response).await;
        assert_eq!(value["details"]["field"], field);
        assert_eq!(value["details"]["code"], code);
    }

    #[actix_web::test]
    async fn mail_outages_surface_as_unavailable() {
        let mut ports = MockPorts::default();
        ports
            .admin
            .expect_send_email()
            .return_once(|_, _| Err(Error::service_unavailable("email delivery failed")));
        let app = actix_test::init_service(test_app(ports.into_state(), routes)).await;
        let cookie = session_cookie(&app, &UserId::random()).await;
        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/admin/emails")
                .cookie(cookie)
                .set_json(json!({ "to": "ada@example.com", "subject": "Hi", "html": "<p>Hi</p>" }))
                .to_request(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
