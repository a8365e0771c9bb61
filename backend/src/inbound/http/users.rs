//! Account handlers.
//!
//! ```text
//! POST /api/v1/users {"email":"ada@example.com","password":"...","displayName":"Ada"}
//! POST /api/v1/login {"email":"ada@example.com","password":"..."}
//! POST /api/v1/logout
//! GET /api/v1/users/me
//! PATCH /api/v1/users/me {"displayName":"Ada L."}
//! GET /api/v1/users/me/courses
//! ```

use actix_web::{HttpRequest, HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::ProfileUpdate;
use crate::domain::{
    CredentialsValidationError, DisplayName, Error, LoginCredentials, Registration,
    UserValidationError, validate_image_url,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::cart::merge_anonymous_cart;
use crate::inbound::http::dto::{StudentDashboardResponse, UserResponse};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Registration body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

/// Login body for `POST /api/v1/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile update; omitted fields are left unchanged.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub image_url: Option<String>,
}

pub(crate) fn map_user_validation_error(err: UserValidationError) -> Error {
    let (field, code) = match &err {
        UserValidationError::EmptyEmail => ("email", "empty_email"),
        UserValidationError::InvalidEmail => ("email", "invalid_email"),
        UserValidationError::EmptyDisplayName => ("displayName", "empty_display_name"),
        UserValidationError::DisplayNameTooLong { .. } => ("displayName", "display_name_too_long"),
        UserValidationError::UnknownRole { .. } => ("role", "unknown_role"),
        UserValidationError::InvalidImageUrl => ("imageUrl", "invalid_image_url"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    match err {
        CredentialsValidationError::Email(inner) => map_user_validation_error(inner),
        CredentialsValidationError::EmptyPassword => {
            Error::invalid_request("password must not be empty")
                .with_details(json!({ "field": "password", "code": "empty_password" }))
        }
        CredentialsValidationError::PasswordTooShort { .. } => {
            Error::invalid_request(err.to_string())
                .with_details(json!({ "field": "password", "code": "password_too_short" }))
        }
    }
}

impl TryFrom<UpdateProfileRequest> for ProfileUpdate {
    type Error = Error;

    fn try_from(value: UpdateProfileRequest) -> Result<Self, Self::Error> {
        let display_name = value
            .display_name
            .map(DisplayName::new)
            .transpose()
            .map_err(map_user_validation_error)?;
        let image_url = value
            .image_url
            .as_deref()
            .map(validate_image_url)
            .transpose()
            .map_err(map_user_validation_error)?;
        Ok(Self {
            display_name,
            image_url,
        })
    }
}

/// Create an account and sign it in.
///
/// Emails listed in the admin allow-list are given the admin role.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "register",
    security([])
)]
#[post("/users")]
pub async fn register(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let RegisterRequest {
        email,
        password,
        display_name,
    } = payload.into_inner();
    let registration = Registration::try_from_parts(&email, &display_name, &password)
        .map_err(map_credentials_error)?;
    let user = state.accounts.register(registration).await?;
    session.persist_user(user.id())?;
    Ok(HttpResponse::Created().json(UserResponse::from(user)))
}

/// Authenticate and establish a session.
///
/// Any anonymous cart is merged into the user's cart cookie.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = UserResponse, headers(("Set-Cookie" = String, description = "Session and cart cookies"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials = LoginCredentials::try_from_parts(&payload.email, &payload.password)
        .map_err(map_credentials_error)?;
    let user = state.accounts.authenticate(&credentials).await?;
    session.persist_user(user.id())?;
    let mut response = HttpResponse::Ok();
    for cookie in merge_anonymous_cart(&req, &state.settings, user.id()) {
        response.cookie(cookie);
    }
    Ok(response.json(UserResponse::from(user)))
}

#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 204, description = "Session cleared")),
    tags = ["users"],
    operation_id = "logout",
    security([], ("SessionCookie" = []))
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.purge();
    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "User no longer exists", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser",
    security(("SessionCookie" = []))
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let user = state.accounts.profile(&user_id).await?;
    Ok(web::Json(user.into()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser",
    security(("SessionCookie" = []))
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner())?;
    let user = state.accounts.update_profile(&user_id, update).await?;
    Ok(web::Json(user.into()))
}

/// Enrolled courses split into completed and in progress.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/courses",
    responses(
        (status = 200, description = "Student dashboard", body = StudentDashboardResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "myCourses",
    security(("SessionCookie" = []))
)]
#[get("/users/me/courses")]
pub async fn my_courses(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<StudentDashboardResponse>> {
    let user_id = session.require_user_id()?;
    let dashboard = state.dashboards.student_dashboard(&user_id).await?;
    Ok(web::Json(dashboard.into()))
}
