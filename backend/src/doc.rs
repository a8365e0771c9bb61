//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` handler together with the request
//! and response bodies they exchange, plus the session cookie security
//! scheme. Swagger UI serves it in debug builds and
//! `cargo run --bin openapi-dump` exports it for client generation.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{Error, ErrorCode, PaymentProvider, PaymentStatus, Role};
use crate::inbound::http::admin::{SendEmailRequest, SetRoleRequest};
use crate::inbound::http::cart::AddCartItemRequest;
use crate::inbound::http::checkout::{
    CaptureRequest, CaptureResponse, CheckoutStartedResponse, MpesaAck, PaymentStatusResponse,
    StartCheckoutRequest,
};
use crate::inbound::http::dto::{
    AttachmentResponse, CartItemResponse, CartResponse, CategoryResponse, ChapterDetailResponse,
    ChapterResponse, CourseDetailResponse, CourseListingResponse, CourseResponse,
    CourseSalesResponse, EnrolledCourseResponse, MoneyTotalResponse, StudentDashboardResponse,
    TeacherAnalyticsResponse, UserResponse,
};
use crate::inbound::http::enrollment::{EnrollResponse, ProgressRequest, ProgressResponse};
use crate::inbound::http::teacher::{
    ChapterPosition, CreateAttachmentRequest, CreateChapterRequest, CreateCourseRequest,
    UpdateChapterRequest, UpdateCourseRequest,
};
use crate::inbound::http::users::{LoginRequest, RegisterRequest, UpdateProfileRequest};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "CourseHub API",
        description = "Course catalogue, cart, checkout, learning progress and authoring.",
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    paths(
        crate::inbound::http::users::register,
        crate::inbound::http::users::login,
        crate::inbound::http::users::logout,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::my_courses,
        crate::inbound::http::catalogue::list_categories,
        crate::inbound::http::catalogue::list_courses,
        crate::inbound::http::catalogue::get_course,
        crate::inbound::http::catalogue::get_chapter,
        crate::inbound::http::cart::get_cart,
        crate::inbound::http::cart::add_cart_item,
        crate::inbound::http::cart::remove_cart_item,
        crate::inbound::http::checkout::start_checkout,
        crate::inbound::http::checkout::capture_paypal,
        crate::inbound::http::checkout::stripe_success,
        crate::inbound::http::checkout::mpesa_callback,
        crate::inbound::http::checkout::payment_status,
        crate::inbound::http::enrollment::enroll,
        crate::inbound::http::enrollment::set_progress,
        crate::inbound::http::teacher::list_owned_courses,
        crate::inbound::http::teacher::create_course,
        crate::inbound::http::teacher::update_course,
        crate::inbound::http::teacher::publish_course,
        crate::inbound::http::teacher::unpublish_course,
        crate::inbound::http::teacher::create_chapter,
        crate::inbound::http::teacher::reorder_chapters,
        crate::inbound::http::teacher::update_chapter,
        crate::inbound::http::teacher::publish_chapter,
        crate::inbound::http::teacher::unpublish_chapter,
        crate::inbound::http::teacher::add_attachment,
        crate::inbound::http::teacher::analytics,
        crate::inbound::http::admin::list_users,
        crate::inbound::http::admin::set_role,
        crate::inbound::http::admin::send_email,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        Role,
        PaymentProvider,
        PaymentStatus,
        UserResponse,
        RegisterRequest,
        LoginRequest,
        UpdateProfileRequest,
        CategoryResponse,
        CourseResponse,
        ChapterResponse,
        AttachmentResponse,
        CourseListingResponse,
        CourseDetailResponse,
        ChapterDetailResponse,
        CartItemResponse,
        CartResponse,
        MoneyTotalResponse,
        AddCartItemRequest,
        StartCheckoutRequest,
        CheckoutStartedResponse,
        CaptureRequest,
        CaptureResponse,
        MpesaAck,
        PaymentStatusResponse,
        EnrollResponse,
        ProgressRequest,
        ProgressResponse,
        EnrolledCourseResponse,
        StudentDashboardResponse,
        CreateCourseRequest,
        UpdateCourseRequest,
        CreateChapterRequest,
        UpdateChapterRequest,
        ChapterPosition,
        CreateAttachmentRequest,
        CourseSalesResponse,
        TeacherAnalyticsResponse,
        SetRoleRequest,
        SendEmailRequest,
    )),
    tags(
        (name = "users", description = "Accounts, sessions and the student dashboard"),
        (name = "catalogue", description = "Public course browsing"),
        (name = "cart", description = "Cookie-backed shopping cart"),
        (name = "checkout", description = "Payment flows for PayPal, Stripe and M-PESA"),
        (name = "enrollment", description = "Free enrollment and chapter progress"),
        (name = "teacher", description = "Course authoring and sales analytics"),
        (name = "admin", description = "User administration and transactional email"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
