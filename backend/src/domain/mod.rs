//! Domain primitives, policies and services.
//!
//! Purpose: Define strongly typed entities for the course marketplace and
//! the services that implement the driving ports. Keep types free of
//! transport and persistence concerns; adapters translate at the edges.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - User, Course, Chapter, Purchase and friends: marketplace entities.
//! - `format_price`, `chapter_is_accessible`, `Cart`: pure policies.
//! - `*Service`: implementations of the driving ports in [`ports`].

pub mod access;
pub mod account_service;
pub mod auth;
pub mod authoring_service;
pub mod cart;
pub mod catalogue;
pub mod catalogue_service;
pub mod checkout_service;
pub mod dashboard_service;
pub mod enrollment;
pub mod enrollment_service;
pub mod error;
pub mod ids;
pub mod money;
pub mod notifications;
pub mod payment;
pub mod ports;
mod service_support;
pub mod trace_id;
pub mod user;

#[cfg(test)]
pub(crate) mod service_fixtures;

pub use self::access::{
    ChapterView, chapter_is_accessible, next_chapter, published_in_order, reading_order,
};
pub use self::account_service::UserAccountService;
pub use self::auth::{
    CredentialsValidationError, LoginCredentials, PASSWORD_MIN_LEN, Registration,
};
pub use self::authoring_service::CourseAuthoringService;
pub use self::cart::{
    ANONYMOUS_CART_COOKIE, ANONYMOUS_CART_TTL_DAYS, Cart, CartLine, CartSummary, CartTotal,
    USER_CART_TTL_DAYS, cart_cookie_name, cart_ttl_days,
};
pub use self::catalogue::{
    Attachment, Category, Chapter, ChapterPatch, Course, CourseFilter, CoursePatch,
};
pub use self::catalogue_service::CatalogueService;
pub use self::checkout_service::CheckoutService;
pub use self::dashboard_service::DashboardService;
pub use self::enrollment::{EnrollmentOutcome, Purchase, UserProgress, progress_percentage};
pub use self::enrollment_service::{Enroller, EnrollmentService};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{
    AttachmentId, CategoryId, ChapterId, CourseId, IdParseError, PaymentRecordId, UserId,
};
pub use self::money::{
    Currency, MoneyError, STORAGE_SCALE, format_price, from_storage_units, to_storage_units,
    validate_price, whole_units_at_least_one,
};
pub use self::notifications::{EmailMessage, enrollment_confirmation};
pub use self::payment::{
    CompletionWrite, NewPaymentRecord, PaymentProvider, PaymentRecord, PaymentStatus,
    PhoneNumber, PhoneNumberError, UnknownProvider, UnknownStatus,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DisplayName, Email, Role, User, UserValidationError, validate_image_url,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use coursehub::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
