//! Error mapping and lookups shared by the domain services.

use tracing::error;

use crate::domain::ports::{
    CourseRepository, CourseRepositoryError, PaymentGatewayError, PaymentRecordError,
    ProgressRepositoryError, PurchaseLedgerError, UserPersistenceError, UserRepository,
};
use crate::domain::{Course, CourseId, Error, PaymentProvider, User, UserId};

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("an account with this email already exists")
        }
    }
}

pub(crate) fn map_course_error(error: CourseRepositoryError) -> Error {
    match error {
        CourseRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("course repository unavailable: {message}"))
        }
        CourseRepositoryError::Query { message } => {
            Error::internal(format!("course repository error: {message}"))
        }
    }
}

pub(crate) fn map_ledger_error(error: PurchaseLedgerError) -> Error {
    match error {
        PurchaseLedgerError::Connection { message } => {
            Error::service_unavailable(format!("purchase ledger unavailable: {message}"))
        }
        PurchaseLedgerError::Query { message } => {
            Error::internal(format!("purchase ledger error: {message}"))
        }
    }
}

pub(crate) fn map_progress_error(error: ProgressRepositoryError) -> Error {
    match error {
        ProgressRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("progress repository unavailable: {message}"))
        }
        ProgressRepositoryError::Query { message } => {
            Error::internal(format!("progress repository error: {message}"))
        }
    }
}

pub(crate) fn map_record_error(error: PaymentRecordError) -> Error {
    match error {
        PaymentRecordError::Connection { message } => {
            Error::service_unavailable(format!("payment records unavailable: {message}"))
        }
        PaymentRecordError::Query { message } => {
            Error::internal(format!("payment record error: {message}"))
        }
    }
}

/// Collapse provider failures into the generic payment error.
///
/// The provider detail is logged, never returned to the caller. Requests the
/// adapter refused before contacting the provider surface as
/// `invalid_request` with their message intact.
pub(crate) fn map_gateway_error(provider: PaymentProvider, error: PaymentGatewayError) -> Error {
    match error {
        PaymentGatewayError::InvalidRequest { message } => Error::invalid_request(message),
        other => {
            error!(provider = provider.as_str(), error = %other, "payment provider call failed");
            Error::payment_failed("payment processing failed")
        }
    }
}

/// Load a course that is visible in the catalogue.
pub(crate) async fn find_published_course<C>(courses: &C, id: &CourseId) -> Result<Course, Error>
where
    C: CourseRepository + ?Sized,
{
    courses
        .find_course(id)
        .await
        .map_err(map_course_error)?
        .filter(|course| course.is_published)
        .ok_or_else(|| Error::not_found("course not found"))
}

/// Load the user behind an authenticated session.
pub(crate) async fn find_user<U>(users: &U, id: &UserId) -> Result<User, Error>
where
    U: UserRepository + ?Sized,
{
    users
        .find_by_id(id)
        .await
        .map_err(map_user_error)?
        .ok_or_else(|| Error::not_found("user not found"))
}

/// Public URL of a course page.
pub(crate) fn course_url(public_base_url: &str, course_id: &CourseId) -> String {
    format!("{}/courses/{course_id}", public_base_url.trim_end_matches('/'))
}
