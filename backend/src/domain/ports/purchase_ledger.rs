//! Port for the purchase ledger: the authoritative enrollment record.
//!
//! Adapters must back [`PurchaseLedger::enroll`] with a uniqueness guarantee
//! on `(user_id, course_id)` and report a lost race as
//! [`EnrollmentOutcome::AlreadyEnrolled`], never as an error.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChapterId, CourseId, EnrollmentOutcome, Purchase, UserId};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by purchase ledger adapters.
    pub enum PurchaseLedgerError {
        /// Repository connection could not be established.
        Connection { message: String } => "purchase ledger connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "purchase ledger query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PurchaseLedger: Send + Sync {
    /// Fetch the purchase for a user and course, if any.
    async fn find_purchase(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError>;

    /// Atomically record a purchase and seed one progress row per chapter.
    ///
    /// When a purchase already exists nothing is written and
    /// [`EnrollmentOutcome::AlreadyEnrolled`] is returned.
    async fn enroll(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_ids: &[ChapterId],
        at: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, PurchaseLedgerError>;

    /// Every purchase held by a user, newest first.
    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, PurchaseLedgerError>;

    /// Every purchase of the given courses.
    async fn purchases_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<Purchase>, PurchaseLedgerError>;
}
