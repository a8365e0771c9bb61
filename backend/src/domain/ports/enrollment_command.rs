//! Driving port for free enrollment and chapter progress.

use async_trait::async_trait;

use crate::domain::{ChapterId, CourseId, EnrollmentOutcome, Error, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EnrollmentCommand: Send + Sync {
    /// Enroll in a published course that has no price.
    async fn enroll_free(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<EnrollmentOutcome, Error>;

    /// Mark a chapter complete or incomplete, returning the new course
    /// completion percentage.
    async fn set_chapter_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        completed: bool,
    ) -> Result<u8, Error>;
}
