//! Port for reading and writing courses, chapters, categories and
//! attachments.

use async_trait::async_trait;

use crate::domain::{
    Attachment, Category, Chapter, ChapterId, Course, CourseFilter, CourseId, UserId,
};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by course repository adapters.
    pub enum CourseRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "course repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "course repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseRepository: Send + Sync {
    /// All categories ordered by name.
    async fn list_categories(&self) -> Result<Vec<Category>, CourseRepositoryError>;

    /// Published courses matching `filter`, newest first.
    async fn list_published(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Courses owned by `owner`, published or not, newest first.
    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Fetch one course regardless of publish state.
    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError>;

    /// Fetch several courses; unknown ids are skipped.
    async fn find_courses(&self, ids: &[CourseId]) -> Result<Vec<Course>, CourseRepositoryError>;

    /// Insert or update a course.
    async fn save_course(&self, course: &Course) -> Result<(), CourseRepositoryError>;

    /// Every chapter of a course ordered by position.
    async fn list_chapters(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Chapter>, CourseRepositoryError>;

    /// Fetch one chapter that belongs to `course_id`.
    async fn find_chapter(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>, CourseRepositoryError>;

    /// Insert or update a chapter.
    async fn save_chapter(&self, chapter: &Chapter) -> Result<(), CourseRepositoryError>;

    /// Apply new positions to chapters of `course_id` atomically.
    async fn reorder_chapters(
        &self,
        course_id: &CourseId,
        positions: &[(ChapterId, i32)],
    ) -> Result<(), CourseRepositoryError>;

    /// Attachments of a course, oldest first.
    async fn list_attachments(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Attachment>, CourseRepositoryError>;

    /// Store a new attachment.
    async fn add_attachment(&self, attachment: &Attachment) -> Result<(), CourseRepositoryError>;
}
