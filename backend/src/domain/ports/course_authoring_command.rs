//! Driving port for teacher course authoring.
//!
//! Callers must hold the teacher or admin role; only the owning teacher or
//! an admin may edit a course.

use async_trait::async_trait;

use crate::domain::{
    Attachment, Chapter, ChapterId, ChapterPatch, Course, CourseId, CoursePatch, Error, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseAuthoringCommand: Send + Sync {
    /// Courses owned by the caller.
    async fn owned_courses(&self, actor: &UserId) -> Result<Vec<Course>, Error>;

    /// Create an unpublished course with a title.
    async fn create_course(&self, actor: &UserId, title: String) -> Result<Course, Error>;

    /// Edit course fields.
    async fn update_course(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        patch: CoursePatch,
    ) -> Result<Course, Error>;

    /// Publish or unpublish a course.
    async fn set_course_published(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        published: bool,
    ) -> Result<Course, Error>;

    /// Append an unpublished chapter after the last one.
    async fn create_chapter(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        title: String,
    ) -> Result<Chapter, Error>;

    /// Edit chapter fields.
    async fn update_chapter(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        patch: ChapterPatch,
    ) -> Result<Chapter, Error>;

    /// Publish or unpublish a chapter. Unpublishing the last published
    /// chapter also unpublishes the course.
    async fn set_chapter_published(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        published: bool,
    ) -> Result<Chapter, Error>;

    /// Assign new positions to chapters.
    async fn reorder_chapters(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        positions: Vec<(ChapterId, i32)>,
    ) -> Result<Vec<Chapter>, Error>;

    /// Attach a downloadable resource.
    async fn add_attachment(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        name: String,
        url: String,
    ) -> Result<Attachment, Error>;
}
