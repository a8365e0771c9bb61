//! Teacher course authoring service.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::info;

use crate::domain::ports::{CourseAuthoringCommand, CourseRepository, UserRepository};
use crate::domain::service_support::{find_user, map_course_error};
use crate::domain::{
    Attachment, AttachmentId, Chapter, ChapterId, ChapterPatch, Course, CourseId, CoursePatch,
    Error, Role, User, UserId, reading_order, validate_price,
};

fn blank(field: &str) -> Error {
    Error::invalid_request(format!("{field} must not be empty")).with_details(json!({
        "field": field,
        "code": "empty_field",
    }))
}

fn unpublishable(what: &str, missing: &[&str]) -> Error {
    Error::invalid_request(format!("{what} is missing required fields")).with_details(json!({
        "fields": missing,
        "code": "publish_requirements",
    }))
}

fn non_blank(field: &str, value: String) -> Result<String, Error> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(blank(field));
    }
    Ok(trimmed.to_owned())
}

/// Authoring service implementing [`CourseAuthoringCommand`].
#[derive(Clone)]
pub struct CourseAuthoringService<U, C> {
    users: Arc<U>,
    courses: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<U, C> CourseAuthoringService<U, C> {
    pub fn new(users: Arc<U>, courses: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self {
            users,
            courses,
            clock,
        }
    }
}

impl<U, C> CourseAuthoringService<U, C>
where
    U: UserRepository,
    C: CourseRepository,
{
    async fn author(&self, actor: &UserId) -> Result<User, Error> {
        let user = find_user(self.users.as_ref(), actor)
            .await
            .map_err(|_| Error::forbidden("teacher role required"))?;
        if !user.role().can_author() {
            return Err(Error::forbidden("teacher role required"));
        }
        Ok(user)
    }

    /// Load a course the actor may edit: its owner, or any admin.
    async fn editable_course(&self, actor: &UserId, course_id: &CourseId) -> Result<Course, Error> {
        let user = self.author(actor).await?;
        let course = self
            .courses
            .find_course(course_id)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found("course not found"))?;
        if course.owner_id != *user.id() && user.role() != Role::Admin {
            return Err(Error::forbidden("only the course owner may edit it"));
        }
        Ok(course)
    }

    async fn chapters(&self, course_id: &CourseId) -> Result<Vec<Chapter>, Error> {
        let mut chapters = self
            .courses
            .list_chapters(course_id)
            .await
            .map_err(map_course_error)?;
        chapters.sort_by_key(reading_order);
        Ok(chapters)
    }

    async fn editable_chapter(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<(Course, Chapter), Error> {
        let course = self.editable_course(actor, course_id).await?;
        let chapter = self
            .courses
            .find_chapter(course_id, chapter_id)
            .await
            .map_err(map_course_error)?
            .ok_or_else(|| Error::not_found("chapter not found"))?;
        Ok((course, chapter))
    }

    async fn check_category(&self, patch: &CoursePatch) -> Result<(), Error> {
        let Some(category_id) = patch.category_id else {
            return Ok(());
        };
        let categories = self
            .courses
            .list_categories()
            .await
            .map_err(map_course_error)?;
        if categories.iter().any(|category| category.id == category_id) {
            Ok(())
        } else {
            Err(Error::invalid_request("unknown category").with_details(json!({
                "field": "categoryId",
                "value": category_id.to_string(),
                "code": "unknown_category",
            })))
        }
    }
}

#[async_trait]
impl<U, C> CourseAuthoringCommand for CourseAuthoringService<U, C>
where
    U: UserRepository,
    C: CourseRepository,
{
    async fn owned_courses(&self, actor: &UserId) -> Result<Vec<Course>, Error> {
        self.author(actor).await?;
        let mut courses = self
            .courses
            .list_by_owner(actor)
            .await
            .map_err(map_course_error)?;
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn create_course(&self, actor: &UserId, title: String) -> Result<Course, Error> {
        self.author(actor).await?;
        let title = non_blank("title", title)?;
        let course = Course::draft(*actor, title, self.clock.utc());
        self.courses
            .save_course(&course)
            .await
            .map_err(map_course_error)?;
        info!(user_id = %actor, course_id = %course.id, "course created");
        Ok(course)
    }

    async fn update_course(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        mut patch: CoursePatch,
    ) -> Result<Course, Error> {
        let mut course = self.editable_course(actor, course_id).await?;
        if let Some(title) = patch.title.take() {
            patch.title = Some(non_blank("title", title)?);
        }
        if let Some(price) = patch.price {
            patch.price = Some(validate_price(price).map_err(|err| {
                Error::invalid_request(err.to_string()).with_details(json!({
                    "field": "price",
                    "code": "invalid_price",
                }))
            })?);
        }
        self.check_category(&patch).await?;
        patch.apply(&mut course, self.clock.utc());
        self.courses
            .save_course(&course)
            .await
            .map_err(map_course_error)?;
        Ok(course)
    }

    async fn set_course_published(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        published: bool,
    ) -> Result<Course, Error> {
        let mut course = self.editable_course(actor, course_id).await?;
        if published {
            let ready = self
                .chapters(course_id)
                .await?
                .iter()
                .filter(|chapter| chapter.is_published)
                .count();
            let missing = course.publish_blockers(ready);
            if !missing.is_empty() {
                return Err(unpublishable("course", &missing));
            }
        }
        course.is_published = published;
        course.updated_at = self.clock.utc();
        self.courses
            .save_course(&course)
            .await
            .map_err(map_course_error)?;
        info!(course_id = %course.id, published, "course visibility changed");
        Ok(course)
    }

    async fn create_chapter(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        title: String,
    ) -> Result<Chapter, Error> {
        let course = self.editable_course(actor, course_id).await?;
        let title = non_blank("title", title)?;
        let position = self
            .chapters(&course.id)
            .await?
            .iter()
            .map(|chapter| chapter.position + 1)
            .max()
            .unwrap_or(0);
        let chapter = Chapter::draft(course.id, title, position, self.clock.utc());
        self.courses
            .save_chapter(&chapter)
            .await
            .map_err(map_course_error)?;
        Ok(chapter)
    }

    async fn update_chapter(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        mut patch: ChapterPatch,
    ) -> Result<Chapter, Error> {
        let (_, mut chapter) = self.editable_chapter(actor, course_id, chapter_id).await?;
        if let Some(title) = patch.title.take() {
            patch.title = Some(non_blank("title", title)?);
        }
        patch.apply(&mut chapter, self.clock.utc());
        self.courses
            .save_chapter(&chapter)
            .await
            .map_err(map_course_error)?;
        Ok(chapter)
    }

    async fn set_chapter_published(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        published: bool,
    ) -> Result<Chapter, Error> {
        let (mut course, mut chapter) =
            self.editable_chapter(actor, course_id, chapter_id).await?;
        if published {
            let missing = chapter.publish_blockers();
            if !missing.is_empty() {
                return Err(unpublishable("chapter", &missing));
            }
        }
        let now = self.clock.utc();
        chapter.is_published = published;
        chapter.updated_at = now;
        self.courses
            .save_chapter(&chapter)
            .await
            .map_err(map_course_error)?;

        if !published && course.is_published {
            let still_published = self
                .chapters(course_id)
                .await?
                .iter()
                .any(|other| other.is_published && other.id != chapter.id);
            if !still_published {
                course.is_published = false;
                course.updated_at = now;
                self.courses
                    .save_course(&course)
                    .await
                    .map_err(map_course_error)?;
                info!(course_id = %course.id, "course unpublished with its last chapter");
            }
        }
        Ok(chapter)
    }

    async fn reorder_chapters(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        positions: Vec<(ChapterId, i32)>,
    ) -> Result<Vec<Chapter>, Error> {
        self.editable_course(actor, course_id).await?;
        let known: HashSet<ChapterId> = self
            .chapters(course_id)
            .await?
            .into_iter()
            .map(|chapter| chapter.id)
            .collect();
        let mut seen = HashSet::new();
        for (id, position) in &positions {
            if !known.contains(id) {
                return Err(Error::invalid_request("chapter does not belong to course")
                    .with_details(json!({ "field": "id", "value": id.to_string() })));
            }
            if *position < 0 {
                return Err(Error::invalid_request("position must not be negative")
                    .with_details(json!({ "field": "position", "value": position })));
            }
            if !seen.insert(*id) {
                return Err(Error::invalid_request("chapter listed twice")
                    .with_details(json!({ "field": "id", "value": id.to_string() })));
            }
        }
        self.courses
            .reorder_chapters(course_id, &positions)
            .await
            .map_err(map_course_error)?;
        self.chapters(course_id).await
    }

    async fn add_attachment(
        &self,
        actor: &UserId,
        course_id: &CourseId,
        name: String,
        url: String,
    ) -> Result<Attachment, Error> {
        let course = self.editable_course(actor, course_id).await?;
        let name = non_blank("name", name)?;
        let url = non_blank("url", url)?;
        let attachment = Attachment {
            id: AttachmentId::random(),
            course_id: course.id,
            name,
            url,
            created_at: self.clock.utc(),
        };
        self.courses
            .add_attachment(&attachment)
            .await
            .map_err(map_course_error)?;
        Ok(attachment)
    }
}

#[cfg(test)]
#[path = "authoring_service_tests.rs"]
mod tests;
