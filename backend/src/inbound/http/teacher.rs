//! Teacher authoring and analytics handlers.
//!
//! Every route requires the teacher or admin role; ownership is checked by
//! the authoring service.
//!
//! ```text
//! GET   /api/v1/teacher/courses
//! POST  /api/v1/teacher/courses {"title":"Rust for Services"}
//! PATCH /api/v1/teacher/courses/{id} {"price":"29.99","categoryId":"..."}
//! POST  /api/v1/teacher/courses/{id}/publish
//! POST  /api/v1/teacher/courses/{id}/chapters {"title":"Ownership"}
//! PUT   /api/v1/teacher/courses/{id}/chapters/reorder [{"id":"...","position":0}]
//! POST  /api/v1/teacher/courses/{id}/attachments {"name":"Slides","url":"https://..."}
//! GET   /api/v1/teacher/analytics
//! ```

use actix_web::{HttpResponse, get, patch, post, put, web};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ChapterId, ChapterPatch, CourseId, CoursePatch, Currency, Error, UserId, validate_image_url,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    AttachmentResponse, ChapterResponse, CourseResponse, TeacherAnalyticsResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, invalid_value_error, parse_id, parse_optional_id,
};

const COURSE_ID: FieldName = FieldName::new("courseId");
const CHAPTER_ID: FieldName = FieldName::new("chapterId");

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourseRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = Option<String>, example = "29.99")]
    pub price: Option<Decimal>,
    #[schema(example = "KES")]
    pub currency: Option<String>,
    pub category_id: Option<String>,
}

impl TryFrom<UpdateCourseRequest> for CoursePatch {
    type Error = Error;

    fn try_from(value: UpdateCourseRequest) -> Result<Self, Self::Error> {
        let image_url = value
            .image_url
            .as_deref()
            .map(validate_image_url)
            .transpose()
            .map_err(|err| invalid_value_error(FieldName::new("imageUrl"), err))?;
        let currency = value
            .currency
            .map(Currency::new)
            .transpose()
            .map_err(|err| invalid_value_error(FieldName::new("currency"), err))?;
        Ok(Self {
            title: value.title,
            description: value.description,
            image_url,
            price: value.price,
            currency,
            category_id: parse_optional_id(
                value.category_id.as_deref(),
                FieldName::new("categoryId"),
            )?,
        })
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChapterRequest {
    pub title: String,
}

#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChapterRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub is_free: Option<bool>,
}

impl From<UpdateChapterRequest> for ChapterPatch {
    fn from(value: UpdateChapterRequest) -> Self {
        Self {
            title: value.title,
            description: value.description,
            video_url: value.video_url,
            is_free: value.is_free,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterPosition {
    pub id: String,
    pub position: i32,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAttachmentRequest {
    pub name: String,
    pub url: String,
}

fn course_path(raw: &str) -> Result<CourseId, Error> {
    parse_id(raw, COURSE_ID)
}

fn chapter_path(path: (String, String)) -> Result<(CourseId, ChapterId), Error> {
    let (course_raw, chapter_raw) = path;
    Ok((parse_id(&course_raw, COURSE_ID)?, parse_id(&chapter_raw, CHAPTER_ID)?))
}

#[utoipa::path(
    get,
    path = "/api/v1/teacher/courses",
    responses(
        (status = 200, description = "Courses owned by the caller, newest first", body = [CourseResponse]),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Teacher role required", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "listOwnedCourses",
    security(("SessionCookie" = []))
)]
#[get("/teacher/courses")]
pub async fn list_owned_courses(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<CourseResponse>>> {
    let actor = session.require_user_id()?;
    let courses = state.authoring.owned_courses(&actor).await?;
    Ok(web::Json(courses.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses",
    request_body = CreateCourseRequest,
    responses(
        (status = 201, description = "Draft course created", body = CourseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Teacher role required", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "createCourse",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses")]
pub async fn create_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateCourseRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let course = state
        .authoring
        .create_course(&actor, payload.into_inner().title)
        .await?;
    Ok(HttpResponse::Created().json(CourseResponse::from(course)))
}

#[utoipa::path(
    patch,
    path = "/api/v1/teacher/courses/{course_id}",
    params(("course_id" = String, Path, description = "Course identifier")),
    request_body = UpdateCourseRequest,
    responses(
        (status = 200, description = "Updated course", body = CourseResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "updateCourse",
    security(("SessionCookie" = []))
)]
#[patch("/teacher/courses/{course_id}")]
pub async fn update_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<UpdateCourseRequest>,
) -> ApiResult<web::Json<CourseResponse>> {
    let actor = session.require_user_id()?;
    let course_id = course_path(&path)?;
    let patch = CoursePatch::try_from(payload.into_inner())?;
    let course = state
        .authoring
        .update_course(&actor, &course_id, patch)
        .await?;
    Ok(web::Json(course.into()))
}

async fn set_course_published(
    state: &HttpState,
    actor: &UserId,
    raw_id: &str,
    published: bool,
) -> ApiResult<web::Json<CourseResponse>> {
    let course_id = course_path(raw_id)?;
    let course = state
        .authoring
        .set_course_published(actor, &course_id, published)
        .await?;
    Ok(web::Json(course.into()))
}

/// Publish a course.
///
/// Refused with `details.missing` until title, description, price, category
/// and at least one published chapter are present.
#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/publish",
    params(("course_id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Published course", body = CourseResponse),
        (status = 400, description = "Course incomplete", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "publishCourse",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/publish")]
pub async fn publish_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseResponse>> {
    let actor = session.require_user_id()?;
    set_course_published(&state, &actor, &path, true).await
}

#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/unpublish",
    params(("course_id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Unpublished course", body = CourseResponse),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "unpublishCourse",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/unpublish")]
pub async fn unpublish_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseResponse>> {
    let actor = session.require_user_id()?;
    set_course_published(&state, &actor, &path, false).await
}

/// Append a draft chapter after the last existing position.
#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/chapters",
    params(("course_id" = String, Path, description = "Course identifier")),
    request_body = CreateChapterRequest,
    responses(
        (status = 201, description = "Chapter created", body = ChapterResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "createChapter",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/chapters")]
pub async fn create_chapter(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateChapterRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let course_id = course_path(&path)?;
    let chapter = state
        .authoring
        .create_chapter(&actor, &course_id, payload.into_inner().title)
        .await?;
    Ok(HttpResponse::Created().json(ChapterResponse::from(chapter)))
}

#[utoipa::path(
    put,
    path = "/api/v1/teacher/courses/{course_id}/chapters/reorder",
    params(("course_id" = String, Path, description = "Course identifier")),
    request_body = Vec<ChapterPosition>,
    responses(
        (status = 200, description = "Chapters in their new order", body = [ChapterResponse]),
        (status = 400, description = "Unknown or duplicate chapter", body = Error),
        (status = 403, description = "Not the owner", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "reorderChapters",
    security(("SessionCookie" = []))
)]
#[put("/teacher/courses/{course_id}/chapters/reorder")]
pub async fn reorder_chapters(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<Vec<ChapterPosition>>,
) -> ApiResult<web::Json<Vec<ChapterResponse>>> {
    let actor = session.require_user_id()?;
    let course_id = course_path(&path)?;
    let positions = payload
        .into_inner()
        .into_iter()
        .map(|entry| Ok((parse_id(&entry.id, FieldName::new("id"))?, entry.position)))
        .collect::<Result<Vec<(ChapterId, i32)>, Error>>()?;
    let chapters = state
        .authoring
        .reorder_chapters(&actor, &course_id, positions)
        .await?;
    Ok(web::Json(chapters.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    patch,
    path = "/api/v1/teacher/courses/{course_id}/chapters/{chapter_id}",
    params(
        ("course_id" = String, Path, description = "Course identifier"),
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    request_body = UpdateChapterRequest,
    responses(
        (status = 200, description = "Updated chapter", body = ChapterResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Chapter not found", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "updateChapter",
    security(("SessionCookie" = []))
)]
#[patch("/teacher/courses/{course_id}/chapters/{chapter_id}")]
pub async fn update_chapter(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<UpdateChapterRequest>,
) -> ApiResult<web::Json<ChapterResponse>> {
    let actor = session.require_user_id()?;
    let (course_id, chapter_id) = chapter_path(path.into_inner())?;
    let chapter = state
        .authoring
        .update_chapter(&actor, &course_id, &chapter_id, payload.into_inner().into())
        .await?;
    Ok(web::Json(chapter.into()))
}

async fn set_chapter_published(
    state: &HttpState,
    actor: &UserId,
    path: (String, String),
    published: bool,
) -> ApiResult<web::Json<ChapterResponse>> {
    let (course_id, chapter_id) = chapter_path(path)?;
    let chapter = state
        .authoring
        .set_chapter_published(actor, &course_id, &chapter_id, published)
        .await?;
    Ok(web::Json(chapter.into()))
}

#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/chapters/{chapter_id}/publish",
    params(
        ("course_id" = String, Path, description = "Course identifier"),
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    responses(
        (status = 200, description = "Published chapter", body = ChapterResponse),
        (status = 400, description = "Chapter incomplete", body = Error),
        (status = 403, description = "Not the owner", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "publishChapter",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/chapters/{chapter_id}/publish")]
pub async fn publish_chapter(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<ChapterResponse>> {
    let actor = session.require_user_id()?;
    set_chapter_published(&state, &actor, path.into_inner(), true).await
}

/// Unpublish a chapter; the course is unpublished too when no published
/// chapter remains.
#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/chapters/{chapter_id}/unpublish",
    params(
        ("course_id" = String, Path, description = "Course identifier"),
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    responses(
        (status = 200, description = "Unpublished chapter", body = ChapterResponse),
        (status = 403, description = "Not the owner", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "unpublishChapter",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/chapters/{chapter_id}/unpublish")]
pub async fn unpublish_chapter(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<ChapterResponse>> {
    let actor = session.require_user_id()?;
    set_chapter_published(&state, &actor, path.into_inner(), false).await
}

#[utoipa::path(
    post,
    path = "/api/v1/teacher/courses/{course_id}/attachments",
    params(("course_id" = String, Path, description = "Course identifier")),
    request_body = CreateAttachmentRequest,
    responses(
        (status = 201, description = "Attachment added", body = AttachmentResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Not the owner", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "addAttachment",
    security(("SessionCookie" = []))
)]
#[post("/teacher/courses/{course_id}/attachments")]
pub async fn add_attachment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<CreateAttachmentRequest>,
) -> ApiResult<HttpResponse> {
    let actor = session.require_user_id()?;
    let course_id = course_path(&path)?;
    let CreateAttachmentRequest { name, url } = payload.into_inner();
    let attachment = state
        .authoring
        .add_attachment(&actor, &course_id, name, url)
        .await?;
    Ok(HttpResponse::Created().json(AttachmentResponse::from(attachment)))
}

/// Sales per owned course and revenue per currency.
#[utoipa::path(
    get,
    path = "/api/v1/teacher/analytics",
    responses(
        (status = 200, description = "Sales analytics", body = TeacherAnalyticsResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Teacher role required", body = Error)
    ),
    tags = ["teacher"],
    operation_id = "teacherAnalytics",
    security(("SessionCookie" = []))
)]
#[get("/teacher/analytics")]
pub async fn analytics(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<TeacherAnalyticsResponse>> {
    let actor = session.require_user_id()?;
    let analytics = state.dashboards.teacher_analytics(&actor).await?;
    Ok(web::Json(analytics.into()))
}

#[cfg(test)]
#[path = "teacher_tests.rs"]
mod tests;
