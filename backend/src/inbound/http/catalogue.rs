//! Public catalogue handlers.
//!
//! Browsing works signed out; a session only adds purchase and progress
//! information.
//!
//! ```text
//! GET /api/v1/categories
//! GET /api/v1/courses?title=rust&categoryId=...
//! GET /api/v1/courses/{courseId}
//! GET /api/v1/courses/{courseId}/chapters/{chapterId}
//! ```

use actix_web::{get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{ChapterId, CourseFilter, CourseId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::dto::{
    CategoryResponse, ChapterDetailResponse, CourseDetailResponse, CourseListingResponse,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_optional_id};

const COURSE_ID: FieldName = FieldName::new("courseId");
const CHAPTER_ID: FieldName = FieldName::new("chapterId");

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct CourseSearchQuery {
    /// Case-insensitive title substring.
    pub title: Option<String>,
    pub category_id: Option<String>,
}

impl CourseSearchQuery {
    fn into_filter(self) -> Result<CourseFilter, Error> {
        let category_id =
            parse_optional_id(self.category_id.as_deref(), FieldName::new("categoryId"))?;
        let title = self
            .title
            .map(|title| title.trim().to_owned())
            .filter(|title| !title.is_empty());
        Ok(CourseFilter { title, category_id })
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    responses(
        (status = 200, description = "Categories ordered by name", body = [CategoryResponse]),
        (status = 503, description = "Store unavailable", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "listCategories",
    security([])
)]
#[get("/categories")]
pub async fn list_categories(
    state: web::Data<HttpState>,
) -> ApiResult<web::Json<Vec<CategoryResponse>>> {
    let categories = state.catalogue.categories().await?;
    Ok(web::Json(categories.into_iter().map(Into::into).collect()))
}

/// Published courses matching the filter, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/courses",
    params(CourseSearchQuery),
    responses(
        (status = 200, description = "Published courses", body = [CourseListingResponse]),
        (status = 400, description = "Invalid request", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "listCourses",
    security([], ("SessionCookie" = []))
)]
#[get("/courses")]
pub async fn list_courses(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<CourseSearchQuery>,
) -> ApiResult<web::Json<Vec<CourseListingResponse>>> {
    let filter = query.into_inner().into_filter()?;
    let viewer = session.user_id()?;
    let listings = state.catalogue.list_courses(viewer, filter).await?;
    Ok(web::Json(listings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}",
    params(("course_id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Course with published chapters", body = CourseDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Course not found or unpublished", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "getCourse",
    security([], ("SessionCookie" = []))
)]
#[get("/courses/{course_id}")]
pub async fn get_course(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<CourseDetailResponse>> {
    let course_id: CourseId = parse_id(&path, COURSE_ID)?;
    let viewer = session.user_id()?;
    let detail = state.catalogue.course_detail(viewer, course_id).await?;
    Ok(web::Json(detail.into()))
}

/// One chapter with access applied.
///
/// The video URL is withheld unless the chapter is the free preview or the
/// caller owns the course; attachments are only listed for owners.
#[utoipa::path(
    get,
    path = "/api/v1/courses/{course_id}/chapters/{chapter_id}",
    params(
        ("course_id" = String, Path, description = "Course identifier"),
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    responses(
        (status = 200, description = "Chapter detail", body = ChapterDetailResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 404, description = "Chapter not found or unpublished", body = Error)
    ),
    tags = ["catalogue"],
    operation_id = "getChapter",
    security([], ("SessionCookie" = []))
)]
#[get("/courses/{course_id}/chapters/{chapter_id}")]
pub async fn get_chapter(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<ChapterDetailResponse>> {
    let (course_raw, chapter_raw) = path.into_inner();
    let course_id: CourseId = parse_id(&course_raw, COURSE_ID)?;
    let chapter_id: ChapterId = parse_id(&chapter_raw, CHAPTER_ID)?;
    let viewer = session.user_id()?;
    let detail = state
        .catalogue
        .chapter_detail(viewer, course_id, chapter_id)
        .await?;
    Ok(web::Json(detail.into()))
}
