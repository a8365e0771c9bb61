//! Free enrollment and chapter progress handlers.
//!
//! ```text
//! POST /api/v1/courses/{courseId}/enroll
//! PUT /api/v1/courses/{courseId}/chapters/{chapterId}/progress {"isCompleted":true}
//! ```

use actix_web::{post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ChapterId, CourseId, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrollResponse {
    /// `enrolled` or `already_enrolled`.
    #[schema(example = "enrolled")]
    pub status: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub is_completed: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[schema(example = 67)]
    pub progress_percentage: u8,
}

/// Enroll in a free course. Repeating the call is harmless.
#[utoipa::path(
    post,
    path = "/api/v1/courses/{course_id}/enroll",
    params(("course_id" = String, Path, description = "Course identifier")),
    responses(
        (status = 200, description = "Enrolled", body = EnrollResponse),
        (status = 400, description = "Course is not free", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Course not found", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "enrollFree",
    security(("SessionCookie" = []))
)]
#[post("/courses/{course_id}/enroll")]
pub async fn enroll(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<EnrollResponse>> {
    let user_id = session.require_user_id()?;
    let course_id: CourseId = parse_id(&path, FieldName::new("courseId"))?;
    let outcome = state.enrollment.enroll_free(&user_id, &course_id).await?;
    Ok(web::Json(EnrollResponse {
        status: outcome.as_str().to_owned(),
        course_id: course_id.to_string(),
    }))
}

#[utoipa::path(
    put,
    path = "/api/v1/courses/{course_id}/chapters/{chapter_id}/progress",
    params(
        ("course_id" = String, Path, description = "Course identifier"),
        ("chapter_id" = String, Path, description = "Chapter identifier")
    ),
    request_body = ProgressRequest,
    responses(
        (status = 200, description = "Updated course progress", body = ProgressResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Chapter not accessible", body = Error),
        (status = 404, description = "Chapter not found", body = Error)
    ),
    tags = ["enrollment"],
    operation_id = "setChapterProgress",
    security(("SessionCookie" = []))
)]
#[put("/courses/{course_id}/chapters/{chapter_id}/progress")]
pub async fn set_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<(String, String)>,
    payload: web::Json<ProgressRequest>,
) -> ApiResult<web::Json<ProgressResponse>> {
    let user_id = session.require_user_id()?;
    let (course_raw, chapter_raw) = path.into_inner();
    let course_id: CourseId = parse_id(&course_raw, FieldName::new("courseId"))?;
    let chapter_id: ChapterId = parse_id(&chapter_raw, FieldName::new("chapterId"))?;
    let progress_percentage = state
        .enrollment
        .set_chapter_progress(&user_id, &course_id, &chapter_id, payload.is_completed)
        .await?;
    Ok(web::Json(ProgressResponse {
        progress_percentage,
    }))
}
