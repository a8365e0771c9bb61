//! PostgreSQL-backed `CourseRepository` implementation using Diesel ORM.
//!
//! Prices are stored as minor units in `price_cents`; conversion to and from
//! [`Decimal`](rust_decimal::Decimal) happens here so the domain never sees
//! integer cents.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{CourseRepository, CourseRepositoryError};
use crate::domain::{
    Attachment, AttachmentId, Category, CategoryId, Chapter, ChapterId, Course, CourseFilter,
    CourseId, Currency, UserId, from_storage_units, to_storage_units,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{AttachmentRow, CategoryRow, ChapterRow, CourseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{attachments, categories, chapters, courses};

/// Diesel-backed implementation of the course repository port.
#[derive(Clone)]
pub struct DieselCourseRepository {
    pool: DbPool,
}

impl DieselCourseRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CourseRepositoryError {
    map_basic_pool_error(error, CourseRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> CourseRepositoryError {
    map_basic_diesel_error(
        error,
        CourseRepositoryError::query,
        CourseRepositoryError::connection,
    )
}

/// Escape `LIKE` wildcards so user search text matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

fn row_to_course(row: CourseRow) -> Result<Course, CourseRepositoryError> {
    let currency = Currency::new(&row.currency)
        .map_err(|err| CourseRepositoryError::query(format!("course currency: {err}")))?;
    Ok(Course {
        id: CourseId::from_uuid(row.id),
        owner_id: UserId::from_uuid(row.owner_id),
        title: row.title,
        description: row.description,
        image_url: row.image_url,
        price: row.price_cents.map(from_storage_units),
        currency,
        is_published: row.is_published,
        category_id: row.category_id.map(CategoryId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn course_to_row(course: &Course) -> Result<CourseRow, CourseRepositoryError> {
    let price_cents = course
        .price
        .map(to_storage_units)
        .transpose()
        .map_err(|err| CourseRepositoryError::query(format!("course price: {err}")))?;
    Ok(CourseRow {
        id: *course.id.as_uuid(),
        owner_id: *course.owner_id.as_uuid(),
        title: course.title.clone(),
        description: course.description.clone(),
        image_url: course.image_url.clone(),
        price_cents,
        currency: course.currency.as_str().to_owned(),
        is_published: course.is_published,
        category_id: course.category_id.map(|id| *id.as_uuid()),
        created_at: course.created_at,
        updated_at: course.updated_at,
    })
}

fn row_to_chapter(row: ChapterRow) -> Chapter {
    Chapter {
        id: ChapterId::from_uuid(row.id),
        course_id: CourseId::from_uuid(row.course_id),
        title: row.title,
        description: row.description,
        video_url: row.video_url,
        position: row.position,
        is_published: row.is_published,
        is_free: row.is_free,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }
}

fn chapter_to_row(chapter: &Chapter) -> ChapterRow {
    ChapterRow {
        id: *chapter.id.as_uuid(),
        course_id: *chapter.course_id.as_uuid(),
        title: chapter.title.clone(),
        description: chapter.description.clone(),
        video_url: chapter.video_url.clone(),
        position: chapter.position,
        is_published: chapter.is_published,
        is_free: chapter.is_free,
        created_at: chapter.created_at,
        updated_at: chapter.updated_at,
    }
}

fn collect_courses(rows: Vec<CourseRow>) -> Result<Vec<Course>, CourseRepositoryError> {
    rows.into_iter().map(row_to_course).collect()
}

#[async_trait]
impl CourseRepository for DieselCourseRepository {
    async fn list_categories(&self) -> Result<Vec<Category>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CategoryRow> = categories::table
            .order(categories::name.asc())
            .select(CategoryRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| Category {
                id: CategoryId::from_uuid(row.id),
                name: row.name,
            })
            .collect())
    }

    async fn list_published(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = courses::table
            .filter(courses::is_published.eq(true))
            .select(CourseRow::as_select())
            .order((courses::created_at.desc(), courses::id.desc()))
            .into_boxed();
        if let Some(title) = filter.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            query = query.filter(courses::title.ilike(like_pattern(title)));
        }
        if let Some(category_id) = filter.category_id {
            query = query.filter(courses::category_id.eq(*category_id.as_uuid()));
        }
        let rows: Vec<CourseRow> = query.load(&mut conn).await.map_err(map_diesel_error)?;
        collect_courses(rows)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<CourseRow> = courses::table
            .filter(courses::owner_id.eq(owner.as_uuid()))
            .order((courses::created_at.desc(), courses::id.desc()))
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_courses(rows)
    }

    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = courses::table
            .filter(courses::id.eq(id.as_uuid()))
            .select(CourseRow::as_select())
            .first::<CourseRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_course).transpose()
    }

    async fn find_courses(&self, ids: &[CourseId]) -> Result<Vec<Course>, CourseRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<CourseRow> = courses::table
            .filter(courses::id.eq_any(uuids))
            .select(CourseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_courses(rows)
    }

    async fn save_course(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let row = course_to_row(course)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(courses::table)
            .values(&row)
            .on_conflict(courses::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn list_chapters(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Chapter>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<ChapterRow> = chapters::table
            .filter(chapters::course_id.eq(course_id.as_uuid()))
            .order((chapters::position.asc(), chapters::id.asc()))
            .select(ChapterRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_chapter).collect())
    }

    async fn find_chapter(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = chapters::table
            .filter(
                chapters::id
                    .eq(chapter_id.as_uuid())
                    .and(chapters::course_id.eq(course_id.as_uuid())),
            )
            .select(ChapterRow::as_select())
            .first::<ChapterRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_chapter))
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<(), CourseRepositoryError> {
        let row = chapter_to_row(chapter);
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(chapters::table)
            .values(&row)
            .on_conflict(chapters::id)
            .do_update()
            .set(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn reorder_chapters(
        &self,
        course_id: &CourseId,
        positions: &[(ChapterId, i32)],
    ) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let course_uuid = *course_id.as_uuid();
        let updates: Vec<(uuid::Uuid, i32)> = positions
            .iter()
            .map(|(id, position)| (*id.as_uuid(), *position))
            .collect();

        conn.transaction(|conn| {
            async move {
                for (chapter_id, position) in updates {
                    diesel::update(
                        chapters::table.filter(
                            chapters::id
                                .eq(chapter_id)
                                .and(chapters::course_id.eq(course_uuid)),
                        ),
                    )
                    .set((
                        chapters::position.eq(position),
                        chapters::updated_at.eq(diesel::dsl::now),
                    ))
                    .execute(conn)
                    .await?;
                }
                Ok::<_, diesel::result::Error>(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn list_attachments(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Attachment>, CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<AttachmentRow> = attachments::table
            .filter(attachments::course_id.eq(course_id.as_uuid()))
            .order(attachments::created_at.asc())
            .select(AttachmentRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|row| Attachment {
                id: AttachmentId::from_uuid(row.id),
                course_id: CourseId::from_uuid(row.course_id),
                name: row.name,
                url: row.url,
                created_at: row.created_at,
            })
            .collect())
    }

    async fn add_attachment(&self, attachment: &Attachment) -> Result<(), CourseRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = AttachmentRow {
            id: *attachment.id.as_uuid(),
            course_id: *attachment.course_id.as_uuid(),
            name: attachment.name.clone(),
            url: attachment.url.clone(),
            created_at: attachment.created_at,
        };
        diesel::insert_into(attachments::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
