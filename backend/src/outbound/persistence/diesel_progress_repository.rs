//! PostgreSQL-backed `ProgressRepository` implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{ProgressRepository, ProgressRepositoryError};
use crate::domain::{ChapterId, UserId, UserProgress};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewProgressRow, ProgressRow};
use super::pool::{DbPool, PoolError};
use super::schema::user_progress;

/// Diesel-backed implementation of the progress repository port.
#[derive(Clone)]
pub struct DieselProgressRepository {
    pool: DbPool,
}

impl DieselProgressRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> ProgressRepositoryError {
    map_basic_pool_error(error, ProgressRepositoryError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> ProgressRepositoryError {
    map_basic_diesel_error(
        error,
        ProgressRepositoryError::query,
        ProgressRepositoryError::connection,
    )
}

#[async_trait]
impl ProgressRepository for DieselProgressRepository {
    async fn progress_for(
        &self,
        user_id: &UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<UserProgress>, ProgressRepositoryError> {
        if chapter_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = chapter_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<ProgressRow> = user_progress::table
            .filter(
                user_progress::user_id
                    .eq(user_id.as_uuid())
                    .and(user_progress::chapter_id.eq_any(uuids)),
            )
            .select(ProgressRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows
            .into_iter()
            .map(|row| UserProgress {
                user_id: UserId::from_uuid(row.user_id),
                chapter_id: ChapterId::from_uuid(row.chapter_id),
                is_completed: row.is_completed,
                updated_at: row.updated_at,
            })
            .collect())
    }

    async fn set_completed(
        &self,
        user_id: &UserId,
        chapter_id: &ChapterId,
        completed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), ProgressRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewProgressRow {
            id: Uuid::new_v4(),
            user_id: *user_id.as_uuid(),
            chapter_id: *chapter_id.as_uuid(),
            is_completed: completed,
            created_at: at,
            updated_at: at,
        };

        diesel::insert_into(user_progress::table)
            .values(&row)
            .on_conflict((user_progress::user_id, user_progress::chapter_id))
            .do_update()
            .set((
                user_progress::is_completed.eq(excluded(user_progress::is_completed)),
                user_progress::updated_at.eq(excluded(user_progress::updated_at)),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }
}
