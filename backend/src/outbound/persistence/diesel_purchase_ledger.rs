//! PostgreSQL-backed purchase ledger.
//!
//! Enrollment writes the purchase and seeds progress rows in one
//! transaction. The unique index on `(user_id, course_id)` decides races:
//! the losing writer inserts nothing and reports `AlreadyEnrolled`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{PurchaseLedger, PurchaseLedgerError};
use crate::domain::{ChapterId, CourseId, EnrollmentOutcome, Purchase, UserId};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewProgressRow, NewPurchaseRow, PurchaseRow};
use super::pool::{DbPool, PoolError};
use super::schema::{purchases, user_progress};

/// Diesel-backed implementation of the purchase ledger port.
#[derive(Clone)]
pub struct DieselPurchaseLedger {
    pool: DbPool,
}

impl DieselPurchaseLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> PurchaseLedgerError {
    map_basic_pool_error(error, PurchaseLedgerError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PurchaseLedgerError {
    map_basic_diesel_error(
        error,
        PurchaseLedgerError::query,
        PurchaseLedgerError::connection,
    )
}

fn row_to_purchase(row: PurchaseRow) -> Purchase {
    Purchase {
        user_id: UserId::from_uuid(row.user_id),
        course_id: CourseId::from_uuid(row.course_id),
        created_at: row.created_at,
    }
}

fn seed_rows(user_id: Uuid, chapter_ids: &[ChapterId], at: DateTime<Utc>) -> Vec<NewProgressRow> {
    chapter_ids
        .iter()
        .map(|chapter_id| NewProgressRow {
            id: Uuid::new_v4(),
            user_id,
            chapter_id: *chapter_id.as_uuid(),
            is_completed: false,
            created_at: at,
            updated_at: at,
        })
        .collect()
}

#[async_trait]
impl PurchaseLedger for DieselPurchaseLedger {
    async fn find_purchase(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = purchases::table
            .filter(
                purchases::user_id
                    .eq(user_id.as_uuid())
                    .and(purchases::course_id.eq(course_id.as_uuid())),
            )
            .select(PurchaseRow::as_select())
            .first::<PurchaseRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(row.map(row_to_purchase))
    }

    async fn enroll(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_ids: &[ChapterId],
        at: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, PurchaseLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let purchase = NewPurchaseRow {
            id: Uuid::new_v4(),
            user_id: *user_id.as_uuid(),
            course_id: *course_id.as_uuid(),
            created_at: at,
        };
        let progress = seed_rows(*user_id.as_uuid(), chapter_ids, at);

        let outcome = conn
            .transaction(|conn| {
                async move {
                    let inserted = diesel::insert_into(purchases::table)
                        .values(&purchase)
                        .on_conflict((purchases::user_id, purchases::course_id))
                        .do_nothing()
                        .execute(conn)
                        .await?;
                    if inserted == 0 {
                        return Ok(EnrollmentOutcome::AlreadyEnrolled);
                    }
                    if !progress.is_empty() {
                        diesel::insert_into(user_progress::table)
                            .values(&progress)
                            .on_conflict((user_progress::user_id, user_progress::chapter_id))
                            .do_nothing()
                            .execute(conn)
                            .await?;
                    }
                    Ok::<_, diesel::result::Error>(EnrollmentOutcome::Enrolled)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;

        debug!(
            %user_id,
            %course_id,
            outcome = outcome.as_str(),
            "purchase ledger write finished"
        );
        Ok(outcome)
    }

    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, PurchaseLedgerError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let rows: Vec<PurchaseRow> = purchases::table
            .filter(purchases::user_id.eq(user_id.as_uuid()))
            .order(purchases::created_at.desc())
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_purchase).collect())
    }

    async fn purchases_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<Purchase>, PurchaseLedgerError> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let uuids: Vec<Uuid> = course_ids.iter().map(|id| *id.as_uuid()).collect();
        let rows: Vec<PurchaseRow> = purchases::table
            .filter(purchases::course_id.eq_any(uuids))
            .select(PurchaseRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(rows.into_iter().map(row_to_purchase).collect())
    }
}
