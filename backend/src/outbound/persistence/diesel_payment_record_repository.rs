//! PostgreSQL-backed advisory payment record log.
//!
//! Status transitions are guarded in SQL: once a row reaches `completed` the
//! conditional upserts below match no rows, so replayed provider callbacks
//! cannot rewrite it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_query;
use diesel::sql_types::{BigInt, Jsonb, Text, Timestamptz, Uuid as SqlUuid};
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{PaymentRecordError, PaymentRecordRepository};
use crate::domain::{
    CompletionWrite, CourseId, Currency, NewPaymentRecord, PaymentProvider, PaymentRecord,
    PaymentRecordId, PaymentStatus, UserId, from_storage_units, to_storage_units,
};

use super::diesel_basic_error_mapping::{map_basic_diesel_error, map_basic_pool_error};
use super::models::{NewPaymentRecordRow, PaymentRecordRow};
use super::pool::{DbPool, PoolError};
use super::schema::payment_records;

/// Diesel-backed implementation of the payment record port.
#[derive(Clone)]
pub struct DieselPaymentRecordRepository {
    pool: DbPool,
}

impl DieselPaymentRecordRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

const GUARDED_UPSERT_SQL: &str = r#"
INSERT INTO payment_records
    (id, user_id, course_id, provider, reference, amount_cents, currency, status, metadata,
     created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $10)
ON CONFLICT (provider, reference)
DO UPDATE SET
    status = EXCLUDED.status,
    metadata = payment_records.metadata || EXCLUDED.metadata,
    updated_at = EXCLUDED.updated_at
WHERE payment_records.status <> 'completed'
"#;

fn map_pool_error(error: PoolError) -> PaymentRecordError {
    map_basic_pool_error(error, PaymentRecordError::connection)
}

fn map_diesel_error(error: diesel::result::Error) -> PaymentRecordError {
    map_basic_diesel_error(
        error,
        PaymentRecordError::query,
        PaymentRecordError::connection,
    )
}

fn amount_cents(record: &NewPaymentRecord) -> Result<i64, PaymentRecordError> {
    to_storage_units(record.amount)
        .map_err(|err| PaymentRecordError::query(format!("payment amount: {err}")))
}

fn row_to_record(row: PaymentRecordRow) -> Result<PaymentRecord, PaymentRecordError> {
    let provider: PaymentProvider = row
        .provider
        .parse()
        .map_err(|err: crate::domain::UnknownProvider| PaymentRecordError::query(err.to_string()))?;
    let status: PaymentStatus = row
        .status
        .parse()
        .map_err(|err: crate::domain::UnknownStatus| PaymentRecordError::query(err.to_string()))?;
    let currency = Currency::new(&row.currency)
        .map_err(|err| PaymentRecordError::query(format!("payment currency: {err}")))?;
    Ok(PaymentRecord {
        id: PaymentRecordId::from_uuid(row.id),
        user_id: UserId::from_uuid(row.user_id),
        course_id: CourseId::from_uuid(row.course_id),
        provider,
        reference: row.reference,
        amount: from_storage_units(row.amount_cents),
        currency,
        status,
        metadata: row.metadata,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl DieselPaymentRecordRepository {
    /// Run the guarded upsert, returning the number of rows written.
    async fn guarded_upsert(
        &self,
        record: &NewPaymentRecord,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> Result<usize, PaymentRecordError> {
        let cents = amount_cents(record)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        sql_query(GUARDED_UPSERT_SQL)
            .bind::<SqlUuid, _>(Uuid::new_v4())
            .bind::<SqlUuid, _>(*record.user_id.as_uuid())
            .bind::<SqlUuid, _>(*record.course_id.as_uuid())
            .bind::<Text, _>(record.provider.as_str())
            .bind::<Text, _>(record.reference.as_str())
            .bind::<BigInt, _>(cents)
            .bind::<Text, _>(record.currency.as_str())
            .bind::<Text, _>(status.as_str())
            .bind::<Jsonb, _>(&record.metadata)
            .bind::<Timestamptz, _>(at)
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)
    }
}

#[async_trait]
impl PaymentRecordRepository for DieselPaymentRecordRepository {
    async fn insert_pending(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError> {
        let cents = amount_cents(record)?;
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = NewPaymentRecordRow {
            id: Uuid::new_v4(),
            user_id: *record.user_id.as_uuid(),
            course_id: *record.course_id.as_uuid(),
            provider: record.provider.as_str(),
            reference: record.reference.as_str(),
            amount_cents: cents,
            currency: record.currency.as_str(),
            status: PaymentStatus::Pending.as_str(),
            metadata: &record.metadata,
            created_at: at,
            updated_at: at,
        };

        diesel::insert_into(payment_records::table)
            .values(&row)
            .on_conflict((payment_records::provider, payment_records::reference))
            .do_nothing()
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, PaymentRecordError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = payment_records::table
            .filter(
                payment_records::provider
                    .eq(provider.as_str())
                    .and(payment_records::reference.eq(reference)),
            )
            .select(PaymentRecordRow::as_select())
            .first::<PaymentRecordRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(row_to_record).transpose()
    }

    async fn record_completed(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<CompletionWrite, PaymentRecordError> {
        let written = self
            .guarded_upsert(record, PaymentStatus::Completed, at)
            .await?;
        Ok(if written == 0 {
            CompletionWrite::AlreadyCompleted
        } else {
            CompletionWrite::Recorded
        })
    }

    async fn record_unsuccessful(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError> {
        self.guarded_upsert(record, record.status, at)
            .await
            .map(|_| ())
    }
}
