//! Integration tests for `DieselPaymentRecordRepository` against embedded
//! PostgreSQL.
//!
//! Status writes go through a conditional upsert; these cases pin down that a
//! `completed` row is final no matter which write arrives afterwards.

use chrono::{DateTime, Duration, TimeZone, Utc};
use coursehub::domain::ports::{CourseRepository, PaymentRecordRepository, UserRepository};
use coursehub::domain::{
    CompletionWrite, Course, Currency, DisplayName, Email, NewPaymentRecord, PaymentProvider,
    PaymentStatus, Role, User, UserId,
};
use coursehub::outbound::persistence::{
    DbPool, DieselCourseRepository, DieselPaymentRecordRepository, DieselUserRepository,
    PoolConfig,
};
use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use rust_decimal_macros::dec;
use serde_json::json;
use tokio::runtime::Runtime;

#[path = "support/embedded_postgres.rs"]
mod embedded_postgres;

use embedded_postgres::{
    handle_cluster_setup_failure, provision_template_database, shared_cluster,
};

const CHECKOUT_ID: &str = "ws_CO_140320260930";

struct TestContext {
    records: DieselPaymentRecordRepository,
    users: DieselUserRepository,
    courses: DieselCourseRepository,
    runtime: Runtime,
    _database: TemporaryDatabase,
}

fn at() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("valid time")
}

fn setup_test_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster()?;
    let database = provision_template_database(cluster)?;
    let config = PoolConfig::new(database.url())
        .with_max_size(2)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        records: DieselPaymentRecordRepository::new(pool.clone()),
        users: DieselUserRepository::new(pool.clone()),
        courses: DieselCourseRepository::new(pool),
        runtime,
        _database: database,
    })
}

#[fixture]
fn diesel_world() -> Option<TestContext> {
    match setup_test_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

/// Insert a payer and a KES course, returning a pending M-PESA record for them.
async fn pending_record(ctx: &TestContext) -> NewPaymentRecord {
    let payer = UserId::random();
    let user = User::new(
        payer,
        Email::new(format!("{payer}@example.com")).expect("valid email"),
        DisplayName::new("Mpesa Payer").expect("valid display name"),
        Role::Student,
        at(),
    );
    ctx.users
        .insert(&user, "$argon2id$placeholder")
        .await
        .expect("insert user");

    let mut course = Course::draft(payer, "Bookkeeping Basics".to_owned(), at());
    course.price = Some(dec!(45690));
    course.currency = Currency::kes();
    ctx.courses.save_course(&course).await.expect("save course");

    NewPaymentRecord {
        user_id: payer,
        course_id: course.id,
        provider: PaymentProvider::Mpesa,
        reference: CHECKOUT_ID.to_owned(),
        amount: dec!(45690),
        currency: Currency::kes(),
        status: PaymentStatus::Pending,
        metadata: json!({ "phoneNumber": "254712345678" }),
    }
}

fn with_status(record: &NewPaymentRecord, status: PaymentStatus) -> NewPaymentRecord {
    NewPaymentRecord {
        status,
        metadata: json!({ "resultCode": status.as_str() }),
        ..record.clone()
    }
}

#[rstest]
fn pending_insert_is_found_by_reference(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: pending_insert_is_found_by_reference skipped");
        return;
    };

    ctx.runtime.block_on(async {
        let record = pending_record(&ctx).await;
        ctx.records
            .insert_pending(&record, at())
            .await
            .expect("insert pending");

        let stored = ctx
            .records
            .find_by_reference(PaymentProvider::Mpesa, CHECKOUT_ID)
            .await
            .expect("lookup")
            .expect("record exists");
        assert_eq!(stored.status, PaymentStatus::Pending);
        assert_eq!(stored.amount, dec!(45690));
        assert_eq!(stored.user_id, record.user_id);
    });
}

#[rstest]
fn second_completion_is_reported_as_already_completed(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: second_completion_is_reported_as_already_completed skipped");
        return;
    };

    ctx.runtime.block_on(async {
        let record = pending_record(&ctx).await;
        ctx.records
            .insert_pending(&record, at())
            .await
            .expect("insert pending");
        let completed = with_status(&record, PaymentStatus::Completed);

        let first = ctx
            .records
            .record_completed(&completed, at() + Duration::minutes(1))
            .await
            .expect("first completion");
        let second = ctx
            .records
            .record_completed(&completed, at() + Duration::minutes(2))
            .await
            .expect("second completion");

        assert_eq!(first, CompletionWrite::Recorded);
        assert_eq!(second, CompletionWrite::AlreadyCompleted);
        let stored = ctx
            .records
            .find_by_reference(PaymentProvider::Mpesa, CHECKOUT_ID)
            .await
            .expect("lookup")
            .expect("record exists");
        assert_eq!(stored.updated_at, at() + Duration::minutes(1));
    });
}

#[rstest]
#[case::failed(PaymentStatus::Failed)]
#[case::cancelled(PaymentStatus::Cancelled)]
fn completed_record_ignores_later_unsuccessful_write(
    diesel_world: Option<TestContext>,
    #[case] late_status: PaymentStatus,
) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: completed_record_ignores_later_unsuccessful_write skipped");
        return;
    };

    ctx.runtime.block_on(async {
        let record = pending_record(&ctx).await;
        ctx.records
            .insert_pending(&record, at())
            .await
            .expect("insert pending");
        ctx.records
            .record_completed(&with_status(&record, PaymentStatus::Completed), at())
            .await
            .expect("completion");
        ctx.records
            .record_unsuccessful(&with_status(&record, late_status), at())
            .await
            .expect("late write is accepted");

        let stored = ctx
            .records
            .find_by_reference(PaymentProvider::Mpesa, CHECKOUT_ID)
            .await
            .expect("lookup")
            .expect("record exists");
        assert_eq!(stored.status, PaymentStatus::Completed);
        assert_eq!(stored.metadata["resultCode"], "completed");
    });
}

#[rstest]
fn pending_record_moves_to_failed(diesel_world: Option<TestContext>) {
    let Some(ctx) = diesel_world else {
        eprintln!("SKIP-TEST-CLUSTER: pending_record_moves_to_failed skipped");
        return;
    };

    ctx.runtime.block_on(async {
        let record = pending_record(&ctx).await;
        ctx.records
            .insert_pending(&record, at())
            .await
            .expect("insert pending");
        ctx.records
            .record_unsuccessful(&with_status(&record, PaymentStatus::Failed), at())
            .await
            .expect("failure write");

        let stored = ctx
            .records
            .find_by_reference(PaymentProvider::Mpesa, CHECKOUT_ID)
            .await
            .expect("lookup")
            .expect("record exists");
        assert_eq!(stored.status, PaymentStatus::Failed);
        assert_eq!(stored.metadata["phoneNumber"], "254712345678");
        assert_eq!(stored.metadata["resultCode"], "failed");
    });
}
