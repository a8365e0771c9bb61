//! Tests for enrollment services.

use std::sync::Arc;

use mockall::predicate::eq;
use rust_decimal_macros::dec;

use super::*;
use crate::domain::ports::{
    MailerError, MockCourseRepository, MockMailer, MockProgressRepository, MockPurchaseLedger,
    MockUserRepository, PurchaseLedgerError,
};
use crate::domain::service_fixtures::{
    BASE_URL, fixture_clock, fixture_timestamp, published_chapter, published_course,
    user_with_role,
};
use crate::domain::{Chapter, ErrorCode, Purchase, Role, UserProgress};

type TestEnroller = Enroller<MockCourseRepository, MockUserRepository, MockPurchaseLedger>;

fn enroller(
    courses: MockCourseRepository,
    users: MockUserRepository,
    ledger: MockPurchaseLedger,
    mailer: MockMailer,
) -> TestEnroller {
    Enroller::new(
        Arc::new(courses),
        Arc::new(users),
        Arc::new(ledger),
        Arc::new(mailer),
        fixture_clock(),
        BASE_URL,
    )
}

fn purchase(user_id: UserId, course_id: CourseId) -> Purchase {
    Purchase {
        user_id,
        course_id,
        created_at: fixture_timestamp(),
    }
}

#[tokio::test]
async fn enroll_seeds_published_chapters_and_sends_email() {
    let student = user_with_role(Role::Student);
    let student_id = *student.id();
    let course = published_course(UserId::random(), None);
    let first = published_chapter(course.id, 0);
    let second = published_chapter(course.id, 1);
    let mut draft = published_chapter(course.id, 2);
    draft.is_published = false;
    let expected_ids = vec![first.id, second.id];

    let mut courses = MockCourseRepository::new();
    let chapters = vec![second, draft, first];
    courses
        .expect_list_chapters()
        .times(1)
        .return_once(move |_| Ok(chapters));
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .times(1)
        .return_once(|_, _| Ok(None));
    ledger
        .expect_enroll()
        .withf(move |user, _, ids, at| {
            *user == student_id && ids == expected_ids.as_slice() && *at == fixture_timestamp()
        })
        .times(1)
        .return_once(|_, _, _, _| Ok(EnrollmentOutcome::Enrolled));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(student)));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .withf(|message| message.to == "student@example.com")
        .times(1)
        .return_once(|_| Ok(()));

    let outcome = enroller(courses, users, ledger, mailer)
        .enroll(&student_id, &course)
        .await
        .expect("enroll succeeds");
    assert_eq!(outcome, EnrollmentOutcome::Enrolled);
}

#[tokio::test]
async fn enroll_short_circuits_for_existing_purchase() {
    let user_id = UserId::random();
    let course = published_course(UserId::random(), None);
    let course_id = course.id;

    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .times(1)
        .return_once(move |user, _| Ok(Some(purchase(*user, course_id))));
    ledger.expect_enroll().never();
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();

    let outcome = enroller(
        MockCourseRepository::new(),
        MockUserRepository::new(),
        ledger,
        mailer,
    )
    .enroll(&user_id, &course)
    .await
    .expect("enroll succeeds");
    assert_eq!(outcome, EnrollmentOutcome::AlreadyEnrolled);
}

#[tokio::test]
async fn lost_insert_race_does_not_send_email() {
    let course = published_course(UserId::random(), None);
    let mut courses = MockCourseRepository::new();
    courses
        .expect_list_chapters()
        .return_once(|_| Ok(Vec::new()));
    let mut ledger = MockPurchaseLedger::new();
    ledger.expect_find_purchase().return_once(|_, _| Ok(None));
    ledger
        .expect_enroll()
        .return_once(|_, _, _, _| Ok(EnrollmentOutcome::AlreadyEnrolled));
    let mut mailer = MockMailer::new();
    mailer.expect_send().never();

    let outcome = enroller(courses, MockUserRepository::new(), ledger, mailer)
        .enroll(&UserId::random(), &course)
        .await
        .expect("enroll succeeds");
    assert_eq!(outcome, EnrollmentOutcome::AlreadyEnrolled);
}

#[tokio::test]
async fn email_failure_does_not_fail_enrollment() {
    let student = user_with_role(Role::Student);
    let student_id = *student.id();
    let course = published_course(UserId::random(), None);
    let mut courses = MockCourseRepository::new();
    courses
        .expect_list_chapters()
        .return_once(|_| Ok(Vec::new()));
    let mut ledger = MockPurchaseLedger::new();
    ledger.expect_find_purchase().return_once(|_, _| Ok(None));
    ledger
        .expect_enroll()
        .return_once(|_, _, _, _| Ok(EnrollmentOutcome::Enrolled));
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(student)));
    let mut mailer = MockMailer::new();
    mailer
        .expect_send()
        .times(1)
        .return_once(|_| Err(MailerError::transport("connection reset")));

    let outcome = enroller(courses, users, ledger, mailer)
        .enroll(&student_id, &course)
        .await
        .expect("enroll succeeds");
    assert_eq!(outcome, EnrollmentOutcome::Enrolled);
}

#[tokio::test]
async fn ledger_connection_errors_are_unavailable() {
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(|_, _| Err(PurchaseLedgerError::connection("pool exhausted")));

    let err = enroller(
        MockCourseRepository::new(),
        MockUserRepository::new(),
        ledger,
        MockMailer::new(),
    )
    .enroll(&UserId::random(), &published_course(UserId::random(), None))
    .await
    .expect_err("ledger failure propagates");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

fn service(
    courses: MockCourseRepository,
    ledger: MockPurchaseLedger,
    progress: MockProgressRepository,
) -> EnrollmentService<MockCourseRepository, MockUserRepository, MockPurchaseLedger, MockProgressRepository>
{
    let courses = Arc::new(courses);
    let enroller = Enroller::new(
        Arc::clone(&courses),
        Arc::new(MockUserRepository::new()),
        Arc::new(ledger),
        Arc::new(crate::domain::ports::LogOnlyMailer),
        fixture_clock(),
        BASE_URL,
    );
    EnrollmentService::new(enroller, courses, Arc::new(progress), fixture_clock())
}

#[tokio::test]
async fn enroll_free_rejects_paid_courses() {
    let course = published_course(UserId::random(), Some(dec!(19.99)));
    let course_id = course.id;
    let mut courses = MockCourseRepository::new();
    courses
        .expect_find_course()
        .with(eq(course_id))
        .return_once(move |_| Ok(Some(course)));
    let mut ledger = MockPurchaseLedger::new();
    ledger.expect_enroll().never();

    let err = service(courses, ledger, MockProgressRepository::new())
        .enroll_free(&UserId::random(), &course_id)
        .await
        .expect_err("paid course refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn enroll_free_hides_unpublished_courses() {
    let mut course = published_course(UserId::random(), None);
    course.is_published = false;
    let course_id = course.id;
    let mut courses = MockCourseRepository::new();
    courses
        .expect_find_course()
        .return_once(move |_| Ok(Some(course)));

    let err = service(courses, MockPurchaseLedger::new(), MockProgressRepository::new())
        .enroll_free(&UserId::random(), &course_id)
        .await
        .expect_err("unpublished course hidden");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

fn progress_row(user_id: UserId, chapter: &Chapter, done: bool) -> UserProgress {
    UserProgress {
        user_id,
        chapter_id: chapter.id,
        is_completed: done,
        updated_at: fixture_timestamp(),
    }
}

#[tokio::test]
async fn progress_update_returns_completion_percentage() {
    let user_id = UserId::random();
    let course = published_course(UserId::random(), Some(dec!(10)));
    let course_id = course.id;
    let chapters: Vec<Chapter> = (0..3).map(|p| published_chapter(course_id, p)).collect();
    let target = chapters[1].id;
    let rows = vec![
        progress_row(user_id, &chapters[0], true),
        progress_row(user_id, &chapters[1], true),
        progress_row(user_id, &chapters[2], false),
    ];

    let mut courses = MockCourseRepository::new();
    courses
        .expect_find_course()
        .return_once(move |_| Ok(Some(course)));
    courses
        .expect_list_chapters()
        .return_once(move |_| Ok(chapters));
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(move |user, course| Ok(Some(purchase(*user, *course))));
    let mut progress = MockProgressRepository::new();
    progress
        .expect_set_completed()
        .withf(move |_, chapter, done, _| *chapter == target && *done)
        .times(1)
        .return_once(|_, _, _, _| Ok(()));
    progress
        .expect_progress_for()
        .times(1)
        .return_once(move |_, _| Ok(rows));

    let percentage = service(courses, ledger, progress)
        .set_chapter_progress(&user_id, &course_id, &target, true)
        .await
        .expect("progress stored");
    assert_eq!(percentage, 67);
}

#[tokio::test]
async fn progress_update_refuses_locked_chapters() {
    let course = published_course(UserId::random(), Some(dec!(10)));
    let course_id = course.id;
    let chapters: Vec<Chapter> = (0..2).map(|p| published_chapter(course_id, p)).collect();
    let locked = chapters[1].id;

    let mut courses = MockCourseRepository::new();
    courses
        .expect_find_course()
        .return_once(move |_| Ok(Some(course)));
    courses
        .expect_list_chapters()
        .return_once(move |_| Ok(chapters));
    let mut ledger = MockPurchaseLedger::new();
    ledger.expect_find_purchase().return_once(|_, _| Ok(None));
    let mut progress = MockProgressRepository::new();
    progress.expect_set_completed().never();

    let err = service(courses, ledger, progress)
        .set_chapter_progress(&UserId::random(), &course_id, &locked, true)
        .await
        .expect_err("locked chapter refused");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
