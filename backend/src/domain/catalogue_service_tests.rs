//! Tests for the catalogue service.

use std::sync::Arc;

use rust_decimal_macros::dec;

use super::*;
use crate::domain::ports::{MockCourseRepository, MockProgressRepository, MockPurchaseLedger};
use crate::domain::service_fixtures::{fixture_timestamp, published_chapter, published_course};
use crate::domain::{
    Attachment, AttachmentId, Course, ErrorCode, Purchase, UserProgress,
};

type Service = CatalogueService<MockCourseRepository, MockPurchaseLedger, MockProgressRepository>;

fn service(
    courses: MockCourseRepository,
    ledger: MockPurchaseLedger,
    progress: MockProgressRepository,
) -> Service {
    CatalogueService::new(Arc::new(courses), Arc::new(ledger), Arc::new(progress))
}

fn purchase(user_id: UserId, course_id: CourseId) -> Purchase {
    Purchase {
        user_id,
        course_id,
        created_at: fixture_timestamp(),
    }
}

fn course_with_chapters(count: i32) -> (Course, Vec<Chapter>) {
    let course = published_course(UserId::random(), Some(dec!(49)));
    let chapters = (0..count)
        .map(|position| published_chapter(course.id, position))
        .collect();
    (course, chapters)
}

fn repo_for(course: &Course, chapters: &[Chapter]) -> MockCourseRepository {
    let mut repo = MockCourseRepository::new();
    let course = course.clone();
    let chapters = chapters.to_vec();
    repo.expect_find_course()
        .returning(move |_| Ok(Some(course.clone())));
    repo.expect_list_chapters()
        .returning(move |_| Ok(chapters.clone()));
    repo
}

#[tokio::test]
async fn anonymous_detail_locks_all_but_first_chapter() {
    let (course, chapters) = course_with_chapters(3);
    let course_id = course.id;
    let mut ledger = MockPurchaseLedger::new();
    ledger.expect_find_purchase().never();

    let detail = service(
        repo_for(&course, &chapters),
        ledger,
        MockProgressRepository::new(),
    )
    .course_detail(None, course_id)
    .await
    .expect("detail loads");

    let access: Vec<bool> = detail.chapters.iter().map(|c| c.accessible).collect();
    assert_eq!(access, vec![true, false, false]);
    assert!(detail.chapters[0].chapter.video_url.is_some());
    assert!(detail.chapters[1].chapter.video_url.is_none());
    assert!(!detail.purchased);
    assert_eq!(detail.progress, None);
    assert_eq!(detail.display_price.as_deref(), Some("$49.00"));
}

#[tokio::test]
async fn free_chapters_open_without_purchase() {
    let (course, mut chapters) = course_with_chapters(3);
    chapters[2].is_free = true;
    let course_id = course.id;
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(|_, _| Ok(None));

    let detail = service(
        repo_for(&course, &chapters),
        ledger,
        MockProgressRepository::new(),
    )
    .course_detail(Some(UserId::random()), course_id)
    .await
    .expect("detail loads");

    let access: Vec<bool> = detail.chapters.iter().map(|c| c.accessible).collect();
    assert_eq!(access, vec![true, false, true]);
}

#[tokio::test]
async fn purchaser_detail_reports_progress() {
    let (course, chapters) = course_with_chapters(2);
    let course_id = course.id;
    let user_id = UserId::random();
    let done = chapters[0].id;
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(|user, course| Ok(Some(purchase(*user, *course))));
    let mut progress = MockProgressRepository::new();
    progress.expect_progress_for().return_once(move |user, _| {
        Ok(vec![UserProgress {
            user_id: *user,
            chapter_id: done,
            is_completed: true,
            updated_at: fixture_timestamp(),
        }])
    });

    let detail = service(repo_for(&course, &chapters), ledger, progress)
        .course_detail(Some(user_id), course_id)
        .await
        .expect("detail loads");
    assert!(detail.purchased);
    assert_eq!(detail.progress, Some(50));
    assert!(detail.chapters.iter().all(|c| c.accessible));
}

#[tokio::test]
async fn unpublished_course_is_not_found() {
    let (mut course, chapters) = course_with_chapters(1);
    course.is_published = false;
    let course_id = course.id;

    let err = service(
        repo_for(&course, &chapters),
        MockPurchaseLedger::new(),
        MockProgressRepository::new(),
    )
    .course_detail(None, course_id)
    .await
    .expect_err("hidden course");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn chapter_detail_hides_attachments_and_video_from_non_purchasers() {
    let (course, chapters) = course_with_chapters(3);
    let course_id = course.id;
    let second = chapters[1].id;
    let third = chapters[2].id;
    let mut repo = repo_for(&course, &chapters);
    repo.expect_list_attachments().never();
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(|_, _| Ok(None));
    let mut progress = MockProgressRepository::new();
    progress
        .expect_progress_for()
        .return_once(|_, _| Ok(Vec::new()));

    let detail = service(repo, ledger, progress)
        .chapter_detail(Some(UserId::random()), course_id, second)
        .await
        .expect("chapter loads");
    assert!(!detail.chapter.accessible);
    assert!(detail.chapter.chapter.video_url.is_none());
    assert!(detail.attachments.is_empty());
    assert_eq!(detail.next_chapter_id, Some(third));
    assert!(!detail.is_completed);
}

#[tokio::test]
async fn chapter_detail_includes_attachments_for_purchasers() {
    let (course, chapters) = course_with_chapters(2);
    let course_id = course.id;
    let last = chapters[1].id;
    let attachment = Attachment {
        id: AttachmentId::random(),
        course_id,
        name: "Slides".to_owned(),
        url: "https://files.example/slides.pdf".to_owned(),
        created_at: fixture_timestamp(),
    };
    let mut repo = repo_for(&course, &chapters);
    repo.expect_list_attachments()
        .return_once(move |_| Ok(vec![attachment]));
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_find_purchase()
        .return_once(|user, course| Ok(Some(purchase(*user, *course))));
    let mut progress = MockProgressRepository::new();
    progress.expect_progress_for().return_once(move |user, _| {
        Ok(vec![UserProgress {
            user_id: *user,
            chapter_id: last,
            is_completed: true,
            updated_at: fixture_timestamp(),
        }])
    });

    let detail = service(repo, ledger, progress)
        .chapter_detail(Some(UserId::random()), course_id, last)
        .await
        .expect("chapter loads");
    assert!(detail.chapter.accessible);
    assert_eq!(detail.attachments.len(), 1);
    assert_eq!(detail.next_chapter_id, None);
    assert!(detail.is_completed);
}

#[tokio::test]
async fn unpublished_chapter_is_not_found() {
    let (course, mut chapters) = course_with_chapters(2);
    chapters[1].is_published = false;
    let course_id = course.id;
    let hidden = chapters[1].id;

    let err = service(
        repo_for(&course, &chapters),
        MockPurchaseLedger::new(),
        MockProgressRepository::new(),
    )
    .chapter_detail(None, course_id, hidden)
    .await
    .expect_err("hidden chapter");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[tokio::test]
async fn listing_counts_published_chapters_and_applies_filter() {
    let (course, mut chapters) = course_with_chapters(3);
    chapters[2].is_published = false;
    let mut other = published_course(UserId::random(), None);
    other.title = "Cooking".to_owned();
    let listed = vec![course.clone(), other];
    let mut repo = MockCourseRepository::new();
    repo.expect_list_published()
        .return_once(move |_| Ok(listed));
    repo.expect_list_chapters()
        .returning(move |_| Ok(chapters.clone()));

    let listings = service(repo, MockPurchaseLedger::new(), MockProgressRepository::new())
        .list_courses(
            None,
            CourseFilter {
                title: Some("rust".to_owned()),
                category_id: None,
            },
        )
        .await
        .expect("listing loads");
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].course.id, course.id);
    assert_eq!(listings[0].published_chapters, 2);
    assert_eq!(listings[0].progress, None);
}

#[tokio::test]
async fn cart_summary_drops_owned_and_unpublished_courses() {
    let viewer = UserId::random();
    let kept = published_course(UserId::random(), Some(dec!(29.99)));
    let owned = published_course(UserId::random(), Some(dec!(10)));
    let mut draft = published_course(UserId::random(), Some(dec!(5)));
    draft.is_published = false;
    let owned_id = owned.id;
    let kept_id = kept.id;

    let mut cart = Cart::default();
    cart.add(kept.id);
    cart.add(owned.id);
    cart.add(draft.id);

    let mut repo = MockCourseRepository::new();
    repo.expect_find_courses()
        .return_once(move |_| Ok(vec![draft, owned, kept]));
    let mut ledger = MockPurchaseLedger::new();
    ledger
        .expect_purchases_for_user()
        .return_once(move |user| Ok(vec![purchase(*user, owned_id)]));

    let summary = service(repo, ledger, MockProgressRepository::new())
        .cart_summary(Some(viewer), cart)
        .await
        .expect("summary builds");
    assert_eq!(summary.lines.len(), 1);
    assert_eq!(summary.lines[0].course.id, kept_id);
    assert_eq!(summary.totals[0].display, "$29.99");
}

#[tokio::test]
async fn empty_cart_skips_the_store() {
    let mut repo = MockCourseRepository::new();
    repo.expect_find_courses().never();

    let summary = service(repo, MockPurchaseLedger::new(), MockProgressRepository::new())
        .cart_summary(None, Cart::default())
        .await
        .expect("summary builds");
    assert!(summary.lines.is_empty());
    assert!(summary.totals.is_empty());
}
