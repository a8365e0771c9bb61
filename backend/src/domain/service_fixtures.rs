//! Shared builders for domain service tests.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use rust_decimal::Decimal;

use crate::domain::{
    CategoryId, Chapter, Course, CourseId, Currency, DisplayName, Email, Role, User, UserId,
};

pub(crate) const BASE_URL: &str = "https://learn.example";

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

pub(crate) fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0)
        .single()
        .expect("fixture timestamp is valid")
}

pub(crate) fn fixture_clock() -> Arc<dyn Clock> {
    Arc::new(FixtureClock {
        utc_now: fixture_timestamp(),
    })
}

pub(crate) fn user_with_role(role: Role) -> User {
    let id = UserId::random();
    User::new(
        id,
        Email::new(format!("{}@example.com", role.as_str())).expect("fixture email"),
        DisplayName::new("Ada Lovelace").expect("fixture display name"),
        role,
        fixture_timestamp(),
    )
}

pub(crate) fn published_course(owner: UserId, price: Option<Decimal>) -> Course {
    let mut course = Course::draft(owner, "Rust for Services".to_owned(), fixture_timestamp());
    course.description = Some("Build backends".to_owned());
    course.price = price;
    course.category_id = Some(CategoryId::random());
    course.is_published = true;
    course
}

pub(crate) fn kes_course(owner: UserId, price: Decimal) -> Course {
    let mut course = published_course(owner, Some(price));
    course.currency = Currency::kes();
    course
}

pub(crate) fn published_chapter(course_id: CourseId, position: i32) -> Chapter {
    let mut chapter = Chapter::draft(
        course_id,
        format!("Chapter {position}"),
        position,
        fixture_timestamp(),
    );
    chapter.description = Some("Lesson".to_owned());
    chapter.video_url = Some(format!("https://video.example/{position}"));
    chapter.is_published = true;
    chapter
}
