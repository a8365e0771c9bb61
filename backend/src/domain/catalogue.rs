//! Course catalogue entities: categories, courses, chapters and attachments.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::ids::{AttachmentId, CategoryId, ChapterId, CourseId, UserId};
use super::money::{Currency, format_price};

/// Course grouping shown as a browse filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// A course owned by a teacher.
///
/// ## Invariants
/// - A published course has a title, description, price, category and at
///   least one published chapter (enforced when publishing).
/// - `price` is `None` or zero for free courses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub id: CourseId,
    pub owner_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Currency,
    pub is_published: bool,
    pub category_id: Option<CategoryId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Start a draft course with only a title.
    #[must_use]
    pub fn draft(owner_id: UserId, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id: CourseId::random(),
            owner_id,
            title,
            description: None,
            image_url: None,
            price: None,
            currency: Currency::usd(),
            is_published: false,
            category_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Courses without a price, or priced at zero, can be enrolled directly.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.price.is_none_or(|price| price.is_zero())
    }

    /// Formatted price, or `None` for free courses.
    #[must_use]
    pub fn display_price(&self) -> Option<String> {
        self.price
            .filter(|price| !price.is_zero())
            .map(|price| format_price(price, &self.currency))
    }

    /// Names of required fields still missing before the course may publish.
    #[must_use]
    pub fn publish_blockers(&self, published_chapters: usize) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
            missing.push("description");
        }
        if self.price.is_none() {
            missing.push("price");
        }
        if self.category_id.is_none() {
            missing.push("categoryId");
        }
        if published_chapters == 0 {
            missing.push("publishedChapter");
        }
        missing
    }
}

/// Editable course fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoursePatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub category_id: Option<CategoryId>,
}

impl CoursePatch {
    /// Apply the patch to `course`, stamping `updated_at`.
    pub fn apply(self, course: &mut Course, now: DateTime<Utc>) {
        let Self {
            title,
            description,
            image_url,
            price,
            currency,
            category_id,
        } = self;
        if let Some(title) = title {
            course.title = title;
        }
        if let Some(description) = description {
            course.description = Some(description);
        }
        if let Some(image_url) = image_url {
            course.image_url = Some(image_url);
        }
        if let Some(price) = price {
            course.price = Some(price);
        }
        if let Some(currency) = currency {
            course.currency = currency;
        }
        if let Some(category_id) = category_id {
            course.category_id = Some(category_id);
        }
        course.updated_at = now;
    }
}

/// A chapter within a course, ordered by `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chapter {
    pub id: ChapterId,
    pub course_id: CourseId,
    pub title: String,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub position: i32,
    pub is_published: bool,
    pub is_free: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Chapter {
    /// Start an unpublished chapter at `position`.
    #[must_use]
    pub fn draft(course_id: CourseId, title: String, position: i32, now: DateTime<Utc>) -> Self {
        Self {
            id: ChapterId::random(),
            course_id,
            title,
            description: None,
            video_url: None,
            position,
            is_published: false,
            is_free: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Names of required fields still missing before the chapter may publish.
    #[must_use]
    pub fn publish_blockers(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.description.as_deref().is_none_or(|d| d.trim().is_empty()) {
            missing.push("description");
        }
        if self.video_url.as_deref().is_none_or(|v| v.trim().is_empty()) {
            missing.push("videoUrl");
        }
        missing
    }
}

/// Editable chapter fields; `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChapterPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub video_url: Option<String>,
    pub is_free: Option<bool>,
}

impl ChapterPatch {
    /// Apply the patch to `chapter`, stamping `updated_at`.
    pub fn apply(self, chapter: &mut Chapter, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            chapter.title = title;
        }
        if let Some(description) = self.description {
            chapter.description = Some(description);
        }
        if let Some(video_url) = self.video_url {
            chapter.video_url = Some(video_url);
        }
        if let Some(is_free) = self.is_free {
            chapter.is_free = is_free;
        }
        chapter.updated_at = now;
    }
}

/// Downloadable resource attached to a course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub id: AttachmentId,
    pub course_id: CourseId,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

/// Browse filter for published courses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseFilter {
    /// Case-insensitive substring match on the title.
    pub title: Option<String>,
    pub category_id: Option<CategoryId>,
}

impl CourseFilter {
    /// Whether `course` satisfies the filter.
    #[must_use]
    pub fn matches(&self, course: &Course) -> bool {
        let title_ok = self.title.as_deref().is_none_or(|needle| {
            course
                .title
                .to_lowercase()
                .contains(&needle.trim().to_lowercase())
        });
        let category_ok = self
            .category_id
            .is_none_or(|category| course.category_id == Some(category));
        title_ok && category_ok
    }
}
