//! Driving port for catalogue reads: listings, course and chapter pages and
//! the cart summary.

use async_trait::async_trait;

use crate::domain::{
    Attachment, Cart, CartSummary, Category, ChapterId, ChapterView, Course,
    CourseFilter, CourseId, Error, UserId,
};

/// Course card shown in browse listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseListing {
    pub course: Course,
    pub published_chapters: usize,
    pub display_price: Option<String>,
    /// Completion percentage when the viewer owns the course.
    pub progress: Option<u8>,
}

/// Course page with its published chapter outline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseDetail {
    pub course: Course,
    /// Published chapters ordered by position, video URLs withheld unless
    /// accessible.
    pub chapters: Vec<ChapterView>,
    pub display_price: Option<String>,
    pub purchased: bool,
    pub progress: Option<u8>,
}

/// Chapter page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterDetail {
    pub course: Course,
    pub chapter: ChapterView,
    pub next_chapter_id: Option<ChapterId>,
    /// Populated for purchasers only.
    pub attachments: Vec<Attachment>,
    pub purchased: bool,
    pub is_completed: bool,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    /// All categories.
    async fn categories(&self) -> Result<Vec<Category>, Error>;

    /// Published courses matching `filter`.
    async fn list_courses(
        &self,
        viewer: Option<UserId>,
        filter: CourseFilter,
    ) -> Result<Vec<CourseListing>, Error>;

    /// Published course page; unpublished courses are not found.
    async fn course_detail(
        &self,
        viewer: Option<UserId>,
        course_id: CourseId,
    ) -> Result<CourseDetail, Error>;

    /// Published chapter page with access filtering applied.
    async fn chapter_detail(
        &self,
        viewer: Option<UserId>,
        course_id: CourseId,
        chapter_id: ChapterId,
    ) -> Result<ChapterDetail, Error>;

    /// Priced cart, dropping unpublished and already owned courses.
    async fn cart_summary(&self, viewer: Option<UserId>, cart: Cart)
    -> Result<CartSummary, Error>;
}

