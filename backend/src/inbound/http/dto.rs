//! Response bodies shared by the HTTP handlers.
//!
//! Domain entities stay free of wire concerns; these types flatten them into
//! camelCase JSON and carry the OpenAPI schemas.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::ports::{
    ChapterDetail, CourseDetail, CourseListing, CourseSales, EnrolledCourse, RevenueTotal,
    StudentDashboard, TeacherAnalytics,
};
use crate::domain::{
    Attachment, CartLine, CartSummary, CartTotal, Category, Chapter, ChapterView, Course, Role,
    User,
};

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id().to_string(),
            email: user.email().as_ref().to_owned(),
            display_name: user.display_name().as_ref().to_owned(),
            role: user.role(),
            image_url: user.image_url().map(str::to_owned),
            created_at: user.created_at(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryResponse {
    pub id: String,
    pub name: String,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            id: category.id.to_string(),
            name: category.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseResponse {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[schema(value_type = Option<String>, example = "29.99")]
    pub price: Option<Decimal>,
    #[schema(example = "USD")]
    pub currency: String,
    /// Price formatted for display, absent for free courses.
    pub display_price: Option<String>,
    pub is_published: bool,
    pub category_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Course> for CourseResponse {
    fn from(course: Course) -> Self {
        let display_price = course.display_price();
        Self {
            id: course.id.to_string(),
            owner_id: course.owner_id.to_string(),
            title: course.title,
            description: course.description,
            image_url: course.image_url,
            price: course.price,
            currency: course.currency.as_str().to_owned(),
            display_price,
            is_published: course.is_published,
            category_id: course.category_id.map(|id| id.to_string()),
            created_at: course.created_at,
            updated_at: course.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterResponse {
    pub id: String,
    pub course_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Omitted when the viewer may not watch the chapter.
    pub video_url: Option<String>,
    pub position: i32,
    pub is_published: bool,
    pub is_free: bool,
    pub accessible: bool,
}

impl ChapterResponse {
    fn build(chapter: Chapter, accessible: bool) -> Self {
        Self {
            id: chapter.id.to_string(),
            course_id: chapter.course_id.to_string(),
            title: chapter.title,
            description: chapter.description,
            video_url: chapter.video_url,
            position: chapter.position,
            is_published: chapter.is_published,
            is_free: chapter.is_free,
            accessible,
        }
    }
}

/// Authors always see their own chapters in full.
impl From<Chapter> for ChapterResponse {
    fn from(chapter: Chapter) -> Self {
        Self::build(chapter, true)
    }
}

impl From<ChapterView> for ChapterResponse {
    fn from(view: ChapterView) -> Self {
        Self::build(view.chapter, view.accessible)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttachmentResponse {
    pub id: String,
    pub course_id: String,
    pub name: String,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl From<Attachment> for AttachmentResponse {
    fn from(attachment: Attachment) -> Self {
        Self {
            id: attachment.id.to_string(),
            course_id: attachment.course_id.to_string(),
            name: attachment.name,
            url: attachment.url,
            created_at: attachment.created_at,
        }
    }
}

/// Catalogue card for a published course.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseListingResponse {
    pub course: CourseResponse,
    pub chapter_count: usize,
    /// Completion percentage, present when the viewer is enrolled.
    pub progress: Option<u8>,
}

impl From<CourseListing> for CourseListingResponse {
    fn from(listing: CourseListing) -> Self {
        Self {
            course: listing.course.into(),
            chapter_count: listing.published_chapters,
            progress: listing.progress,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailResponse {
    pub course: CourseResponse,
    pub chapters: Vec<ChapterResponse>,
    pub purchased: bool,
    pub progress: Option<u8>,
}

impl From<CourseDetail> for CourseDetailResponse {
    fn from(detail: CourseDetail) -> Self {
        Self {
            course: detail.course.into(),
            chapters: detail.chapters.into_iter().map(Into::into).collect(),
            purchased: detail.purchased,
            progress: detail.progress,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChapterDetailResponse {
    pub course: CourseResponse,
    pub chapter: ChapterResponse,
    pub next_chapter_id: Option<String>,
    pub attachments: Vec<AttachmentResponse>,
    pub purchased: bool,
    pub is_completed: bool,
}

impl From<ChapterDetail> for ChapterDetailResponse {
    fn from(detail: ChapterDetail) -> Self {
        Self {
            course: detail.course.into(),
            chapter: detail.chapter.into(),
            next_chapter_id: detail.next_chapter_id.map(|id| id.to_string()),
            attachments: detail.attachments.into_iter().map(Into::into).collect(),
            purchased: detail.purchased,
            is_completed: detail.is_completed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemResponse {
    pub course: CourseResponse,
}

impl From<CartLine> for CartItemResponse {
    fn from(line: CartLine) -> Self {
        Self {
            course: line.course.into(),
        }
    }
}

/// Amount summed over one currency, with its display form.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoneyTotalResponse {
    pub currency: String,
    #[schema(value_type = String, example = "45690")]
    pub amount: Decimal,
    #[schema(example = "KES 45,690")]
    pub display: String,
}

impl From<CartTotal> for MoneyTotalResponse {
    fn from(total: CartTotal) -> Self {
        Self {
            currency: total.currency.as_str().to_owned(),
            amount: total.amount,
            display: total.display,
        }
    }
}

impl From<RevenueTotal> for MoneyTotalResponse {
    fn from(total: RevenueTotal) -> Self {
        Self {
            currency: total.currency.as_str().to_owned(),
            amount: total.amount,
            display: total.display,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub totals: Vec<MoneyTotalResponse>,
}

impl From<CartSummary> for CartResponse {
    fn from(summary: CartSummary) -> Self {
        Self {
            items: summary.lines.into_iter().map(Into::into).collect(),
            totals: summary.totals.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCourseResponse {
    pub course: CourseResponse,
    pub chapter_count: usize,
    pub progress: u8,
}

impl From<EnrolledCourse> for EnrolledCourseResponse {
    fn from(enrolled: EnrolledCourse) -> Self {
        Self {
            course: enrolled.course.into(),
            chapter_count: enrolled.published_chapters,
            progress: enrolled.progress,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDashboardResponse {
    pub completed_courses: Vec<EnrolledCourseResponse>,
    pub courses_in_progress: Vec<EnrolledCourseResponse>,
}

impl From<StudentDashboard> for StudentDashboardResponse {
    fn from(dashboard: StudentDashboard) -> Self {
        Self {
            completed_courses: dashboard.completed.into_iter().map(Into::into).collect(),
            courses_in_progress: dashboard.in_progress.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseSalesResponse {
    pub course_id: String,
    pub title: String,
    pub sales: usize,
    pub currency: String,
    #[schema(value_type = String, example = "59.98")]
    pub revenue: Decimal,
}

impl From<CourseSales> for CourseSalesResponse {
    fn from(sales: CourseSales) -> Self {
        Self {
            course_id: sales.course.id.to_string(),
            title: sales.course.title,
            sales: sales.sales,
            currency: sales.course.currency.as_str().to_owned(),
            revenue: sales.revenue,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeacherAnalyticsResponse {
    pub courses: Vec<CourseSalesResponse>,
    pub total_sales: usize,
    pub total_revenue: Vec<MoneyTotalResponse>,
}

impl From<TeacherAnalytics> for TeacherAnalyticsResponse {
    fn from(analytics: TeacherAnalytics) -> Self {
        Self {
            courses: analytics.courses.into_iter().map(Into::into).collect(),
            total_sales: analytics.total_sales,
            total_revenue: analytics.revenue.into_iter().map(Into::into).collect(),
        }
    }
}
