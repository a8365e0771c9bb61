//! Driving port for student and teacher dashboards.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::{Course, Currency, Error, UserId};

/// Owned course with the learner's completion percentage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrolledCourse {
    pub course: Course,
    pub published_chapters: usize,
    pub progress: u8,
}

/// Owned courses split by completion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentDashboard {
    pub completed: Vec<EnrolledCourse>,
    pub in_progress: Vec<EnrolledCourse>,
}

/// Sales of one course.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSales {
    pub course: Course,
    pub sales: usize,
    pub revenue: Decimal,
}

/// Revenue in one currency.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevenueTotal {
    pub currency: Currency,
    pub amount: Decimal,
    pub display: String,
}

/// Teacher revenue across owned courses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeacherAnalytics {
    pub courses: Vec<CourseSales>,
    pub total_sales: usize,
    pub revenue: Vec<RevenueTotal>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DashboardQuery: Send + Sync {
    /// Courses the user owns, split into completed and in progress.
    async fn student_dashboard(&self, user_id: &UserId) -> Result<StudentDashboard, Error>;

    /// Sales and revenue for courses the teacher owns.
    async fn teacher_analytics(&self, user_id: &UserId) -> Result<TeacherAnalytics, Error>;
}
