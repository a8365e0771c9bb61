//! Student and teacher dashboard projections.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::ports::{
    CourseRepository, CourseSales, DashboardQuery, EnrolledCourse, ProgressRepository,
    PurchaseLedger, RevenueTotal, StudentDashboard, TeacherAnalytics, UserRepository,
};
use crate::domain::service_support::{
    find_user, map_course_error, map_ledger_error, map_progress_error,
};
use crate::domain::{
    ChapterId, CourseId, Currency, Error, UserId, format_price, progress_percentage,
    published_in_order,
};

/// Dashboard service implementing [`DashboardQuery`].
#[derive(Clone)]
pub struct DashboardService<U, C, L, P> {
    users: Arc<U>,
    courses: Arc<C>,
    ledger: Arc<L>,
    progress: Arc<P>,
}

impl<U, C, L, P> DashboardService<U, C, L, P> {
    pub fn new(users: Arc<U>, courses: Arc<C>, ledger: Arc<L>, progress: Arc<P>) -> Self {
        Self {
            users,
            courses,
            ledger,
            progress,
        }
    }
}

#[async_trait]
impl<U, C, L, P> DashboardQuery for DashboardService<U, C, L, P>
where
    U: UserRepository,
    C: CourseRepository,
    L: PurchaseLedger,
    P: ProgressRepository,
{
    async fn student_dashboard(&self, user_id: &UserId) -> Result<StudentDashboard, Error> {
        let purchases = self
            .ledger
            .purchases_for_user(user_id)
            .await
            .map_err(map_ledger_error)?;
        if purchases.is_empty() {
            return Ok(StudentDashboard::default());
        }
        let order: Vec<CourseId> = purchases.iter().map(|p| p.course_id).collect();
        let mut courses = self
            .courses
            .find_courses(&order)
            .await
            .map_err(map_course_error)?;
        courses.sort_by_key(|course| order.iter().position(|id| *id == course.id));

        let mut dashboard = StudentDashboard::default();
        for course in courses {
            let published = published_in_order(
                self.courses
                    .list_chapters(&course.id)
                    .await
                    .map_err(map_course_error)?,
            );
            let ids: Vec<ChapterId> = published.iter().map(|chapter| chapter.id).collect();
            let done: HashSet<ChapterId> = self
                .progress
                .progress_for(user_id, &ids)
                .await
                .map_err(map_progress_error)?
                .into_iter()
                .filter(|row| row.is_completed)
                .map(|row| row.chapter_id)
                .collect();
            let progress = progress_percentage(done.len(), ids.len());
            let entry = EnrolledCourse {
                course,
                published_chapters: ids.len(),
                progress,
            };
            if progress == 100 {
                dashboard.completed.push(entry);
            } else {
                dashboard.in_progress.push(entry);
            }
        }
        Ok(dashboard)
    }

    async fn teacher_analytics(&self, user_id: &UserId) -> Result<TeacherAnalytics, Error> {
        let user = find_user(self.users.as_ref(), user_id).await?;
        if !user.role().can_author() {
            return Err(Error::forbidden("teacher role required"));
        }
        let courses = self
            .courses
            .list_by_owner(user_id)
            .await
            .map_err(map_course_error)?;
        if courses.is_empty() {
            return Ok(TeacherAnalytics::default());
        }
        let ids: Vec<CourseId> = courses.iter().map(|course| course.id).collect();
        let purchases = self
            .ledger
            .purchases_for_courses(&ids)
            .await
            .map_err(map_ledger_error)?;
        let mut counts: HashMap<CourseId, usize> = HashMap::new();
        for purchase in &purchases {
            *counts.entry(purchase.course_id).or_default() += 1;
        }

        let mut totals: BTreeMap<Currency, Decimal> = BTreeMap::new();
        let mut sales = Vec::with_capacity(courses.len());
        for course in courses {
            let count = counts.get(&course.id).copied().unwrap_or(0);
            let revenue = course.price.unwrap_or_default() * Decimal::from(count);
            *totals.entry(course.currency.clone()).or_default() += revenue;
            sales.push(CourseSales {
                course,
                sales: count,
                revenue,
            });
        }
        sales.sort_by(|a, b| b.sales.cmp(&a.sales));

        Ok(TeacherAnalytics {
            total_sales: purchases.len(),
            revenue: totals
                .into_iter()
                .map(|(currency, amount)| RevenueTotal {
                    display: format_price(amount, &currency),
                    currency,
                    amount,
                })
                .collect(),
            courses: sales,
        })
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockCourseRepository, MockProgressRepository, MockPurchaseLedger, MockUserRepository,
    };
    use crate::domain::service_fixtures::{
        fixture_timestamp, kes_course, published_chapter, published_course, user_with_role,
    };
    use crate::domain::{ErrorCode, Purchase, Role, UserProgress};
    use rust_decimal_macros::dec;

    fn purchase(user_id: UserId, course_id: CourseId) -> Purchase {
        Purchase {
            user_id,
            course_id,
            created_at: fixture_timestamp(),
        }
    }

    #[tokio::test]
    async fn student_dashboard_splits_by_completion() {
        let user_id = UserId::random();
        let done_course = published_course(UserId::random(), Some(dec!(10)));
        let open_course = published_course(UserId::random(), Some(dec!(20)));
        let done_chapter = published_chapter(done_course.id, 0);
        let open_chapter = published_chapter(open_course.id, 0);
        let (done_id, open_id) = (done_course.id, open_course.id);
        let done_chapter_id = done_chapter.id;

        let mut ledger = MockPurchaseLedger::new();
        ledger.expect_purchases_for_user().return_once(move |user| {
            Ok(vec![purchase(*user, done_id), purchase(*user, open_id)])
        });
        let mut courses = MockCourseRepository::new();
        let listed = vec![open_course, done_course];
        courses
            .expect_find_courses()
            .return_once(move |_| Ok(listed));
        courses.expect_list_chapters().returning(move |course| {
            if *course == done_id {
                Ok(vec![done_chapter.clone()])
            } else {
                Ok(vec![open_chapter.clone()])
            }
        });
        let mut progress = MockProgressRepository::new();
        progress.expect_progress_for().returning(move |user, ids| {
            Ok(ids
                .iter()
                .filter(|id| **id == done_chapter_id)
                .map(|id| UserProgress {
                    user_id: *user,
                    chapter_id: *id,
                    is_completed: true,
                    updated_at: fixture_timestamp(),
                })
                .collect())
        });

        let service = DashboardService::new(
            Arc::new(MockUserRepository::new()),
            Arc::new(courses),
            Arc::new(ledger),
            Arc::new(progress),
        );
        let dashboard = service
            .student_dashboard(&user_id)
            .await
            .expect("dashboard loads");
        assert_eq!(dashboard.completed.len(), 1);
        assert_eq!(dashboard.completed[0].course.id, done_id);
        assert_eq!(dashboard.in_progress.len(), 1);
        assert_eq!(dashboard.in_progress[0].progress, 0);
    }

    #[tokio::test]
    async fn teacher_analytics_totals_revenue_per_currency() {
        let teacher = user_with_role(Role::Teacher);
        let teacher_id = *teacher.id();
        let usd = published_course(teacher_id, Some(dec!(29.99)));
        let kes = kes_course(teacher_id, dec!(45690));
        let (usd_id, kes_id) = (usd.id, kes.id);

        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(teacher)));
        let mut courses = MockCourseRepository::new();
        courses
            .expect_list_by_owner()
            .return_once(move |_| Ok(vec![usd, kes]));
        let mut ledger = MockPurchaseLedger::new();
        ledger.expect_purchases_for_courses().return_once(move |_| {
            Ok(vec![
                purchase(UserId::random(), usd_id),
                purchase(UserId::random(), usd_id),
                purchase(UserId::random(), kes_id),
            ])
        });

        let analytics = DashboardService::new(
            Arc::new(users),
            Arc::new(courses),
            Arc::new(ledger),
            Arc::new(MockProgressRepository::new()),
        )
        .teacher_analytics(&teacher_id)
        .await
        .expect("analytics load");
        assert_eq!(analytics.total_sales, 3);
        assert_eq!(analytics.courses[0].course.id, usd_id);
        assert_eq!(analytics.courses[0].revenue, dec!(59.98));
        let displays: Vec<&str> = analytics.revenue.iter().map(|r| r.display.as_str()).collect();
        assert_eq!(displays, vec!["KES 45,690", "$59.98"]);
    }

    #[tokio::test]
    async fn students_have_no_analytics() {
        let student = user_with_role(Role::Student);
        let student_id = *student.id();
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(student)));

        let err = DashboardService::new(
            Arc::new(users),
            Arc::new(MockCourseRepository::new()),
            Arc::new(MockPurchaseLedger::new()),
            Arc::new(MockProgressRepository::new()),
        )
        .teacher_analytics(&student_id)
        .await
        .expect_err("student refused");
        assert_eq!(err.code(), ErrorCode::Forbidden);
    }
}
