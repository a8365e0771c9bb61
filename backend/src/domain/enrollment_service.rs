//! Enrollment services.
//!
//! [`Enroller`] is the single place a Purchase is written. Checkout and free
//! enrollment both funnel through it so the duplicate check, progress
//! seeding and confirmation email behave identically for every entry point.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::ports::{
    CourseRepository, EnrollmentCommand, Mailer, ProgressRepository, PurchaseLedger,
    UserRepository,
};
use crate::domain::service_support::{
    course_url, find_published_course, map_course_error, map_ledger_error, map_progress_error,
};
use crate::domain::{
    ChapterId, Course, CourseId, EnrollmentOutcome, Error, UserId, chapter_is_accessible,
    enrollment_confirmation, progress_percentage, published_in_order,
};

/// Writes purchases and sends the confirmation email.
pub struct Enroller<C, U, L> {
    courses: Arc<C>,
    users: Arc<U>,
    ledger: Arc<L>,
    mailer: Arc<dyn Mailer>,
    clock: Arc<dyn Clock>,
    public_base_url: Arc<str>,
}

impl<C, U, L> Clone for Enroller<C, U, L> {
    fn clone(&self) -> Self {
        Self {
            courses: Arc::clone(&self.courses),
            users: Arc::clone(&self.users),
            ledger: Arc::clone(&self.ledger),
            mailer: Arc::clone(&self.mailer),
            clock: Arc::clone(&self.clock),
            public_base_url: Arc::clone(&self.public_base_url),
        }
    }
}

impl<C, U, L> Enroller<C, U, L> {
    pub fn new(
        courses: Arc<C>,
        users: Arc<U>,
        ledger: Arc<L>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
        public_base_url: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            courses,
            users,
            ledger,
            mailer,
            clock,
            public_base_url: public_base_url.into(),
        }
    }

    pub(crate) fn public_base_url(&self) -> &str {
        &self.public_base_url
    }
}

impl<C, U, L> Enroller<C, U, L>
where
    C: CourseRepository,
    U: UserRepository,
    L: PurchaseLedger,
{
    /// Whether `user_id` holds a purchase for `course_id`.
    pub async fn is_enrolled(&self, user_id: &UserId, course_id: &CourseId) -> Result<bool, Error> {
        let purchase = self
            .ledger
            .find_purchase(user_id, course_id)
            .await
            .map_err(map_ledger_error)?;
        Ok(purchase.is_some())
    }

    /// Record the purchase and seed progress for every published chapter.
    ///
    /// The ledger is checked first and the insert itself is conflict-safe,
    /// so a concurrent duplicate resolves to
    /// [`EnrollmentOutcome::AlreadyEnrolled`].
    pub async fn enroll(
        &self,
        user_id: &UserId,
        course: &Course,
    ) -> Result<EnrollmentOutcome, Error> {
        if self.is_enrolled(user_id, &course.id).await? {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }

        let chapters = self
            .courses
            .list_chapters(&course.id)
            .await
            .map_err(map_course_error)?;
        let chapter_ids: Vec<ChapterId> = published_in_order(chapters)
            .into_iter()
            .map(|chapter| chapter.id)
            .collect();

        let outcome = self
            .ledger
            .enroll(user_id, &course.id, &chapter_ids, self.clock.utc())
            .await
            .map_err(map_ledger_error)?;

        if outcome == EnrollmentOutcome::Enrolled {
            info!(%user_id, course_id = %course.id, chapters = chapter_ids.len(), "user enrolled");
            self.send_confirmation(user_id, course).await;
        }
        Ok(outcome)
    }

    async fn send_confirmation(&self, user_id: &UserId, course: &Course) {
        let user = match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!(%user_id, "enrolled user vanished before confirmation email");
                return;
            }
            Err(err) => {
                warn!(%user_id, error = %err, "could not load user for confirmation email");
                return;
            }
        };
        let message = enrollment_confirmation(
            &user,
            course,
            &course_url(&self.public_base_url, &course.id),
        );
        if let Err(err) = self.mailer.send(&message).await {
            warn!(%user_id, course_id = %course.id, error = %err, "enrollment email failed");
        }
    }
}

/// Free enrollment and chapter progress.
pub struct EnrollmentService<C, U, L, P> {
    enroller: Enroller<C, U, L>,
    courses: Arc<C>,
    progress: Arc<P>,
    clock: Arc<dyn Clock>,
}

impl<C, U, L, P> EnrollmentService<C, U, L, P> {
    pub fn new(
        enroller: Enroller<C, U, L>,
        courses: Arc<C>,
        progress: Arc<P>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            enroller,
            courses,
            progress,
            clock,
        }
    }
}

#[async_trait]
impl<C, U, L, P> EnrollmentCommand for EnrollmentService<C, U, L, P>
where
    C: CourseRepository,
    U: UserRepository,
    L: PurchaseLedger,
    P: ProgressRepository,
{
    async fn enroll_free(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<EnrollmentOutcome, Error> {
        let course = find_published_course(self.courses.as_ref(), course_id).await?;
        if !course.is_free() {
            return Err(Error::invalid_request(
                "course requires payment; use checkout",
            ));
        }
        self.enroller.enroll(user_id, &course).await
    }

    async fn set_chapter_progress(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_id: &ChapterId,
        completed: bool,
    ) -> Result<u8, Error> {
        let course = find_published_course(self.courses.as_ref(), course_id).await?;
        let published = published_in_order(
            self.courses
                .list_chapters(&course.id)
                .await
                .map_err(map_course_error)?,
        );
        let chapter = published
            .iter()
            .find(|chapter| chapter.id == *chapter_id)
            .ok_or_else(|| Error::not_found("chapter not found"))?;

        let purchased = self.enroller.is_enrolled(user_id, &course.id).await?;
        if !chapter_is_accessible(chapter, &published, purchased) {
            return Err(Error::forbidden("chapter is locked"));
        }

        self.progress
            .set_completed(user_id, chapter_id, completed, self.clock.utc())
            .await
            .map_err(map_progress_error)?;

        let ids: Vec<ChapterId> = published.iter().map(|chapter| chapter.id).collect();
        let rows = self
            .progress
            .progress_for(user_id, &ids)
            .await
            .map_err(map_progress_error)?;
        let done = rows.iter().filter(|row| row.is_completed).count();
        Ok(progress_percentage(done, ids.len()))
    }
}

#[cfg(test)]
#[path = "enrollment_service_tests.rs"]
mod tests;
