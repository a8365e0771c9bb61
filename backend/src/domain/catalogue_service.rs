//! Catalogue read service.
//!
//! Every chapter leaving this service has passed through the access policy,
//! so locked chapters never carry a video URL.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    CatalogueQuery, ChapterDetail, CourseDetail, CourseListing, CourseRepository,
    ProgressRepository, PurchaseLedger,
};
use crate::domain::service_support::{
    find_published_course, map_course_error, map_ledger_error, map_progress_error,
};
use crate::domain::{
    Cart, CartSummary, Category, Chapter, ChapterId, ChapterView, CourseFilter, CourseId, Error,
    UserId, chapter_is_accessible, next_chapter, progress_percentage, published_in_order,
};

/// Catalogue service implementing [`CatalogueQuery`].
#[derive(Clone)]
pub struct CatalogueService<C, L, P> {
    courses: Arc<C>,
    ledger: Arc<L>,
    progress: Arc<P>,
}

impl<C, L, P> CatalogueService<C, L, P> {
    pub fn new(courses: Arc<C>, ledger: Arc<L>, progress: Arc<P>) -> Self {
        Self {
            courses,
            ledger,
            progress,
        }
    }
}

impl<C, L, P> CatalogueService<C, L, P>
where
    C: CourseRepository,
    L: PurchaseLedger,
    P: ProgressRepository,
{
    async fn published_chapters(&self, course_id: &CourseId) -> Result<Vec<Chapter>, Error> {
        let chapters = self
            .courses
            .list_chapters(course_id)
            .await
            .map_err(map_course_error)?;
        Ok(published_in_order(chapters))
    }

    async fn owns(&self, viewer: Option<UserId>, course_id: &CourseId) -> Result<bool, Error> {
        let Some(user_id) = viewer else {
            return Ok(false);
        };
        let purchase = self
            .ledger
            .find_purchase(&user_id, course_id)
            .await
            .map_err(map_ledger_error)?;
        Ok(purchase.is_some())
    }

    async fn owned_courses(&self, viewer: Option<UserId>) -> Result<HashSet<CourseId>, Error> {
        let Some(user_id) = viewer else {
            return Ok(HashSet::new());
        };
        let purchases = self
            .ledger
            .purchases_for_user(&user_id)
            .await
            .map_err(map_ledger_error)?;
        Ok(purchases.into_iter().map(|p| p.course_id).collect())
    }

    async fn completed_ids(
        &self,
        user_id: &UserId,
        chapters: &[Chapter],
    ) -> Result<HashSet<ChapterId>, Error> {
        let ids: Vec<ChapterId> = chapters.iter().map(|chapter| chapter.id).collect();
        let rows = self
            .progress
            .progress_for(user_id, &ids)
            .await
            .map_err(map_progress_error)?;
        Ok(rows
            .into_iter()
            .filter(|row| row.is_completed)
            .map(|row| row.chapter_id)
            .collect())
    }

    async fn progress_of(&self, user_id: &UserId, published: &[Chapter]) -> Result<u8, Error> {
        let done = self.completed_ids(user_id, published).await?;
        Ok(progress_percentage(done.len(), published.len()))
    }
}

#[async_trait]
impl<C, L, P> CatalogueQuery for CatalogueService<C, L, P>
where
    C: CourseRepository,
    L: PurchaseLedger,
    P: ProgressRepository,
{
    async fn categories(&self) -> Result<Vec<Category>, Error> {
        let mut categories = self
            .courses
            .list_categories()
            .await
            .map_err(map_course_error)?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_courses(
        &self,
        viewer: Option<UserId>,
        filter: CourseFilter,
    ) -> Result<Vec<CourseListing>, Error> {
        let courses = self
            .courses
            .list_published(&filter)
            .await
            .map_err(map_course_error)?;
        let owned = self.owned_courses(viewer).await?;

        let mut listings = Vec::with_capacity(courses.len());
        for course in courses.into_iter().filter(|course| filter.matches(course)) {
            let published = self.published_chapters(&course.id).await?;
            let progress = match viewer {
                Some(user_id) if owned.contains(&course.id) => {
                    Some(self.progress_of(&user_id, &published).await?)
                }
                _ => None,
            };
            listings.push(CourseListing {
                display_price: course.display_price(),
                published_chapters: published.len(),
                progress,
                course,
            });
        }
        Ok(listings)
    }

    async fn course_detail(
        &self,
        viewer: Option<UserId>,
        course_id: CourseId,
    ) -> Result<CourseDetail, Error> {
        let course = find_published_course(self.courses.as_ref(), &course_id).await?;
        let published = self.published_chapters(&course.id).await?;
        let purchased = self.owns(viewer, &course.id).await?;
        let progress = match viewer {
            Some(user_id) if purchased => Some(self.progress_of(&user_id, &published).await?),
            _ => None,
        };
        let chapters = published
            .iter()
            .map(|chapter| {
                let accessible = chapter_is_accessible(chapter, &published, purchased);
                ChapterView::new(chapter.clone(), accessible)
            })
            .collect();
        Ok(CourseDetail {
            display_price: course.display_price(),
            course,
            chapters,
            purchased,
            progress,
        })
    }

    async fn chapter_detail(
        &self,
        viewer: Option<UserId>,
        course_id: CourseId,
        chapter_id: ChapterId,
    ) -> Result<ChapterDetail, Error> {
        let course = find_published_course(self.courses.as_ref(), &course_id).await?;
        let published = self.published_chapters(&course.id).await?;
        let chapter = published
            .iter()
            .find(|chapter| chapter.id == chapter_id)
            .cloned()
            .ok_or_else(|| Error::not_found("chapter not found"))?;
        let purchased = self.owns(viewer, &course.id).await?;
        let accessible = chapter_is_accessible(&chapter, &published, purchased);
        let next_chapter_id = next_chapter(&chapter, &published).map(|next| next.id);

        let attachments = if purchased {
            self.courses
                .list_attachments(&course.id)
                .await
                .map_err(map_course_error)?
        } else {
            Vec::new()
        };
        let is_completed = match viewer {
            Some(user_id) => self
                .completed_ids(&user_id, std::slice::from_ref(&chapter))
                .await?
                .contains(&chapter.id),
            None => false,
        };

        Ok(ChapterDetail {
            course,
            chapter: ChapterView::new(chapter, accessible),
            next_chapter_id,
            attachments,
            purchased,
            is_completed,
        })
    }

    async fn cart_summary(
        &self,
        viewer: Option<UserId>,
        cart: Cart,
    ) -> Result<CartSummary, Error> {
        if cart.is_empty() {
            return Ok(CartSummary::default());
        }
        let mut courses = self
            .courses
            .find_courses(cart.items())
            .await
            .map_err(map_course_error)?;
        courses.retain(|course| course.is_published);
        courses.sort_by_key(|course| {
            cart.items()
                .iter()
                .position(|id| *id == course.id)
                .unwrap_or(usize::MAX)
        });
        let owned = self.owned_courses(viewer).await?;
        Ok(CartSummary::build(courses, &owned))
    }
}

#[cfg(test)]
#[path = "catalogue_service_tests.rs"]
mod tests;
