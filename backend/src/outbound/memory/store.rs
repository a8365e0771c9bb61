//! Shared in-memory state and the port implementations over it.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{
    CourseRepository, CourseRepositoryError, PaymentRecordError, PaymentRecordRepository,
    ProgressRepository, ProgressRepositoryError, PurchaseLedger, PurchaseLedgerError,
    StoredCredentials, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Attachment, Category, CategoryId, Chapter, ChapterId, CompletionWrite, Course, CourseFilter,
    CourseId, Email, EnrollmentOutcome, NewPaymentRecord, PaymentProvider, PaymentRecord,
    PaymentStatus, Purchase, Role, User, UserId, UserProgress, reading_order,
};

const CATEGORY_NAMES: [&str; 7] = [
    "Computer Science",
    "Music",
    "Fitness",
    "Photography",
    "Accounting",
    "Engineering",
    "Filming",
];

/// Categories shipped with every deployment; ids match the seed migration.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    CATEGORY_NAMES
        .iter()
        .zip(1_u128..)
        .map(|(name, suffix)| Category {
            id: CategoryId::from_uuid(Uuid::from_u128(
                0x6f1c_2d1e_8a43_4c1b_9d2f_0b5a_7e3c_9a00 + suffix,
            )),
            name: (*name).to_owned(),
        })
        .collect()
}

struct StoredUser {
    user: User,
    password_hash: String,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, StoredUser>,
    categories: Vec<Category>,
    courses: HashMap<CourseId, Course>,
    chapters: HashMap<ChapterId, Chapter>,
    attachments: Vec<Attachment>,
    purchases: BTreeMap<(UserId, CourseId), Purchase>,
    progress: HashMap<(UserId, ChapterId), UserProgress>,
    payments: HashMap<(PaymentProvider, String), PaymentRecord>,
}

impl MemoryState {
    fn users(&self) -> impl Iterator<Item = (&User, &str)> {
        self.users
            .values()
            .map(|stored| (&stored.user, stored.password_hash.as_str()))
    }

    fn user_mut(&mut self, id: &UserId) -> Option<&mut User> {
        self.users.get_mut(id).map(|stored| &mut stored.user)
    }

    fn write_payment(
        &mut self,
        record: &NewPaymentRecord,
        status: PaymentStatus,
        at: DateTime<Utc>,
    ) -> bool {
        let key = (record.provider, record.reference.clone());
        match self.payments.get_mut(&key) {
            Some(existing) if existing.status == PaymentStatus::Completed => false,
            Some(existing) => {
                existing.status = status;
                merge_metadata(&mut existing.metadata, &record.metadata);
                existing.updated_at = at;
                true
            }
            None => {
                let mut fresh = record.clone();
                fresh.status = status;
                self.payments.insert(key, fresh.into_record(at));
                true
            }
        }
    }
}

/// Shallow object merge, newer keys winning, like `jsonb || jsonb`.
fn merge_metadata(target: &mut serde_json::Value, update: &serde_json::Value) {
    match (target.as_object_mut(), update.as_object()) {
        (Some(existing), Some(incoming)) => {
            for (key, value) in incoming {
                existing.insert(key.clone(), value.clone());
            }
        }
        _ => *target = update.clone(),
    }
}

fn newest_first<T>(items: &mut [T], key: impl Fn(&T) -> (DateTime<Utc>, Uuid)) {
    items.sort_by(|a, b| key(b).cmp(&key(a)));
}

/// Process-local store implementing every persistence port.
///
/// Cloning shares the underlying state.
#[derive(Clone)]
pub struct InMemoryStore {
    state: Arc<RwLock<MemoryState>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Empty store holding only the default categories.
    #[must_use]
    pub fn new() -> Self {
        let state = MemoryState {
            categories: default_categories(),
            ..MemoryState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: &User, password_hash: &str) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        if state.users().any(|(existing, _)| existing.email() == user.email()) {
            return Err(UserPersistenceError::duplicate_email(user.email().to_string()));
        }
        state.users.insert(
            *user.id(),
            StoredUser {
                user: user.clone(),
                password_hash: password_hash.to_owned(),
            },
        );
        Ok(())
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state.users.get(id).map(|stored| stored.user.clone()))
    }

    async fn find_credentials(
        &self,
        email: &Email,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let state = self.state.read().await;
        Ok(state
            .users()
            .find(|(user, _)| user.email() == email)
            .map(|(user, hash)| StoredCredentials {
                user: user.clone(),
                password_hash: hash.to_owned(),
            }))
    }

    async fn update_profile(&self, user: &User) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.user_mut(user.id()) {
            *existing = existing
                .clone()
                .with_display_name(user.display_name().clone())
                .with_image_url(user.image_url().map(str::to_owned));
        }
        Ok(())
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<bool, UserPersistenceError> {
        let mut state = self.state.write().await;
        Ok(match state.user_mut(id) {
            Some(existing) => {
                *existing = existing.clone().with_role(role);
                true
            }
            None => false,
        })
    }

    async fn set_billing_customer(
        &self,
        id: &UserId,
        customer_id: &str,
    ) -> Result<(), UserPersistenceError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.user_mut(id) {
            *existing = existing
                .clone()
                .with_billing_customer(Some(customer_id.to_owned()));
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<User>, UserPersistenceError> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users().map(|(user, _)| user.clone()).collect();
        newest_first(&mut users, |u| (u.created_at(), *u.id().as_uuid()));
        Ok(users)
    }
}

#[async_trait]
impl CourseRepository for InMemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut categories = state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn list_published(
        &self,
        filter: &CourseFilter,
    ) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.is_published && filter.matches(course))
            .cloned()
            .collect();
        newest_first(&mut courses, |c| (c.created_at, *c.id.as_uuid()));
        Ok(courses)
    }

    async fn list_by_owner(&self, owner: &UserId) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut courses: Vec<Course> = state
            .courses
            .values()
            .filter(|course| course.owner_id == *owner)
            .cloned()
            .collect();
        newest_first(&mut courses, |c| (c.created_at, *c.id.as_uuid()));
        Ok(courses)
    }

    async fn find_course(&self, id: &CourseId) -> Result<Option<Course>, CourseRepositoryError> {
        Ok(self.state.read().await.courses.get(id).cloned())
    }

    async fn find_courses(&self, ids: &[CourseId]) -> Result<Vec<Course>, CourseRepositoryError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.courses.get(id).cloned())
            .collect())
    }

    async fn save_course(&self, course: &Course) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        let known_category = course
            .category_id
            .is_none_or(|category| state.categories.iter().any(|c| c.id == category));
        if !known_category {
            return Err(CourseRepositoryError::query("referenced record does not exist"));
        }
        state.courses.insert(course.id, course.clone());
        Ok(())
    }

    async fn list_chapters(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Chapter>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut chapters: Vec<Chapter> = state
            .chapters
            .values()
            .filter(|chapter| chapter.course_id == *course_id)
            .cloned()
            .collect();
        chapters.sort_by_key(reading_order);
        Ok(chapters)
    }

    async fn find_chapter(
        &self,
        course_id: &CourseId,
        chapter_id: &ChapterId,
    ) -> Result<Option<Chapter>, CourseRepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .chapters
            .get(chapter_id)
            .filter(|chapter| chapter.course_id == *course_id)
            .cloned())
    }

    async fn save_chapter(&self, chapter: &Chapter) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        if !state.courses.contains_key(&chapter.course_id) {
            return Err(CourseRepositoryError::query("referenced record does not exist"));
        }
        state.chapters.insert(chapter.id, chapter.clone());
        Ok(())
    }

    async fn reorder_chapters(
        &self,
        course_id: &CourseId,
        positions: &[(ChapterId, i32)],
    ) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        for (chapter_id, position) in positions {
            if let Some(chapter) = state
                .chapters
                .get_mut(chapter_id)
                .filter(|chapter| chapter.course_id == *course_id)
            {
                chapter.position = *position;
            }
        }
        Ok(())
    }

    async fn list_attachments(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<Attachment>, CourseRepositoryError> {
        let state = self.state.read().await;
        let mut attachments: Vec<Attachment> = state
            .attachments
            .iter()
            .filter(|attachment| attachment.course_id == *course_id)
            .cloned()
            .collect();
        attachments.sort_by_key(|attachment| attachment.created_at);
        Ok(attachments)
    }

    async fn add_attachment(&self, attachment: &Attachment) -> Result<(), CourseRepositoryError> {
        let mut state = self.state.write().await;
        if !state.courses.contains_key(&attachment.course_id) {
            return Err(CourseRepositoryError::query("referenced record does not exist"));
        }
        state.attachments.push(attachment.clone());
        Ok(())
    }
}

#[async_trait]
impl PurchaseLedger for InMemoryStore {
    async fn find_purchase(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Purchase>, PurchaseLedgerError> {
        let state = self.state.read().await;
        Ok(state.purchases.get(&(*user_id, *course_id)).cloned())
    }

    async fn enroll(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        chapter_ids: &[ChapterId],
        at: DateTime<Utc>,
    ) -> Result<EnrollmentOutcome, PurchaseLedgerError> {
        let mut state = self.state.write().await;
        if state.purchases.contains_key(&(*user_id, *course_id)) {
            return Ok(EnrollmentOutcome::AlreadyEnrolled);
        }
        state.purchases.insert(
            (*user_id, *course_id),
            Purchase {
                user_id: *user_id,
                course_id: *course_id,
                created_at: at,
            },
        );
        for chapter_id in chapter_ids {
            state
                .progress
                .entry((*user_id, *chapter_id))
                .or_insert_with(|| UserProgress {
                    user_id: *user_id,
                    chapter_id: *chapter_id,
                    is_completed: false,
                    updated_at: at,
                });
        }
        Ok(EnrollmentOutcome::Enrolled)
    }

    async fn purchases_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Purchase>, PurchaseLedgerError> {
        let state = self.state.read().await;
        let mut purchases: Vec<Purchase> = state
            .purchases
            .values()
            .filter(|purchase| purchase.user_id == *user_id)
            .cloned()
            .collect();
        newest_first(&mut purchases, |p| (p.created_at, *p.course_id.as_uuid()));
        Ok(purchases)
    }

    async fn purchases_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<Vec<Purchase>, PurchaseLedgerError> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .values()
            .filter(|purchase| course_ids.contains(&purchase.course_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ProgressRepository for InMemoryStore {
    async fn progress_for(
        &self,
        user_id: &UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<UserProgress>, ProgressRepositoryError> {
        let state = self.state.read().await;
        Ok(chapter_ids
            .iter()
            .filter_map(|chapter_id| state.progress.get(&(*user_id, *chapter_id)).cloned())
            .collect())
    }

    async fn set_completed(
        &self,
        user_id: &UserId,
        chapter_id: &ChapterId,
        completed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), ProgressRepositoryError> {
        let mut state = self.state.write().await;
        state.progress.insert(
            (*user_id, *chapter_id),
            UserProgress {
                user_id: *user_id,
                chapter_id: *chapter_id,
                is_completed: completed,
                updated_at: at,
            },
        );
        Ok(())
    }
}

#[async_trait]
impl PaymentRecordRepository for InMemoryStore {
    async fn insert_pending(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError> {
        let mut state = self.state.write().await;
        let key = (record.provider, record.reference.clone());
        if !state.payments.contains_key(&key) {
            let mut pending = record.clone();
            pending.status = PaymentStatus::Pending;
            state.payments.insert(key, pending.into_record(at));
        }
        Ok(())
    }

    async fn find_by_reference(
        &self,
        provider: PaymentProvider,
        reference: &str,
    ) -> Result<Option<PaymentRecord>, PaymentRecordError> {
        let state = self.state.read().await;
        Ok(state
            .payments
            .get(&(provider, reference.to_owned()))
            .cloned())
    }

    async fn record_completed(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<CompletionWrite, PaymentRecordError> {
        let mut state = self.state.write().await;
        Ok(if state.write_payment(record, PaymentStatus::Completed, at) {
            CompletionWrite::Recorded
        } else {
            CompletionWrite::AlreadyCompleted
        })
    }

    async fn record_unsuccessful(
        &self,
        record: &NewPaymentRecord,
        at: DateTime<Utc>,
    ) -> Result<(), PaymentRecordError> {
        let mut state = self.state.write().await;
        state.write_payment(record, record.status, at);
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
