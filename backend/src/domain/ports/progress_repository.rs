//! Port for per-chapter completion state.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{ChapterId, UserId, UserProgress};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by progress repository adapters.
    pub enum ProgressRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } => "progress repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "progress repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Progress rows of `user_id` restricted to `chapter_ids`.
    async fn progress_for(
        &self,
        user_id: &UserId,
        chapter_ids: &[ChapterId],
    ) -> Result<Vec<UserProgress>, ProgressRepositoryError>;

    /// Insert or update the completion flag for one chapter.
    async fn set_completed(
        &self,
        user_id: &UserId,
        chapter_id: &ChapterId,
        completed: bool,
        at: DateTime<Utc>,
    ) -> Result<(), ProgressRepositoryError>;
}
