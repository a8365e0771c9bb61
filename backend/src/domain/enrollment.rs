//! Purchases (the enrollment fact) and per-chapter progress.

use chrono::{DateTime, Utc};

use super::ids::{ChapterId, CourseId, UserId};

/// Entitlement record; at most one exists per `(user_id, course_id)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purchase {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub created_at: DateTime<Utc>,
}

/// Result of an enrollment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentOutcome {
    /// A purchase row and progress rows were created.
    Enrolled,
    /// A purchase row already existed; nothing was written.
    AlreadyEnrolled,
}

impl EnrollmentOutcome {
    /// Wire label used in API responses.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enrolled => "enrolled",
            Self::AlreadyEnrolled => "already_enrolled",
        }
    }
}

/// Completion state of a chapter for one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProgress {
    pub user_id: UserId,
    pub chapter_id: ChapterId,
    pub is_completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Completion percentage rounded half up, `0` for courses without chapters.
///
/// # Examples
/// ```
/// use coursehub::domain::progress_percentage;
///
/// assert_eq!(progress_percentage(1, 3), 33);
/// assert_eq!(progress_percentage(2, 3), 67);
/// assert_eq!(progress_percentage(0, 0), 0);
/// ```
#[must_use]
pub fn progress_percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    let scaled = (completed * 200 + total) / (total * 2);
    u8::try_from(scaled).unwrap_or(100)
}
