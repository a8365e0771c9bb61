//! Chapter access policy.
//!
//! A chapter is open when it is the first published chapter of its course,
//! when it is flagged free, or when the viewer holds a purchase. Anonymous
//! viewers never hold a purchase. Inaccessible chapters lose their video URL
//! before leaving the domain.
//!
//! Positions are not unique, so every ordering here is by position and then
//! by chapter id.

use super::catalogue::Chapter;
use super::ids::ChapterId;

/// Reading order of a chapter within its course.
#[must_use]
pub fn reading_order(chapter: &Chapter) -> (i32, ChapterId) {
    (chapter.position, chapter.id)
}

/// Decide whether `chapter` may be watched.
///
/// `published` holds the course's published chapters in any order.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use coursehub::domain::{Chapter, CourseId, chapter_is_accessible};
///
/// let course = CourseId::random();
/// let mut first = Chapter::draft(course, "Intro".into(), 0, Utc::now());
/// first.is_published = true;
/// let mut second = Chapter::draft(course, "Deep dive".into(), 1, Utc::now());
/// second.is_published = true;
/// let published = vec![first.clone(), second.clone()];
///
/// assert!(chapter_is_accessible(&first, &published, false));
/// assert!(!chapter_is_accessible(&second, &published, false));
/// assert!(chapter_is_accessible(&second, &published, true));
/// ```
#[must_use]
pub fn chapter_is_accessible(chapter: &Chapter, published: &[Chapter], purchased: bool) -> bool {
    if purchased || chapter.is_free {
        return true;
    }
    let opener = published
        .iter()
        .filter(|candidate| candidate.is_published)
        .min_by_key(|candidate| reading_order(candidate));
    chapter.is_published && opener.is_some_and(|first| first.id == chapter.id)
}

/// Chapter as presented to a viewer, with the video withheld when locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterView {
    pub chapter: Chapter,
    pub accessible: bool,
}

impl ChapterView {
    /// Apply the access decision, dropping the video URL when locked.
    #[must_use]
    pub fn new(mut chapter: Chapter, accessible: bool) -> Self {
        if !accessible {
            chapter.video_url = None;
        }
        Self {
            chapter,
            accessible,
        }
    }
}

/// Published chapters of a course in reading order.
#[must_use]
pub fn published_in_order(chapters: Vec<Chapter>) -> Vec<Chapter> {
    let mut published: Vec<Chapter> = chapters.into_iter().filter(|c| c.is_published).collect();
    published.sort_by_key(reading_order);
    published
}

/// Published chapter immediately after `current` in reading order.
#[must_use]
pub fn next_chapter<'a>(current: &Chapter, published: &'a [Chapter]) -> Option<&'a Chapter> {
    let after = reading_order(current);
    published
        .iter()
        .filter(|candidate| candidate.is_published && reading_order(candidate) > after)
        .min_by_key(|candidate| reading_order(candidate))
}
