//! Audiobook and chapter domain models

use crate::error::ModelError;
use crate::types::{progress, Duration, Validator};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Unique identifier for a book
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(String);

impl BookId {
    /// Creates a BookId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BookId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for BookId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for BookId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier of a chapter file (usually its URI)
///
/// This is also the identifier the player reports as its current item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChapterId(String);

impl ChapterId {
    /// Creates a ChapterId from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChapterId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for ChapterId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ChapterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One audio file of a multi-file audiobook
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chapter {
    pub id: ChapterId,
    /// `None` until the duration has been measured. Never changes once known.
    pub duration: Option<Duration>,
}

impl Chapter {
    /// Creates a chapter whose duration is not known yet
    pub fn new(id: impl Into<ChapterId>) -> Self {
        Self {
            id: id.into(),
            duration: None,
        }
    }

    /// Creates a chapter with a known duration
    pub fn with_duration(id: impl Into<ChapterId>, duration: Duration) -> Self {
        Self {
            id: id.into(),
            duration: Some(duration),
        }
    }

    /// Returns true once the duration is known
    pub fn has_duration(&self) -> bool {
        self.duration.is_some()
    }
}

/// Snapshot of an audiobook as handed to the playback engine
///
/// `current_position` is meaningful only while `current_chapter` is set.
///
/// A `current_chapter` that does not name one of `chapters` is a programmer
/// error: derived queries hit a `debug_assert!` in debug builds, and release
/// builds treat the chapter as unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Audiobook {
    pub id: BookId,
    pub display_name: String,
    pub chapters: Vec<Chapter>,
    pub current_chapter: Option<ChapterId>,
    pub current_position: Duration,
}

impl Audiobook {
    /// Creates a book that has never been played
    pub fn new(id: impl Into<BookId>, display_name: impl Into<String>, chapters: Vec<Chapter>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            chapters,
            current_chapter: None,
            current_position: Duration::ZERO,
        }
    }

    /// Creates a book and checks its invariants
    pub fn try_new(
        id: impl Into<BookId>,
        display_name: impl Into<String>,
        chapters: Vec<Chapter>,
    ) -> Result<Self, ModelError> {
        let book = Self::new(id, display_name, chapters);
        book.check()?;
        Ok(book)
    }

    /// Sets the stored playback position
    pub fn with_position(mut self, chapter: impl Into<ChapterId>, position: Duration) -> Self {
        self.current_chapter = Some(chapter.into());
        self.current_position = position;
        self
    }

    /// Checks the snapshot invariants, reporting the first violation
    pub fn check(&self) -> Result<(), ModelError> {
        if self.id.as_str().trim().is_empty() {
            return Err(ModelError::EmptyBookId);
        }

        if self.chapters.is_empty() {
            return Err(ModelError::NoChapters {
                book_id: self.id.to_string(),
            });
        }

        let mut seen = HashSet::new();
        for chapter in &self.chapters {
            if !seen.insert(&chapter.id) {
                return Err(ModelError::DuplicateChapter {
                    book_id: self.id.to_string(),
                    chapter: chapter.id.to_string(),
                });
            }
        }

        if let Some(current) = &self.current_chapter {
            if !self.chapters.iter().any(|c| &c.id == current) {
                return Err(ModelError::UnknownCurrentChapter {
                    book_id: self.id.to_string(),
                    chapter: current.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Index of the current chapter, if one is set
    pub fn current_chapter_index(&self) -> Option<usize> {
        let current = self.current_chapter.as_ref()?;
        let index = self.chapters.iter().position(|c| &c.id == current);
        debug_assert!(
            index.is_some(),
            "current chapter {} is not part of book {}",
            current,
            self.id
        );
        index
    }

    /// Position of the current chapter together with the in-chapter offset
    pub fn resume_point(&self) -> Option<(usize, Duration)> {
        self.current_chapter_index()
            .map(|index| (index, self.current_position))
    }

    /// Sum of all chapter durations, `None` while any of them is unknown
    pub fn total_duration(&self) -> Option<Duration> {
        self.chapters.iter().map(|c| c.duration).sum()
    }

    /// Sum of the durations of the chapters before the current one
    ///
    /// Zero when no chapter is current, `None` if one of them is unknown.
    pub fn preceding_duration(&self) -> Option<Duration> {
        let index = self.current_chapter_index().unwrap_or(0);
        self.chapters[..index].iter().map(|c| c.duration).sum()
    }

    /// Position within the whole book
    pub fn position_in_book(&self) -> Option<Duration> {
        self.current_chapter_index()?;
        self.preceding_duration()
            .map(|preceding| preceding + self.current_position)
    }

    /// Duration of the chapter at `index`, if known
    pub fn chapter_duration(&self, index: usize) -> Option<Duration> {
        self.chapters.get(index).and_then(|c| c.duration)
    }

    /// Play progress in `[0, 1]`
    pub fn progress(&self) -> f32 {
        progress::play_progress(self)
    }
}

impl Validator for Audiobook {
    fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.display_name.trim().is_empty() {
            errors.push("Display name cannot be empty".to_string());
        }

        if let Err(e) = self.check() {
            errors.push(e.to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_chapters() -> Vec<Chapter> {
        vec![
            Chapter::with_duration("file:///book/01.mp3", Duration::from_millis(60_000)),
            Chapter::with_duration("file:///book/02.mp3", Duration::from_millis(90_000)),
            Chapter::with_duration("file:///book/03.mp3", Duration::from_millis(30_000)),
        ]
    }

    #[test]
    fn test_book_id_display() {
        let id = BookId::from("book-1");
        assert_eq!(id.to_string(), "book-1");
        assert_eq!(id.as_str(), "book-1");
    }

    #[test]
    fn test_chapter_without_duration() {
        let chapter = Chapter::new("file:///a.mp3");
        assert!(!chapter.has_duration());
        assert_eq!(chapter.id.as_str(), "file:///a.mp3");
    }

    #[test]
    fn test_new_book_has_no_position() {
        let book = Audiobook::new("b1", "Book", three_chapters());
        assert!(book.current_chapter.is_none());
        assert_eq!(book.current_chapter_index(), None);
        assert_eq!(book.position_in_book(), None);
        assert_eq!(book.preceding_duration(), Some(Duration::ZERO));
    }

    #[test]
    fn test_current_chapter_index() {
        let book = Audiobook::new("b1", "Book", three_chapters())
            .with_position("file:///book/02.mp3", Duration::from_millis(1_000));
        assert_eq!(book.current_chapter_index(), Some(1));
        assert_eq!(book.resume_point(), Some((1, Duration::from_millis(1_000))));
    }

    #[test]
    fn test_total_duration() {
        let book = Audiobook::new("b1", "Book", three_chapters());
        assert_eq!(book.total_duration(), Some(Duration::from_millis(180_000)));
    }

    #[test]
    fn test_total_duration_unknown() {
        let mut chapters = three_chapters();
        chapters[2].duration = None;
        let book = Audiobook::new("b1", "Book", chapters);
        assert_eq!(book.total_duration(), None);
    }

    #[test]
    fn test_position_in_book() {
        let book = Audiobook::new("b1", "Book", three_chapters())
            .with_position("file:///book/03.mp3", Duration::from_millis(5_000));
        assert_eq!(book.preceding_duration(), Some(Duration::from_millis(150_000)));
        assert_eq!(book.position_in_book(), Some(Duration::from_millis(155_000)));
    }

    #[test]
    fn test_preceding_duration_ignores_later_unknowns() {
        let mut chapters = three_chapters();
        chapters[2].duration = None;
        let book = Audiobook::new("b1", "Book", chapters)
            .with_position("file:///book/02.mp3", Duration::from_millis(5_000));
        assert_eq!(book.preceding_duration(), Some(Duration::from_millis(60_000)));
        assert_eq!(book.total_duration(), None);
    }

    #[test]
    fn test_try_new_rejects_empty_chapters() {
        let result = Audiobook::try_new("b1", "Book", Vec::new());
        assert!(matches!(result, Err(ModelError::NoChapters { .. })));
    }

    #[test]
    fn test_try_new_rejects_duplicates() {
        let chapters = vec![Chapter::new("a"), Chapter::new("a")];
        let result = Audiobook::try_new("b1", "Book", chapters);
        assert!(matches!(result, Err(ModelError::DuplicateChapter { .. })));
    }

    #[test]
    fn test_check_rejects_unknown_current_chapter() {
        let book = Audiobook::new("b1", "Book", three_chapters())
            .with_position("file:///elsewhere.mp3", Duration::ZERO);
        assert!(matches!(
            book.check(),
            Err(ModelError::UnknownCurrentChapter { .. })
        ));
        assert!(!book.is_valid());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "is not part of book")]
    fn test_unknown_current_chapter_fails_fast_in_debug() {
        let book = Audiobook::new("b1", "Book", three_chapters())
            .with_position("file:///elsewhere.mp3", Duration::ZERO);
        let _ = book.current_chapter_index();
    }

    #[test]
    #[cfg(not(debug_assertions))]
    fn test_unknown_current_chapter_is_unset_in_release() {
        let book = Audiobook::new("b1", "Book", three_chapters())
            .with_position("file:///elsewhere.mp3", Duration::ZERO);
        assert_eq!(book.current_chapter_index(), None);
        assert_eq!(book.progress(), 0.0);
    }

    #[test]
    fn test_validation_empty_display_name() {
        let book = Audiobook::new("b1", "  ", three_chapters());
        let errors = book.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_serde_roundtrip_keeps_unknown_durations() {
        let mut chapters = three_chapters();
        chapters[0].duration = None;
        let book = Audiobook::new("b1", "Book", chapters)
            .with_position("file:///book/02.mp3", Duration::from_millis(1_234));

        let json = serde_json::to_string(&book).unwrap();
        let parsed: Audiobook = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, book);
    }
}
