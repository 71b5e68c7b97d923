// FILE: crates/media-engine/src/chapters.rs
//! Turning an audiobook snapshot into a player playlist

use crate::adapter::ChapterRef;
use folio_core::{Audiobook, Chapter};

impl From<&Chapter> for ChapterRef {
    fn from(chapter: &Chapter) -> Self {
        Self {
            id: chapter.id.clone(),
            duration_hint: chapter.duration,
        }
    }
}

/// Items to load plus where to start playing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterQueue {
    /// Playlist title, the book's display name
    pub title: String,
    pub chapters: Vec<ChapterRef>,
    pub start_index: usize,
    pub start_offset_ms: u64,
}

impl ChapterQueue {
    /// Builds the queue for a book, resuming at its stored position
    ///
    /// `rewind_ms` is taken off the stored position, stopping at the start of
    /// the chapter. Books without a stored position start at chapter 0.
    pub fn for_book(book: &Audiobook, rewind_ms: u64) -> Self {
        let chapters = book.chapters.iter().map(ChapterRef::from).collect();

        let (start_index, start_offset_ms) = match book.resume_point() {
            Some((index, position)) => (index, position.as_millis().saturating_sub(rewind_ms)),
            None => (0, 0),
        };

        Self {
            title: book.display_name.clone(),
            chapters,
            start_index,
            start_offset_ms,
        }
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }
}
