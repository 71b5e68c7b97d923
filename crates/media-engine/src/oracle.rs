//! Chapter duration lookup used by cross-chapter seeks

use async_trait::async_trait;
use folio_core::{Audiobook, BookId, Duration};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Reports a chapter's total duration, if it has been measured
///
/// Implementations must be free of side effects and safe to call from
/// several engines at once.
#[async_trait]
pub trait DurationOracle: Send + Sync {
    async fn chapter_duration(&self, book_id: &BookId, chapter_index: usize) -> Option<Duration>;
}

/// In-memory oracle keyed by book and chapter index
#[derive(Debug, Default)]
pub struct BookDurations {
    durations: RwLock<HashMap<(BookId, usize), Duration>>,
}

impl BookDurations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collects every known chapter duration of the given books
    pub fn from_books<'a>(books: impl IntoIterator<Item = &'a Audiobook>) -> Self {
        let oracle = Self::new();
        for book in books {
            for (index, chapter) in book.chapters.iter().enumerate() {
                if let Some(duration) = chapter.duration {
                    oracle.insert(book.id.clone(), index, duration);
                }
            }
        }
        oracle
    }

    pub fn insert(&self, book_id: BookId, chapter_index: usize, duration: Duration) {
        self.durations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((book_id, chapter_index), duration);
    }

    pub fn len(&self) -> usize {
        self.durations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DurationOracle for BookDurations {
    async fn chapter_duration(&self, book_id: &BookId, chapter_index: usize) -> Option<Duration> {
        self.durations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&(book_id.clone(), chapter_index))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_core::Chapter;

    fn book() -> Audiobook {
        Audiobook::new(
            "book-1",
            "Book One",
            vec![
                Chapter::with_duration("a.mp3", Duration::from_millis(90_000)),
                Chapter::new("b.mp3"),
            ],
        )
    }

    #[tokio::test]
    async fn test_from_books_skips_unknown_durations() {
        let oracle = BookDurations::from_books([&book()]);
        let id = BookId::new("book-1");

        assert_eq!(oracle.len(), 1);
        assert_eq!(
            oracle.chapter_duration(&id, 0).await,
            Some(Duration::from_millis(90_000))
        );
        assert_eq!(oracle.chapter_duration(&id, 1).await, None);
    }

    #[tokio::test]
    async fn test_insert_makes_duration_known() {
        let oracle = BookDurations::from_books([&book()]);
        let id = BookId::new("book-1");

        oracle.insert(id.clone(), 1, Duration::from_seconds(60));
        assert_eq!(
            oracle.chapter_duration(&id, 1).await,
            Some(Duration::from_millis(60_000))
        );
    }

    #[tokio::test]
    async fn test_survives_poisoned_lock() {
        let oracle = std::sync::Arc::new(BookDurations::from_books([&book()]));

        let poisoner = std::sync::Arc::clone(&oracle);
        let _ = std::thread::spawn(move || {
            let _durations = poisoner.durations.write().expect("durations lock");
            panic!("panic while holding the durations lock");
        })
        .join();
        assert!(oracle.durations.is_poisoned());

        let id = BookId::new("book-1");
        oracle.insert(id.clone(), 1, Duration::from_millis(45_000));
        assert_eq!(oracle.len(), 2);
        assert_eq!(
            oracle.chapter_duration(&id, 1).await,
            Some(Duration::from_millis(45_000))
        );
    }

    #[tokio::test]
    async fn test_other_books_are_not_confused() {
        let oracle = BookDurations::from_books([&book()]);
        assert!(oracle
            .chapter_duration(&BookId::new("book-2"), 0)
            .await
            .is_none());
    }
}
