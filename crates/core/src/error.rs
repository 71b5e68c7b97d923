//! Error types for the audiobook model

use thiserror::Error;

/// Invariant violations in an audiobook snapshot
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    /// Book id is empty or whitespace
    #[error("Book id cannot be empty")]
    EmptyBookId,

    /// Book has no chapters
    #[error("Book {book_id} has no chapters")]
    NoChapters { book_id: String },

    /// Two chapters share an identifier
    #[error("Book {book_id} lists chapter {chapter} more than once")]
    DuplicateChapter { book_id: String, chapter: String },

    /// Current chapter does not belong to the book
    #[error("Current chapter {chapter} is not part of book {book_id}")]
    UnknownCurrentChapter { book_id: String, chapter: String },
}

/// Result type alias using ModelError
pub type Result<T> = std::result::Result<T, ModelError>;
