//! Folio core - audiobook model and play progress projection

pub mod error;
pub mod types;

pub use error::{ModelError, Result};
pub use types::{
    play_progress, progress_fraction, Audiobook, BookId, Chapter, ChapterId, Duration, Validator,
};
