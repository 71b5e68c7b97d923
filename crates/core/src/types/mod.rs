//! Domain types for Folio
//!
//! - `book`: Audiobook and Chapter types
//! - `progress`: play progress projection
//! - `common`: Shared traits and utilities

mod book;
mod common;
pub mod progress;

pub use book::{Audiobook, BookId, Chapter, ChapterId};
pub use common::{Duration, Validator};
pub use progress::{play_progress, progress_fraction};
