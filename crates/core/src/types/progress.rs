//! Play progress projection
//!
//! Progress is a pure function of the chapter durations and the stored
//! position. It is 0 whenever it cannot be computed honestly: no current
//! chapter, an unknown chapter duration, or a book of zero length.

use crate::types::{Audiobook, Duration};

/// Fraction of the book played, in `[0, 1]`
pub fn play_progress(book: &Audiobook) -> f32 {
    let durations: Vec<Option<Duration>> = book.chapters.iter().map(|c| c.duration).collect();
    progress_fraction(&durations, book.resume_point())
}

/// Fraction of a chaptered timeline played
///
/// `current` is the chapter index and the position within that chapter. The
/// player may report a position slightly past a chapter's nominal duration,
/// so the result is clamped.
pub fn progress_fraction(durations: &[Option<Duration>], current: Option<(usize, Duration)>) -> f32 {
    let Some((index, position)) = current else {
        return 0.0;
    };

    let Some(total) = durations.iter().copied().sum::<Option<Duration>>() else {
        return 0.0;
    };

    if total.is_zero() || index >= durations.len() {
        return 0.0;
    }

    let preceding: Duration = durations[..index].iter().flatten().copied().sum();
    let played = preceding + position;

    (played.as_millis() as f64 / total.as_millis() as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chapter;

    fn known(ms: &[u64]) -> Vec<Option<Duration>> {
        ms.iter().map(|&m| Some(Duration::from_millis(m))).collect()
    }

    #[test]
    fn test_no_current_chapter_is_zero() {
        assert_eq!(progress_fraction(&known(&[1_000, 1_000]), None), 0.0);
    }

    #[test]
    fn test_unknown_duration_is_zero() {
        let mut durations = known(&[1_000, 1_000]);
        durations[1] = None;
        let current = Some((0, Duration::from_millis(500)));
        assert_eq!(progress_fraction(&durations, current), 0.0);
    }

    #[test]
    fn test_zero_total_is_zero() {
        let current = Some((1, Duration::ZERO));
        assert_eq!(progress_fraction(&known(&[0, 0]), current), 0.0);
    }

    #[test]
    fn test_progress_counts_preceding_chapters() {
        let current = Some((1, Duration::from_millis(25_000)));
        let progress = progress_fraction(&known(&[50_000, 50_000]), current);
        assert!((progress - 0.75).abs() < f32::EPSILON);
    }

    #[test]
    fn test_progress_is_clamped() {
        let current = Some((1, Duration::from_millis(80_000)));
        assert_eq!(progress_fraction(&known(&[50_000, 50_000]), current), 1.0);
    }

    #[test]
    fn test_out_of_range_index_is_zero() {
        let current = Some((5, Duration::ZERO));
        assert_eq!(progress_fraction(&known(&[1_000]), current), 0.0);
    }

    #[test]
    fn test_progress_is_monotonic_without_seeks() {
        let book = Audiobook::new(
            "b1",
            "Book",
            vec![
                Chapter::with_duration("a", Duration::from_millis(10_000)),
                Chapter::with_duration("b", Duration::from_millis(20_000)),
                Chapter::with_duration("c", Duration::from_millis(5_000)),
            ],
        );

        let mut previous = 0.0;
        for (chapter, length) in [("a", 10_000u64), ("b", 20_000), ("c", 5_000)] {
            for position in (0..=length).step_by(500) {
                let snapshot = book
                    .clone()
                    .with_position(chapter, Duration::from_millis(position));
                let progress = snapshot.progress();
                assert!(progress >= previous, "{} < {}", progress, previous);
                assert!((0.0..=1.0).contains(&progress));
                previous = progress;
            }
        }
        assert_eq!(previous, 1.0);
    }
}
