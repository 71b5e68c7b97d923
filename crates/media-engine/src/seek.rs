//! Seek-back planning
//!
//! A rewind near the start of a chapter should continue into the end of the
//! previous one. The plan is computed from the player's current item and
//! position; resolving a cross-boundary target needs the previous chapter's
//! duration, which the engine looks up separately.

/// What a seek back should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekBackPlan {
    /// Close to the start of the chapter: go to its start
    RestartChapter,
    /// Rewind by the increment inside the current chapter
    WithinChapter,
    /// Crossed the start of the first chapter: rewind, clamping at 0
    ClampToStart,
    /// Land `overshoot_ms` before the end of the previous chapter
    CrossBoundary {
        previous_index: usize,
        overshoot_ms: u64,
    },
}

/// Plans a seek back of `increment_ms` from `position_ms`
///
/// The rewound position `p - increment` is classified against half the
/// increment:
/// - in `[-half, half)` the chapter restarts,
/// - at or above `half` the rewind stays in the chapter,
/// - below `-half` the rewind crosses into the previous chapter, if any.
pub fn plan_seek_back(
    position_ms: u64,
    current_index: Option<usize>,
    increment_ms: u64,
) -> SeekBackPlan {
    let increment = i64::try_from(increment_ms).unwrap_or(i64::MAX);
    let position = i64::try_from(position_ms).unwrap_or(i64::MAX);
    let half = increment / 2;
    let rewound = position.saturating_sub(increment);

    if (-half..half).contains(&rewound) {
        SeekBackPlan::RestartChapter
    } else if rewound >= half {
        SeekBackPlan::WithinChapter
    } else {
        match current_index {
            Some(index) if index > 0 => SeekBackPlan::CrossBoundary {
                previous_index: index - 1,
                overshoot_ms: rewound.unsigned_abs(),
            },
            _ => SeekBackPlan::ClampToStart,
        }
    }
}

/// Position in the previous chapter for a cross-boundary rewind
pub fn cross_boundary_target(previous_duration_ms: u64, overshoot_ms: u64) -> u64 {
    previous_duration_ms.saturating_sub(overshoot_ms)
}
