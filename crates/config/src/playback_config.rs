//! `[playback]` section

use crate::validation::{ConfigSection, Issues};
use serde::{Deserialize, Serialize};

/// Transport step sizes and position-refresh cadence of the engine
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Rewind step, also the basis of cross-chapter seek-back
    pub seek_back_increment_ms: u64,
    pub seek_forward_increment_ms: u64,
    /// Taken off a stored position when a book is resumed
    pub rewind_on_resume_secs: u64,
    /// State stream tick period while playing
    pub position_refresh_ms: u64,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seek_back_increment_ms: 30_000,
            seek_forward_increment_ms: 10_000,
            rewind_on_resume_secs: 0,
            position_refresh_ms: 1_000,
        }
    }
}

impl ConfigSection for PlaybackConfig {
    const NAME: &'static str = "playback";

    fn check(&self, issues: &mut Issues) {
        issues.within("seek_back_increment_ms", self.seek_back_increment_ms, 1_000..=300_000);
        issues.within("seek_forward_increment_ms", self.seek_forward_increment_ms, 1_000..=300_000);
        issues.within("rewind_on_resume_secs", self.rewind_on_resume_secs, 0..=60);
        issues.within("position_refresh_ms", self.position_refresh_ms, 100..=10_000);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_legal() {
        assert!(PlaybackConfig::default().validate().is_ok());
    }

    #[test]
    fn test_each_bad_field_is_reported() {
        let config = PlaybackConfig {
            seek_back_increment_ms: 10,
            seek_forward_increment_ms: 999_999,
            rewind_on_resume_secs: 61,
            position_refresh_ms: 1_000,
        };

        let fields: Vec<String> = config
            .validate()
            .unwrap_err()
            .into_iter()
            .map(|issue| issue.field)
            .collect();
        assert_eq!(
            fields,
            [
                "playback.seek_back_increment_ms",
                "playback.seek_forward_increment_ms",
                "playback.rewind_on_resume_secs",
            ]
        );
    }

    #[test]
    fn test_zero_refresh_is_rejected() {
        let config = PlaybackConfig {
            position_refresh_ms: 0,
            ..PlaybackConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().len(), 1);
    }
}
