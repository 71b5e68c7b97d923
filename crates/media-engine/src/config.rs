//! Engine tuning values

use folio_config::PlaybackConfig;

/// Seek step sizes handed to the player right after acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekIncrements {
    pub back_ms: u64,
    pub forward_ms: u64,
}

/// Settings the playback engine runs with
///
/// Built from the `[playback]` section of the config file, or by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Rewind step, also the basis of the cross-chapter seek-back arithmetic
    pub seek_back_increment_ms: u64,
    pub seek_forward_increment_ms: u64,
    /// Subtracted from a stored position when a book is resumed
    pub rewind_on_resume_ms: u64,
    /// Ticking period of the state stream while playing
    pub position_refresh_ms: u64,
}

impl EngineConfig {
    pub fn seek_increments(&self) -> SeekIncrements {
        SeekIncrements {
            back_ms: self.seek_back_increment_ms,
            forward_ms: self.seek_forward_increment_ms,
        }
    }

    pub fn position_refresh(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.position_refresh_ms.max(1))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::from(&PlaybackConfig::default())
    }
}

impl From<&PlaybackConfig> for EngineConfig {
    fn from(config: &PlaybackConfig) -> Self {
        Self {
            seek_back_increment_ms: config.seek_back_increment_ms,
            seek_forward_increment_ms: config.seek_forward_increment_ms,
            rewind_on_resume_ms: config.rewind_on_resume_secs.saturating_mul(1_000),
            position_refresh_ms: config.position_refresh_ms,
        }
    }
}
