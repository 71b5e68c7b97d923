//! Engine state management

use crate::adapter::{PlaybackPhase, PlayerAdapter};
use folio_core::{ChapterId, Duration};
use serde::{Deserialize, Serialize};

/// Externally observable playback status
///
/// Starts as `Initializing` and leaves it once the player is acquired.
/// `Ready` and `Playing` alternate afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MediaState {
    #[default]
    Initializing,
    Ready,
    /// A chapter is loaded and the player intends to play it
    Playing { chapter: ChapterId, position: Duration },
}

impl MediaState {
    pub fn is_playing(&self) -> bool {
        matches!(self, MediaState::Playing { .. })
    }

    pub fn chapter(&self) -> Option<&ChapterId> {
        match self {
            MediaState::Playing { chapter, .. } => Some(chapter),
            _ => None,
        }
    }

    pub fn position(&self) -> Option<Duration> {
        match self {
            MediaState::Playing { position, .. } => Some(*position),
            _ => None,
        }
    }
}

/// The player readings MediaState is derived from
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdapterSnapshot {
    pub play_when_ready: bool,
    pub phase: PlaybackPhase,
    pub current_item: Option<ChapterId>,
    pub position_ms: u64,
}

impl AdapterSnapshot {
    pub fn capture<A: PlayerAdapter + ?Sized>(adapter: &A) -> Self {
        Self {
            play_when_ready: adapter.play_when_ready(),
            phase: adapter.playback_phase(),
            current_item: adapter.current_item_id(),
            position_ms: adapter.current_position_ms(),
        }
    }
}

/// Maps a player snapshot to the state consumers see
///
/// `Playing` requires play-when-ready, a non-idle phase and a current item.
/// Everything else is `Ready`.
pub fn derive_media_state(snapshot: &AdapterSnapshot) -> MediaState {
    let active_phase = matches!(
        snapshot.phase,
        PlaybackPhase::Buffering | PlaybackPhase::Ready | PlaybackPhase::Ended
    );

    match &snapshot.current_item {
        Some(chapter) if snapshot.play_when_ready && active_phase => MediaState::Playing {
            chapter: chapter.clone(),
            position: Duration::from_millis(snapshot.position_ms),
        },
        _ => MediaState::Ready,
    }
}
