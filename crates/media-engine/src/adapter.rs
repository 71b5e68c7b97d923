//! Contract over the underlying media player
//!
//! The engine owns its adapter exclusively and drives it through these
//! primitives. Adapters report what happened through listeners, which may be
//! invoked synchronously from inside any primitive.

use crate::config::SeekIncrements;
use folio_core::{ChapterId, Duration};
use serde::{Deserialize, Serialize};

/// Coarse player phase, as media players usually report it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PlaybackPhase {
    #[default]
    Idle,
    Buffering,
    Ready,
    Ended,
}

/// Notifications emitted by a player adapter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerEvent {
    PlaybackStateChanged(PlaybackPhase),
    PlayWhenReadyChanged(bool),
    /// Transient failure such as a decode error. The player keeps its state.
    Error(String),
}

pub type PlayerListener = Box<dyn Fn(PlayerEvent) + Send + Sync>;

/// One item handed to the player
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    pub id: ChapterId,
    pub duration_hint: Option<Duration>,
}

impl ChapterRef {
    pub fn new(id: impl Into<ChapterId>) -> Self {
        Self {
            id: id.into(),
            duration_hint: None,
        }
    }
}

pub trait PlayerAdapter: Send + 'static {
    fn set_seek_increments(&mut self, increments: SeekIncrements);

    /// Title shown by the player for the whole playlist, usually the book name
    fn set_playlist_title(&mut self, title: &str);

    /// Replaces the playlist. The first item becomes current at position 0.
    fn load_chapters(&mut self, chapters: Vec<ChapterRef>);
    fn seek_to(&mut self, item_index: usize, position_ms: u64);
    fn set_play_when_ready(&mut self, play_when_ready: bool);
    fn prepare(&mut self);
    fn stop(&mut self);
    fn release(&mut self);

    fn seek_forward(&mut self);
    /// Rewinds by the back increment, clamping at the start of the item
    fn seek_back(&mut self);
    fn seek_to_default_position(&mut self);
    fn has_next_item(&self) -> bool;
    fn seek_to_next_item(&mut self);
    fn seek_to_previous_item(&mut self);

    fn current_position_ms(&self) -> u64;
    fn current_item_index(&self) -> Option<usize>;
    fn current_item_id(&self) -> Option<ChapterId>;
    fn current_item_duration_ms(&self) -> Option<u64>;
    fn playback_phase(&self) -> PlaybackPhase;
    fn play_when_ready(&self) -> bool;

    fn add_listener(&mut self, listener: PlayerListener);
}
