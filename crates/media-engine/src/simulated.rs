//! In-memory player for tests and headless hosts
//!
//! [`SimulatedPlayer`] implements [`PlayerAdapter`] without decoding
//! anything. Time only moves when [`SimulatedPlayerHandle::advance`] is
//! called. Item durations come from [`ChapterRef::duration_hint`] unless
//! overridden per identifier.

use crate::adapter::{ChapterRef, PlaybackPhase, PlayerAdapter, PlayerEvent, PlayerListener};
use crate::config::SeekIncrements;
use folio_core::ChapterId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Past this position, "previous" restarts the current item
const PREVIOUS_RESTART_THRESHOLD_MS: u64 = 3_000;

type SharedListener = Arc<dyn Fn(PlayerEvent) + Send + Sync>;

struct SimState {
    title: Option<String>,
    items: Vec<ChapterRef>,
    durations: HashMap<ChapterId, u64>,
    index: Option<usize>,
    position_ms: u64,
    phase: PlaybackPhase,
    play_when_ready: bool,
    increments: SeekIncrements,
    listeners: Vec<SharedListener>,
    load_count: usize,
    release_count: usize,
}

impl Default for SimState {
    fn default() -> Self {
        Self {
            title: None,
            items: Vec::new(),
            durations: HashMap::new(),
            index: None,
            position_ms: 0,
            phase: PlaybackPhase::Idle,
            play_when_ready: false,
            increments: SeekIncrements {
                back_ms: 5_000,
                forward_ms: 15_000,
            },
            listeners: Vec::new(),
            load_count: 0,
            release_count: 0,
        }
    }
}

impl SimState {
    fn duration_of(&self, index: usize) -> Option<u64> {
        let item = self.items.get(index)?;
        self.durations
            .get(&item.id)
            .copied()
            .or_else(|| item.duration_hint.map(|d| d.as_millis()))
    }

    fn current_duration(&self) -> Option<u64> {
        self.index.and_then(|index| self.duration_of(index))
    }

    fn clamp_to_current(&self, position_ms: u64) -> u64 {
        match self.current_duration() {
            Some(duration) => position_ms.min(duration),
            None => position_ms,
        }
    }

    fn set_phase(&mut self, phase: PlaybackPhase, events: &mut Vec<PlayerEvent>) {
        if self.phase != phase {
            self.phase = phase;
            events.push(PlayerEvent::PlaybackStateChanged(phase));
        }
    }

    fn seek_to(&mut self, index: usize, position_ms: u64, events: &mut Vec<PlayerEvent>) {
        if index >= self.items.len() {
            return;
        }
        self.index = Some(index);
        self.position_ms = self.clamp_to_current(position_ms);
        if self.phase == PlaybackPhase::Ended {
            self.set_phase(PlaybackPhase::Ready, events);
        }
    }

    fn advance(&mut self, mut ms: u64, events: &mut Vec<PlayerEvent>) {
        while let Some(index) = self.index {
            let Some(duration) = self.duration_of(index) else {
                self.position_ms = self.position_ms.saturating_add(ms);
                return;
            };

            let left = duration.saturating_sub(self.position_ms);
            if ms < left {
                self.position_ms += ms;
                return;
            }

            ms -= left;
            if index + 1 < self.items.len() {
                self.index = Some(index + 1);
                self.position_ms = 0;
            } else {
                self.position_ms = duration;
                self.set_phase(PlaybackPhase::Ended, events);
                return;
            }
        }
    }
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Applies `f` and notifies listeners after the lock is released
fn mutate<R>(
    state: &Mutex<SimState>,
    f: impl FnOnce(&mut SimState, &mut Vec<PlayerEvent>) -> R,
) -> R {
    let mut events = Vec::new();
    let (result, listeners) = {
        let mut guard = lock(state);
        let result = f(&mut guard, &mut events);
        let listeners = if events.is_empty() {
            Vec::new()
        } else {
            guard.listeners.clone()
        };
        (result, listeners)
    };

    for event in events {
        for listener in &listeners {
            listener(event.clone());
        }
    }
    result
}

/// Headless [`PlayerAdapter`]
pub struct SimulatedPlayer {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlayer {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// Overrides item durations by identifier
    pub fn with_durations<I, K>(self, durations: I) -> Self
    where
        I: IntoIterator<Item = (K, u64)>,
        K: Into<ChapterId>,
    {
        lock(&self.state)
            .durations
            .extend(durations.into_iter().map(|(id, ms)| (id.into(), ms)));
        self
    }

    /// Handle for driving and inspecting this player after it is handed off
    pub fn handle(&self) -> SimulatedPlayerHandle {
        SimulatedPlayerHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for SimulatedPlayer {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerAdapter for SimulatedPlayer {
    fn set_seek_increments(&mut self, increments: SeekIncrements) {
        lock(&self.state).increments = increments;
    }

    fn set_playlist_title(&mut self, title: &str) {
        lock(&self.state).title = Some(title.to_string());
    }

    fn load_chapters(&mut self, chapters: Vec<ChapterRef>) {
        mutate(&self.state, |state, events| {
            state.index = if chapters.is_empty() { None } else { Some(0) };
            state.items = chapters;
            state.position_ms = 0;
            state.load_count += 1;
            state.set_phase(PlaybackPhase::Idle, events);
        });
    }

    fn seek_to(&mut self, item_index: usize, position_ms: u64) {
        mutate(&self.state, |state, events| {
            state.seek_to(item_index, position_ms, events)
        });
    }

    fn set_play_when_ready(&mut self, play_when_ready: bool) {
        mutate(&self.state, |state, events| {
            if state.play_when_ready != play_when_ready {
                state.play_when_ready = play_when_ready;
                events.push(PlayerEvent::PlayWhenReadyChanged(play_when_ready));
            }
        });
    }

    fn prepare(&mut self) {
        mutate(&self.state, |state, events| {
            if state.phase == PlaybackPhase::Idle && !state.items.is_empty() {
                state.set_phase(PlaybackPhase::Ready, events);
            }
        });
    }

    fn stop(&mut self) {
        mutate(&self.state, |state, events| {
            state.set_phase(PlaybackPhase::Idle, events)
        });
    }

    fn release(&mut self) {
        let mut state = lock(&self.state);
        state.release_count += 1;
        state.listeners.clear();
        state.title = None;
        state.items.clear();
        state.index = None;
        state.position_ms = 0;
        state.play_when_ready = false;
        state.phase = PlaybackPhase::Idle;
    }

    fn seek_forward(&mut self) {
        let mut state = lock(&self.state);
        let target = state.position_ms.saturating_add(state.increments.forward_ms);
        state.position_ms = state.clamp_to_current(target);
    }

    fn seek_back(&mut self) {
        let mut state = lock(&self.state);
        state.position_ms = state.position_ms.saturating_sub(state.increments.back_ms);
    }

    fn seek_to_default_position(&mut self) {
        lock(&self.state).position_ms = 0;
    }

    fn has_next_item(&self) -> bool {
        let state = lock(&self.state);
        state
            .index
            .is_some_and(|index| index + 1 < state.items.len())
    }

    fn seek_to_next_item(&mut self) {
        mutate(&self.state, |state, events| {
            if let Some(index) = state.index {
                state.seek_to(index + 1, 0, events);
            }
        });
    }

    fn seek_to_previous_item(&mut self) {
        mutate(&self.state, |state, events| {
            let Some(index) = state.index else {
                return;
            };
            if state.position_ms > PREVIOUS_RESTART_THRESHOLD_MS || index == 0 {
                state.seek_to(index, 0, events);
            } else {
                state.seek_to(index - 1, 0, events);
            }
        });
    }

    fn current_position_ms(&self) -> u64 {
        lock(&self.state).position_ms
    }

    fn current_item_index(&self) -> Option<usize> {
        lock(&self.state).index
    }

    fn current_item_id(&self) -> Option<ChapterId> {
        let state = lock(&self.state);
        state
            .index
            .and_then(|index| state.items.get(index))
            .map(|item| item.id.clone())
    }

    fn current_item_duration_ms(&self) -> Option<u64> {
        lock(&self.state).current_duration()
    }

    fn playback_phase(&self) -> PlaybackPhase {
        lock(&self.state).phase
    }

    fn play_when_ready(&self) -> bool {
        lock(&self.state).play_when_ready
    }

    fn add_listener(&mut self, listener: PlayerListener) {
        lock(&self.state).listeners.push(Arc::from(listener));
    }
}

/// Drives and inspects a [`SimulatedPlayer`] owned elsewhere
#[derive(Clone)]
pub struct SimulatedPlayerHandle {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedPlayerHandle {
    /// Plays `ms` of audio, moving into the next item at the end of a known
    /// duration and ending after the last one
    pub fn advance(&self, ms: u64) {
        mutate(&self.state, |state, events| state.advance(ms, events));
    }

    /// Emits a transient error event
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        mutate(&self.state, |_, events| {
            events.push(PlayerEvent::Error(message));
        });
    }

    pub fn set_phase(&self, phase: PlaybackPhase) {
        mutate(&self.state, |state, events| state.set_phase(phase, events));
    }

    pub fn seek_to(&self, index: usize, position_ms: u64) {
        mutate(&self.state, |state, events| {
            state.seek_to(index, position_ms, events)
        });
    }

    pub fn set_duration(&self, id: impl Into<ChapterId>, duration_ms: u64) {
        lock(&self.state).durations.insert(id.into(), duration_ms);
    }

    pub fn playlist_title(&self) -> Option<String> {
        lock(&self.state).title.clone()
    }

    pub fn loaded_items(&self) -> Vec<ChapterId> {
        lock(&self.state)
            .items
            .iter()
            .map(|item| item.id.clone())
            .collect()
    }

    pub fn current_index(&self) -> Option<usize> {
        lock(&self.state).index
    }

    pub fn position_ms(&self) -> u64 {
        lock(&self.state).position_ms
    }

    pub fn phase(&self) -> PlaybackPhase {
        lock(&self.state).phase
    }

    pub fn play_when_ready(&self) -> bool {
        lock(&self.state).play_when_ready
    }

    pub fn seek_increments(&self) -> SeekIncrements {
        lock(&self.state).increments
    }

    pub fn load_count(&self) -> usize {
        lock(&self.state).load_count
    }

    pub fn release_count(&self) -> usize {
        lock(&self.state).release_count
    }

    pub fn listener_count(&self) -> usize {
        lock(&self.state).listeners.len()
    }
}
