//! Media Engine - chaptered playback engine for Folio
//!
//! Turns a multi-file audiobook into one continuous timeline on top of a
//! [`PlayerAdapter`], publishes [`MediaState`] snapshots and implements the
//! transport commands, including rewinding across chapter boundaries.

mod adapter;
mod chapters;
mod config;
pub mod diagnostics;
mod engine;
mod error;
mod oracle;
mod seek;
pub mod simulated;
mod state;
mod stream;

pub use adapter::{ChapterRef, PlaybackPhase, PlayerAdapter, PlayerEvent, PlayerListener};
pub use chapters::ChapterQueue;
pub use config::{EngineConfig, SeekIncrements};
pub use diagnostics::{DiagnosticsSink, LogDiagnostics, RecordingDiagnostics};
pub use engine::PlaybackEngine;
pub use error::{EngineError, EngineResult};
pub use oracle::{BookDurations, DurationOracle};
pub use seek::{cross_boundary_target, plan_seek_back, SeekBackPlan};
pub use simulated::{SimulatedPlayer, SimulatedPlayerHandle};
pub use state::{derive_media_state, AdapterSnapshot, MediaState};
pub use stream::StateStream;
