//! Core playback engine: transport commands over an exclusively owned player

use crate::adapter::{PlayerAdapter, PlayerEvent};
use crate::chapters::ChapterQueue;
use crate::config::EngineConfig;
use crate::diagnostics::{context, events, DiagnosticsSink};
use crate::oracle::DurationOracle;
use crate::seek::{cross_boundary_target, plan_seek_back, SeekBackPlan};
use crate::state::{derive_media_state, AdapterSnapshot, MediaState};
use crate::stream::{StateSource, StateStream};
use crate::{EngineError, EngineResult};
use folio_core::{Audiobook, BookId};
use log::{debug, error, info, warn};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

enum AdapterSlot<A> {
    NotReady,
    Ready(A),
    Released,
}

struct Shared<A> {
    slot: Mutex<AdapterSlot<A>>,
    state_tx: watch::Sender<MediaState>,
    last_played_book: Mutex<Option<BookId>>,
    /// Bumped by every play and stop
    generation: AtomicU64,
    config: EngineConfig,
    oracle: Arc<dyn DurationOracle>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

/// A rewind into the previous chapter waiting for its duration
struct PendingCrossing {
    book_id: BookId,
    generation: u64,
    current_index: usize,
    previous_index: usize,
    position_ms: u64,
    overshoot_ms: u64,
}

impl PendingCrossing {
    fn report(&self, diagnostics: &dyn DiagnosticsSink, event: &str, reason: &str) {
        diagnostics.report(
            event,
            context([
                ("book_id", self.book_id.to_string()),
                ("chapter_index", self.current_index.to_string()),
                ("position_ms", self.position_ms.to_string()),
                ("target_ms", format!("-{}", self.overshoot_ms)),
                ("reason", reason.to_string()),
            ]),
        );
    }
}

impl<A: PlayerAdapter> Shared<A> {
    /// Runs `op` against the player if it is ready
    fn with_adapter<R>(&self, op: &str, f: impl FnOnce(&mut A) -> R) -> EngineResult<R> {
        let mut slot = lock(&self.slot);
        match &mut *slot {
            AdapterSlot::Ready(adapter) => Ok(f(adapter)),
            AdapterSlot::NotReady => {
                debug!("{} ignored: player not ready", op);
                Err(EngineError::NotReady)
            }
            AdapterSlot::Released => {
                debug!("{} ignored: engine shut down", op);
                Err(EngineError::ShutDown)
            }
        }
    }

    fn current_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, state: MediaState) {
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                debug!("state -> {:?}", state);
                *current = state;
                true
            }
        });
    }

    fn publish_from_adapter(&self) {
        if let Ok(state) = self.with_adapter("refresh", |adapter| {
            derive_media_state(&AdapterSnapshot::capture(&*adapter))
        }) {
            self.publish(state);
        }
    }

    /// Takes ownership of a freshly acquired player
    ///
    /// Returns false if the engine was shut down meanwhile; the player is
    /// released right away in that case.
    fn install(&self, mut adapter: A, events: mpsc::UnboundedSender<PlayerEvent>) -> bool {
        let mut slot = lock(&self.slot);
        if matches!(*slot, AdapterSlot::NotReady) {
            adapter.set_seek_increments(self.config.seek_increments());
            adapter.add_listener(Box::new(move |event| {
                let _ = events.send(event);
            }));
            *slot = AdapterSlot::Ready(adapter);
            info!("Player acquired");
            return true;
        }

        let shut_down = matches!(*slot, AdapterSlot::Released);
        drop(slot);
        adapter.release();
        if shut_down {
            info!("Player arrived after shutdown, released");
        } else {
            warn!("Second player acquired, released");
        }
        false
    }

    fn handle_event(&self, event: PlayerEvent) {
        match event {
            PlayerEvent::PlaybackStateChanged(_) | PlayerEvent::PlayWhenReadyChanged(_) => {
                self.publish_from_adapter();
            }
            PlayerEvent::Error(message) => {
                let error = EngineError::Player(message);
                warn!("{}", error);
                let state = self.state_tx.borrow().clone();
                let book_id = lock(&self.last_played_book)
                    .as_ref()
                    .map_or_else(|| "unknown".to_string(), BookId::to_string);
                let (chapter_index, position_ms) = self
                    .with_adapter("report error", |adapter| {
                        (adapter.current_item_index(), adapter.current_position_ms())
                    })
                    .unwrap_or((None, 0));
                self.diagnostics.report(
                    events::PLAYER_ERROR,
                    context([
                        ("message", error.to_string()),
                        ("state", format!("{:?}", state)),
                        ("book_id", book_id),
                        (
                            "chapter_index",
                            chapter_index.map_or_else(|| "none".to_string(), |i| i.to_string()),
                        ),
                        ("position_ms", position_ms.to_string()),
                    ]),
                );
            }
        }
    }

    async fn finish_crossing(&self, crossing: PendingCrossing) {
        let duration = self
            .oracle
            .chapter_duration(&crossing.book_id, crossing.previous_index)
            .await;

        let Some(duration) = duration else {
            warn!(
                "seek back into chapter {} of {} unresolved: duration unknown",
                crossing.previous_index, crossing.book_id
            );
            crossing.report(
                self.diagnostics.as_ref(),
                events::SEEK_BACK_UNRESOLVED,
                "previous_duration_unknown",
            );
            return;
        };

        if self.current_generation() != crossing.generation {
            debug!("seek back superseded by a newer command");
            crossing.report(
                self.diagnostics.as_ref(),
                events::SEEK_BACK_SUPERSEDED,
                "generation_changed",
            );
            return;
        }

        let target_ms = cross_boundary_target(duration.as_millis(), crossing.overshoot_ms);
        let seeked = self.with_adapter("seek_back", |adapter| {
            if adapter.current_item_index() == Some(crossing.current_index) {
                adapter.seek_to(crossing.previous_index, target_ms);
                true
            } else {
                false
            }
        });

        match seeked {
            Ok(true) => debug!(
                "seek back crossed into chapter {} at {} ms",
                crossing.previous_index, target_ms
            ),
            Ok(false) => crossing.report(
                self.diagnostics.as_ref(),
                events::SEEK_BACK_SUPERSEDED,
                "chapter_changed",
            ),
            Err(_) => {}
        }
    }
}

impl<A: PlayerAdapter> StateSource for Shared<A> {
    fn refresh(&self) -> Option<MediaState> {
        let mut slot = lock(&self.slot);
        match &mut *slot {
            AdapterSlot::Ready(adapter) => {
                Some(derive_media_state(&AdapterSnapshot::capture(&*adapter)))
            }
            _ => None,
        }
    }
}

async fn run_worker<A, F>(shared: Arc<Shared<A>>, acquire: F)
where
    A: PlayerAdapter,
    F: Future<Output = EngineResult<A>>,
{
    let adapter = match acquire.await {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("Failed to acquire player: {}", e);
            shared
                .diagnostics
                .report(events::ADAPTER_UNAVAILABLE, context([("error", e)]));
            return;
        }
    };

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    if !shared.install(adapter, events_tx) {
        return;
    }
    shared.publish_from_adapter();

    while let Some(event) = events_rx.recv().await {
        shared.handle_event(event);
    }
    debug!("Player event channel closed");
}

/// Chaptered playback engine
///
/// Owns one player, acquired asynchronously at construction. Until the
/// player arrives the state is [`MediaState::Initializing`] and every
/// command is a no-op. Commands never fail from the caller's point of view;
/// their effects show up on the [`StateStream`].
///
/// Commands are meant to be issued from a single task. The engine does its
/// own background work (acquisition, event handling, duration lookups) on
/// the tokio runtime it was created in.
pub struct PlaybackEngine<A: PlayerAdapter> {
    shared: Arc<Shared<A>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    runtime: Handle,
}

impl<A: PlayerAdapter> PlaybackEngine<A> {
    /// Creates the engine and starts acquiring the player
    ///
    /// Must be called from within a tokio runtime.
    pub fn new<F>(
        acquire: F,
        oracle: Arc<dyn DurationOracle>,
        diagnostics: Arc<dyn DiagnosticsSink>,
        config: EngineConfig,
    ) -> EngineResult<Self>
    where
        F: Future<Output = EngineResult<A>> + Send + 'static,
    {
        let runtime = Handle::try_current().map_err(|_| EngineError::NoRuntime)?;
        let (state_tx, _) = watch::channel(MediaState::Initializing);

        let shared = Arc::new(Shared {
            slot: Mutex::new(AdapterSlot::NotReady),
            state_tx,
            last_played_book: Mutex::new(None),
            generation: AtomicU64::new(0),
            config,
            oracle,
            diagnostics,
        });

        let worker = runtime.spawn(run_worker(Arc::clone(&shared), acquire));

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
            runtime,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.shared.config
    }

    /// Latest published state
    pub fn current_state(&self) -> MediaState {
        self.shared.state_tx.borrow().clone()
    }

    /// Raw published states, without position refresh
    pub fn subscribe(&self) -> watch::Receiver<MediaState> {
        self.shared.state_tx.subscribe()
    }

    /// States for display, refreshed periodically while playing
    pub fn state_stream(&self) -> StateStream {
        let source: Weak<dyn StateSource> = Arc::downgrade(&self.shared) as Weak<dyn StateSource>;
        StateStream::new(
            self.shared.state_tx.subscribe(),
            source,
            self.shared.config.position_refresh(),
        )
    }

    pub fn last_played_book_id(&self) -> Option<BookId> {
        lock(&self.shared.last_played_book).clone()
    }

    /// Loads `book` and starts playing it from its stored position
    pub fn play(&self, book: &Audiobook) {
        debug!("play {} ({} chapters)", book.id, book.chapters.len());
        self.shared.next_generation();

        let ChapterQueue {
            title,
            chapters,
            start_index,
            start_offset_ms,
        } = ChapterQueue::for_book(book, self.shared.config.rewind_on_resume_ms);

        let result = self.shared.with_adapter("play", |adapter| {
            adapter.stop();
            adapter.set_playlist_title(&title);
            adapter.load_chapters(chapters);
            adapter.seek_to(start_index, start_offset_ms);
            adapter.set_play_when_ready(true);
            adapter.prepare();
        });

        match result {
            Ok(()) => {
                *lock(&self.shared.last_played_book) = Some(book.id.clone());
            }
            Err(EngineError::NotReady) => {
                warn!("play {} dropped: player not ready", book.id);
                self.shared.diagnostics.report(
                    events::PLAY_DROPPED_NOT_READY,
                    context([("book_id", &book.id)]),
                );
            }
            Err(_) => {}
        }
    }

    pub fn stop(&self) {
        debug!("stop");
        self.shared.next_generation();
        let _ = self.shared.with_adapter("stop", |adapter| {
            adapter.set_play_when_ready(false);
            adapter.stop();
        });
    }

    pub fn seek_forward(&self) {
        debug!("seek_forward");
        let _ = self
            .shared
            .with_adapter("seek_forward", |adapter| adapter.seek_forward());
    }

    /// Next chapter, or the end of the last one
    pub fn seek_next(&self) {
        debug!("seek_next");
        let _ = self.shared.with_adapter("seek_next", |adapter| {
            if adapter.has_next_item() {
                adapter.seek_to_next_item();
                return;
            }
            match (adapter.current_item_index(), adapter.current_item_duration_ms()) {
                (Some(index), Some(duration_ms)) => adapter.seek_to(index, duration_ms),
                _ => debug!("seek_next at last chapter ignored: duration unknown"),
            }
        });
    }

    pub fn seek_previous(&self) {
        debug!("seek_previous");
        let _ = self
            .shared
            .with_adapter("seek_previous", |adapter| adapter.seek_to_previous_item());
    }

    /// Rewinds by the configured increment, crossing into the previous chapter
    ///
    /// A rewind past the start of a chapter lands the same distance before the
    /// end of the previous chapter. That needs the previous chapter's duration,
    /// so the seek finishes on a spawned task whose handle is returned. If the
    /// duration is unknown nothing happens and `seek_back_unresolved` is
    /// reported. A play or stop issued before the lookup finishes cancels the
    /// seek.
    pub fn seek_back(&self) -> Option<JoinHandle<()>> {
        debug!("seek_back");
        let increment_ms = self.shared.config.seek_back_increment_ms;
        let generation = self.shared.current_generation();

        let planned = self.shared.with_adapter("seek_back", |adapter| {
            let position_ms = adapter.current_position_ms();
            let current_index = adapter.current_item_index();
            let plan = plan_seek_back(position_ms, current_index, increment_ms);
            match plan {
                SeekBackPlan::RestartChapter => adapter.seek_to_default_position(),
                SeekBackPlan::WithinChapter | SeekBackPlan::ClampToStart => adapter.seek_back(),
                SeekBackPlan::CrossBoundary { .. } => {}
            }
            (plan, position_ms)
        });

        let (previous_index, overshoot_ms, position_ms) = match planned {
            Ok((
                SeekBackPlan::CrossBoundary {
                    previous_index,
                    overshoot_ms,
                },
                position_ms,
            )) => (previous_index, overshoot_ms, position_ms),
            _ => return None,
        };

        let Some(book_id) = self.last_played_book_id() else {
            warn!("seek back into chapter {} unresolved: no book played", previous_index);
            self.shared.diagnostics.report(
                events::SEEK_BACK_UNRESOLVED,
                context([
                    ("book_id", "unknown".to_string()),
                    ("chapter_index", (previous_index + 1).to_string()),
                    ("position_ms", position_ms.to_string()),
                    ("target_ms", format!("-{}", overshoot_ms)),
                    ("reason", "book_unknown".to_string()),
                ]),
            );
            return None;
        };

        let crossing = PendingCrossing {
            book_id,
            generation,
            current_index: previous_index + 1,
            previous_index,
            position_ms,
            overshoot_ms,
        };
        let shared = Arc::clone(&self.shared);
        Some(
            self.runtime
                .spawn(async move { shared.finish_crossing(crossing).await }),
        )
    }

    /// Releases the player; every later command is a no-op
    ///
    /// Safe to call repeatedly. If the player has not arrived yet it is
    /// released as soon as it does.
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *lock(&self.shared.slot), AdapterSlot::Released);
        match previous {
            AdapterSlot::Ready(mut adapter) => {
                adapter.release();
                if let Some(worker) = lock(&self.worker).take() {
                    worker.abort();
                }
                info!("Playback engine shut down, player released");
            }
            AdapterSlot::NotReady => {
                info!("Playback engine shut down before the player arrived");
            }
            AdapterSlot::Released => debug!("shutdown ignored: already shut down"),
        }
    }
}

impl<A: PlayerAdapter> Drop for PlaybackEngine<A> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
