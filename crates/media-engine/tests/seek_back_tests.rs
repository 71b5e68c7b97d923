//! Rewind behavior around chapter boundaries

use async_trait::async_trait;
use folio_core::{Audiobook, BookId, Chapter, Duration};
use folio_media_engine::diagnostics::events;
use folio_media_engine::{
    BookDurations, ChapterRef, DurationOracle, EngineConfig, MediaState, PlaybackEngine,
    PlayerAdapter, RecordingDiagnostics, SimulatedPlayer, SimulatedPlayerHandle,
};
use std::sync::Arc;
use tokio::sync::Notify;

struct Harness {
    engine: PlaybackEngine<SimulatedPlayer>,
    player: SimulatedPlayerHandle,
    diagnostics: Arc<RecordingDiagnostics>,
}

async fn harness(player: SimulatedPlayer, oracle: Arc<dyn DurationOracle>) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();
    let handle = player.handle();
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let engine = PlaybackEngine::new(
        async move { Ok(player) },
        oracle,
        diagnostics.clone(),
        EngineConfig::default(),
    )
    .expect("runtime available");

    engine
        .subscribe()
        .wait_for(|state| *state != MediaState::Initializing)
        .await
        .expect("engine alive");

    Harness {
        engine,
        player: handle,
        diagnostics,
    }
}

fn book() -> Audiobook {
    Audiobook::new(
        "book",
        "Book",
        vec![
            Chapter::with_duration("01.mp3", Duration::from_millis(90_000)),
            Chapter::with_duration("02.mp3", Duration::from_millis(120_000)),
        ],
    )
}

/// Harness with the book loaded at `(chapter, position)` and every duration known
async fn playing_at(chapter: &str, position_ms: u64) -> Harness {
    let book = book();
    let oracle = Arc::new(BookDurations::from_books([&book]));
    let h = harness(SimulatedPlayer::new(), oracle).await;
    h.engine
        .play(&book.with_position(chapter, Duration::from_millis(position_ms)));
    h
}

fn location(player: &SimulatedPlayerHandle) -> (Option<usize>, u64) {
    (player.current_index(), player.position_ms())
}

#[tokio::test]
async fn test_far_from_start_rewinds_within_chapter() {
    let h = playing_at("02.mp3", 50_000).await;
    assert!(h.engine.seek_back().is_none());
    assert_eq!(location(&h.player), (Some(1), 20_000));
}

#[tokio::test]
async fn test_near_start_snaps_to_chapter_start() {
    for position in [40_000, 20_000, 15_000] {
        let h = playing_at("02.mp3", position).await;
        assert!(h.engine.seek_back().is_none());
        assert_eq!(location(&h.player), (Some(1), 0), "from {}", position);
    }
}

#[tokio::test]
async fn test_crosses_into_previous_chapter() {
    let h = playing_at("02.mp3", 10_000).await;

    let lookup = h.engine.seek_back().expect("duration lookup started");
    lookup.await.expect("lookup task");

    assert_eq!(location(&h.player), (Some(0), 70_000));
    assert!(h.diagnostics.reports().is_empty());
}

#[tokio::test]
async fn test_cross_target_clamps_to_previous_start() {
    let book = Audiobook::new(
        "short",
        "Short",
        vec![
            Chapter::with_duration("a.mp3", Duration::from_millis(5_000)),
            Chapter::with_duration("b.mp3", Duration::from_millis(60_000)),
        ],
    );
    let oracle = Arc::new(BookDurations::from_books([&book]));
    let h = harness(SimulatedPlayer::new(), oracle).await;
    h.engine.play(&book.with_position("b.mp3", Duration::ZERO));

    let lookup = h.engine.seek_back().expect("duration lookup started");
    lookup.await.expect("lookup task");

    assert_eq!(location(&h.player), (Some(0), 0));
}

#[tokio::test]
async fn test_first_chapter_clamps_to_start() {
    let h = playing_at("01.mp3", 5_000).await;
    assert!(h.engine.seek_back().is_none());
    assert_eq!(location(&h.player), (Some(0), 0));
    assert!(h.diagnostics.reports().is_empty());
}

#[tokio::test]
async fn test_unknown_previous_duration_is_reported_noop() {
    let h = harness(SimulatedPlayer::new(), Arc::new(BookDurations::new())).await;
    h.engine
        .play(&book().with_position("02.mp3", Duration::from_millis(10_000)));
    let before = h
        .engine
        .subscribe()
        .wait_for(MediaState::is_playing)
        .await
        .expect("engine alive")
        .clone();

    let lookup = h.engine.seek_back().expect("duration lookup started");
    lookup.await.expect("lookup task");

    assert_eq!(location(&h.player), (Some(1), 10_000));
    assert_eq!(h.engine.current_state(), before);

    let reports = h.diagnostics.named(events::SEEK_BACK_UNRESOLVED);
    assert_eq!(reports.len(), 1);
    let context = &reports[0].context;
    assert_eq!(context["book_id"], "book");
    assert_eq!(context["chapter_index"], "1");
    assert_eq!(context["position_ms"], "10000");
    assert_eq!(context["target_ms"], "-20000");
    assert_eq!(context["reason"], "previous_duration_unknown");
}

#[tokio::test]
async fn test_unknown_book_is_reported_noop() {
    let mut player = SimulatedPlayer::new();
    player.load_chapters(vec![ChapterRef::new("01.mp3"), ChapterRef::new("02.mp3")]);
    player.seek_to(1, 10_000);

    let h = harness(player, Arc::new(BookDurations::from_books([&book()]))).await;
    assert_eq!(h.engine.last_played_book_id(), None);

    assert!(h.engine.seek_back().is_none());
    assert_eq!(location(&h.player), (Some(1), 10_000));

    let reports = h.diagnostics.named(events::SEEK_BACK_UNRESOLVED);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context["reason"], "book_unknown");
}

/// Oracle that answers only once released
struct GatedOracle {
    gate: Notify,
    inner: BookDurations,
}

#[async_trait]
impl DurationOracle for GatedOracle {
    async fn chapter_duration(&self, book_id: &BookId, chapter_index: usize) -> Option<Duration> {
        self.gate.notified().await;
        self.inner.chapter_duration(book_id, chapter_index).await
    }
}

#[tokio::test]
async fn test_stop_supersedes_pending_lookup() {
    let oracle = Arc::new(GatedOracle {
        gate: Notify::new(),
        inner: BookDurations::from_books([&book()]),
    });
    let h = harness(SimulatedPlayer::new(), oracle.clone()).await;
    h.engine
        .play(&book().with_position("02.mp3", Duration::from_millis(10_000)));

    let lookup = h.engine.seek_back().expect("duration lookup started");
    h.engine.stop();
    oracle.gate.notify_one();
    lookup.await.expect("lookup task");

    assert_eq!(location(&h.player), (Some(1), 10_000));
    assert_eq!(h.diagnostics.named(events::SEEK_BACK_SUPERSEDED).len(), 1);
}

#[tokio::test]
async fn test_chapter_change_supersedes_pending_lookup() {
    let oracle = Arc::new(GatedOracle {
        gate: Notify::new(),
        inner: BookDurations::from_books([&book()]),
    });
    let h = harness(SimulatedPlayer::new(), oracle.clone()).await;
    h.engine
        .play(&book().with_position("02.mp3", Duration::from_millis(10_000)));

    let lookup = h.engine.seek_back().expect("duration lookup started");
    h.player.seek_to(0, 0);
    oracle.gate.notify_one();
    lookup.await.expect("lookup task");

    assert_eq!(location(&h.player), (Some(0), 0));
    let reports = h.diagnostics.named(events::SEEK_BACK_SUPERSEDED);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].context["reason"], "chapter_changed");
}

#[tokio::test]
async fn test_rewind_after_shutdown_does_nothing() {
    let h = playing_at("02.mp3", 10_000).await;
    h.engine.shutdown();
    assert!(h.engine.seek_back().is_none());
    assert!(h.diagnostics.reports().is_empty());
}
