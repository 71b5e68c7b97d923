//! Latest-wins MediaState stream with position refresh while playing

use crate::state::MediaState;
use futures::Stream;
use std::sync::Weak;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};

/// Something that can recompute the current state on demand
pub(crate) trait StateSource: Send + Sync {
    /// Fresh state from the player, or `None` if the player is gone
    fn refresh(&self) -> Option<MediaState>;
}

enum Mode {
    /// Nothing emitted yet
    Pending,
    /// Waiting for the next published state
    Idle,
    /// Playing: re-deriving the state every period
    Ticking(Interval),
}

enum Wake {
    Published,
    Closed,
    Tick,
}

/// Stream of engine states
///
/// Emits the current state first. While the state is `Playing` it also emits a
/// freshly derived state every refresh period; any other state is emitted once
/// and the ticking stops. Only the newest published state is ever seen.
pub struct StateStream {
    rx: watch::Receiver<MediaState>,
    source: Weak<dyn StateSource>,
    period: Duration,
    mode: Mode,
}

impl StateStream {
    pub(crate) fn new(
        rx: watch::Receiver<MediaState>,
        source: Weak<dyn StateSource>,
        period: Duration,
    ) -> Self {
        Self {
            rx,
            source,
            period,
            mode: Mode::Pending,
        }
    }

    /// Waits for the next state; `None` once the engine is gone
    pub async fn next(&mut self) -> Option<MediaState> {
        loop {
            let wake = match &mut self.mode {
                Mode::Pending => Wake::Published,
                Mode::Idle => match self.rx.changed().await {
                    Ok(()) => Wake::Published,
                    Err(_) => Wake::Closed,
                },
                Mode::Ticking(interval) => {
                    tokio::select! {
                        changed = self.rx.changed() => match changed {
                            Ok(()) => Wake::Published,
                            Err(_) => Wake::Closed,
                        },
                        _ = interval.tick() => Wake::Tick,
                    }
                }
            };

            match wake {
                Wake::Published => {
                    let state = self.rx.borrow_and_update().clone();
                    return Some(self.enter(state));
                }
                Wake::Closed => return None,
                Wake::Tick => {
                    let source = self.source.upgrade()?;
                    match source.refresh() {
                        Some(state) if state.is_playing() => return Some(state),
                        // Left Playing: stop ticking, the published change follows
                        Some(_) | None => self.mode = Mode::Idle,
                    }
                }
            }
        }
    }

    /// Converts into a `futures::Stream`
    pub fn into_stream(self) -> impl Stream<Item = MediaState> + Send {
        futures::stream::unfold(self, |mut stream| async move {
            stream.next().await.map(|state| (state, stream))
        })
    }

    fn enter(&mut self, published: MediaState) -> MediaState {
        if !published.is_playing() {
            self.mode = Mode::Idle;
            return published;
        }

        let mut interval = time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.mode = Mode::Ticking(interval);

        self.source
            .upgrade()
            .and_then(|source| source.refresh())
            .filter(MediaState::is_playing)
            .unwrap_or(published)
    }
}
