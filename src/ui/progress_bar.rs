use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;

/// How long a completed bar stays full before it is hidden.
pub const HIDE_DELAY: Duration = Duration::from_millis(500);

/// What a progress bar currently shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BarState {
    pub visible: bool,
    pub width: u8,
}

type Listener = Arc<dyn Fn(BarState) + Send + Sync>;

struct Inner {
    state: BarState,
    /// Bumped on every update so a stale hide timer can tell it lost.
    generation: u64,
}

/// Display model for one upload's progress bar.
///
/// Values below 100 show the bar at that width. 100 or more fills it, and
/// hides it again (width back to 0) after [`HIDE_DELAY`] unless another update
/// arrives first.
#[derive(Clone)]
pub struct ProgressBar {
    inner: Arc<Mutex<Inner>>,
    listener: Listener,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new(|_| {})
    }
}

impl ProgressBar {
    /// `on_change` sees every state the bar passes through, including the
    /// delayed hide.
    pub fn new(on_change: impl Fn(BarState) + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: BarState::default(),
                generation: 0,
            })),
            listener: Arc::new(on_change),
        }
    }

    pub fn state(&self) -> BarState {
        self.lock().state
    }

    /// Must be called from within a tokio runtime when `percent >= 100`.
    pub fn set(&self, percent: u8) {
        let (state, generation) = {
            let mut inner = self.lock();
            inner.generation += 1;
            if percent < 100 {
                inner.state = BarState {
                    visible: true,
                    width: percent,
                };
            } else {
                inner.state.width = 100;
            }
            (inner.state, inner.generation)
        };
        (self.listener)(state);

        if percent >= 100 {
            let bar = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(HIDE_DELAY).await;
                bar.hide_if_current(generation);
            });
        }
    }

    fn hide_if_current(&self, generation: u64) {
        let hidden = {
            let mut inner = self.lock();
            if inner.generation != generation {
                return;
            }
            inner.state = BarState::default();
            inner.state
        };
        (self.listener)(hidden);
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
