//! Trailing-edge debouncer for realtime refreshes
//!
//! Each [`Debouncer::trigger`] cancels the outstanding timer and starts a new
//! one. The action runs only after `delay` passes with no further trigger,
//! so a burst of N events becomes one refresh.

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Boxed async action run when the debounce window closes
pub type DebouncedAction = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceState {
    /// No timer pending
    Idle,
    /// Timer running; another trigger restarts it
    Pending,
    /// Terminal; triggers are ignored
    TornDown,
}

struct Inner {
    state: DebounceState,
    timer: Option<JoinHandle<()>>,
    generation: u64,
}

pub struct Debouncer {
    name: String,
    delay: Duration,
    inner: Arc<Mutex<Inner>>,
    action: DebouncedAction,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Debouncer {
    pub fn new<F, Fut>(name: &str, delay: Duration, action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self {
            name: name.to_string(),
            delay,
            inner: Arc::new(Mutex::new(Inner {
                state: DebounceState::Idle,
                timer: None,
                generation: 0,
            })),
            action: Arc::new(move || -> Pin<Box<dyn Future<Output = ()> + Send>> {
                Box::pin(action())
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> DebounceState {
        lock(&self.inner).state
    }

    /// Restart the window. Returns `false` once torn down or outside a runtime.
    pub fn trigger(&self) -> bool {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                log::warn!(
                    target: "opsdesk::realtime",
                    "[{}] refresh trigger outside of a tokio runtime ignored",
                    self.name
                );
                return false;
            }
        };

        let mut inner = lock(&self.inner);
        if inner.state == DebounceState::TornDown {
            return false;
        }

        if let Some(timer) = inner.timer.take() {
            timer.abort();
            log::debug!(target: "opsdesk::realtime", "[{}] debounce restarted", self.name);
        }

        inner.generation += 1;
        inner.state = DebounceState::Pending;

        let generation = inner.generation;
        let shared = Arc::clone(&self.inner);
        let action = Arc::clone(&self.action);
        let delay = self.delay;
        let name = self.name.clone();

        inner.timer = Some(runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut inner = lock(&shared);
                if inner.state != DebounceState::Pending || inner.generation != generation {
                    return;
                }
                inner.state = DebounceState::Idle;
                inner.timer = None;
            }
            log::debug!(target: "opsdesk::realtime", "[{}] debounced refresh firing", name);
            action().await;
        }));

        true
    }

    /// Cancel any pending timer and refuse further triggers
    pub fn teardown(&self) {
        let mut inner = lock(&self.inner);
        if inner.state == DebounceState::TornDown {
            return;
        }
        if let Some(timer) = inner.timer.take() {
            timer.abort();
        }
        inner.state = DebounceState::TornDown;
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("name", &self.name)
            .field("delay", &self.delay)
            .field("state", &self.state())
            .finish()
    }
}
