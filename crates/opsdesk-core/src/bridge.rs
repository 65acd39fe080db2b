//! Realtime invalidation bridge
//!
//! Subscribes one handler to a fixed set of event names. Whatever event
//! fires, the handler only restarts the view's debouncer.

use crate::debounce::{DebounceState, Debouncer};
use crate::realtime::{EventHandler, HandlerId, RealtimeChannel};
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub struct RealtimeBridge {
    channel: Arc<dyn RealtimeChannel>,
    id: HandlerId,
    events: Vec<String>,
    debouncer: Arc<Debouncer>,
    detached: AtomicBool,
}

impl RealtimeBridge {
    /// Register the refresh handler for each of `events`
    pub fn attach(channel: Arc<dyn RealtimeChannel>, events: &[String], debouncer: Debouncer) -> Self {
        let debouncer = Arc::new(debouncer);
        let id = HandlerId::next();
        let events: Vec<String> = events
            .iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let trigger = Arc::clone(&debouncer);
        let handler: Arc<dyn EventHandler> = Arc::new(move |event: &str, _: &Value| {
            log::debug!(target: "opsdesk::realtime", "'{}' invalidates current page", event);
            trigger.trigger();
        });

        for event in &events {
            channel.subscribe(event, id, Arc::clone(&handler));
        }

        Self {
            channel,
            id,
            events,
            debouncer,
            detached: AtomicBool::new(false),
        }
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn debounce_state(&self) -> DebounceState {
        self.debouncer.state()
    }

    pub fn is_attached(&self) -> bool {
        !self.detached.load(Ordering::SeqCst)
    }

    /// Unsubscribe every event and cancel the pending refresh. Idempotent.
    pub fn detach(&self) {
        if self.detached.swap(true, Ordering::SeqCst) {
            return;
        }
        for event in &self.events {
            self.channel.unsubscribe(event, self.id);
        }
        self.debouncer.teardown();
    }
}

impl Drop for RealtimeBridge {
    fn drop(&mut self) {
        self.detach();
    }
}
