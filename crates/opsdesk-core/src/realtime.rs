//! Process-wide realtime hub
//!
//! The application shell owns the [`RealtimeHub`] and decides when it is
//! connected. List views only ever see it as an `Arc<dyn RealtimeChannel>`,
//! so they can subscribe and unsubscribe but never connect or disconnect.
//!
//! Subscriptions outlive the connection: handlers registered while
//! disconnected start receiving events once the hub connects.

use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Event the hub emits to its own subscribers when it connects
pub const CONNECT_EVENT: &str = "connect";

static NEXT_HANDLER_ID: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a registered handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn next() -> Self {
        HandlerId(NEXT_HANDLER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for HandlerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "handler#{}", self.0)
    }
}

/// Receives realtime events. The payload is opaque to list views.
pub trait EventHandler: Send + Sync {
    fn handle(&self, event: &str, payload: &Value);
}

impl<F> EventHandler for F
where
    F: Fn(&str, &Value) + Send + Sync,
{
    fn handle(&self, event: &str, payload: &Value) {
        self(event, payload)
    }
}

/// Subscribe/unsubscribe capability handed to list views
pub trait RealtimeChannel: Send + Sync {
    /// Register `handler` for `event` under `id`.
    ///
    /// Returns `false` when `(event, id)` was already registered; the
    /// existing registration is kept and no duplicate delivery is created.
    fn subscribe(&self, event: &str, id: HandlerId, handler: Arc<dyn EventHandler>) -> bool;

    /// Remove `(event, id)`. Returns `false` when it was not registered.
    fn unsubscribe(&self, event: &str, id: HandlerId) -> bool;
}

struct Connection {
    connected_at: DateTime<Utc>,
    token: String,
}

#[derive(Default)]
struct HubInner {
    connection: Option<Connection>,
    subscriptions: HashMap<String, BTreeMap<HandlerId, Arc<dyn EventHandler>>>,
}

/// Connection state and subscription counts, for health output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HubStatus {
    pub connected: bool,
    pub connected_at: Option<DateTime<Utc>>,
    pub subscriptions: BTreeMap<String, usize>,
}

#[derive(Default)]
pub struct RealtimeHub {
    inner: RwLock<HubInner>,
}

impl RealtimeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect with an operator token. Connecting twice is a no-op.
    ///
    /// Returns `Ok(true)` when a new connection was established.
    pub fn connect(&self, token: &str) -> CoreResult<bool> {
        if token.trim().is_empty() {
            return Err(CoreError::validation("token", "must not be empty"));
        }

        {
            let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
            if inner.connection.is_some() {
                log::debug!(target: "opsdesk::realtime", "already connected");
                return Ok(false);
            }
            inner.connection = Some(Connection {
                connected_at: Utc::now(),
                token: token.trim().to_string(),
            });
        }

        log::info!(target: "opsdesk::realtime", "realtime hub connected");
        self.emit(CONNECT_EVENT, &Value::Null);
        Ok(true)
    }

    /// Drop the connection. Subscriptions are kept. Idempotent.
    pub fn disconnect(&self) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.connection.take().is_some() {
            log::info!(target: "opsdesk::realtime", "realtime hub disconnected");
            true
        } else {
            false
        }
    }

    pub fn is_connected(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .connection
            .is_some()
    }

    /// Check the token an event publisher presents against the one the hub
    /// connected with
    pub fn authorize(&self, token: Option<&str>) -> CoreResult<()> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        let Some(connection) = inner.connection.as_ref() else {
            return Err(CoreError::NotConnected);
        };
        match token.map(str::trim) {
            Some(token) if !token.is_empty() && token == connection.token => Ok(()),
            _ => Err(CoreError::Unauthorized),
        }
    }

    /// Number of handlers registered for `event`
    pub fn handler_count(&self, event: &str) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .subscriptions
            .get(event)
            .map_or(0, BTreeMap::len)
    }

    pub fn status(&self) -> HubStatus {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        HubStatus {
            connected: inner.connection.is_some(),
            connected_at: inner.connection.as_ref().map(|c| c.connected_at),
            subscriptions: inner
                .subscriptions
                .iter()
                .map(|(event, handlers)| (event.clone(), handlers.len()))
                .collect(),
        }
    }

    /// Deliver an event to every handler registered for it.
    ///
    /// Events arriving while disconnected are dropped. A panicking handler is
    /// logged and skipped; the rest still run. Returns the number of handlers
    /// that completed.
    pub fn emit(&self, event: &str, payload: &Value) -> usize {
        let handlers: Vec<(HandlerId, Arc<dyn EventHandler>)> = {
            let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
            if inner.connection.is_none() {
                log::debug!(target: "opsdesk::realtime", "dropping '{}' while disconnected", event);
                return 0;
            }
            match inner.subscriptions.get(event) {
                Some(handlers) => handlers
                    .iter()
                    .map(|(id, handler)| (*id, Arc::clone(handler)))
                    .collect(),
                None => return 0,
            }
        };

        let mut delivered = 0;
        for (id, handler) in handlers {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(event, payload))) {
                Ok(()) => delivered += 1,
                Err(_) => log::error!(
                    target: "opsdesk::realtime",
                    "{} panicked while handling '{}'",
                    id,
                    event
                ),
            }
        }
        delivered
    }
}

impl RealtimeChannel for RealtimeHub {
    fn subscribe(&self, event: &str, id: HandlerId, handler: Arc<dyn EventHandler>) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let handlers = inner.subscriptions.entry(event.to_string()).or_default();
        if handlers.contains_key(&id) {
            return false;
        }
        handlers.insert(id, handler);
        log::debug!(target: "opsdesk::realtime", "{} subscribed to '{}'", id, event);
        true
    }

    fn unsubscribe(&self, event: &str, id: HandlerId) -> bool {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let Some(handlers) = inner.subscriptions.get_mut(event) else {
            return false;
        };
        let removed = handlers.remove(&id).is_some();
        if handlers.is_empty() {
            inner.subscriptions.remove(event);
        }
        if removed {
            log::debug!(target: "opsdesk::realtime", "{} unsubscribed from '{}'", id, event);
        }
        removed
    }
}

impl std::fmt::Debug for RealtimeHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeHub")
            .field("status", &self.status())
            .finish()
    }
}
