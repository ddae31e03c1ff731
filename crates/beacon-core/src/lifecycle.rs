//! Process lifecycle: readiness flag, foreground/background state and a
//! bounded queue of events raised before the host was ready to receive them.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::NotificationId;

/// Whether the host application is currently visible to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppState {
    Foreground,
    Background,
}

/// Lifecycle transitions reported back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Schedule,
    Update,
    Trigger,
    Clear,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event: EventKind,
    pub id: NotificationId,
    pub state: AppState,
    /// Option mapping of the notification at the time of the event.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub notification: serde_json::Value,
}

/// Receiver of lifecycle events once the host is ready (e.g. a web view).
///
/// Called while the registry's mutation lock may be held: implementations
/// must hand the event off rather than call back into the registry.
pub trait EventSink: Send + Sync {
    fn deliver(&self, event: &NotificationEvent);
}

struct LifecycleState {
    ready: bool,
    in_background: bool,
    queue: VecDeque<NotificationEvent>,
    sink: Option<Arc<dyn EventSink>>,
}

/// Owned replacement for ambient "device ready" globals.
///
/// Shared by `Arc` between the registry, the trigger pipeline and whatever
/// drives the host's resume/pause callbacks.
pub struct Lifecycle {
    capacity: usize,
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            state: Mutex::new(LifecycleState {
                ready: false,
                in_background: true,
                queue: VecDeque::new(),
                sink: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LifecycleState> {
        // A panicked holder cannot leave this state half-written.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build an event stamped with the current application state.
    pub fn event(
        &self,
        event: EventKind,
        id: NotificationId,
        notification: serde_json::Value,
    ) -> NotificationEvent {
        NotificationEvent {
            event,
            id,
            state: self.app_state(),
            notification,
        }
    }

    /// Deliver `event` now if the host is ready, otherwise queue it.
    pub fn emit(&self, event: NotificationEvent) {
        let sink = {
            let mut st = self.lock();
            match (st.ready, st.sink.clone()) {
                (true, Some(sink)) => sink,
                _ => {
                    if st.queue.len() >= self.capacity {
                        if let Some(dropped) = st.queue.pop_front() {
                            warn!(id = %dropped.id, event = ?dropped.event, "event queue full, dropping oldest event");
                        }
                    }
                    debug!(id = %event.id, event = ?event.event, "host not ready, queueing event");
                    st.queue.push_back(event);
                    return;
                }
            }
        };
        sink.deliver(&event);
    }

    /// Host signalled readiness: attach `sink` and flush queued events in order.
    pub fn mark_ready(&self, sink: Arc<dyn EventSink>) {
        let pending: Vec<NotificationEvent> = {
            let mut st = self.lock();
            st.ready = true;
            st.in_background = false;
            st.sink = Some(sink.clone());
            st.queue.drain(..).collect()
        };
        debug!(count = pending.len(), "host ready, flushing queued events");
        for event in &pending {
            sink.deliver(event);
        }
    }

    pub fn on_resume(&self) {
        self.lock().in_background = false;
    }

    pub fn on_pause(&self) {
        self.lock().in_background = true;
    }

    pub fn is_ready(&self) -> bool {
        self.lock().ready
    }

    pub fn app_state(&self) -> AppState {
        if self.lock().in_background {
            AppState::Background
        } else {
            AppState::Foreground
        }
    }

    /// Number of events waiting for the host.
    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_EVENT_QUEUE_CAPACITY)
    }
}
