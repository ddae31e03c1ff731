use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use beacon_core::NotificationId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::platform::Timer;
use crate::trigger::{TriggerOutcome, TriggerPipeline};

struct Armed {
    at: DateTime<Utc>,
    payload: Value,
}

/// In-process stand-in for the OS alarm facility.
///
/// Keeps one pending wake-up per id and, while [`run`](Self::run) is active,
/// delivers due wake-ups to the trigger pipeline at tick precision.
#[derive(Default)]
pub struct TimerService {
    armed: Mutex<HashMap<NotificationId, Armed>>,
}

impl TimerService {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, HashMap<NotificationId, Armed>> {
        self.armed.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn armed_count(&self) -> usize {
        self.map().len()
    }

    /// When `id` is next due, if armed.
    pub fn due_at(&self, id: NotificationId) -> Option<DateTime<Utc>> {
        self.map().get(&id).map(|a| a.at)
    }

    /// Disarm and return every wake-up due at `now`, earliest first.
    pub fn take_due(&self, now: DateTime<Utc>) -> Vec<(NotificationId, Value)> {
        let mut map = self.map();
        let due_ids: Vec<NotificationId> = map
            .iter()
            .filter(|(_, a)| a.at <= now)
            .map(|(id, _)| *id)
            .collect();
        let mut due: Vec<(DateTime<Utc>, NotificationId, Value)> = due_ids
            .into_iter()
            .filter_map(|id| map.remove(&id).map(|a| (a.at, id, a.payload)))
            .collect();
        due.sort_by_key(|(at, id, _)| (*at, *id));
        due.into_iter().map(|(_, id, payload)| (id, payload)).collect()
    }

    /// Deliver everything due at `now`. The map lock is released before the
    /// pipeline runs, so re-arms from inside the fire land normally.
    pub fn fire_due(
        &self,
        pipeline: &TriggerPipeline,
        now: DateTime<Utc>,
    ) -> Vec<(NotificationId, TriggerOutcome)> {
        self.take_due(now)
            .into_iter()
            .map(|(id, payload)| (id, pipeline.on_trigger_at(id, Some(&payload), now)))
            .collect()
    }

    /// Main loop. Polls every `tick` until `shutdown` broadcasts `true`.
    pub async fn run(
        self: Arc<Self>,
        pipeline: Arc<TriggerPipeline>,
        tick: std::time::Duration,
        mut shutdown: watch::Receiver<bool>,
    ) {
        info!(tick_ms = tick.as_millis() as u64, "timer service started");
        let mut interval = tokio::time::interval(tick);
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    for (id, outcome) in self.fire_due(&pipeline, Utc::now()) {
                        debug!(%id, ?outcome, "wake-up processed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("timer service shutting down");
                        break;
                    }
                }
            }
        }
    }
}

impl Timer for TimerService {
    fn schedule(&self, id: NotificationId, at: DateTime<Utc>, payload: Value) {
        let replaced = self.map().insert(id, Armed { at, payload }).is_some();
        debug!(%id, at = %at, replaced, "wake-up armed");
    }

    fn cancel(&self, id: NotificationId) {
        if self.map().remove(&id).is_some() {
            debug!(%id, "wake-up disarmed");
        }
    }
}
