//! The fire path: `Armed → Fired → {Displayed, Rearmed, Cleared}`.

use std::sync::Arc;

use beacon_core::lifecycle::EventKind;
use beacon_core::NotificationId;
use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{debug, error, info};

use crate::builder::InstanceFactory;
use crate::registry::NotificationRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// No record: cancelled between arming and firing.
    NotFound,
    /// Neither builder could assemble the artifact.
    BuildFailed,
}

/// What one wake-up ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    Dropped(DropReason),
    /// Shown, not re-armed. `updated` is set for edit-driven fires.
    Displayed { updated: bool },
    /// Shown and re-armed for `next`, edit-driven or not.
    Rearmed { next: DateTime<Utc> },
}

/// Entry point for timer wake-ups and display callbacks.
pub struct TriggerPipeline {
    registry: Arc<NotificationRegistry>,
    factory: InstanceFactory,
}

impl TriggerPipeline {
    pub fn new(registry: Arc<NotificationRegistry>, factory: InstanceFactory) -> Self {
        Self { registry, factory }
    }

    pub fn registry(&self) -> &Arc<NotificationRegistry> {
        &self.registry
    }

    /// Handle a wake-up for `id` delivered now.
    pub fn on_trigger(&self, id: NotificationId, payload: Option<&Value>) -> TriggerOutcome {
        self.on_trigger_at(id, payload, Utc::now())
    }

    /// Handle a wake-up for `id` as if delivered at `now`.
    ///
    /// The persisted record is authoritative; `payload` is only logged. The
    /// registry's mutation lock is held throughout, so a cancel either
    /// completes before this lookup (fire dropped) or starts after the
    /// display and re-arm are done.
    pub fn on_trigger_at(
        &self,
        id: NotificationId,
        payload: Option<&Value>,
        now: DateTime<Utc>,
    ) -> TriggerOutcome {
        let guard = self.registry.lock_mutations();

        let Some(record) = self.registry.get(id) else {
            debug!(%id, "fire for unknown notification dropped");
            return TriggerOutcome::Dropped(DropReason::NotFound);
        };
        if let Some(payload) = payload {
            debug!(%id, %payload, "wake-up payload received");
        }

        let updated = record.is_update(now);
        let repeat = record.repeat();

        let instance = match self.factory.assemble(record, now) {
            Ok(instance) => instance,
            Err(e) => {
                error!(%id, error = %e, "cannot build notification; fire dropped");
                return TriggerOutcome::Dropped(DropReason::BuildFailed);
            }
        };

        self.registry.renderer().notify(id, instance.artifact());
        info!(%id, updated, path = ?instance.artifact().path, "notification displayed");

        let lifecycle = self.registry.lifecycle();
        lifecycle.emit(lifecycle.event(EventKind::Trigger, id, instance.options().to_value()));

        if repeat.is_none() {
            return TriggerOutcome::Displayed { updated };
        }

        // The timer has already consumed this wake-up. An edit-driven fire
        // keeps a still-future trigger; otherwise move to the next window.
        if updated {
            if let Some(at) = instance.options().requested_at().filter(|at| *at > now) {
                self.registry.timer().schedule(id, at, instance.options().to_value());
                debug!(%id, at = %at, "edited repeating notification kept armed");
                return TriggerOutcome::Rearmed { next: at };
            }
        }

        match self.registry.advance_trigger(&guard, id, now) {
            Ok(Some((next, record))) => {
                self.registry.timer().schedule(id, next, record.to_value());
                info!(%id, next = %next, "repeating notification re-armed");
                TriggerOutcome::Rearmed { next }
            }
            Ok(None) => TriggerOutcome::Displayed { updated },
            Err(e) => {
                error!(%id, error = %e, "failed to persist next trigger; repeat stopped");
                TriggerOutcome::Displayed { updated }
            }
        }
    }

    /// The user tapped the notification. With `autoClear` it is removed from
    /// the display; the record stays known until cancelled.
    pub fn on_clicked(&self, id: NotificationId) -> bool {
        match self.registry.get(id) {
            Some(record) if record.auto_clear() => self.registry.clear(id).is_some(),
            Some(_) => false,
            None => {
                debug!(%id, "click on unknown notification ignored");
                false
            }
        }
    }

    /// The platform reports the notification was swiped away.
    pub fn on_dismissed(&self, id: NotificationId) -> bool {
        self.registry.clear(id).is_some()
    }
}
