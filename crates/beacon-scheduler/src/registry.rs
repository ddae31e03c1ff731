use std::sync::{Arc, Mutex, MutexGuard};

use beacon_core::lifecycle::EventKind;
use beacon_core::{Lifecycle, NotificationId};
use beacon_store::KeyValueStore;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use crate::assets::AssetResolver;
use crate::error::{Result, SchedulerError};
use crate::options::{OptionRecord, KEY_AT, KEY_ID};
use crate::platform::{Renderer, Timer};
use crate::repository::NotificationRepository;

/// Proof that the registry-wide mutation lock is held.
pub struct MutationGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Summary of [`NotificationRegistry::restore`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RestoreReport {
    /// Wake-ups re-registered with the timer.
    pub armed: usize,
    /// Repeating records whose trigger had to be moved forward first.
    pub advanced: usize,
    /// One-shot records whose moment passed while nobody was listening.
    pub missed: usize,
}

/// Aggregate root over all persisted notifications.
///
/// The only component that writes to the store. Mutations are serialized by
/// one lock: each is a single-key read-modify-write, and a cancel can never
/// interleave with a re-arm of the same record.
pub struct NotificationRegistry {
    repo: NotificationRepository,
    assets: Arc<dyn AssetResolver>,
    renderer: Arc<dyn Renderer>,
    timer: Arc<dyn Timer>,
    lifecycle: Arc<Lifecycle>,
    mutations: Mutex<()>,
}

impl NotificationRegistry {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        assets: Arc<dyn AssetResolver>,
        renderer: Arc<dyn Renderer>,
        timer: Arc<dyn Timer>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            repo: NotificationRepository::new(store),
            assets,
            renderer,
            timer,
            lifecycle,
            mutations: Mutex::new(()),
        }
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn renderer(&self) -> &Arc<dyn Renderer> {
        &self.renderer
    }

    pub fn timer(&self) -> &Arc<dyn Timer> {
        &self.timer
    }

    /// Take the mutation lock. Held by the trigger pipeline for the whole
    /// of a fire so that lookup, display and re-arm see one consistent record.
    pub fn lock_mutations(&self) -> MutationGuard<'_> {
        MutationGuard {
            _guard: self.mutations.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    // --- reads ------------------------------------------------------------

    /// All persisted ids. Empty if the store cannot be read.
    pub fn list_ids(&self) -> Vec<NotificationId> {
        self.repo.ids().unwrap_or_else(|e| {
            error!(error = %e, "cannot list notification ids");
            Vec::new()
        })
    }

    /// Look up one record. Missing, corrupt and unreadable entries all come
    /// back as `None`.
    pub fn get(&self, id: NotificationId) -> Option<OptionRecord> {
        match self.repo.load(id) {
            Ok(Some(mut record)) => {
                record.normalize(self.assets.as_ref());
                Some(record)
            }
            Ok(None) => None,
            Err(e) => {
                error!(%id, error = %e, "cannot read notification");
                None
            }
        }
    }

    /// Records for `ids` in the given order, skipping those not found.
    pub fn get_many(&self, ids: &[NotificationId]) -> Vec<OptionRecord> {
        ids.iter().filter_map(|id| self.get(*id)).collect()
    }

    pub fn get_all(&self) -> Vec<OptionRecord> {
        self.get_many(&self.list_ids())
    }

    pub fn exists(&self, id: NotificationId) -> bool {
        self.get(id).is_some()
    }

    /// Option mappings of the records found for `ids`.
    pub fn properties_for(&self, ids: &[NotificationId]) -> Vec<Value> {
        self.get_many(ids)
            .into_iter()
            .map(|r| Value::Object(r.into_props()))
            .collect()
    }

    // --- mutations --------------------------------------------------------

    /// Create a notification, or update it in place if its id already exists.
    #[instrument(skip(self, props))]
    pub fn schedule(&self, props: Map<String, Value>) -> Result<OptionRecord> {
        let guard = self.lock_mutations();
        let now = Utc::now();
        let mut record = OptionRecord::from_map(props);
        let id = record.id();

        if self.repo.load(id)?.is_some() {
            debug!(%id, "id already scheduled; updating in place");
            let updates = record.into_props();
            return self
                .update_locked(&guard, id, updates, now)?
                .ok_or(SchedulerError::NotFound { id });
        }

        record.normalize(self.assets.as_ref());
        record.pin_trigger(now);
        self.repo.save(&record)?;

        let at = record.trigger_at(now);
        self.timer.schedule(id, at, record.to_value());
        info!(%id, at = %at, repeating = record.repeat().is_some(), "notification scheduled");
        self.emit(EventKind::Schedule, &record);
        Ok(record)
    }

    /// Merge `updates` over an existing record and re-arm it.
    ///
    /// Returns `None` (and does nothing) if `id` is unknown.
    #[instrument(skip(self, updates))]
    pub fn update(&self, id: NotificationId, updates: Map<String, Value>) -> Result<Option<OptionRecord>> {
        let guard = self.lock_mutations();
        self.update_locked(&guard, id, updates, Utc::now())
    }

    fn update_locked(
        &self,
        _guard: &MutationGuard<'_>,
        id: NotificationId,
        mut updates: Map<String, Value>,
        now: DateTime<Utc>,
    ) -> Result<Option<OptionRecord>> {
        let Some(mut record) = self.repo.load(id)? else {
            debug!(%id, "update of unknown notification ignored");
            return Ok(None);
        };

        // The id is the key; an update must never move a record.
        updates.insert(KEY_ID.into(), Value::from(id.get()));
        let retimed = updates.contains_key(KEY_AT);
        record.merge(updates);
        record.stamp_updated(now);
        record.normalize(self.assets.as_ref());
        if retimed {
            record.pin_trigger(now);
        }
        self.repo.save(&record)?;

        // Re-arming at the (possibly past) trigger refreshes the display
        // immediately; the pipeline sees the fresh `updatedAt` and re-arms a
        // repeat from there.
        let at = record.trigger_at(now);
        self.timer.schedule(id, at, record.to_value());
        info!(%id, at = %at, "notification updated");
        self.emit(EventKind::Update, &record);
        Ok(Some(record))
    }

    /// Remove a notification entirely: display, store entry and wake-up.
    ///
    /// Idempotent; unknown ids return `None`.
    #[instrument(skip(self))]
    pub fn cancel(&self, id: NotificationId) -> Result<Option<OptionRecord>> {
        let guard = self.lock_mutations();
        self.cancel_locked(&guard, id)
    }

    fn cancel_locked(&self, _guard: &MutationGuard<'_>, id: NotificationId) -> Result<Option<OptionRecord>> {
        let Some(record) = self.repo.load(id)? else {
            debug!(%id, "cancel of unknown notification is a no-op");
            return Ok(None);
        };
        self.renderer.cancel(id);
        self.repo.remove(id)?;
        self.timer.cancel(id);
        info!(%id, "notification cancelled");
        self.emit(EventKind::Cancel, &record);
        Ok(Some(record))
    }

    /// Dismiss a notification from the display only. The record stays
    /// persisted and any pending wake-up stays armed.
    #[instrument(skip(self))]
    pub fn clear(&self, id: NotificationId) -> Option<OptionRecord> {
        let record = self.get(id)?;
        self.renderer.cancel(id);
        debug!(%id, "notification cleared from display");
        self.emit(EventKind::Clear, &record);
        Some(record)
    }

    pub fn cancel_all(&self) -> Result<Vec<OptionRecord>> {
        let guard = self.lock_mutations();
        let mut removed = Vec::new();
        for id in self.list_ids() {
            if let Some(record) = self.cancel_locked(&guard, id)? {
                removed.push(record);
            }
        }
        info!(count = removed.len(), "all notifications cancelled");
        Ok(removed)
    }

    pub fn clear_all(&self) -> Vec<OptionRecord> {
        self.list_ids()
            .into_iter()
            .filter_map(|id| self.clear(id))
            .collect()
    }

    /// Move a repeating record's trigger to its next occurrence after `now`.
    ///
    /// Returns the new trigger and the updated record, or `None` if the
    /// record is gone (cancelled) or does not repeat. A store failure is
    /// returned to the caller; the record keeps its old trigger.
    pub fn advance_trigger(
        &self,
        _guard: &MutationGuard<'_>,
        id: NotificationId,
        now: DateTime<Utc>,
    ) -> Result<Option<(DateTime<Utc>, OptionRecord)>> {
        let Some(mut record) = self.repo.load(id)? else {
            return Ok(None);
        };
        let Some(repeat) = record.repeat() else {
            return Ok(None);
        };
        let original = record.requested_at().unwrap_or(now);
        let Some(next) = repeat.next_after(original, now) else {
            warn!(%id, ?repeat, "repeat interval overflowed; not re-arming");
            return Ok(None);
        };
        record.set_trigger(next);
        self.repo.save(&record)?;
        Ok(Some((next, record)))
    }

    /// Re-register wake-ups after a process or device restart.
    ///
    /// Future triggers are armed as-is. Repeating records whose trigger has
    /// passed are moved to their next occurrence first. One-shot records in
    /// the past are left alone as history.
    #[instrument(skip(self))]
    pub fn restore(&self, now: DateTime<Utc>) -> Result<RestoreReport> {
        let guard = self.lock_mutations();
        let mut report = RestoreReport::default();

        for id in self.list_ids() {
            let Some(mut record) = self.get(id) else {
                continue;
            };
            let at = record.requested_at().unwrap_or(now);

            let at = if at < now {
                match record.repeat() {
                    Some(_) => match self.advance_trigger(&guard, id, now)? {
                        Some((next, updated)) => {
                            record = updated;
                            report.advanced += 1;
                            next
                        }
                        None => continue,
                    },
                    None => {
                        report.missed += 1;
                        continue;
                    }
                }
            } else {
                at
            };

            self.timer.schedule(id, at, record.to_value());
            report.armed += 1;
        }

        if report.missed > 0 {
            warn!(count = report.missed, "one-shot notifications missed while offline");
        }
        info!(armed = report.armed, advanced = report.advanced, "wake-ups restored");
        Ok(report)
    }

    fn emit(&self, kind: EventKind, record: &OptionRecord) {
        let event = self.lifecycle.event(kind, record.id(), record.to_value());
        self.lifecycle.emit(event);
    }
}
