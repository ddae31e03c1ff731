//! Seams to the platform: the notification renderer and the OS timer.

use beacon_core::NotificationId;
use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::instance::DisplayArtifact;

/// The system notification surface.
///
/// Both calls are idempotent: notifying an id that is already shown replaces
/// it, cancelling an id that is not shown does nothing.
pub trait Renderer: Send + Sync {
    fn notify(&self, id: NotificationId, artifact: &DisplayArtifact);

    fn cancel(&self, id: NotificationId);
}

/// One-shot wake-ups that invoke the trigger pipeline.
///
/// At most one wake-up exists per id: scheduling an id that is already armed
/// replaces the earlier wake-up.
pub trait Timer: Send + Sync {
    fn schedule(&self, id: NotificationId, at: DateTime<Utc>, payload: Value);

    fn cancel(&self, id: NotificationId);
}
