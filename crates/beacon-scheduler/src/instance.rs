use beacon_core::NotificationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::options::{NotificationAction, OptionRecord};

/// Which construction path produced an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildPath {
    /// Mutable builder API on current platforms.
    Builder,
    /// Immutable notification object on old platforms.
    Legacy,
}

/// Everything the platform renderer needs to show one notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayArtifact {
    pub id: NotificationId,
    pub title: String,
    pub text: String,
    pub icon: String,
    pub small_icon: String,
    pub sound: String,
    pub badge: u32,
    /// ARGB, alpha always opaque.
    pub led_argb: u32,
    pub ongoing: bool,
    pub auto_clear: bool,
    pub when: DateTime<Utc>,
    pub actions: Vec<NotificationAction>,
    /// Opaque caller payload, handed back on interaction.
    #[serde(default)]
    pub data: serde_json::Value,
    pub path: BuildPath,
}

/// A live notification: its options paired with a ready-to-render artifact.
///
/// Never persisted; always rebuilt from the option record.
#[derive(Debug, Clone)]
pub struct NotificationInstance {
    options: OptionRecord,
    artifact: DisplayArtifact,
}

impl NotificationInstance {
    pub fn new(options: OptionRecord, artifact: DisplayArtifact) -> Self {
        Self { options, artifact }
    }

    pub fn options(&self) -> &OptionRecord {
        &self.options
    }

    pub fn artifact(&self) -> &DisplayArtifact {
        &self.artifact
    }
}
