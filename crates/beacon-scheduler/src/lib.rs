//! `beacon-scheduler`: local notification lifecycle engine.
//!
//! # Overview
//!
//! Notifications are described by an [`OptionRecord`] and persisted through
//! the flat key/value store of `beacon-store`, keyed by id. The
//! [`NotificationRegistry`] is the only writer. When a wake-up arrives, the
//! [`TriggerPipeline`] reloads the record, builds a display artifact, hands it
//! to the [`Renderer`] and re-arms repeating notifications with the [`Timer`].
//!
//! # Fire outcomes
//!
//! | Outcome     | When                                               |
//! |-------------|----------------------------------------------------|
//! | `Dropped`   | record cancelled before the fire, or build failed  |
//! | `Displayed` | one-shot; `updated` marks a fire caused by an edit |
//! | `Rearmed`   | repeating; armed again for its next occurrence     |

pub mod assets;
pub mod builder;
pub mod engine;
pub mod error;
pub mod instance;
pub mod options;
pub mod platform;
pub mod registry;
pub mod repeat;
pub mod repository;
pub mod trigger;
pub mod ui;

pub use assets::{AssetError, AssetResolver, FsAssetResolver};
pub use builder::{ArtifactBuilder, InstanceFactory, LegacyBuilder, ModernBuilder, PlatformCapability};
pub use engine::TimerService;
pub use error::{Result, SchedulerError};
pub use instance::{BuildPath, DisplayArtifact, NotificationInstance};
pub use options::{led_color, NotificationAction, OptionRecord};
pub use platform::{Renderer, Timer};
pub use registry::{NotificationRegistry, RestoreReport};
pub use repeat::Repeat;
pub use trigger::{DropReason, TriggerOutcome, TriggerPipeline};
pub use ui::{UiLoop, UiRenderer};
