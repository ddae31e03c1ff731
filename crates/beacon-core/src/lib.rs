//! `beacon-core`: shared configuration, error, identity and process-lifecycle
//! types used by every other beacon crate.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod types;

pub use config::BeaconConfig;
pub use error::{CoreError, Result};
pub use lifecycle::{AppState, EventKind, EventSink, Lifecycle, NotificationEvent};
pub use types::NotificationId;
