use beacon_core::NotificationId;
use thiserror::Error;

/// Errors that can occur within the notification lifecycle engine.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// The persistent store rejected a read or write.
    #[error("Store error: {0}")]
    Store(#[from] beacon_store::StoreError),

    /// A record could not be (de)serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The caller-supplied option payload is structurally unusable
    /// (e.g. not a JSON object).
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    /// A display artifact could not be assembled by the selected builder.
    #[error("Build failed ({builder}): {reason}")]
    Build {
        builder: &'static str,
        reason: String,
    },

    /// No record with the given ID exists in the store.
    #[error("Notification not found: {id}")]
    NotFound { id: NotificationId },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
