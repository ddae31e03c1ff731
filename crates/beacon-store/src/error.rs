use thiserror::Error;

/// Errors raised by a [`KeyValueStore`](crate::KeyValueStore) backend.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite / rusqlite error.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The store file or its parent directory could not be created.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An import source was not the expected `{ "<key>": "<text>" }` shape.
    #[error("invalid import data: {0}")]
    InvalidImport(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;
