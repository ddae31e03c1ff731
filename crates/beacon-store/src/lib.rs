//! `beacon-store`: durable flat key → text namespace.
//!
//! The store knows nothing about notifications: keys are opaque strings and
//! values are opaque text. All JSON handling lives one layer up in the typed
//! repository of `beacon-scheduler`.
//!
//! | Backend        | Use                                   |
//! |----------------|---------------------------------------|
//! | `SqliteStore`  | on-disk, survives process restarts    |
//! | `MemoryStore`  | tests and ephemeral hosts             |

pub mod db;
pub mod error;
pub mod memory;
pub mod migrate;
pub mod sqlite;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use migrate::import_entries;
pub use sqlite::SqliteStore;

/// A single string-keyed namespace of text values.
///
/// Implementations must be `Send + Sync`; each call is atomic on its own key,
/// nothing is atomic across keys.
pub trait KeyValueStore: Send + Sync {
    /// All keys currently present, in ascending key order.
    fn keys(&self) -> Result<Vec<String>>;

    /// Raw value for `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or overwrite `key`.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Returns whether an entry was actually removed.
    fn remove(&self, key: &str) -> Result<bool>;

    /// Every entry as `(key, value)` pairs.
    fn entries(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for key in self.keys()? {
            if let Some(value) = self.get(&key)? {
                out.push((key, value));
            }
        }
        Ok(out)
    }
}
