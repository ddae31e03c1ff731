use std::sync::Arc;

use beacon_core::NotificationId;
use beacon_store::KeyValueStore;
use tracing::warn;

use crate::error::Result;
use crate::options::OptionRecord;

/// Typed view of the flat store: `"<id>" → "<json option mapping>"`.
///
/// This is the only place where record text is parsed or produced.
pub struct NotificationRepository {
    store: Arc<dyn KeyValueStore>,
}

impl NotificationRepository {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Every id with an entry. Keys that are not integers are skipped.
    pub fn ids(&self) -> Result<Vec<NotificationId>> {
        let mut ids: Vec<NotificationId> = self
            .store
            .keys()?
            .into_iter()
            .filter_map(|key| match NotificationId::from_store_key(&key) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(%key, error = %e, "ignoring non-numeric store key");
                    None
                }
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Load a record. Corrupt entries are logged and reported as absent.
    pub fn load(&self, id: NotificationId) -> Result<Option<OptionRecord>> {
        let Some(text) = self.store.get(&id.store_key())? else {
            return Ok(None);
        };
        let parsed = serde_json::from_str::<serde_json::Value>(&text)
            .map_err(crate::error::SchedulerError::from)
            .and_then(OptionRecord::from_value);
        match parsed {
            Ok(record) => Ok(Some(record)),
            Err(e) => {
                warn!(%id, error = %e, "malformed notification entry; treating as absent");
                Ok(None)
            }
        }
    }

    /// Write `record` under its own id, replacing any previous entry.
    pub fn save(&self, record: &OptionRecord) -> Result<()> {
        let text = serde_json::to_string(record)?;
        self.store.put(&record.id().store_key(), &text)?;
        Ok(())
    }

    pub fn remove(&self, id: NotificationId) -> Result<bool> {
        Ok(self.store.remove(&id.store_key())?)
    }
}
