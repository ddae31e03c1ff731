use tracing::{info, warn};

use crate::error::{Result, StoreError};
use crate::KeyValueStore;

/// One-time import of an exported shared-preferences namespace.
///
/// `input` must be a JSON object whose values are the stored text, i.e.
/// `{ "<id>": "<json-serialized option mapping>" }`. Non-string values are
/// re-serialized to text so that nested objects exported verbatim still land
/// in the flat shape. Existing keys are overwritten.
///
/// Returns the count of imported entries.
pub fn import_entries(store: &dyn KeyValueStore, input: &str) -> Result<usize> {
    let parsed: serde_json::Value =
        serde_json::from_str(input).map_err(|e| StoreError::InvalidImport(e.to_string()))?;
    let serde_json::Value::Object(map) = parsed else {
        return Err(StoreError::InvalidImport(
            "expected a JSON object at top level".to_string(),
        ));
    };

    let mut count = 0;
    for (key, value) in map {
        let text = match value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => {
                warn!(%key, "skipping null entry during import");
                continue;
            }
            other => other.to_string(),
        };
        store.put(&key, &text)?;
        count += 1;
    }
    info!(count, "imported preference entries");
    Ok(count)
}
