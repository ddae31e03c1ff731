use rusqlite::Connection;

use crate::error::Result;

/// Initialise the preferences schema in `conn`.
///
/// One row per `(namespace, key)`. The table mirrors a platform
/// shared-preferences file: no columns beyond the key and its text value.
pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS preferences (
            namespace   TEXT NOT NULL,
            key         TEXT NOT NULL,
            value       TEXT NOT NULL,
            PRIMARY KEY (namespace, key)
        ) STRICT;
        ",
    )?;
    Ok(())
}
