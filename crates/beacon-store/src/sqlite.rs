use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::{debug, info};

use crate::db::init_db;
use crate::error::Result;
use crate::KeyValueStore;

/// SQLite-backed namespace.
///
/// Wraps a single connection in a `Mutex`; every call is one short
/// statement, so contention stays negligible for notification volumes.
pub struct SqliteStore {
    db: Mutex<Connection>,
    namespace: String,
}

impl SqliteStore {
    /// Wrap an already-open connection, initialising the schema if needed.
    pub fn new(conn: Connection, namespace: &str) -> Result<Self> {
        init_db(&conn)?;
        Ok(Self {
            db: Mutex::new(conn),
            namespace: namespace.to_string(),
        })
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        info!(path = %path.display(), %namespace, "opened notification store");
        Self::new(conn, namespace)
    }

    /// In-memory database, mostly for tests.
    pub fn open_in_memory(namespace: &str) -> Result<Self> {
        Self::new(Connection::open_in_memory()?, namespace)
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for SqliteStore {
    fn keys(&self) -> Result<Vec<String>> {
        let db = self.conn();
        let mut stmt =
            db.prepare_cached("SELECT key FROM preferences WHERE namespace = ?1 ORDER BY key")?;
        let keys = stmt
            .query_map([&self.namespace], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        let db = self.conn();
        match db.query_row(
            "SELECT value FROM preferences WHERE namespace = ?1 AND key = ?2",
            rusqlite::params![self.namespace, key],
            |row| row.get::<_, String>(0),
        ) {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let db = self.conn();
        db.execute(
            "INSERT INTO preferences (namespace, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT (namespace, key) DO UPDATE SET value = excluded.value",
            rusqlite::params![self.namespace, key, value],
        )?;
        debug!(%key, "preference written");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let db = self.conn();
        let n = db.execute(
            "DELETE FROM preferences WHERE namespace = ?1 AND key = ?2",
            rusqlite::params![self.namespace, key],
        )?;
        debug!(%key, removed = n > 0, "preference removed");
        Ok(n > 0)
    }

    fn entries(&self) -> Result<Vec<(String, String)>> {
        let db = self.conn();
        let mut stmt = db.prepare_cached(
            "SELECT key, value FROM preferences WHERE namespace = ?1 ORDER BY key",
        )?;
        let rows = stmt
            .query_map([&self.namespace], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }
}
