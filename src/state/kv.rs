use rusqlite::{Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised by a key-value backend
#[derive(Debug, Error)]
pub enum KvError {
    #[error("storage database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("could not create storage directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A persistent string slot store
///
/// Every location list lives in exactly one slot, overwritten in full on
/// each mutation.
pub trait KvStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError>;
    fn remove(&mut self, key: &str) -> Result<(), KvError>;
}

impl<K: KvStore + ?Sized> KvStore for Box<K> {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        (**self).remove(key)
    }
}

/// SQLite-backed slot store.
/// Slots live in a single `kv_slots` table of the application database.
pub struct SqliteKv {
    conn: Connection,
    db_path: PathBuf,
}

impl SqliteKv {
    /// Open (or create) the database file at `path`, creating parent
    /// directories as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KvError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| KvError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        tracing::info!("📁 Location database opened at {}", path.display());

        let store = SqliteKv {
            conn,
            db_path: path.to_path_buf(),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> Result<(), KvError> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS kv_slots (
                key         TEXT PRIMARY KEY,
                value       TEXT NOT NULL,
                updated_at  INTEGER NOT NULL
            )",
            [],
        )?;
        Ok(())
    }
}

impl KvStore for SqliteKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_slots WHERE key = ?1",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.conn.execute(
            "INSERT INTO kv_slots (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            rusqlite::params![key, value, chrono::Utc::now().timestamp()],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.conn
            .execute("DELETE FROM kv_slots WHERE key = ?1", [key])?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteKv")
            .field("db_path", &self.db_path)
            .finish()
    }
}

/// Volatile slot store, used when no database can be opened and in tests
#[derive(Debug, Default, Clone)]
pub struct MemoryKv {
    slots: BTreeMap<String, String>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Result<Option<String>, KvError> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), KvError> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), KvError> {
        self.slots.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(kv: &mut dyn KvStore) {
        assert_eq!(kv.get("trips").unwrap(), None);

        kv.set("trips", "[]").unwrap();
        assert_eq!(kv.get("trips").unwrap().as_deref(), Some("[]"));

        kv.set("trips", "[1]").unwrap();
        assert_eq!(kv.get("trips").unwrap().as_deref(), Some("[1]"));
        assert_eq!(kv.get("holidayLocations").unwrap(), None);

        kv.remove("trips").unwrap();
        assert_eq!(kv.get("trips").unwrap(), None);

        // Removing a missing slot is not an error
        kv.remove("trips").unwrap();
    }

    #[test]
    fn test_memory_kv() {
        exercise(&mut MemoryKv::new());
    }

    #[test]
    fn test_sqlite_kv() {
        let dir = tempfile::tempdir().unwrap();
        let mut kv = SqliteKv::open(dir.path().join("travel_tracker.db")).unwrap();
        exercise(&mut kv);
    }

    #[test]
    fn test_sqlite_kv_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("travel_tracker.db");

        {
            let mut kv = SqliteKv::open(&path).unwrap();
            kv.set("trips", r#"[{"name":"Oslo"}]"#).unwrap();
        }

        let kv = SqliteKv::open(&path).unwrap();
        assert_eq!(
            kv.get("trips").unwrap().as_deref(),
            Some(r#"[{"name":"Oslo"}]"#)
        );
    }
}
