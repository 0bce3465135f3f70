use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

/// Minimal string key/value persistence used by the settings and
/// statistics records.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> crate::Result<()>;
    fn remove(&mut self, key: &str) -> crate::Result<()>;
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for Box<K> {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        (**self).remove(key)
    }
}

impl<K: KeyValueStore + ?Sized> KeyValueStore for &mut K {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        (**self).remove(key)
    }
}

/// SQLite-backed store holding one row per key
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStore {
    pub fn open<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&path)?;
        Self::init(&conn)?;
        tracing::debug!(path = %path.display(), "opened key-value store");
        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    pub fn open_in_memory() -> crate::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn, path: None })
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;
        Ok(())
    }

    /// Location of the backing file, `None` for in-memory stores
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> crate::Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> crate::Result<()> {
        self.conn
            .execute("DELETE FROM kv_store WHERE key = ?1", [key])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_key_reads_as_none() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(store.get("absent").unwrap(), None);
        assert!(store.path().is_none());
    }

    #[test]
    fn set_overwrites_previous_value() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "one").unwrap();
        store.set("k", "two").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn remove_erases_the_key() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.set("k", "v").unwrap();
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
        // removing again is harmless
        store.remove("k").unwrap();
    }

    #[test]
    fn values_survive_reopening_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("store.db");
        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set("zetamac-settings", "{}").unwrap();
        }
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.path(), Some(path.as_path()));
        assert_eq!(
            store.get("zetamac-settings").unwrap().as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn KeyValueStore> = Box::new(SqliteStore::open_in_memory().unwrap());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
    }
}
