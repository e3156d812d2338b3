//! SQLite-backed key-value store
//!
//! The database file lives in the data directory (`{data_dir}/{name}.db`).
//! rusqlite is blocking, so every operation runs on tokio's blocking pool
//! while holding the connection lock.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::error::{StorageError, StorageResult};
use super::kv::KeyValueStore;
use super::schema::{init_schema, needs_init};

/// Key-value store persisted in a SQLite database
///
/// The file is opened on first use, so a missing or corrupt database shows
/// up as an error from the first operation rather than from `open`.
#[derive(Clone)]
pub struct SqliteKvStore {
    conn: Arc<Mutex<Option<Connection>>>,
    path: Option<PathBuf>,
}

impl SqliteKvStore {
    /// Use (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self {
            conn: Arc::new(Mutex::new(None)),
            path: Some(path.as_ref().to_path_buf()),
        }
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        prepare_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            path: None,
        })
    }

    /// Path of the database file (`None` when in memory)
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Run blocking database work off the async executor
    async fn with_conn<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StorageResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| StorageError::Task("database connection lock poisoned".to_string()))?;
            if guard.is_none() {
                let path = path.ok_or_else(|| {
                    StorageError::Unavailable("in-memory database was closed".to_string())
                })?;
                *guard = Some(connect(&path)?);
            }
            match guard.as_mut() {
                Some(conn) => f(conn),
                None => Err(StorageError::Unavailable("database is not open".to_string())),
            }
        })
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
    }
}

/// Open the database file and bring its schema up to date
fn connect(path: &Path) -> StorageResult<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let unavailable = |e: rusqlite::Error| {
        StorageError::Unavailable(format!("cannot open '{}': {}", path.display(), e))
    };
    let conn = Connection::open(path).map_err(unavailable)?;
    if needs_init(&conn) {
        init_schema(&conn).map_err(unavailable)?;
    }

    debug!(path = %path.display(), "Opened key-value database");
    Ok(conn)
}

fn prepare_schema(conn: &Connection) -> StorageResult<()> {
    if needs_init(conn) {
        init_schema(conn)?;
    }
    Ok(())
}

/// Fail with `UnknownStore` unless the record space exists
fn require_store(conn: &Connection, store: &str) -> StorageResult<()> {
    let exists = conn
        .prepare("SELECT 1 FROM stores WHERE name = ?1")?
        .exists([store])?;

    if exists {
        Ok(())
    } else {
        Err(StorageError::UnknownStore(store.to_string()))
    }
}

impl KeyValueStore for SqliteKvStore {
    async fn ensure_store(&self, store: &str) -> StorageResult<()> {
        let store = store.to_string();
        self.with_conn(move |conn| {
            let created = conn.execute("INSERT OR IGNORE INTO stores (name) VALUES (?1)", [&store])?;
            if created > 0 {
                debug!(store = %store, "Created record store");
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, store: &str, key: &str) -> StorageResult<Option<String>> {
        let store = store.to_string();
        let key = key.to_string();
        self.with_conn(move |conn| {
            require_store(conn, &store)?;
            let value = conn
                .query_row(
                    "SELECT value FROM records WHERE store = ?1 AND key = ?2",
                    params![store, key],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            debug!(store = %store, key = %key, found = value.is_some(), "Read record");
            Ok(value)
        })
        .await
    }

    async fn put(&self, store: &str, key: &str, value: &str) -> StorageResult<()> {
        let store = store.to_string();
        let key = key.to_string();
        let value = value.to_string();
        self.with_conn(move |conn| {
            let tx = conn.transaction()?;
            require_store(&tx, &store)?;
            tx.execute(
                "INSERT OR REPLACE INTO records (store, key, value) VALUES (?1, ?2, ?3)",
                params![store, key, value],
            )?;
            tx.commit()?;
            debug!(store = %store, key = %key, bytes = value.len(), "Wrote record");
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let kv = SqliteKvStore::open_in_memory().unwrap();
        kv.ensure_store("workspaces").await.unwrap();

        assert!(kv.get("workspaces", "workspaces").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let kv = SqliteKvStore::open_in_memory().unwrap();
        kv.ensure_store("workspaces").await.unwrap();

        kv.put("workspaces", "workspaces", "[]").await.unwrap();
        assert_eq!(
            kv.get("workspaces", "workspaces").await.unwrap().as_deref(),
            Some("[]")
        );

        // Upsert replaces the previous value
        kv.put("workspaces", "workspaces", "[1]").await.unwrap();
        assert_eq!(
            kv.get("workspaces", "workspaces").await.unwrap().as_deref(),
            Some("[1]")
        );
    }

    #[tokio::test]
    async fn test_ensure_store_is_idempotent() {
        let kv = SqliteKvStore::open_in_memory().unwrap();
        kv.ensure_store("workspaces").await.unwrap();
        kv.put("workspaces", "k", "v").await.unwrap();

        kv.ensure_store("workspaces").await.unwrap();
        assert_eq!(kv.get("workspaces", "k").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_unknown_store_is_an_error() {
        let kv = SqliteKvStore::open_in_memory().unwrap();

        let err = kv.get("missing", "k").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownStore(_)));

        let err = kv.put("missing", "k", "v").await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownStore(_)));
    }

    #[tokio::test]
    async fn test_stores_are_isolated() {
        let kv = SqliteKvStore::open_in_memory().unwrap();
        kv.ensure_store("a").await.unwrap();
        kv.ensure_store("b").await.unwrap();

        kv.put("a", "key", "from a").await.unwrap();
        assert!(kv.get("b", "key").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("WritingApp.db");

        {
            let kv = SqliteKvStore::open(&path);
            kv.ensure_store("workspaces").await.unwrap();
            kv.put("workspaces", "workspaces", "saved").await.unwrap();
        }

        let kv = SqliteKvStore::open(&path);
        assert_eq!(kv.path(), Some(path.as_path()));
        assert_eq!(
            kv.get("workspaces", "workspaces").await.unwrap().as_deref(),
            Some("saved")
        );
    }

    #[tokio::test]
    async fn test_unwritable_location_fails_on_first_use() {
        let temp_dir = TempDir::new().unwrap();
        // A regular file cannot be used as the parent directory
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"x").unwrap();

        let kv = SqliteKvStore::open(blocker.join("db.sqlite"));
        let err = kv.ensure_store("workspaces").await.unwrap_err();
        assert!(matches!(err, StorageError::CreateDirectory { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_unavailable() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("WritingApp.db");
        std::fs::write(&path, vec![0xAB; 4096]).unwrap();

        let kv = SqliteKvStore::open(&path);
        let err = kv.ensure_store("workspaces").await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert!(err.is_recoverable());

        // Retrying does not touch the file
        assert!(kv.get("workspaces", "workspaces").await.is_err());
        assert_eq!(std::fs::read(&path).unwrap(), vec![0xAB; 4096]);
    }
}
