//! In-memory key-value store
//!
//! Used for tests and throwaway sessions. Clones share the same records, so
//! a test can keep a handle, drop the workspace store, and open a new one on
//! the same data. Storage can be switched off to simulate an unavailable
//! backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::kv::KeyValueStore;

type Records = HashMap<String, HashMap<String, String>>;

/// Key-value store held entirely in memory
#[derive(Clone, Default)]
pub struct MemoryKvStore {
    records: Arc<Mutex<Records>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail (or succeed again)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> StorageResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("in-memory store switched off".to_string()))
        } else {
            Ok(())
        }
    }
}

impl KeyValueStore for MemoryKvStore {
    async fn ensure_store(&self, store: &str) -> StorageResult<()> {
        self.check_available()?;
        self.records
            .lock()
            .await
            .entry(store.to_string())
            .or_default();
        Ok(())
    }

    async fn get(&self, store: &str, key: &str) -> StorageResult<Option<String>> {
        self.check_available()?;
        let records = self.records.lock().await;
        let space = records
            .get(store)
            .ok_or_else(|| StorageError::UnknownStore(store.to_string()))?;
        Ok(space.get(key).cloned())
    }

    async fn put(&self, store: &str, key: &str, value: &str) -> StorageResult<()> {
        self.check_available()?;
        let mut records = self.records.lock().await;
        let space = records
            .get_mut(store)
            .ok_or_else(|| StorageError::UnknownStore(store.to_string()))?;
        space.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
