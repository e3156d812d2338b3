//! Local key-value store interface
//!
//! A generic, asynchronous store of opaque string records addressed by
//! (record space, key). It knows nothing about workspaces or pages.
//!
//! A backend must:
//! - create a record space idempotently in `ensure_store`
//! - apply each `put` atomically (it either commits or fails)
//! - return `Ok(None)` from `get` for keys that were never written; only
//!   I/O-level failures and unknown record spaces are errors

use std::future::Future;

use super::error::StorageResult;

/// Asynchronous string store backing the workspace collection
pub trait KeyValueStore: Send + Sync + 'static {
    /// Make sure the named record space exists, creating it on first use
    fn ensure_store(&self, store: &str) -> impl Future<Output = StorageResult<()>> + Send;

    /// Read the value at `key`, or `None` if it was never written
    fn get(
        &self,
        store: &str,
        key: &str,
    ) -> impl Future<Output = StorageResult<Option<String>>> + Send;

    /// Insert or replace the value at `key`
    fn put(
        &self,
        store: &str,
        key: &str,
        value: &str,
    ) -> impl Future<Output = StorageResult<()>> + Send;
}
