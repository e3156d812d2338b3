//! Workspace and page store
//!
//! The `WorkspaceStore` owns the in-memory workspace collection and the
//! current selection, and mediates every change through a
//! mutate-then-persist cycle:
//!
//! 1. update the in-memory collection (synchronously, never interleaved)
//! 2. serialize the whole collection and write it under one fixed key
//!
//! ## Failures
//!
//! Operations never return errors. A failure is logged and recorded in the
//! store's error field (`error()`), leaving the caller free to show it and
//! offer a retry. In-memory changes are kept even when persisting them fails,
//! so the next successful save catches the stored copy up. Unknown ids are
//! silent no-ops.
//!
//! ## Selection
//!
//! The current workspace is an id into the collection and is mirrored in a
//! `SelectionCache`. The current page is always derived from that
//! workspace's `current_page_id`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut store = WorkspaceStore::open(&config);
//! store.load_all().await;
//!
//! let workspace = store.create_workspace("Essays", "#f97316").await;
//! let page = store.create_page("Draft").await;
//! store.update_page_content(page.unwrap(), "hello world", None).await;
//! ```

use anyhow::{Context, Result};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::document;
use crate::export::{Export, ExportFormat};
use crate::models::{Page, Workspace};
use crate::storage::{KeyValueStore, SelectionCache, SqliteKvStore, StorageError};

/// Key under which the workspace collection is stored
pub const WORKSPACES_KEY: &str = "workspaces";

const LOAD_FAILED: &str = "Failed to load workspaces. Please refresh the page.";
const SAVE_FAILED: &str = "Failed to save data";
const PARSE_HINT: &str = "The saved workspaces could not be read. Reset the local data to start fresh.";

/// Owner of all workspace and page data
pub struct WorkspaceStore<S> {
    kv: S,
    store_name: String,
    selection: SelectionCache,
    workspaces: Vec<Workspace>,
    current_workspace_id: Option<Uuid>,
    is_loading: bool,
    error: Option<String>,
    recovery_hint: Option<&'static str>,
}

impl WorkspaceStore<SqliteKvStore> {
    /// Open the on-disk store described by `config`
    ///
    /// Nothing is read yet; call `load_all` before use. A database that
    /// cannot be opened is reported by `load_all` like any other load error.
    pub fn open(config: &Config) -> Self {
        let kv = SqliteKvStore::open(config.database_path());
        let selection = SelectionCache::open(config.selection_path());
        Self::new(kv, config.store_name.clone(), selection)
    }
}

impl<S: KeyValueStore> WorkspaceStore<S> {
    /// Create a store over a key-value backend and selection cache
    pub fn new(kv: S, store_name: impl Into<String>, selection: SelectionCache) -> Self {
        Self {
            kv,
            store_name: store_name.into(),
            selection,
            workspaces: Vec::new(),
            current_workspace_id: None,
            is_loading: false,
            error: None,
            recovery_hint: None,
        }
    }

    // ==================== Accessors ====================

    /// All workspaces, in creation order
    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace(&self, id: Uuid) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn current_workspace_id(&self) -> Option<Uuid> {
        self.current_workspace_id
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        self.current_workspace_id.and_then(|id| self.workspace(id))
    }

    /// The selected page of the current workspace
    pub fn current_page(&self) -> Option<&Page> {
        self.current_workspace().and_then(Workspace::current_page)
    }

    /// Find a page in any workspace
    pub fn page(&self, id: Uuid) -> Option<&Page> {
        self.workspaces.iter().find_map(|w| w.page(id))
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Message describing the last failure, if any
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Suggested recovery for the last failure
    pub fn recovery_hint(&self) -> Option<&'static str> {
        self.recovery_hint
    }

    pub fn clear_error(&mut self) {
        self.error = None;
        self.recovery_hint = None;
    }

    /// The key-value backend
    pub fn backend(&self) -> &S {
        &self.kv
    }

    // ==================== Loading & Saving ====================

    /// Read the collection from storage and restore the last selection
    ///
    /// An absent or empty record gives an empty collection with nothing
    /// selected. On failure the collection is left empty and the stored
    /// record is not touched.
    pub async fn load_all(&mut self) {
        info!("Loading workspaces");
        self.is_loading = true;
        self.clear_error();

        match self.read_collection().await {
            Ok(workspaces) => self.restore(workspaces),
            Err(e) => {
                self.workspaces.clear();
                self.current_workspace_id = None;
                self.fail(LOAD_FAILED, &e);
            }
        }

        self.is_loading = false;
    }

    async fn read_collection(&self) -> Result<Vec<Workspace>> {
        self.kv
            .ensure_store(&self.store_name)
            .await
            .context("Failed to open workspace storage")?;

        let data = self
            .kv
            .get(&self.store_name, WORKSPACES_KEY)
            .await
            .context("Failed to read workspaces")?;

        match data {
            Some(data) => document::decode(&data).context("Failed to parse workspaces"),
            None => Ok(Vec::new()),
        }
    }

    fn restore(&mut self, workspaces: Vec<Workspace>) {
        let cached = self.selection.get();
        let current = cached
            .filter(|id| workspaces.iter().any(|w| w.id == *id))
            .or_else(|| workspaces.first().map(|w| w.id));

        info!(
            workspaces = workspaces.len(),
            restored = current.is_some() && current == cached,
            "Workspaces loaded"
        );

        self.workspaces = workspaces;
        self.current_workspace_id = current;

        if current != cached || current.is_none() {
            self.remember_selection();
        }
    }

    /// Write the whole collection to storage
    ///
    /// In-memory state is kept when this fails.
    pub async fn save_to_storage(&mut self) {
        if let Err(e) = self.persist().await {
            self.fail(SAVE_FAILED, &e);
        }
    }

    async fn persist(&self) -> Result<()> {
        let data = document::encode(&self.workspaces).context("Failed to serialize workspaces")?;

        self.kv
            .ensure_store(&self.store_name)
            .await
            .context("Failed to open workspace storage")?;
        self.kv
            .put(&self.store_name, WORKSPACES_KEY, &data)
            .await
            .context("Failed to write workspaces")?;

        debug!(bytes = data.len(), workspaces = self.workspaces.len(), "Workspaces saved");
        Ok(())
    }

    // ==================== Workspace Operations ====================

    /// Create a workspace and make it current
    pub async fn create_workspace(&mut self, name: &str, color: &str) -> Uuid {
        let workspace = Workspace::new(name, color);
        let id = workspace.id;

        self.workspaces.push(workspace);
        self.current_workspace_id = Some(id);
        self.clear_error();
        self.remember_selection();

        self.save_to_storage().await;
        info!(workspace = %id, name, "Workspace created");
        id
    }

    /// Delete a workspace
    ///
    /// The last remaining workspace cannot be deleted. If the current
    /// workspace is removed, the first remaining one takes its place.
    /// Returns whether anything was deleted.
    pub async fn delete_workspace(&mut self, id: Uuid) -> bool {
        let Some(index) = self.workspaces.iter().position(|w| w.id == id) else {
            debug!(workspace = %id, "Delete ignored: unknown workspace");
            return false;
        };

        if self.workspaces.len() == 1 {
            warn!(workspace = %id, "Refusing to delete the last workspace");
            return false;
        }

        self.workspaces.remove(index);
        if self.current_workspace_id == Some(id) {
            self.current_workspace_id = self.workspaces.first().map(|w| w.id);
        }
        self.clear_error();
        self.remember_selection();

        self.save_to_storage().await;
        info!(workspace = %id, "Workspace deleted");
        true
    }

    /// Switch to another workspace; unknown ids are ignored
    pub async fn set_current_workspace(&mut self, id: Uuid) {
        let Some(workspace) = self.workspace(id) else {
            debug!(workspace = %id, "Switch ignored: unknown workspace");
            return;
        };
        let name = workspace.name.clone();

        self.current_workspace_id = Some(id);
        self.clear_error();
        self.remember_selection();

        self.save_to_storage().await;
        info!(workspace = %id, name = %name, "Switched workspace");
    }

    /// Rename a workspace
    pub async fn rename_workspace(&mut self, id: Uuid, new_name: &str) {
        if let Some(workspace) = self.workspaces.iter_mut().find(|w| w.id == id) {
            workspace.rename(new_name);
        }
        self.clear_error();

        self.save_to_storage().await;
    }

    // ==================== Page Operations ====================

    /// Add an empty page to the current workspace and select it
    ///
    /// Returns `None` when no workspace is selected.
    pub async fn create_page(&mut self, title: &str) -> Option<Uuid> {
        let Some(workspace) = self.current_workspace_mut() else {
            error!("No current workspace to create page in");
            return None;
        };

        let page = Page::new(title);
        let id = page.id;
        workspace.pages.push(page);
        workspace.current_page_id = Some(id);
        workspace.touch();
        self.clear_error();

        self.save_to_storage().await;
        info!(page = %id, title, "Page created");
        Some(id)
    }

    /// Remove a page from the current workspace
    ///
    /// If it was the selected page, the first remaining page (if any) is
    /// selected instead.
    pub async fn delete_page(&mut self, page_id: Uuid) {
        let Some(workspace) = self.current_workspace_mut() else {
            return;
        };
        let Some(index) = workspace.pages.iter().position(|p| p.id == page_id) else {
            debug!(page = %page_id, "Delete ignored: page not in current workspace");
            return;
        };

        workspace.pages.remove(index);
        if workspace.current_page_id == Some(page_id) {
            workspace.current_page_id = workspace.pages.first().map(|p| p.id);
        }
        workspace.touch();
        self.clear_error();

        self.save_to_storage().await;
        info!(page = %page_id, "Page deleted");
    }

    /// Select a page of the current workspace; unknown ids are ignored
    pub async fn set_current_page(&mut self, page_id: Uuid) {
        let Some(workspace) = self.current_workspace_mut() else {
            return;
        };
        if !workspace.contains_page(page_id) {
            debug!(page = %page_id, "Select ignored: page not in current workspace");
            return;
        }

        workspace.current_page_id = Some(page_id);
        self.clear_error();

        self.save_to_storage().await;
    }

    /// Replace a page's content, and its title when one is given
    ///
    /// Counts are recomputed from `content`. `title: None` keeps the current
    /// title; `Some("")` sets an empty one. The page and its workspace both
    /// get a new `updated_at`. Callers are expected to debounce.
    pub async fn update_page_content(&mut self, page_id: Uuid, content: &str, title: Option<&str>) {
        let Some(workspace) = self
            .workspaces
            .iter_mut()
            .find(|w| w.contains_page(page_id))
        else {
            debug!(page = %page_id, "Update ignored: unknown page");
            return;
        };

        if let Some(page) = workspace.page_mut(page_id) {
            page.set_content(content);
            if let Some(title) = title {
                page.set_title(title);
            }
            let updated_at = page.updated_at;
            workspace.updated_at = updated_at;
        }
        self.clear_error();

        self.save_to_storage().await;
    }

    /// Copy a page of the current workspace
    ///
    /// The copy is appended but not selected.
    pub async fn duplicate_page(&mut self, page_id: Uuid) -> Option<Uuid> {
        let workspace = self.current_workspace_mut()?;
        let copy = workspace.page(page_id)?.duplicate();
        let id = copy.id;

        workspace.pages.push(copy);
        workspace.touch();
        self.clear_error();

        self.save_to_storage().await;
        info!(source = %page_id, page = %id, "Page duplicated");
        Some(id)
    }

    /// Render a page for export; nothing is modified
    pub fn export_page(&self, page_id: Uuid, format: ExportFormat) -> Option<Export> {
        self.page(page_id).map(|page| Export::of(page, format))
    }

    // ==================== Internals ====================

    fn current_workspace_mut(&mut self) -> Option<&mut Workspace> {
        let id = self.current_workspace_id?;
        self.workspaces.iter_mut().find(|w| w.id == id)
    }

    /// Mirror the current workspace id into the selection cache
    fn remember_selection(&mut self) {
        if let Err(e) = self.selection.set(self.current_workspace_id) {
            warn!(error = %e, "Failed to remember current workspace");
        }
    }

    fn fail(&mut self, message: &str, err: &anyhow::Error) {
        let storage = err.downcast_ref::<StorageError>();
        let hint = match storage {
            Some(storage) => storage.recovery_suggestion(),
            None if err.downcast_ref::<document::DocumentError>().is_some() => Some(PARSE_HINT),
            None => None,
        };

        error!(
            error = %format!("{:#}", err),
            recoverable = storage.map_or(hint.is_some(), StorageError::is_recoverable),
            "{}",
            message
        );
        self.error = Some(message.to_string());
        self.recovery_hint = hint;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_PAGE_TITLE;
    use crate::storage::MemoryKvStore;

    const STORE: &str = "workspaces";

    fn new_store(kv: &MemoryKvStore) -> WorkspaceStore<MemoryKvStore> {
        WorkspaceStore::new(kv.clone(), STORE, SelectionCache::in_memory())
    }

    async fn loaded_store() -> (MemoryKvStore, WorkspaceStore<MemoryKvStore>) {
        let kv = MemoryKvStore::new();
        let mut store = new_store(&kv);
        store.load_all().await;
        (kv, store)
    }

    async fn stored_collection(kv: &MemoryKvStore) -> Vec<Workspace> {
        let data = kv.get(STORE, WORKSPACES_KEY).await.unwrap().unwrap();
        document::decode(&data).unwrap()
    }

    #[tokio::test]
    async fn test_load_empty_storage() {
        let (_kv, store) = loaded_store().await;

        assert!(store.workspaces().is_empty());
        assert!(store.current_workspace_id().is_none());
        assert!(store.current_page().is_none());
        assert!(store.error().is_none());
        assert!(!store.is_loading());
    }

    #[tokio::test]
    async fn test_create_workspaces_have_unique_ids() {
        let (_kv, mut store) = loaded_store().await;

        let mut ids = Vec::new();
        for i in 0..5 {
            ids.push(store.create_workspace(&format!("Workspace {}", i), "#fff").await);
        }

        assert_eq!(store.workspaces().len(), 5);
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 5);
    }

    #[tokio::test]
    async fn test_create_workspace_selects_it() {
        let (kv, mut store) = loaded_store().await;

        let first = store.create_workspace("First", "#111").await;
        store.create_page("Page").await.unwrap();
        assert!(store.current_page().is_some());

        let second = store.create_workspace("Second", "#222").await;
        assert_ne!(first, second);
        assert_eq!(store.current_workspace_id(), Some(second));
        assert!(store.current_page().is_none());

        // Persisted immediately
        assert_eq!(stored_collection(&kv).await.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_current_workspace_selects_first_remaining() {
        let (_kv, mut store) = loaded_store().await;

        let a = store.create_workspace("A", "#a").await;
        let page_a = store.create_page("A page").await.unwrap();
        let _b = store.create_workspace("B", "#b").await;
        let c = store.create_workspace("C", "#c").await;

        assert!(store.delete_workspace(c).await);
        assert_eq!(store.current_workspace_id(), Some(a));
        assert_eq!(store.current_page().map(|p| p.id), Some(page_a));
        assert!(store
            .workspaces()
            .iter()
            .any(|w| Some(w.id) == store.current_workspace_id()));
    }

    #[tokio::test]
    async fn test_delete_other_workspace_keeps_selection() {
        let (_kv, mut store) = loaded_store().await;

        let a = store.create_workspace("A", "#a").await;
        let b = store.create_workspace("B", "#b").await;
        let page = store.create_page("B page").await.unwrap();

        assert!(store.delete_workspace(a).await);
        assert_eq!(store.current_workspace_id(), Some(b));
        assert_eq!(store.current_page().map(|p| p.id), Some(page));
    }

    #[tokio::test]
    async fn test_cannot_delete_last_workspace() {
        let (_kv, mut store) = loaded_store().await;

        let only = store.create_workspace("Only", "#000").await;
        assert!(!store.delete_workspace(only).await);
        assert_eq!(store.workspaces().len(), 1);
        assert_eq!(store.current_workspace_id(), Some(only));
    }

    #[tokio::test]
    async fn test_delete_unknown_workspace_is_noop() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        store.create_workspace("B", "#b").await;

        assert!(!store.delete_workspace(Uuid::new_v4()).await);
        assert_eq!(store.workspaces().len(), 2);
    }

    #[tokio::test]
    async fn test_set_current_workspace() {
        let (_kv, mut store) = loaded_store().await;

        let a = store.create_workspace("A", "#a").await;
        let page = store.create_page("Remember me").await.unwrap();
        store.create_workspace("B", "#b").await;

        store.set_current_workspace(a).await;
        assert_eq!(store.current_workspace_id(), Some(a));
        assert_eq!(store.current_page().map(|p| p.id), Some(page));

        // Unknown id leaves the selection alone
        store.set_current_workspace(Uuid::new_v4()).await;
        assert_eq!(store.current_workspace_id(), Some(a));
    }

    #[tokio::test]
    async fn test_rename_workspace() {
        let (kv, mut store) = loaded_store().await;

        let id = store.create_workspace("Old", "#a").await;
        let before = store.workspace(id).unwrap().updated_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        store.rename_workspace(id, "New").await;
        let workspace = store.workspace(id).unwrap();
        assert_eq!(workspace.name, "New");
        assert!(workspace.updated_at > before);

        assert_eq!(stored_collection(&kv).await[0].name, "New");
    }

    #[tokio::test]
    async fn test_create_page_without_workspace() {
        let (_kv, mut store) = loaded_store().await;
        assert!(store.create_page(DEFAULT_PAGE_TITLE).await.is_none());
    }

    #[tokio::test]
    async fn test_create_page_selects_it() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        let first = store.create_page(DEFAULT_PAGE_TITLE).await.unwrap();
        let second = store.create_page("Second").await.unwrap();

        let workspace = store.current_workspace().unwrap();
        assert_eq!(workspace.pages.len(), 2);
        assert_eq!(workspace.pages[0].id, first);
        assert_eq!(workspace.pages[0].title, "Untitled");
        assert_eq!(workspace.current_page_id, Some(second));
        assert_eq!(store.current_page().map(|p| p.id), Some(second));
    }

    #[tokio::test]
    async fn test_delete_current_page_selects_first_remaining() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        let first = store.create_page("1").await.unwrap();
        let _second = store.create_page("2").await.unwrap();
        let third = store.create_page("3").await.unwrap();

        store.delete_page(third).await;
        assert_eq!(store.current_page().map(|p| p.id), Some(first));
    }

    #[tokio::test]
    async fn test_delete_last_page_clears_selection() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        let only = store.create_page("1").await.unwrap();
        store.delete_page(only).await;

        let workspace = store.current_workspace().unwrap();
        assert!(workspace.pages.is_empty());
        assert!(workspace.current_page_id.is_none());
        assert!(store.current_page().is_none());
    }

    #[tokio::test]
    async fn test_delete_other_page_keeps_selection() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        let first = store.create_page("1").await.unwrap();
        let second = store.create_page("2").await.unwrap();

        store.delete_page(first).await;
        assert_eq!(store.current_page().map(|p| p.id), Some(second));
    }

    #[tokio::test]
    async fn test_set_current_page() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        let first = store.create_page("1").await.unwrap();
        store.create_page("2").await.unwrap();

        store.set_current_page(first).await;
        assert_eq!(store.current_page().map(|p| p.id), Some(first));

        store.set_current_page(Uuid::new_v4()).await;
        assert_eq!(store.current_page().map(|p| p.id), Some(first));
    }

    #[tokio::test]
    async fn test_set_current_page_ignores_other_workspaces() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let elsewhere = store.create_page("In A").await.unwrap();
        store.create_workspace("B", "#b").await;
        let here = store.create_page("In B").await.unwrap();

        store.set_current_page(elsewhere).await;
        assert_eq!(store.current_page().map(|p| p.id), Some(here));
    }

    #[tokio::test]
    async fn test_update_content_keeps_title() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let id = store.create_page("Keep me").await.unwrap();

        store.update_page_content(id, "hello world", None).await;

        let page = store.page(id).unwrap();
        assert_eq!(page.word_count, 2);
        assert_eq!(page.char_count, 11);
        assert_eq!(page.title, "Keep me");
        assert_eq!(page.content, "hello world");
    }

    #[tokio::test]
    async fn test_update_content_with_title() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let id = store.create_page("Old").await.unwrap();
        store.update_page_content(id, "some words here", None).await;

        store.update_page_content(id, "", Some("New Title")).await;

        let page = store.page(id).unwrap();
        assert_eq!(page.word_count, 0);
        assert_eq!(page.char_count, 0);
        assert_eq!(page.title, "New Title");
        assert_eq!(store.current_workspace().unwrap().updated_at, page.updated_at);
    }

    #[tokio::test]
    async fn test_update_content_accepts_empty_title() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let id = store.create_page("Old").await.unwrap();

        store.update_page_content(id, "x", Some("")).await;
        assert_eq!(store.page(id).unwrap().title, "");
    }

    #[tokio::test]
    async fn test_update_content_bumps_workspace() {
        let (_kv, mut store) = loaded_store().await;
        let ws = store.create_workspace("A", "#a").await;
        let id = store.create_page("P").await.unwrap();
        let before = store.workspace(ws).unwrap().updated_at;
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        store.update_page_content(id, "text", None).await;

        let workspace = store.workspace(ws).unwrap();
        assert!(workspace.updated_at > before);
        assert_eq!(workspace.updated_at, workspace.pages[0].updated_at);
    }

    #[tokio::test]
    async fn test_update_content_reaches_page_outside_current_workspace() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let id = store.create_page("In A").await.unwrap();
        store.create_workspace("B", "#b").await;

        store.update_page_content(id, "late save", None).await;
        assert_eq!(store.page(id).unwrap().content, "late save");
    }

    #[tokio::test]
    async fn test_update_two_pages_both_persist() {
        let (kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let one = store.create_page("One").await.unwrap();
        let two = store.create_page("Two").await.unwrap();

        store.update_page_content(one, "first page", None).await;
        store.update_page_content(two, "second page text", None).await;

        let stored = stored_collection(&kv).await;
        let pages = &stored[0].pages;
        assert_eq!(pages.iter().find(|p| p.id == one).unwrap().content, "first page");
        assert_eq!(
            pages.iter().find(|p| p.id == two).unwrap().content,
            "second page text"
        );
    }

    #[tokio::test]
    async fn test_duplicate_page() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let source = store.create_page("Notes").await.unwrap();
        store.update_page_content(source, "hello world", None).await;

        let copy_id = store.duplicate_page(source).await.unwrap();

        let source_page = store.page(source).unwrap().clone();
        let copy = store.page(copy_id).unwrap();
        assert_ne!(copy.id, source_page.id);
        assert_eq!(copy.content, source_page.content);
        assert_eq!(copy.word_count, source_page.word_count);
        assert_eq!(copy.char_count, source_page.char_count);
        assert_ne!(copy.title, source_page.title);
        assert!(copy.title.contains("(Copy)"));

        // The source stays selected
        assert_eq!(store.current_page().map(|p| p.id), Some(source));
        assert_eq!(store.current_workspace().unwrap().pages.len(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_unknown_page() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        assert!(store.duplicate_page(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn test_export_page() {
        let (_kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;
        let id = store.create_page("Notes").await.unwrap();
        store.update_page_content(id, "line1\nline2", None).await;

        let export = store.export_page(id, ExportFormat::Markdown).unwrap();
        assert!(export.contents.starts_with("# Notes\n\nline1\nline2"));
        assert_eq!(export.file_name, "Notes.md");

        assert!(store.export_page(Uuid::new_v4(), ExportFormat::Txt).is_none());
    }

    #[tokio::test]
    async fn test_round_trip() {
        let kv = MemoryKvStore::new();
        let mut store = new_store(&kv);
        store.load_all().await;

        store.create_workspace("A", "#a").await;
        let page = store.create_page("Notes").await.unwrap();
        store.update_page_content(page, "hello world", Some("Renamed")).await;
        store.create_workspace("B", "#b").await;
        store.create_page("Other").await;
        store.save_to_storage().await;

        let original = store.workspaces().to_vec();

        let mut reopened = new_store(&kv);
        reopened.load_all().await;
        assert_eq!(reopened.workspaces(), original.as_slice());
    }

    #[tokio::test]
    async fn test_load_restores_cached_selection() {
        let kv = MemoryKvStore::new();
        let mut store = new_store(&kv);
        store.load_all().await;
        store.create_workspace("A", "#a").await;
        let b = store.create_workspace("B", "#b").await;
        let page = store.create_page("B page").await.unwrap();

        let mut selection = SelectionCache::in_memory();
        selection.set(Some(b)).unwrap();
        let mut reopened = WorkspaceStore::new(kv.clone(), STORE, selection);
        reopened.load_all().await;

        assert_eq!(reopened.current_workspace_id(), Some(b));
        assert_eq!(reopened.current_page().map(|p| p.id), Some(page));
    }

    #[tokio::test]
    async fn test_load_falls_back_to_first_workspace() {
        let kv = MemoryKvStore::new();
        let mut store = new_store(&kv);
        store.load_all().await;
        let a = store.create_workspace("A", "#a").await;
        store.create_workspace("B", "#b").await;

        let mut selection = SelectionCache::in_memory();
        selection.set(Some(Uuid::new_v4())).unwrap();
        let mut reopened = WorkspaceStore::new(kv.clone(), STORE, selection);
        reopened.load_all().await;

        assert_eq!(reopened.current_workspace_id(), Some(a));
    }

    #[tokio::test]
    async fn test_load_corrupt_record() {
        let kv = MemoryKvStore::new();
        kv.ensure_store(STORE).await.unwrap();
        kv.put(STORE, WORKSPACES_KEY, "{broken").await.unwrap();

        let mut store = new_store(&kv);
        store.load_all().await;

        assert!(store.workspaces().is_empty());
        assert!(store.current_workspace_id().is_none());
        assert_eq!(store.error(), Some(LOAD_FAILED));
        assert_eq!(store.recovery_hint(), Some(PARSE_HINT));
        assert!(!store.is_loading());

        // The stored record is left for the user to recover
        assert_eq!(
            kv.get(STORE, WORKSPACES_KEY).await.unwrap().as_deref(),
            Some("{broken")
        );
    }

    #[tokio::test]
    async fn test_load_unavailable_storage() {
        let kv = MemoryKvStore::new();
        kv.set_unavailable(true);

        let mut store = new_store(&kv);
        store.load_all().await;

        assert_eq!(store.error(), Some(LOAD_FAILED));
        assert!(store.recovery_hint().unwrap().contains("Clear the local data"));

        // Manual retry once storage is back
        kv.set_unavailable(false);
        store.load_all().await;
        assert!(store.error().is_none());
    }

    #[tokio::test]
    async fn test_failed_save_keeps_memory_state() {
        let (kv, mut store) = loaded_store().await;
        store.create_workspace("A", "#a").await;

        kv.set_unavailable(true);
        let id = store.create_workspace("B", "#b").await;

        assert_eq!(store.error(), Some(SAVE_FAILED));
        assert_eq!(store.workspaces().len(), 2);
        assert_eq!(store.current_workspace_id(), Some(id));

        // The next successful save catches storage up and clears the error
        kv.set_unavailable(false);
        store.rename_workspace(id, "B2").await;
        assert!(store.error().is_none());
        assert_eq!(stored_collection(&kv).await.len(), 2);

        store.clear_error();
        assert!(store.recovery_hint().is_none());
    }
}
