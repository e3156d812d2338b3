//! Folio Core Library
//!
//! This crate provides the core functionality for Folio, a local-first
//! writing app: workspaces hold pages of plain text, and everything lives in
//! one local SQLite database.
//!
//! # Architecture
//!
//! - **WorkspaceStore**: owns the in-memory collection and current selection
//! - **KeyValueStore**: persists the whole collection as one JSON record
//! - **SelectionCache**: remembers the current workspace between runs
//!
//! Every mutation updates memory first, then rewrites the stored record.
//!
//! # Quick Start
//!
//! ```text
//! let config = Config::load()?;
//! let mut store = WorkspaceStore::open(&config);
//! store.load_all().await;
//!
//! store.create_workspace("Essays", &config.default_color).await;
//! let page = store.create_page("Draft").await;
//! ```
//!
//! # Modules
//!
//! - `store`: Workspace and page operations (main entry point)
//! - `models`: Workspaces and pages
//! - `document`: Versioned encoding of the stored collection
//! - `storage`: Key-value backends and the selection cache
//! - `autosave`: Debounced saving for an editor surface
//! - `session`: Writing session counters
//! - `export`: Text, Markdown and HTML rendering
//! - `config`: Application configuration

pub mod autosave;
pub mod config;
pub mod document;
pub mod export;
pub mod models;
pub mod session;
pub mod stats;
pub mod storage;
pub mod store;

pub use autosave::{AutosaveSettings, Autosaver};
pub use config::Config;
pub use document::DocumentError;
pub use export::{Export, ExportFormat};
pub use models::{Page, PageSort, Workspace, DEFAULT_PAGE_TITLE};
pub use session::{Session, TodayStats};
pub use stats::TextStats;
pub use storage::{
    KeyValueStore, MemoryKvStore, SelectionCache, SqliteKvStore, StorageError, StorageStats,
};
pub use store::WorkspaceStore;
