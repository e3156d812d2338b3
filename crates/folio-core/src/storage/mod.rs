//! Storage layer
//!
//! Local persistence for the workspace collection.
//!
//! ## Architecture
//!
//! - **Key-value store**: generic async string store (`KeyValueStore`), with a
//!   SQLite backend for real use and an in-memory one for tests
//! - **Selection cache**: a one-value file remembering the current workspace
//!
//! The workspace collection itself is an opaque string to this layer; see
//! `document` for its encoding.

pub mod error;
pub mod kv;
pub mod memory;
pub mod schema;
pub mod selection;
pub mod sqlite;
pub mod usage;

pub use error::{StorageError, StorageResult};
pub use kv::KeyValueStore;
pub use memory::MemoryKvStore;
pub use schema::{init_schema, needs_init, SCHEMA_VERSION};
pub use selection::SelectionCache;
pub use sqlite::SqliteKvStore;
pub use usage::StorageStats;
