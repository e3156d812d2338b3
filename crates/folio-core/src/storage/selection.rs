//! Last-selected workspace cache
//!
//! The id of the current workspace lives in a tiny file of its own
//! (`current_workspace_id`) so startup can restore the selection without
//! touching the workspace collection. The file is written atomically and
//! removed when nothing is selected.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::warn;
use uuid::Uuid;

use super::error::{StorageError, StorageResult};

/// Scalar slot holding the current workspace id
#[derive(Debug, Clone, Default)]
pub struct SelectionCache {
    /// Backing file (`None` keeps the value in memory only)
    path: Option<PathBuf>,
    value: Option<Uuid>,
}

impl SelectionCache {
    /// Open the cache stored at `path`
    ///
    /// A missing or unreadable file means "no selection"; it is never an error.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let value = match fs::read_to_string(&path) {
            Ok(content) => match Uuid::parse_str(content.trim()) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Ignoring invalid workspace selection");
                    None
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not read workspace selection");
                None
            }
        };

        Self {
            path: Some(path),
            value,
        }
    }

    /// A cache that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// The cached workspace id
    pub fn get(&self) -> Option<Uuid> {
        self.value
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Replace the cached id; `None` clears the slot
    pub fn set(&mut self, id: Option<Uuid>) -> StorageResult<()> {
        self.value = id;

        let Some(path) = &self.path else {
            return Ok(());
        };

        match id {
            Some(id) => atomic_write(path, id.to_string().as_bytes()),
            None => match fs::remove_file(path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
                Err(source) => Err(StorageError::SelectionFile {
                    path: path.clone(),
                    source,
                }),
            },
        }
    }
}

/// Write data to a file atomically
///
/// 1. Write to a temporary file in the same directory
/// 2. Sync the file to disk
/// 3. Rename the temp file to the target path
///
/// This ensures the target file is never left in a partially-written state.
pub(crate) fn atomic_write(path: &Path, data: &[u8]) -> StorageResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let file_error = |source: io::Error| StorageError::SelectionFile {
        path: temp_path.clone(),
        source,
    };
    let mut file = File::create(&temp_path).map_err(file_error)?;
    file.write_all(data).map_err(file_error)?;
    file.sync_all().map_err(file_error)?;

    fs::rename(&temp_path, path).map_err(|source| StorageError::Replace {
        from: temp_path.clone(),
        to: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
