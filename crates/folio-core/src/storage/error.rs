//! Storage errors
//!
//! Every failure of the key-value backend or the selection file maps to a
//! `StorageError`. Variants that the user can do something about carry a
//! recovery suggestion, which the store surfaces next to its error message.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

const CLEAR_DATA: &str = "Clear the local data directory and try again.";
const CHECK_DATA_DIR: &str = "Check that the data directory exists and you have write permissions.";

/// Errors from the key-value backend and the selection file
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database cannot be opened or is not a database
    #[error("Local storage is unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to create data directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Reading, writing or removing the selection file failed
    #[error("Failed to update '{path}': {source}")]
    SelectionFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The temp file was written but could not replace the target
    #[error("Could not replace '{to}' with '{from}': {source}")]
    Replace {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A record space was used before `ensure_store` created it
    #[error("Record store '{0}' does not exist")]
    UnknownStore(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A blocking storage task panicked or was cancelled
    #[error("Storage task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Whether the user can fix this, e.g. by clearing data or permissions
    pub fn is_recoverable(&self) -> bool {
        self.recovery_suggestion().is_some()
    }

    /// What the user can do about this error
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StorageError::Unavailable(_) | StorageError::Database(_) => Some(CLEAR_DATA),
            StorageError::CreateDirectory { .. }
            | StorageError::SelectionFile { .. }
            | StorageError::Replace { .. } => Some(CHECK_DATA_DIR),
            StorageError::UnknownStore(_) | StorageError::Task(_) => None,
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_suggests_clearing_data() {
        let err = StorageError::Unavailable("file is not a database".to_string());
        assert!(err.is_recoverable());
        assert_eq!(err.recovery_suggestion(), Some(CLEAR_DATA));
        assert!(err.to_string().contains("file is not a database"));
    }

    #[test]
    fn test_database_error_suggests_clearing_data() {
        let err = StorageError::from(rusqlite::Error::InvalidQuery);
        assert!(matches!(err, StorageError::Database(_)));
        assert_eq!(err.recovery_suggestion(), Some(CLEAR_DATA));
    }

    #[test]
    fn test_file_errors_point_at_data_dir() {
        let err = StorageError::SelectionFile {
            path: PathBuf::from("/data/current_workspace_id"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };
        assert!(err.is_recoverable());
        assert_eq!(err.recovery_suggestion(), Some(CHECK_DATA_DIR));
        assert!(err.to_string().contains("/data/current_workspace_id"));
    }

    #[test]
    fn test_programming_errors_have_no_suggestion() {
        let err = StorageError::UnknownStore("drafts".to_string());
        assert!(err.to_string().contains("drafts"));
        assert!(!err.is_recoverable());
        assert!(StorageError::Task("cancelled".to_string())
            .recovery_suggestion()
            .is_none());
    }
}
