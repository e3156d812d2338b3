//! On-disk footprint of the local data

use std::fs;
use std::path::Path;

use crate::config::Config;

/// Sizes of the files Folio keeps in its data directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub database_exists: bool,
    pub database_size: u64,
    pub selection_exists: bool,
}

impl StorageStats {
    /// Inspect the files named by `config`
    pub fn collect(config: &Config) -> Self {
        let database_size = file_size(&config.database_path());
        Self {
            database_exists: database_size.is_some(),
            database_size: database_size.unwrap_or(0),
            selection_exists: config.selection_path().exists(),
        }
    }

    /// Database size formatted for people ("12.3 KB")
    pub fn total_size_human(&self) -> String {
        human_size(self.database_size)
    }
}

fn file_size(path: &Path) -> Option<u64> {
    fs::metadata(path).ok().map(|m| m.len())
}

fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_human_size() {
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn test_collect_empty_dir() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };

        let stats = StorageStats::collect(&config);
        assert!(!stats.database_exists);
        assert_eq!(stats.database_size, 0);
        assert!(!stats.selection_exists);
    }

    #[test]
    fn test_collect_existing_database() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            data_dir: temp_dir.path().to_path_buf(),
            ..Config::default()
        };
        fs::write(config.database_path(), vec![0u8; 2048]).unwrap();

        let stats = StorageStats::collect(&config);
        assert!(stats.database_exists);
        assert_eq!(stats.total_size_human(), "2.0 KB");
    }
}
