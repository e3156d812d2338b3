//! Status command handler

use anyhow::Result;

use folio_core::{Config, StorageStats};

use super::Store;
use crate::output::{Output, OutputFormat};

/// Show storage location, size and content counts
pub fn show(store: &Store, config: &Config, output: &Output) -> Result<()> {
    let stats = StorageStats::collect(config);
    let workspaces = store.workspaces();
    let pages: usize = workspaces.iter().map(|w| w.pages.len()).sum();
    let words: usize = workspaces.iter().map(|w| w.total_words()).sum();
    let current_workspace = store.current_workspace();
    let current_page = store.current_page();

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "current_workspace": current_workspace.map(|w| w.id),
                    "current_page": current_page.map(|p| p.id),
                    "storage": {
                        "data_dir": config.data_dir,
                        "database": config.database_path(),
                        "database_exists": stats.database_exists,
                        "database_size": stats.database_size,
                        "selection_exists": stats.selection_exists
                    },
                    "counts": {
                        "workspaces": workspaces.len(),
                        "pages": pages,
                        "words": words
                    }
                })
            );
        }
        OutputFormat::Quiet => {
            if let Some(workspace) = current_workspace {
                println!("{}", workspace.id);
            }
        }
        OutputFormat::Human => {
            println!("Folio Status");
            println!("============");
            println!();
            println!("Current:");
            println!(
                "  Workspace: {}",
                current_workspace
                    .map(|w| w.name.as_str())
                    .unwrap_or("(none)")
            );
            println!(
                "  Page:      {}",
                current_page.map(|p| p.title.as_str()).unwrap_or("(none)")
            );
            println!();
            println!("Storage:");
            println!("  Location: {}", config.data_dir.display());
            println!("  Size:     {}", stats.total_size_human());
            println!();
            println!("Contents:");
            println!("  Workspaces: {}", workspaces.len());
            println!("  Pages:      {}", pages);
            println!("  Words:      {}", words);
        }
    }

    Ok(())
}
