//! Page command handlers
//!
//! Pages are addressed within the current workspace, except for `show` and
//! `export`, which accept a page from any workspace.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use uuid::Uuid;

use folio_core::{ExportFormat, PageSort, DEFAULT_PAGE_TITLE};

use super::{ensure_ok, require_workspace, resolve_any_page, resolve_page_in, Store};
use crate::editor::{confirm, edit_text};
use crate::output::{short_id, Output};

/// Create a page in the current workspace and select it
pub async fn create(store: &mut Store, title: Option<String>, output: &Output) -> Result<()> {
    require_workspace(store)?;
    let title = title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_PAGE_TITLE.to_string());

    let id = store
        .create_page(&title)
        .await
        .ok_or_else(|| anyhow!("Failed to create page"))?;
    ensure_ok(store)?;

    output.success(&format!("Created page: {}", id));
    if let Some(page) = store.page(id) {
        output.print_page(page);
    }
    Ok(())
}

/// List pages of the current workspace matching `search`
pub fn list(store: &Store, search: Option<String>, sort: String, output: &Output) -> Result<()> {
    let workspace = require_workspace(store)?;
    let sort: PageSort = sort.parse()?;
    let pages = workspace.find_pages(search.as_deref(), sort);

    if !output.is_json() && !output.is_quiet() {
        match &search {
            Some(query) => println!("Workspace: {} (matching \"{}\")\n", workspace.name, query),
            None => println!("Workspace: {}\n", workspace.name),
        }
    }
    output.print_pages(&pages, workspace.current_page_id);
    Ok(())
}

/// Select a page of the current workspace
pub async fn use_page(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_page_in(require_workspace(store)?, &id)?;

    store.set_current_page(uuid).await;
    ensure_ok(store)?;

    let title = store.page(uuid).map(|p| p.title.clone()).unwrap_or_default();
    output.success(&format!("Selected page: {}", title));
    Ok(())
}

/// Show a page, defaulting to the selected one
pub fn show(store: &Store, id: Option<String>, output: &Output) -> Result<()> {
    let uuid = match id {
        Some(id) => resolve_any_page(store, &id)?,
        None => selected_page(store)?,
    };

    let page = store
        .page(uuid)
        .ok_or_else(|| anyhow!("Page not found: {}", uuid))?;
    output.print_page(page);
    Ok(())
}

/// Edit a page's content in $EDITOR, or rename it with `--title`
pub async fn edit(
    store: &mut Store,
    id: Option<String>,
    title: Option<String>,
    output: &Output,
) -> Result<()> {
    let uuid = match id {
        Some(id) => resolve_page_in(require_workspace(store)?, &id)?,
        None => selected_page(store)?,
    };
    let content = store
        .page(uuid)
        .map(|p| p.content.clone())
        .ok_or_else(|| anyhow!("Page not found: {}", uuid))?;

    if let Some(title) = title {
        store.update_page_content(uuid, &content, Some(&title)).await;
        ensure_ok(store)?;
        output.success(&format!("Renamed page {} to {}", short_id(uuid), title));
        return Ok(());
    }

    let edited = edit_text(&content)?;
    if edited == content {
        output.message("No changes.");
        return Ok(());
    }

    store.update_page_content(uuid, &edited, None).await;
    ensure_ok(store)?;

    output.success("Page updated");
    if let Some(page) = store.page(uuid) {
        output.print_page(page);
    }
    Ok(())
}

/// Delete a page from the current workspace
pub async fn delete(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_page_in(require_workspace(store)?, &id)?;

    if output.should_prompt() {
        if let Some(page) = store.page(uuid) {
            println!("Delete page: {} - {}", short_id(page.id), page.title);
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    store.delete_page(uuid).await;
    ensure_ok(store)?;

    output.success(&format!("Deleted page: {}", uuid));
    Ok(())
}

/// Copy a page within the current workspace
pub async fn duplicate(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_page_in(require_workspace(store)?, &id)?;

    let copy = store
        .duplicate_page(uuid)
        .await
        .ok_or_else(|| anyhow!("Page not found: {}", id))?;
    ensure_ok(store)?;

    output.success(&format!("Duplicated page: {}", copy));
    if let Some(page) = store.page(copy) {
        output.print_page(page);
    }
    Ok(())
}

/// Render a page to a file, optionally opening it
pub fn export(
    store: &Store,
    id: String,
    format: String,
    out: Option<PathBuf>,
    open: bool,
    output: &Output,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let uuid = resolve_any_page(store, &id)?;

    let export = store
        .export_page(uuid, format)
        .ok_or_else(|| anyhow!("Page not found: {}", id))?;

    let dir = match out {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to determine current directory")?,
    };
    let path = export
        .write_to_dir(&dir)
        .with_context(|| format!("Failed to write export to {:?}", dir))?;

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "path": path,
                "fileName": export.file_name,
                "mimeType": export.mime_type,
            })
        );
    } else if output.is_quiet() {
        println!("{}", path.display());
    } else {
        output.success(&format!("Exported to {}", path.display()));
    }

    if open {
        open::that(&path).with_context(|| format!("Failed to open {:?}", path))?;
    }
    Ok(())
}

fn selected_page(store: &Store) -> Result<Uuid> {
    require_workspace(store)?;
    match store.current_page() {
        Some(page) => Ok(page.id),
        None => bail!("No page selected. Create one with `folio page create [title]`."),
    }
}
