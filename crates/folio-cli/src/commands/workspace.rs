//! Workspace command handlers

use anyhow::{bail, Result};

use folio_core::Config;

use super::{ensure_ok, required_name, resolve_workspace_id, Store};
use crate::editor::confirm;
use crate::output::{short_id, Output};

/// Create a workspace and switch to it
pub async fn create(
    store: &mut Store,
    config: &Config,
    name: String,
    color: Option<String>,
    output: &Output,
) -> Result<()> {
    let name = required_name(&name, "Workspace name")?;
    let color = color.unwrap_or_else(|| config.default_color.clone());

    let id = store.create_workspace(&name, &color).await;
    ensure_ok(store)?;

    output.success(&format!("Created workspace: {}", id));
    if let Some(workspace) = store.workspace(id) {
        output.print_workspace(workspace);
    }
    Ok(())
}

/// List all workspaces
pub fn list(store: &Store, output: &Output) -> Result<()> {
    output.print_workspaces(store.workspaces(), store.current_workspace_id());
    Ok(())
}

/// Switch the current workspace
pub async fn use_workspace(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_workspace_id(store, &id)?;

    store.set_current_workspace(uuid).await;
    ensure_ok(store)?;

    let name = store
        .current_workspace()
        .map(|w| w.name.clone())
        .unwrap_or_default();
    output.success(&format!("Switched to workspace: {}", name));
    Ok(())
}

/// Rename a workspace
pub async fn rename(store: &mut Store, id: String, name: String, output: &Output) -> Result<()> {
    let uuid = resolve_workspace_id(store, &id)?;
    let name = required_name(&name, "Workspace name")?;

    store.rename_workspace(uuid, &name).await;
    ensure_ok(store)?;

    output.success(&format!("Renamed workspace {} to {}", short_id(uuid), name));
    Ok(())
}

/// Delete a workspace and all of its pages
pub async fn delete(store: &mut Store, id: String, output: &Output) -> Result<()> {
    let uuid = resolve_workspace_id(store, &id)?;

    if store.workspaces().len() == 1 {
        bail!("Cannot delete the only workspace. Create another one first.");
    }

    if output.should_prompt() {
        if let Some(workspace) = store.workspace(uuid) {
            println!(
                "Delete workspace: {} - {} ({} page(s))",
                short_id(workspace.id),
                workspace.name,
                workspace.pages.len()
            );
        }
        if !confirm("Are you sure?")? {
            println!("Cancelled.");
            return Ok(());
        }
    }

    if !store.delete_workspace(uuid).await {
        bail!("Workspace was not deleted");
    }
    ensure_ok(store)?;

    output.success(&format!("Deleted workspace: {}", uuid));
    Ok(())
}
