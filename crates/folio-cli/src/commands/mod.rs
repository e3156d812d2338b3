//! Command handlers
//!
//! Each submodule handles one top-level command. Helpers shared between them
//! live here: id prefix resolution and turning store failures into errors.

pub mod config;
pub mod page;
pub mod status;
pub mod workspace;
pub mod write;

use anyhow::{bail, Result};
use uuid::Uuid;

use folio_core::{SqliteKvStore, Workspace, WorkspaceStore};

/// The store as used by the CLI
pub type Store = WorkspaceStore<SqliteKvStore>;

/// Fail with the store's last error, if it recorded one
pub fn ensure_ok(store: &Store) -> Result<()> {
    match (store.error(), store.recovery_hint()) {
        (None, _) => Ok(()),
        (Some(message), Some(hint)) => bail!("{}\n{}", message, hint),
        (Some(message), None) => bail!("{}", message),
    }
}

/// The current workspace, or an error telling the user how to get one
pub fn require_workspace(store: &Store) -> Result<&Workspace> {
    match store.current_workspace() {
        Some(workspace) => Ok(workspace),
        None => bail!("No workspace selected. Create one with `folio workspace create <name>`."),
    }
}

/// Trim a user-supplied name, rejecting blank ones
pub fn required_name(value: &str, what: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("{} cannot be empty", what);
    }
    Ok(trimmed.to_string())
}

/// Resolve a workspace id given in full or as a unique prefix
pub fn resolve_workspace_id(store: &Store, id: &str) -> Result<Uuid> {
    resolve_id(
        "workspace",
        id,
        store.workspaces().iter().map(|w| (w.id, w.name.as_str())),
    )
}

/// Resolve a page id among the pages of `workspace`
pub fn resolve_page_in(workspace: &Workspace, id: &str) -> Result<Uuid> {
    resolve_id(
        "page",
        id,
        workspace.pages.iter().map(|p| (p.id, p.title.as_str())),
    )
}

/// Resolve a page id among the pages of every workspace
pub fn resolve_any_page(store: &Store, id: &str) -> Result<Uuid> {
    resolve_id(
        "page",
        id,
        store
            .workspaces()
            .iter()
            .flat_map(|w| w.pages.iter())
            .map(|p| (p.id, p.title.as_str())),
    )
}

/// Match `id` against `(id, label)` candidates: exact id first, then prefix
fn resolve_id<'a>(
    kind: &str,
    id: &str,
    candidates: impl Iterator<Item = (Uuid, &'a str)>,
) -> Result<Uuid> {
    let needle = id.trim().to_lowercase();
    let candidates: Vec<_> = candidates.collect();

    if let Ok(uuid) = Uuid::parse_str(&needle) {
        if candidates.iter().any(|(c, _)| *c == uuid) {
            return Ok(uuid);
        }
        bail!("No {} found with id: {}", kind, id);
    }

    if needle.is_empty() {
        bail!("No {} id given", kind);
    }

    let matches: Vec<_> = candidates
        .iter()
        .filter(|(c, _)| c.to_string().starts_with(&needle))
        .collect();

    match matches.as_slice() {
        [] => bail!("No {} found matching: {}", kind, id),
        [(uuid, _)] => Ok(*uuid),
        _ => {
            eprintln!("Multiple {}s match '{}':", kind, id);
            for (uuid, label) in &matches {
                eprintln!("  {} - {}", uuid, label);
            }
            bail!("Ambiguous ID. Please provide more characters.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<(Uuid, &'static str)> {
        vec![
            (
                Uuid::parse_str("5d1c8a52-3f0e-4c1e-9a53-0d6b1f0b8f3a").unwrap(),
                "Essays",
            ),
            (
                Uuid::parse_str("5d2f4a0e-7f4d-4f0e-8d6a-2c9c1f6e4b11").unwrap(),
                "Journal",
            ),
            (
                Uuid::parse_str("a0b1c2d3-0000-4000-8000-000000000000").unwrap(),
                "Drafts",
            ),
        ]
    }

    #[test]
    fn test_resolve_full_id() {
        let candidates = ids();
        let full = candidates[1].0.to_string();
        let resolved = resolve_id("workspace", &full, candidates.into_iter()).unwrap();
        assert_eq!(resolved.to_string(), full);
    }

    #[test]
    fn test_resolve_unknown_full_id() {
        let missing = Uuid::new_v4().to_string();
        assert!(resolve_id("workspace", &missing, ids().into_iter()).is_err());
    }

    #[test]
    fn test_resolve_prefix() {
        let resolved = resolve_id("page", "5d1", ids().into_iter()).unwrap();
        assert_eq!(resolved, ids()[0].0);

        let resolved = resolve_id("page", "A0B1", ids().into_iter()).unwrap();
        assert_eq!(resolved, ids()[2].0);
    }

    #[test]
    fn test_resolve_ambiguous_prefix() {
        assert!(resolve_id("page", "5d", ids().into_iter()).is_err());
    }

    #[test]
    fn test_resolve_no_match() {
        assert!(resolve_id("page", "fff", ids().into_iter()).is_err());
        assert!(resolve_id("page", "  ", ids().into_iter()).is_err());
    }

    #[test]
    fn test_required_name() {
        assert_eq!(required_name("  Essays ", "Name").unwrap(), "Essays");
        assert!(required_name("   ", "Name").is_err());
    }
}
