//! Interactive editing support
//!
//! Opens $EDITOR on a temporary copy of a page and asks for confirmation
//! before destructive commands.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::process::Command;

use anyhow::{bail, Context, Result};

/// Open `initial_content` in the user's preferred editor and return the result
///
/// `$EDITOR` may carry arguments (`code --wait`).
pub fn edit_text(initial_content: &str) -> Result<String> {
    let editor = find_editor()?;
    let mut parts = editor.split_whitespace();
    let program = parts.next().unwrap_or("vi");

    let mut file = tempfile::Builder::new()
        .prefix("folio-page-")
        .suffix(".txt")
        .tempfile()
        .context("Failed to create temp file for editing")?;
    file.write_all(initial_content.as_bytes())
        .context("Failed to write temp file for editing")?;
    file.flush()?;

    let status = Command::new(program)
        .args(parts)
        .arg(file.path())
        .status()
        .with_context(|| format!("Failed to run editor: {}", editor))?;

    if !status.success() {
        bail!(
            "Editor '{}' exited with non-zero status. Check that your editor is configured correctly.",
            editor
        );
    }

    fs::read_to_string(file.path())
        .with_context(|| format!("Failed to read edited file: {:?}", file.path()))
}

/// Find the user's preferred editor
fn find_editor() -> Result<String> {
    for var in ["VISUAL", "EDITOR"] {
        if let Ok(editor) = env::var(var) {
            if !editor.trim().is_empty() {
                return Ok(editor);
            }
        }
    }

    let fallbacks = ["nano", "vim", "vi"];
    if let Some(editor) = fallbacks.iter().find(|e| on_path(e)) {
        return Ok(editor.to_string());
    }

    bail!(
        "No editor found. Set $EDITOR environment variable.\n\
         Example: export EDITOR=nano"
    )
}

/// Whether `program` is an executable file in one of the $PATH directories
fn on_path(program: &str) -> bool {
    env::var_os("PATH")
        .map(|paths| env::split_paths(&paths).any(|dir| is_file(&dir.join(program))))
        .unwrap_or(false)
}

fn is_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}

/// Prompt for confirmation
///
/// Returns true if user confirms, false otherwise.
/// In non-interactive mode (no TTY), returns false.
pub fn confirm(prompt: &str) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Ok(false);
    }

    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}
