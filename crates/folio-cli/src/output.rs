//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use serde::Serialize;
use uuid::Uuid;

use folio_core::{Page, Workspace};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn is_quiet(&self) -> bool {
        matches!(self.format, OutputFormat::Quiet)
    }

    pub fn is_json(&self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }

    /// Print a single workspace with its page titles
    pub fn print_workspace(&self, workspace: &Workspace) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", workspace.id);
                println!("Name:    {}", workspace.name);
                println!("Color:   {}", workspace.color);
                println!("Pages:   {}", workspace.pages.len());
                println!("Words:   {}", workspace.total_words());
                println!("Created: {}", workspace.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated: {}", workspace.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(workspace),
            OutputFormat::Quiet => println!("{}", workspace.id),
        }
    }

    /// Print all workspaces, marking the current one
    pub fn print_workspaces(&self, workspaces: &[Workspace], current: Option<Uuid>) {
        match self.format {
            OutputFormat::Human => {
                if workspaces.is_empty() {
                    println!("No workspaces yet. Create one with `folio workspace create <name>`.");
                    return;
                }
                for workspace in workspaces {
                    let marker = if Some(workspace.id) == current { "*" } else { " " };
                    println!(
                        "{} {} | {} | {} page(s) | {}",
                        marker,
                        short_id(workspace.id),
                        truncate(&workspace.name, 35),
                        workspace.pages.len(),
                        workspace.color
                    );
                }
                println!("\n{} workspace(s)", workspaces.len());
            }
            OutputFormat::Json => {
                let entries: Vec<_> = workspaces
                    .iter()
                    .map(|w| {
                        serde_json::json!({
                            "id": w.id,
                            "name": w.name,
                            "color": w.color,
                            "pages": w.pages.len(),
                            "current": Some(w.id) == current,
                            "updatedAt": w.updated_at.timestamp_millis(),
                        })
                    })
                    .collect();
                print_json(&entries);
            }
            OutputFormat::Quiet => {
                for workspace in workspaces {
                    println!("{}", workspace.id);
                }
            }
        }
    }

    /// Print a single page including its content
    pub fn print_page(&self, page: &Page) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:      {}", page.id);
                println!("Title:   {}", page.title);
                println!("Words:   {}", page.word_count);
                println!("Chars:   {}", page.char_count);
                println!("Created: {}", page.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated: {}", page.updated_at.format("%Y-%m-%d %H:%M"));
                if !page.content.is_empty() {
                    println!("────────────────────────────────────────");
                    println!("{}", page.content);
                }
            }
            OutputFormat::Json => print_json(page),
            OutputFormat::Quiet => println!("{}", page.id),
        }
    }

    /// Print the pages of a workspace, marking the selected one
    pub fn print_pages(&self, pages: &[&Page], current: Option<Uuid>) {
        match self.format {
            OutputFormat::Human => {
                if pages.is_empty() {
                    println!("No pages in this workspace.");
                    return;
                }
                for page in pages {
                    let marker = if Some(page.id) == current { "*" } else { " " };
                    println!(
                        "{} {} | {} | {} words | {}",
                        marker,
                        short_id(page.id),
                        truncate(&page.title, 35),
                        page.word_count,
                        truncate_line(&page.content, 40)
                    );
                }
                println!("\n{} page(s)", pages.len());
            }
            OutputFormat::Json => {
                let entries: Vec<_> = pages
                    .iter()
                    .map(|p| {
                        serde_json::json!({
                            "id": p.id,
                            "title": p.title,
                            "wordCount": p.word_count,
                            "charCount": p.char_count,
                            "current": Some(p.id) == current,
                            "updatedAt": p.updated_at.timestamp_millis(),
                        })
                    })
                    .collect();
                print_json(&entries);
            }
            OutputFormat::Quiet => {
                for page in pages {
                    println!("{}", page.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

/// Pretty-print a value as JSON on stdout
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to format output: {}", e),
    }
}

/// First eight characters of an id, enough to address it by prefix
pub fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Truncate a string to max length in characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Truncate to first line and max length
fn truncate_line(s: &str, max_len: usize) -> String {
    let first_line = s.lines().next().unwrap_or("");
    truncate(first_line, max_len)
}
