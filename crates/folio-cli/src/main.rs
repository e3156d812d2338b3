//! Folio CLI
//!
//! Command-line interface for Folio - local-first workspaces of plain-text
//! pages.

use std::fs::OpenOptions;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio_core::{Config, WorkspaceStore};

mod commands;
mod editor;
mod output;

use commands::Store;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "Folio - Local-first writing workspaces")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workspaces
    #[command(alias = "ws")]
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
    /// Manage pages in the current workspace
    Page {
        #[command(subcommand)]
        command: PageCommands,
    },
    /// Write to a page from stdin, saving as you go
    Write {
        /// Page ID (full UUID or prefix); defaults to the selected page
        #[arg(short, long)]
        page: Option<String>,
        /// Set the page title
        #[arg(short = 'T', long)]
        title: Option<String>,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Show status (current selection, storage, counts)
    Status,
}

#[derive(Subcommand)]
enum WorkspaceCommands {
    /// Create a workspace and switch to it
    #[command(alias = "add")]
    Create {
        /// Workspace name
        name: String,
        /// Accent color (e.g. "#3b82f6")
        #[arg(short, long)]
        color: Option<String>,
    },
    /// List all workspaces
    #[command(alias = "ls")]
    List,
    /// Switch to a workspace
    Use {
        /// Workspace ID (full UUID or prefix)
        id: String,
    },
    /// Rename a workspace
    Rename {
        /// Workspace ID (full UUID or prefix)
        id: String,
        /// New name
        name: String,
    },
    /// Delete a workspace and its pages
    #[command(alias = "rm")]
    Delete {
        /// Workspace ID (full UUID or prefix)
        id: String,
    },
}

#[derive(Subcommand)]
enum PageCommands {
    /// Create a page and select it
    #[command(alias = "add")]
    Create {
        /// Page title (defaults to "Untitled")
        title: Option<String>,
    },
    /// List pages, optionally filtered and sorted
    #[command(alias = "ls")]
    List {
        /// Only pages whose title or content contains this text
        #[arg(short, long)]
        search: Option<String>,
        /// Sort order: updated, created or title
        #[arg(long, default_value = "updated")]
        sort: String,
    },
    /// Select a page
    Use {
        /// Page ID (full UUID or prefix)
        id: String,
    },
    /// Show a page (defaults to the selected page)
    Show {
        /// Page ID (full UUID or prefix)
        id: Option<String>,
    },
    /// Edit a page in $EDITOR, or rename it with --title
    Edit {
        /// Page ID (full UUID or prefix)
        id: Option<String>,
        /// New title; keeps the content unchanged
        #[arg(short = 'T', long)]
        title: Option<String>,
    },
    /// Delete a page
    #[command(alias = "rm")]
    Delete {
        /// Page ID (full UUID or prefix)
        id: String,
    },
    /// Copy a page
    Duplicate {
        /// Page ID (full UUID or prefix)
        id: String,
    },
    /// Export a page to a file
    Export {
        /// Page ID (full UUID or prefix)
        id: String,
        /// Output format: txt, md or html
        #[arg(short, long, default_value = "md")]
        format: String,
        /// Directory to write to (defaults to the current directory)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Open the exported file afterwards
        #[arg(long)]
        open: bool,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, autosave_delay_ms, default_color, ...)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without opening the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(config_path, &output),
            Some(ConfigCommands::Set { key, value }) => {
                commands::config::set(key, value, config_path, &output)
            }
        };
    }

    let config = Config::load_with_cli_override(config_path)?;
    init_logging(&config);

    let mut store = WorkspaceStore::open(&config);
    store.load_all().await;
    commands::ensure_ok(&store)?;

    match cli.command {
        Commands::Workspace { command } => {
            handle_workspace_command(command, &mut store, &config, &output).await
        }
        Commands::Page { command } => handle_page_command(command, &mut store, &output).await,
        Commands::Write { page, title } => {
            commands::write::write(store, &config, page, title, &output).await
        }
        Commands::Config { .. } => unreachable!(), // Handled above
        Commands::Status => commands::status::show(&store, &config, &output),
    }
}

async fn handle_workspace_command(
    command: WorkspaceCommands,
    store: &mut Store,
    config: &Config,
    output: &Output,
) -> Result<()> {
    match command {
        WorkspaceCommands::Create { name, color } => {
            commands::workspace::create(store, config, name, color, output).await
        }
        WorkspaceCommands::List => commands::workspace::list(store, output),
        WorkspaceCommands::Use { id } => commands::workspace::use_workspace(store, id, output).await,
        WorkspaceCommands::Rename { id, name } => {
            commands::workspace::rename(store, id, name, output).await
        }
        WorkspaceCommands::Delete { id } => commands::workspace::delete(store, id, output).await,
    }
}

async fn handle_page_command(
    command: PageCommands,
    store: &mut Store,
    output: &Output,
) -> Result<()> {
    match command {
        PageCommands::Create { title } => commands::page::create(store, title, output).await,
        PageCommands::List { search, sort } => commands::page::list(store, search, sort, output),
        PageCommands::Use { id } => commands::page::use_page(store, id, output).await,
        PageCommands::Show { id } => commands::page::show(store, id, output),
        PageCommands::Edit { id, title } => commands::page::edit(store, id, title, output).await,
        PageCommands::Delete { id } => commands::page::delete(store, id, output).await,
        PageCommands::Duplicate { id } => commands::page::duplicate(store, id, output).await,
        PageCommands::Export {
            id,
            format,
            out,
            open,
        } => commands::page::export(store, id, format, out, open, output),
    }
}

/// Install a tracing subscriber when FOLIO_LOG is set
///
/// Logs go to `log_file` when configured, stderr otherwise.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("FOLIO_LOG") else {
        return;
    };

    let env_filter = EnvFilter::new(format!("folio_core={},folio={}", log_level, log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false);

    match &config.log_file {
        Some(log_path) => {
            let log_file = match OpenOptions::new().create(true).append(true).open(log_path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Warning: Could not open log file {:?}: {}", log_path, e);
                    return;
                }
            };
            // Ignore error if already initialized
            let _ = builder.with_ansi(false).with_writer(log_file).try_init();
            info!("Logging initialized to {:?}", log_path);
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
