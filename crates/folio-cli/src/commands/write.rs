//! Write command: a plain-text writing surface on stdin
//!
//! Lines read from stdin are appended to the page and handed to the
//! autosaver, which saves after each quiet period. End of input flushes
//! whatever is still pending.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Mutex;
use tracing::info;

use folio_core::{AutosaveSettings, Autosaver, Config, TextStats, DEFAULT_PAGE_TITLE};

use super::{ensure_ok, require_workspace, resolve_page_in, Store};
use crate::output::Output;

/// Append stdin to a page with debounced saving
///
/// Writes to `--page`, else the selected page, else a new page.
pub async fn write(
    mut store: Store,
    config: &Config,
    page: Option<String>,
    title: Option<String>,
    output: &Output,
) -> Result<()> {
    let page_id = match page {
        Some(id) => {
            let uuid = resolve_page_in(require_workspace(&store)?, &id)?;
            store.set_current_page(uuid).await;
            uuid
        }
        None => match store.current_page().map(|p| p.id) {
            Some(id) => id,
            None => {
                require_workspace(&store)?;
                let title = title.as_deref().unwrap_or(DEFAULT_PAGE_TITLE);
                store
                    .create_page(title)
                    .await
                    .ok_or_else(|| anyhow!("Failed to create page"))?
            }
        },
    };
    ensure_ok(&store)?;

    let mut content = store
        .page(page_id)
        .map(|p| p.content.clone())
        .unwrap_or_default();
    if !content.is_empty() && !content.ends_with('\n') {
        content.push('\n');
    }

    let store = Arc::new(Mutex::new(store));
    let mut autosaver = Autosaver::new(Arc::clone(&store), AutosaveSettings::from(config));
    {
        let mut session = autosaver.session().lock().await;
        session.start_session();
        let existing = TextStats::of(&content);
        session.word_count = existing.words;
        session.char_count = existing.chars;
    }
    info!(page = %page_id, "Writing session started");

    if let Some(title) = title.as_deref() {
        autosaver.title_changed(page_id, title);
    }

    if output.should_prompt() && atty::is(atty::Stream::Stdin) {
        eprintln!("Writing to page {}. Press Ctrl-D to finish.", page_id);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        content.push_str(&line);
        content.push('\n');
        autosaver.content_changed(page_id, &content).await;
    }

    autosaver.flush().await;
    let today = {
        let mut session = autosaver.session().lock().await;
        let today = session.today_stats();
        session.end_session();
        today
    };
    drop(autosaver);

    let store = store.lock().await;
    ensure_ok(&store)?;
    let page = store
        .page(page_id)
        .ok_or_else(|| anyhow!("Page not found: {}", page_id))?;
    info!(page = %page_id, words = today.words, "Writing session ended");

    if output.is_json() {
        println!(
            "{}",
            serde_json::json!({
                "id": page.id,
                "title": page.title,
                "wordCount": page.word_count,
                "charCount": page.char_count,
                "wordsAdded": today.words,
                "durationSeconds": today.duration.num_seconds(),
            })
        );
    } else if output.is_quiet() {
        println!("{}", page.id);
    } else {
        output.success(&format!(
            "Saved \"{}\": {} words, {} added in {}s",
            page.title,
            page.word_count,
            today.words,
            today.duration.num_seconds()
        ));
    }
    Ok(())
}
