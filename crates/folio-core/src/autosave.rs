//! Debounced autosave for an editing surface
//!
//! The store persists every mutation, so an editor must not call it on each
//! keystroke. `Autosaver` sits between the two:
//!
//! - content edits update the session counters at once, then save after the
//!   configured quiet period (`autosave_delay_ms`)
//! - the writer counts as "writing" until `idle_timeout_ms` passes without an
//!   edit
//! - title edits are debounced on their own timer (`title_delay_ms`) and keep
//!   whatever content the page has when the timer fires
//!
//! Timers are tokio tasks. Restarting, flushing or dropping the autosaver
//! cancels a timer that is still sleeping. Once a timer has started saving it
//! runs to completion; `flush` waits for it.

use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::session::Session;
use crate::stats::TextStats;
use crate::storage::KeyValueStore;
use crate::store::WorkspaceStore;

/// Timer lengths used by the autosaver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutosaveSettings {
    pub save_delay: Duration,
    pub idle_timeout: Duration,
    pub title_delay: Duration,
}

impl Default for AutosaveSettings {
    fn default() -> Self {
        Self {
            save_delay: Duration::from_millis(500),
            idle_timeout: Duration::from_millis(1000),
            title_delay: Duration::from_millis(300),
        }
    }
}

impl From<&Config> for AutosaveSettings {
    fn from(config: &Config) -> Self {
        Self {
            save_delay: config.autosave_delay(),
            idle_timeout: config.idle_timeout(),
            title_delay: config.title_delay(),
        }
    }
}

#[derive(Debug)]
struct PendingContent {
    page_id: Uuid,
    content: String,
}

#[derive(Debug)]
struct PendingTitle {
    page_id: Uuid,
    title: String,
}

type Slot<T> = Arc<std::sync::Mutex<Option<T>>>;

fn take<T>(slot: &Slot<T>) -> Option<T> {
    slot.lock().unwrap_or_else(|e| e.into_inner()).take()
}

fn fill<T>(slot: &Slot<T>, value: T) {
    *slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(value);
}

const SLEEPING: u8 = 0;
const SAVING: u8 = 1;
const CANCELLED: u8 = 2;

/// Debounce task that can be cancelled only before its save starts
struct SaveTimer {
    state: Arc<AtomicU8>,
    handle: JoinHandle<()>,
}

impl SaveTimer {
    fn spawn<F, Fut>(delay: Duration, save: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let state = Arc::new(AtomicU8::new(SLEEPING));
        let handle = tokio::spawn({
            let state = Arc::clone(&state);
            async move {
                tokio::time::sleep(delay).await;
                if state
                    .compare_exchange(SLEEPING, SAVING, Ordering::AcqRel, Ordering::Acquire)
                    .is_ok()
                {
                    save().await;
                }
            }
        });
        Self { state, handle }
    }

    /// Stop the timer if it is still sleeping
    ///
    /// Returns the task handle when the save has already started.
    fn cancel(self) -> Option<JoinHandle<()>> {
        match self.state.compare_exchange(
            SLEEPING,
            CANCELLED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => {
                self.handle.abort();
                None
            }
            Err(_) => Some(self.handle),
        }
    }
}

/// Debounces edits into store saves and tracks the writing session
pub struct Autosaver<S> {
    store: Arc<Mutex<WorkspaceStore<S>>>,
    session: Arc<Mutex<Session>>,
    settings: AutosaveSettings,
    content: Slot<PendingContent>,
    title: Slot<PendingTitle>,
    save_timer: Option<SaveTimer>,
    title_timer: Option<SaveTimer>,
    idle_timer: Option<JoinHandle<()>>,
    in_flight: Vec<JoinHandle<()>>,
}

impl<S: KeyValueStore> Autosaver<S> {
    pub fn new(store: Arc<Mutex<WorkspaceStore<S>>>, settings: AutosaveSettings) -> Self {
        Self {
            store,
            session: Arc::new(Mutex::new(Session::new())),
            settings,
            content: Arc::default(),
            title: Arc::default(),
            save_timer: None,
            title_timer: None,
            idle_timer: None,
            in_flight: Vec::new(),
        }
    }

    pub fn store(&self) -> &Arc<Mutex<WorkspaceStore<S>>> {
        &self.store
    }

    pub fn session(&self) -> &Arc<Mutex<Session>> {
        &self.session
    }

    pub fn settings(&self) -> AutosaveSettings {
        self.settings
    }

    /// Whether an edit is waiting for its timer
    pub fn has_pending(&self) -> bool {
        let content = self.content.lock().unwrap_or_else(|e| e.into_inner());
        let title = self.title.lock().unwrap_or_else(|e| e.into_inner());
        content.is_some() || title.is_some()
    }

    /// Record a content edit of `page_id`
    pub async fn content_changed(&mut self, page_id: Uuid, content: &str) {
        let stats = TextStats::of(content);
        {
            let mut session = self.session.lock().await;
            session.update_stats(stats.words, stats.chars);
            session.update_writing_status(true);
        }

        fill(
            &self.content,
            PendingContent {
                page_id,
                content: content.to_string(),
            },
        );

        let timer = SaveTimer::spawn(self.settings.save_delay, {
            let store = Arc::clone(&self.store);
            let session = Arc::clone(&self.session);
            let slot = Arc::clone(&self.content);
            move || async move {
                let mut store = store.lock().await;
                if let Some(pending) = take(&slot) {
                    save_content(&mut store, &session, pending).await;
                }
            }
        });
        reschedule(&mut self.save_timer, &mut self.in_flight, timer);

        restart(&mut self.idle_timer, {
            let session = Arc::clone(&self.session);
            let delay = self.settings.idle_timeout;
            async move {
                tokio::time::sleep(delay).await;
                session.lock().await.update_writing_status(false);
            }
        });
    }

    /// Record a title edit of `page_id`
    pub fn title_changed(&mut self, page_id: Uuid, title: &str) {
        fill(
            &self.title,
            PendingTitle {
                page_id,
                title: title.to_string(),
            },
        );

        let timer = SaveTimer::spawn(self.settings.title_delay, {
            let store = Arc::clone(&self.store);
            let session = Arc::clone(&self.session);
            let content = Arc::clone(&self.content);
            let slot = Arc::clone(&self.title);
            move || async move {
                let mut store = store.lock().await;
                if let Some(pending) = take(&slot) {
                    save_title(&mut store, &session, &content, pending).await;
                }
            }
        });
        reschedule(&mut self.title_timer, &mut self.in_flight, timer);
    }

    /// Run pending saves now and wait for saves already under way
    ///
    /// Returns whether anything was pending or still saving.
    pub async fn flush(&mut self) -> bool {
        for timer in [self.save_timer.take(), self.title_timer.take()]
            .into_iter()
            .flatten()
        {
            if let Some(handle) = timer.cancel() {
                self.in_flight.push(handle);
            }
        }

        let mut flushed = false;
        for handle in self.in_flight.drain(..) {
            flushed |= !handle.is_finished();
            if let Err(e) = handle.await {
                warn!(error = %e, "Autosave task did not complete");
            }
        }

        let mut store = self.store.lock().await;
        let content = take(&self.content);
        let title = take(&self.title);
        flushed |= content.is_some() || title.is_some();

        if let Some(pending) = content {
            save_content(&mut store, &self.session, pending).await;
        }
        if let Some(pending) = title {
            save_title(&mut store, &self.session, &self.content, pending).await;
        }

        flushed
    }
}

impl<S> Drop for Autosaver<S> {
    // Saves already under way are detached and still finish
    fn drop(&mut self) {
        for timer in [self.save_timer.take(), self.title_timer.take()]
            .into_iter()
            .flatten()
        {
            let _ = timer.cancel();
        }
        if let Some(idle) = self.idle_timer.take() {
            idle.abort();
        }
    }
}

/// Replace `slot` with `timer`, keeping a save that already started
fn reschedule(
    slot: &mut Option<SaveTimer>,
    in_flight: &mut Vec<JoinHandle<()>>,
    timer: SaveTimer,
) {
    in_flight.retain(|handle| !handle.is_finished());
    if let Some(handle) = slot.take().and_then(SaveTimer::cancel) {
        in_flight.push(handle);
    }
    *slot = Some(timer);
}

fn restart<F>(timer: &mut Option<JoinHandle<()>>, task: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Some(previous) = timer.take() {
        previous.abort();
    }
    *timer = Some(tokio::spawn(task));
}

async fn save_content<S: KeyValueStore>(
    store: &mut WorkspaceStore<S>,
    session: &Mutex<Session>,
    pending: PendingContent,
) {
    debug!(page = %pending.page_id, chars = pending.content.len(), "Autosaving content");
    store
        .update_page_content(pending.page_id, &pending.content, None)
        .await;
    if store.error().is_none() {
        session.lock().await.mark_saved();
    }
}

/// Save a new title together with the page's latest content
async fn save_title<S: KeyValueStore>(
    store: &mut WorkspaceStore<S>,
    session: &Mutex<Session>,
    content: &Slot<PendingContent>,
    pending: PendingTitle,
) {
    let unsaved = {
        let slot = content.lock().unwrap_or_else(|e| e.into_inner());
        slot.as_ref()
            .filter(|c| c.page_id == pending.page_id)
            .map(|c| c.content.clone())
    };
    let Some(current) = unsaved.or_else(|| store.page(pending.page_id).map(|p| p.content.clone()))
    else {
        return;
    };

    debug!(page = %pending.page_id, "Autosaving title");
    store
        .update_page_content(pending.page_id, &current, Some(&pending.title))
        .await;
    if store.error().is_none() {
        session.lock().await.mark_saved();
    }
}
