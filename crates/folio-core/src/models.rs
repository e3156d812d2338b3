//! Data models for Folio
//!
//! Defines the two persisted entities: `Workspace` and the `Page`s it owns.
//! Field names serialize in camelCase and timestamps as epoch milliseconds,
//! which is the layout of the persisted workspace collection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::stats::TextStats;

/// Title given to pages created without an explicit one
pub const DEFAULT_PAGE_TITLE: &str = "Untitled";

/// Marker appended to the title of a duplicated page
pub const COPY_SUFFIX: &str = " (Copy)";

/// Current time at the precision the persisted format keeps (milliseconds)
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// Order of a page listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSort {
    /// Most recently modified first
    #[default]
    Updated,
    /// Most recently created first
    Created,
    /// Alphabetical, ignoring case
    Title,
}

/// Returned when parsing an unknown sort name
#[derive(Error, Debug)]
#[error("Unknown sort order '{0}' (expected updated, created or title)")]
pub struct UnknownSort(String);

impl FromStr for PageSort {
    type Err = UnknownSort;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "updated" => Ok(PageSort::Updated),
            "created" => Ok(PageSort::Created),
            "title" => Ok(PageSort::Title),
            _ => Err(UnknownSort(s.to_string())),
        }
    }
}

impl fmt::Display for PageSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PageSort::Updated => "updated",
            PageSort::Created => "created",
            PageSort::Title => "title",
        })
    }
}

/// A single page of writing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Unique identifier, fixed for the page's lifetime
    pub id: Uuid,
    /// Page title
    pub title: String,
    /// Plain text content
    pub content: String,
    /// When this page was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When this page was last modified
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
    /// Cached word count of `content`
    pub word_count: usize,
    /// Cached character count of `content`
    pub char_count: usize,
}

impl Page {
    /// Create an empty page with the given title
    pub fn new(title: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            content: String::new(),
            created_at: now,
            updated_at: now,
            word_count: 0,
            char_count: 0,
        }
    }

    /// Replace the content and recompute the cached counts
    pub fn set_content(&mut self, content: impl Into<String>) {
        self.content = content.into();
        let stats = TextStats::of(&self.content);
        self.word_count = stats.words;
        self.char_count = stats.chars;
        self.updated_at = now();
    }

    /// Update the title
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        self.updated_at = now();
    }

    /// Copy this page under a fresh id with a marked title and new timestamps
    pub fn duplicate(&self) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            title: format!("{}{}", self.title, COPY_SUFFIX),
            created_at: now,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// A named collection of pages
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    /// Unique identifier
    pub id: Uuid,
    /// Display name (not required to be unique)
    pub name: String,
    /// Accent color, stored as given (e.g. "#3b82f6")
    pub color: String,
    /// Pages in creation order
    pub pages: Vec<Page>,
    /// The page last selected in this workspace, by id
    pub current_page_id: Option<Uuid>,
    /// When this workspace was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// When this workspace or one of its pages was last modified
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Create an empty workspace
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        let now = now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color: color.into(),
            pages: Vec::new(),
            current_page_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Update the name
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.touch();
    }

    /// Bump `updated_at` to now
    pub fn touch(&mut self) {
        self.updated_at = now();
    }

    /// Look up a page by id
    pub fn page(&self, id: Uuid) -> Option<&Page> {
        self.pages.iter().find(|p| p.id == id)
    }

    /// Look up a page by id for modification
    pub fn page_mut(&mut self, id: Uuid) -> Option<&mut Page> {
        self.pages.iter_mut().find(|p| p.id == id)
    }

    /// Check whether a page belongs to this workspace
    pub fn contains_page(&self, id: Uuid) -> bool {
        self.pages.iter().any(|p| p.id == id)
    }

    /// The page `current_page_id` points at, if it still exists
    pub fn current_page(&self) -> Option<&Page> {
        self.current_page_id.and_then(|id| self.page(id))
    }

    /// Sum of the word counts of all pages
    pub fn total_words(&self) -> usize {
        self.pages.iter().map(|p| p.word_count).sum()
    }

    /// Pages whose title or content contains `query`, in `sort` order
    ///
    /// Matching ignores case. An empty or missing query matches every page.
    pub fn find_pages(&self, query: Option<&str>, sort: PageSort) -> Vec<&Page> {
        let needle = query.unwrap_or_default().to_lowercase();
        let mut pages: Vec<&Page> = self
            .pages
            .iter()
            .filter(|p| {
                needle.is_empty()
                    || p.title.to_lowercase().contains(&needle)
                    || p.content.to_lowercase().contains(&needle)
            })
            .collect();

        match sort {
            PageSort::Updated => pages.sort_by(|a, b| b.updated_at.cmp(&a.updated_at)),
            PageSort::Created => pages.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            PageSort::Title => pages.sort_by(|a, b| {
                a.title
                    .to_lowercase()
                    .cmp(&b.title.to_lowercase())
                    .then_with(|| a.title.cmp(&b.title))
            }),
        }
        pages
    }
}
