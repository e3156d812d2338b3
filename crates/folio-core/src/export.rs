//! Page export
//!
//! Renders a page into one of three static text templates. Rendering is pure;
//! writing the result somewhere is a separate step (`Export::write_to_dir`).

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use thiserror::Error;

use crate::models::{Page, DEFAULT_PAGE_TITLE};
use crate::storage::selection::atomic_write;
use crate::storage::StorageResult;

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Markdown,
    Html,
}

/// Returned when parsing an unknown format name
#[derive(Error, Debug)]
#[error("Unknown export format '{0}' (expected txt, md or html)")]
pub struct UnknownFormat(String);

impl ExportFormat {
    /// File extension, without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Markdown => "md",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Html => "text/html",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "txt" | "text" => Ok(ExportFormat::Txt),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            "html" | "htm" => Ok(ExportFormat::Html),
            _ => Err(UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered page, ready to be saved as a file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    /// Suggested file name: `{title}.{ext}`
    pub file_name: String,
    pub mime_type: &'static str,
    pub contents: String,
}

impl Export {
    /// Render `page` in `format`
    pub fn of(page: &Page, format: ExportFormat) -> Self {
        Self {
            file_name: file_name(&page.title, format),
            mime_type: format.mime_type(),
            contents: render(page, format),
        }
    }

    /// Write the export into `dir` under its file name, returning the full path
    pub fn write_to_dir(&self, dir: &Path) -> StorageResult<PathBuf> {
        let path = dir.join(&self.file_name);
        atomic_write(&path, self.contents.as_bytes())?;
        Ok(path)
    }
}

/// Render a page as text
pub fn render(page: &Page, format: ExportFormat) -> String {
    let created = created_label(page);
    match format {
        ExportFormat::Txt => format!(
            "{}\n{}\n\n{}\n\n---\nCreated: {}",
            page.title,
            "=".repeat(page.title.chars().count()),
            page.content,
            created
        ),
        ExportFormat::Markdown => format!(
            "# {}\n\n{}\n\n---\n*Created: {}*",
            page.title, page.content, created
        ),
        ExportFormat::Html => {
            let title = escape_html(&page.title);
            let body = escape_html(&page.content).replace('\n', "<br>");
            format!(
                r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <meta charset="utf-8">
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 800px; margin: 0 auto; padding: 20px; line-height: 1.6; }}
        h1 {{ color: #333; }}
    </style>
</head>
<body>
    <h1>{title}</h1>
    <div>{body}</div>
    <hr>
    <small>Created: {created}</small>
</body>
</html>"#
            )
        }
    }
}

/// Creation date in local time, month/day/year
fn created_label(page: &Page) -> String {
    page.created_at
        .with_timezone(&Local)
        .format("%-m/%-d/%Y")
        .to_string()
}

/// `{title}.{ext}` with characters that cannot appear in a file name replaced
fn file_name(title: &str, format: ExportFormat) -> String {
    let stem: String = title
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = if stem.is_empty() {
        DEFAULT_PAGE_TITLE
    } else {
        stem.as_str()
    };
    format!("{}.{}", stem, format.extension())
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
    out
}
