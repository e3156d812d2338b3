//! Workspace collection encoding
//!
//! The whole collection is stored as one JSON record:
//!
//! ```text
//! { "version": 1, "workspaces": [ { ...workspace, "pages": [ ... ] } ] }
//! ```
//!
//! Records written before versioning are a bare JSON array of workspaces and
//! are still accepted on load.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::Workspace;

/// Current format version
pub const CURRENT_VERSION: u32 = 1;

/// Errors that can occur while encoding or decoding the collection
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Invalid workspace data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unsupported data version {found} (this build reads up to {supported})")]
    UnsupportedVersion { found: u64, supported: u32 },

    #[error("Expected a workspace list or versioned record")]
    UnexpectedShape,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    workspaces: &'a [Workspace],
}

#[derive(Deserialize)]
struct Envelope {
    workspaces: Vec<Workspace>,
}

/// Serialize the collection into its stored form
pub fn encode(workspaces: &[Workspace]) -> Result<String, DocumentError> {
    let envelope = EnvelopeRef {
        version: CURRENT_VERSION,
        workspaces,
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Parse a stored record back into the collection
///
/// A blank record decodes to an empty collection.
pub fn decode(data: &str) -> Result<Vec<Workspace>, DocumentError> {
    if data.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(data)?;
    if value.is_array() {
        return Ok(serde_json::from_value(value)?);
    }

    let version = value
        .as_object()
        .ok_or(DocumentError::UnexpectedShape)?
        .get("version")
        .and_then(Value::as_u64)
        .ok_or_else(|| DocumentError::MissingField("version".to_string()))?;

    if version > u64::from(CURRENT_VERSION) {
        return Err(DocumentError::UnsupportedVersion {
            found: version,
            supported: CURRENT_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    Ok(envelope.workspaces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Page;

    fn sample() -> Vec<Workspace> {
        let mut workspace = Workspace::new("Essays", "#f97316");
        let mut page = Page::new("Notes");
        page.set_content("line1\nline2");
        workspace.current_page_id = Some(page.id);
        workspace.pages.push(page);
        vec![workspace, Workspace::new("Journal", "#22c55e")]
    }

    #[test]
    fn test_encode_writes_version() {
        let encoded = encode(&sample()).unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["version"], CURRENT_VERSION);
        assert_eq!(value["workspaces"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_decode_restores_collection() {
        let workspaces = sample();
        let decoded = decode(&encode(&workspaces).unwrap()).unwrap();
        assert_eq!(decoded, workspaces);
    }

    #[test]
    fn test_decode_legacy_array() {
        let workspaces = sample();
        let legacy = serde_json::to_string(&workspaces).unwrap();
        assert!(legacy.starts_with('['));

        let decoded = decode(&legacy).unwrap();
        assert_eq!(decoded, workspaces);
    }

    #[test]
    fn test_decode_blank_is_empty() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode("  \n").unwrap().is_empty());
        assert!(decode("[]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_newer_version() {
        let err = decode(r#"{"version": 2, "workspaces": []}"#).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::UnsupportedVersion { found: 2, .. }
        ));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode("{not json").unwrap_err(), DocumentError::Json(_)));
        assert!(matches!(decode("42").unwrap_err(), DocumentError::UnexpectedShape));
        assert!(matches!(
            decode(r#"{"workspaces": []}"#).unwrap_err(),
            DocumentError::MissingField(_)
        ));
    }
}
