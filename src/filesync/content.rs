//! Content processors: isolating the managed portion of a file.
//!
//! Some synced files are only partially managed: a `.gitignore` may carry a
//! marker-delimited section that belongs to the repository, and a
//! `package.json` is managed only in selected top-level fields. A
//! [`ContentProcessor`] is a pair of pure functions that isolate the managed
//! portion for comparison and reassemble the final file for commit.
//!
//! Invariants: the engine reduces every source to its comparable form once,
//! up front, via `extract_comparable`; after that only the remote copy being
//! diffed (default branch or PR branch) goes through extraction, so the same
//! marker logic governs both "does the default branch need a PR" and "does
//! an existing PR need a new commit". `merge_final` always receives a source
//! already in comparable form.

use serde_json::Value;
use thiserror::Error;

/// A remote copy that cannot be merged into (e.g. unparsable JSON where a
/// document is required). Surfaced so the sync fails instead of recommitting
/// content it could not actually merge.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct MergeError(pub String);

/// Isolates the managed portion of a file during comparison and merge.
pub trait ContentProcessor: Send + Sync {
    /// Extracts the comparable (managed) portion of a document.
    fn extract_comparable(&self, content: &str) -> String;

    /// Produces the final file content: the managed portion from `source`
    /// (already in comparable form), everything else preserved verbatim
    /// from `existing`.
    ///
    /// The result must end with exactly one trailing newline, and any
    /// preserved section must be separated from the synced portion by
    /// exactly one blank line. An `existing` that cannot be merged into is
    /// an error, never a silent passthrough.
    fn merge_final(&self, source: &str, existing: &str) -> Result<String, MergeError>;
}

/// Marker line that begins the repository-owned section of a `.gitignore`.
///
/// Everything above the marker is managed and replaced on sync; the marker
/// and everything below it survive verbatim.
pub const GITIGNORE_PRESERVE_MARKER: &str = "# --- repository-specific entries below (preserved) ---";

/// Processor for `.gitignore` files with a preserved trailing section.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitignoreProcessor;

impl ContentProcessor for GitignoreProcessor {
    fn extract_comparable(&self, content: &str) -> String {
        match content.find(GITIGNORE_PRESERVE_MARKER) {
            Some(idx) => content[..idx].to_string(),
            None => content.to_string(),
        }
    }

    fn merge_final(&self, source: &str, existing: &str) -> Result<String, MergeError> {
        let synced = source.trim_end();
        Ok(match existing.find(GITIGNORE_PRESERVE_MARKER) {
            Some(idx) => {
                let preserved = existing[idx..].trim_end();
                format!("{synced}\n\n{preserved}\n")
            }
            None => format!("{synced}\n"),
        })
    }
}

/// Serializes a JSON value with all object keys sorted, recursively.
///
/// Used wherever equality must be deep and key-order-insensitive (the
/// package.json field comparison).
pub fn canonical_json(value: &Value) -> String {
    fn sort(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut keys: Vec<&String> = map.keys().collect();
                keys.sort();
                let mut sorted = serde_json::Map::new();
                for key in keys {
                    sorted.insert(key.clone(), sort(&map[key]));
                }
                Value::Object(sorted)
            }
            Value::Array(items) => Value::Array(items.iter().map(sort).collect()),
            other => other.clone(),
        }
    }
    sort(value).to_string()
}
