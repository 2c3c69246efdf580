//! package.json field reconciliation.
//!
//! A specialization of the file-sync engine for exactly one file: only the
//! selected top-level fields (`scripts` and/or `engines`) are managed, every
//! other field of the target document is preserved verbatim, key order
//! included. This reconciler never creates a fresh `package.json`: a missing
//! or unparsable target fails fast before the engine runs, and an unparsable
//! copy on the sync branch fails the sync at merge time.

use std::path::Path;

use serde_json::Value;

use crate::filesync::{ContentProcessor, FileSyncRequest, MergeError, canonical_json, sync_contents};
use crate::github::RepoHost;
use crate::types::{FileSyncOutcome, FileSyncStatus};

/// The target path this reconciler manages.
const PACKAGE_JSON_PATH: &str = "package.json";

/// The top-level fields eligible for management.
pub const ALLOWED_FIELDS: [&str; 2] = ["scripts", "engines"];

/// Content processor comparing and merging only the selected fields.
///
/// `extract_comparable` projects a document onto the selected fields and
/// serializes them with sorted keys, so the comparison is deep and
/// key-order-insensitive on both sides. `merge_final` replaces the selected
/// fields in the existing document and leaves everything else untouched.
#[derive(Debug, Clone)]
pub struct PackageJsonProcessor {
    fields: Vec<String>,
}

impl PackageJsonProcessor {
    pub fn new(fields: Vec<String>) -> Self {
        PackageJsonProcessor { fields }
    }

    fn projection(&self, doc: &Value) -> Value {
        let mut map = serde_json::Map::new();
        for field in &self.fields {
            if let Some(value) = doc.get(field) {
                map.insert(field.clone(), value.clone());
            }
        }
        Value::Object(map)
    }
}

impl ContentProcessor for PackageJsonProcessor {
    fn extract_comparable(&self, content: &str) -> String {
        match serde_json::from_str::<Value>(content) {
            Ok(doc) => canonical_json(&self.projection(&doc)),
            // Unparsable content participates verbatim so the mismatch is
            // visible; the subsequent merge then fails rather than guess.
            Err(_) => content.to_string(),
        }
    }

    fn merge_final(&self, source: &str, existing: &str) -> Result<String, MergeError> {
        let source_doc: Value = serde_json::from_str(source)
            .map_err(|e| MergeError(format!("source package.json is not valid JSON: {e}")))?;
        let mut existing_doc: Value = serde_json::from_str(existing).map_err(|e| {
            MergeError(format!(
                "existing package.json on the sync branch is not valid JSON: {e}"
            ))
        })?;
        if let Some(map) = existing_doc.as_object_mut() {
            for field in &self.fields {
                if let Some(value) = source_doc.get(field) {
                    map.insert(field.clone(), value.clone());
                }
            }
        }
        let mut out = serde_json::to_string_pretty(&existing_doc)
            .map_err(|e| MergeError(format!("failed to serialize merged package.json: {e}")))?;
        out.push('\n');
        Ok(out)
    }
}

/// Merges the selected fields of a source `package.json` into the target
/// repository's existing one, through the PR engine.
pub async fn reconcile_package_json<H: RepoHost>(
    host: &H,
    source_path: &Path,
    fields: &[String],
    branch: &str,
    pr_title: &str,
    pr_body: &str,
    dry_run: bool,
) -> FileSyncOutcome {
    for field in fields {
        if !ALLOWED_FIELDS.contains(&field.as_str()) {
            return FileSyncOutcome::failed(
                dry_run,
                branch,
                format!("unsupported package.json field {field:?} (expected scripts or engines)"),
            );
        }
    }

    let source = match std::fs::read_to_string(source_path) {
        Ok(content) => content,
        Err(e) => {
            return FileSyncOutcome::failed(
                dry_run,
                branch,
                format!("failed to read source file {}: {e}", source_path.display()),
            );
        }
    };
    if serde_json::from_str::<Value>(&source).is_err() {
        return FileSyncOutcome::failed(
            dry_run,
            branch,
            format!("source file {} is not valid JSON", source_path.display()),
        );
    }

    // Fail fast when the target does not exist or is unparsable; this
    // reconciler only ever edits an existing document.
    let default_branch = match host.get_repository().await {
        Ok(record) => record.default_branch,
        Err(e) => {
            return FileSyncOutcome::failed(
                dry_run,
                branch,
                format!("failed to fetch repository: {e}"),
            );
        }
    };
    match host.get_file(PACKAGE_JSON_PATH, &default_branch).await {
        Ok(Some(existing)) => {
            if serde_json::from_str::<Value>(&existing.content).is_err() {
                return FileSyncOutcome::failed(
                    dry_run,
                    branch,
                    "target package.json is not valid JSON",
                );
            }
        }
        Ok(None) => {
            return FileSyncOutcome::failed(
                dry_run,
                branch,
                "target package.json does not exist; this reconciler never creates one",
            );
        }
        Err(e) => {
            return FileSyncOutcome::failed(
                dry_run,
                branch,
                format!("failed to fetch package.json: {e}"),
            );
        }
    }

    let processor = PackageJsonProcessor::new(fields.to_vec());
    let request = FileSyncRequest {
        targets: &[],
        branch,
        pr_title,
        pr_body,
        processor: Some(&processor),
        dry_run,
    };
    let outcome = sync_contents(
        host,
        &request,
        &[(PACKAGE_JSON_PATH.to_string(), source)],
    )
    .await;

    // The pre-check guarantees the file exists, so a "create"-flavored
    // status can only mean the PR branch lost the file; report it as a
    // plain update for readability.
    normalize_status(outcome)
}

fn normalize_status(mut outcome: FileSyncOutcome) -> FileSyncOutcome {
    outcome.status = match outcome.status {
        FileSyncStatus::Created | FileSyncStatus::Mixed => FileSyncStatus::Updated,
        FileSyncStatus::PrUpdatedCreated | FileSyncStatus::PrUpdatedMixed => {
            FileSyncStatus::PrUpdated
        }
        FileSyncStatus::WouldCreate => FileSyncStatus::WouldUpdate,
        other => other,
    };
    outcome
}
