//! Ruleset reconciliation.
//!
//! A ruleset is managed by name: the desired document's mandatory `name` is
//! the lookup key against the list endpoint. Equality with the remote
//! ruleset is computed only over the managed field set — API-only fields
//! (ids, timestamps, links) are stripped from both sides first — and an
//! update always posts the full desired document, never a partial patch.

use serde_json::Value;

use crate::github::RepoHost;
use crate::types::{RulesetOutcome, RulesetStatus};

/// The fields a ruleset is compared over. Everything else in the remote
/// document is API bookkeeping.
const COMPARED_FIELDS: [&str; 6] = [
    "name",
    "target",
    "enforcement",
    "bypass_actors",
    "conditions",
    "rules",
];

/// Reconciles the named ruleset, optionally deleting every other ruleset.
pub async fn reconcile_ruleset<H: RepoHost>(
    host: &H,
    desired: &Value,
    delete_others: bool,
    dry_run: bool,
) -> RulesetOutcome {
    let Some(name) = desired.get("name").and_then(Value::as_str) else {
        return failed(dry_run, "ruleset document is missing a \"name\" field");
    };
    if name.is_empty() {
        return failed(dry_run, "ruleset \"name\" must be non-empty");
    }

    let existing = match host.list_rulesets().await {
        Ok(list) => list,
        Err(e) => return failed(dry_run, format!("failed to list rulesets: {e}")),
    };

    let managed = existing.iter().find(|r| r.name == name);

    let (status, error) = match managed {
        None => {
            if dry_run {
                (RulesetStatus::WouldCreate, None)
            } else {
                match host.create_ruleset(desired).await {
                    Ok(()) => {
                        tracing::info!(repo = %host.repo_id(), ruleset = name, "ruleset created");
                        (RulesetStatus::Created, None)
                    }
                    Err(e) => (
                        RulesetStatus::Failed,
                        Some(format!("failed to create ruleset: {e}")),
                    ),
                }
            }
        }
        Some(summary) => {
            let remote = match host.get_ruleset(summary.id).await {
                Ok(doc) => doc,
                Err(e) => return failed(dry_run, format!("failed to fetch ruleset: {e}")),
            };
            if rulesets_equal(desired, &remote) {
                (RulesetStatus::Unchanged, None)
            } else if dry_run {
                (RulesetStatus::WouldUpdate, None)
            } else {
                match host.update_ruleset(summary.id, desired).await {
                    Ok(()) => {
                        tracing::info!(repo = %host.repo_id(), ruleset = name, "ruleset updated");
                        (RulesetStatus::Updated, None)
                    }
                    Err(e) => (
                        RulesetStatus::Failed,
                        Some(format!("failed to update ruleset: {e}")),
                    ),
                }
            }
        }
    };

    // Deleting unmanaged rulesets is independent of the managed ruleset's
    // own result: each deletion is attempted on its own, and a failure is
    // recorded per-ruleset without aborting the rest.
    let mut deleted = Vec::new();
    let mut delete_warnings = Vec::new();
    if delete_others {
        for other in existing.iter().filter(|r| r.name != name) {
            if dry_run {
                deleted.push(other.name.clone());
                continue;
            }
            match host.delete_ruleset(other.id).await {
                Ok(()) => {
                    tracing::info!(repo = %host.repo_id(), ruleset = %other.name, "ruleset deleted");
                    deleted.push(other.name.clone());
                }
                Err(e) => {
                    tracing::warn!(
                        repo = %host.repo_id(),
                        ruleset = %other.name,
                        error = %e,
                        "failed to delete ruleset"
                    );
                    delete_warnings.push(format!("failed to delete ruleset {}: {e}", other.name));
                }
            }
        }
    }

    RulesetOutcome {
        success: !matches!(status, RulesetStatus::Failed),
        dry_run,
        status,
        error,
        deleted,
        delete_warnings,
    }
}

fn failed(dry_run: bool, error: impl Into<String>) -> RulesetOutcome {
    RulesetOutcome {
        success: false,
        dry_run,
        status: RulesetStatus::Failed,
        error: Some(error.into()),
        deleted: Vec::new(),
        delete_warnings: Vec::new(),
    }
}

/// Deep structural equality over the managed field set only.
pub fn rulesets_equal(desired: &Value, remote: &Value) -> bool {
    COMPARED_FIELDS
        .iter()
        .all(|field| normalized_field(desired, field) == normalized_field(remote, field))
}

/// Projects one compared field, normalizing "not there" representations:
/// a missing key, an explicit null, and (for the optional list-shaped
/// fields) an empty container all mean "absent".
fn normalized_field(doc: &Value, field: &str) -> Option<Value> {
    let value = doc.get(field)?;
    match value {
        Value::Null => None,
        Value::Array(items) if items.is_empty() && field == "bypass_actors" => None,
        Value::Object(map) if map.is_empty() && field == "conditions" => None,
        other => Some(other.clone()),
    }
}
