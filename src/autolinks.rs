//! Autolink reconciliation.
//!
//! Autolinks are a set keyed by `key_prefix`, and the API has no partial
//! update verb: changing any non-key field means deleting the existing
//! entry and recreating it. The plan is computed as pure set logic so it can
//! be tested without a host.

use serde::{Deserialize, Serialize};

use crate::github::{AutolinkEntry, RepoHost};
use crate::types::{AutolinkOutcome, AutolinkStatus};

/// A desired autolink definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutolinkSpec {
    /// Natural key; immutable on the API side.
    pub key_prefix: String,
    pub url_template: String,
    #[serde(default = "default_true")]
    pub is_alphanumeric: bool,
}

fn default_true() -> bool {
    true
}

impl AutolinkSpec {
    fn matches(&self, entry: &AutolinkEntry) -> bool {
        self.key_prefix == entry.key_prefix
            && self.url_template == entry.url_template
            && self.is_alphanumeric == entry.is_alphanumeric
    }
}

/// The create/delete sets required to converge existing onto desired.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutolinkPlan {
    pub create: Vec<AutolinkSpec>,
    pub delete: Vec<AutolinkEntry>,
}

impl AutolinkPlan {
    pub fn is_empty(&self) -> bool {
        self.create.is_empty() && self.delete.is_empty()
    }
}

/// Computes the minimal create/delete sets.
///
/// - exact match on all three fields: untouched;
/// - same `key_prefix`, any other field differs: delete then recreate;
/// - existing prefix absent from desired: delete;
/// - desired prefix absent from existing: create.
pub fn plan_autolinks(desired: &[AutolinkSpec], existing: &[AutolinkEntry]) -> AutolinkPlan {
    let mut plan = AutolinkPlan::default();

    for spec in desired {
        match existing.iter().find(|e| e.key_prefix == spec.key_prefix) {
            Some(entry) if spec.matches(entry) => {}
            Some(entry) => {
                plan.delete.push(entry.clone());
                plan.create.push(spec.clone());
            }
            None => plan.create.push(spec.clone()),
        }
    }

    for entry in existing {
        if !desired.iter().any(|s| s.key_prefix == entry.key_prefix) {
            plan.delete.push(entry.clone());
        }
    }

    plan
}

/// Reconciles the repository's autolinks toward the desired set.
pub async fn reconcile_autolinks<H: RepoHost>(
    host: &H,
    desired: &[AutolinkSpec],
    dry_run: bool,
) -> AutolinkOutcome {
    for spec in desired {
        if spec.key_prefix.is_empty() {
            return failed(dry_run, "autolink key_prefix must be non-empty");
        }
    }
    let mut prefixes: Vec<&str> = desired.iter().map(|s| s.key_prefix.as_str()).collect();
    prefixes.sort_unstable();
    prefixes.dedup();
    if prefixes.len() != desired.len() {
        return failed(dry_run, "duplicate autolink key_prefix in desired set");
    }

    let existing = match host.list_autolinks().await {
        Ok(list) => list,
        Err(e) => return failed(dry_run, format!("failed to list autolinks: {e}")),
    };

    let plan = plan_autolinks(desired, &existing);
    if plan.is_empty() {
        return AutolinkOutcome {
            success: true,
            dry_run,
            status: AutolinkStatus::Unchanged,
            error: None,
            created: Vec::new(),
            deleted: Vec::new(),
        };
    }

    let created: Vec<String> = plan.create.iter().map(|s| s.key_prefix.clone()).collect();
    let deleted: Vec<String> = plan.delete.iter().map(|e| e.key_prefix.clone()).collect();

    if dry_run {
        return AutolinkOutcome {
            success: true,
            dry_run,
            status: AutolinkStatus::WouldUpdate,
            error: None,
            created,
            deleted,
        };
    }

    // Deletions first: a recreate with the same prefix would otherwise
    // collide with the entry it replaces.
    for entry in &plan.delete {
        if let Err(e) = host.delete_autolink(entry.id).await {
            return failed(
                dry_run,
                format!("failed to delete autolink {}: {e}", entry.key_prefix),
            );
        }
    }
    for spec in &plan.create {
        if let Err(e) = host.create_autolink(spec).await {
            return failed(
                dry_run,
                format!("failed to create autolink {}: {e}", spec.key_prefix),
            );
        }
    }

    tracing::info!(
        repo = %host.repo_id(),
        created = created.len(),
        deleted = deleted.len(),
        "autolinks updated"
    );
    AutolinkOutcome {
        success: true,
        dry_run,
        status: AutolinkStatus::Updated,
        error: None,
        created,
        deleted,
    }
}

fn failed(dry_run: bool, error: impl Into<String>) -> AutolinkOutcome {
    AutolinkOutcome {
        success: false,
        dry_run,
        status: AutolinkStatus::Failed,
        error: Some(error.into()),
        created: Vec::new(),
        deleted: Vec::new(),
    }
}
