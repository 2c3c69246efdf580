//! Settings/toggle reconciler: merge settings, topics, code scanning, and
//! boolean security toggles for one repository, in one pass.
//!
//! Failure isolation invariant: a warning on one sub-resource (topics, code
//! scanning, any toggle) never prevents the other sub-resources from being
//! attempted and never flips `success` to false. Only the repository fetch
//! or a permission classification fails the whole pass.

pub mod code_scanning;
pub mod toggles;
pub mod topics;


use serde_json::Value;

use crate::github::{RepoHost, RepoSettingsPatch};
use crate::types::{
    ChangeRecord, DesiredSettings, MergeSettings, PermissionGap, RepoRecord, SettingsOutcome,
    SettingsStatus, Toggle,
};

pub use code_scanning::reconcile_code_scanning;
pub use toggles::reconcile_toggle;
pub use topics::{diff_topics, reconcile_topics};

/// Reconciles every settings-shaped resource of one repository.
pub async fn reconcile_settings<H: RepoHost>(
    host: &H,
    desired: &DesiredSettings,
    dry_run: bool,
) -> SettingsOutcome {
    // Step 1: fetch the fresh snapshot. A 403 is classified, not thrown;
    // any other failure is fatal for this repository only.
    let record = match host.get_repository().await {
        Ok(record) => record,
        Err(e) if e.is_forbidden() => {
            tracing::warn!(repo = %host.repo_id(), "access denied (HTTP 403)");
            let mut outcome = SettingsOutcome::failed(dry_run, format!("access denied: {e}"));
            outcome.access_denied = true;
            return outcome;
        }
        Err(e) => {
            tracing::error!(repo = %host.repo_id(), error = %e, "failed to fetch repository");
            return SettingsOutcome::failed(dry_run, format!("failed to fetch repository: {e}"));
        }
    };

    // Step 2: access sufficiency. Admin permission is not required — if the
    // settings fields are readable they are presumed writable (app tokens
    // report no admin bit) — but a missing permissions object, or a record
    // with no merge fields at all, means we cannot proceed.
    if let Some(gap) = classify_permission_gap(&record) {
        let reason = match gap {
            PermissionGap::NoAccess => "repository record carries no permissions object",
            PermissionGap::SettingsUnreadable => {
                "merge settings are not readable (missing app installation?)"
            }
        };
        tracing::warn!(repo = %host.repo_id(), ?gap, "insufficient permissions");
        let mut outcome = SettingsOutcome::failed(dry_run, reason);
        outcome.insufficient_permissions = Some(gap);
        return outcome;
    }

    // Step 3: tri-state diff and single-call apply for merge settings.
    let (changes, patch) = diff_merge_settings(&desired.merge, &record.merge);
    let mut status = SettingsStatus::Unchanged;
    let mut error = None;
    let mut success = true;

    if !changes.is_empty() {
        if dry_run {
            status = SettingsStatus::WouldUpdate;
        } else {
            match host.update_repository(&patch).await {
                Ok(()) => {
                    tracing::info!(
                        repo = %host.repo_id(),
                        changes = changes.len(),
                        "repository settings updated"
                    );
                    status = SettingsStatus::Updated;
                }
                Err(e) => {
                    tracing::error!(repo = %host.repo_id(), error = %e, "failed to update settings");
                    status = SettingsStatus::Failed;
                    error = Some(format!("failed to update settings: {e}"));
                    success = false;
                }
            }
        }
    }

    // Steps 4-6: independent sub-resources. Each catches its own errors.
    let topics = match &desired.topics {
        Some(topics) => Some(reconcile_topics(host, topics, dry_run).await),
        None => None,
    };

    let code_scanning = match desired.code_scanning {
        Some(flag) => Some(reconcile_code_scanning(host, flag, dry_run).await),
        None => None,
    };

    let mut toggle_outcomes = Vec::new();
    for toggle in Toggle::ALL {
        if let Some(flag) = desired.toggle(toggle) {
            toggle_outcomes.push(reconcile_toggle(host, toggle, flag, dry_run).await);
        }
    }

    SettingsOutcome {
        success,
        dry_run,
        status,
        error,
        access_denied: false,
        insufficient_permissions: None,
        changes,
        topics,
        code_scanning,
        toggles: toggle_outcomes,
    }
}

/// Classifies the two distinguishable "technically reachable, practically
/// unusable" cases.
fn classify_permission_gap(record: &RepoRecord) -> Option<PermissionGap> {
    if record.permissions.is_none() {
        return Some(PermissionGap::NoAccess);
    }
    if record.merge_settings_unreadable() {
        return Some(PermissionGap::SettingsUnreadable);
    }
    None
}

/// Diffs the six merge/branch tri-states against the fetched snapshot.
///
/// Returns the ChangeRecords (only fields that differ) and the apply payload
/// (every *set* desired field, changed or not; unset fields never appear).
pub fn diff_merge_settings(
    desired: &MergeSettings,
    actual: &MergeSettings,
) -> (Vec<ChangeRecord>, RepoSettingsPatch) {
    let mut changes = Vec::new();
    let mut patch = RepoSettingsPatch::default();

    for field in MergeSettings::FIELDS {
        let Some(want) = desired.get(field) else {
            continue;
        };
        patch.set(field, want);
        let have = actual.get(field);
        if have != Some(want) {
            let from = have.map_or(Value::Null, Value::Bool);
            changes.push(ChangeRecord::new(field, from, want));
        }
    }

    (changes, patch)
}
