//! Topics reconciliation: order-independent set difference, replace-all
//! apply.
//!
//! Topics failures are deliberately quarantined: a fetch or replace error is
//! recorded as a warning on the result and never escalates, so settings
//! changes that were already applied are not misreported as failed.

use std::collections::BTreeSet;

use crate::github::RepoHost;
use crate::types::{TopicsOutcome, TopicsStatus};

/// Computes `(added, removed)` between desired and current topic sets.
///
/// Order-independent and duplicate-insensitive: `added = desired − current`,
/// `removed = current − desired`.
pub fn diff_topics(desired: &[String], current: &[String]) -> (Vec<String>, Vec<String>) {
    let desired_set: BTreeSet<&str> = desired.iter().map(String::as_str).collect();
    let current_set: BTreeSet<&str> = current.iter().map(String::as_str).collect();
    let added = desired_set
        .difference(&current_set)
        .map(|s| (*s).to_string())
        .collect();
    let removed = current_set
        .difference(&desired_set)
        .map(|s| (*s).to_string())
        .collect();
    (added, removed)
}

/// Reconciles the repository's topics toward the desired list.
pub async fn reconcile_topics<H: RepoHost>(
    host: &H,
    desired: &[String],
    dry_run: bool,
) -> TopicsOutcome {
    let current = match host.get_topics().await {
        Ok(topics) => topics,
        Err(e) => {
            tracing::warn!(repo = %host.repo_id(), error = %e, "failed to fetch topics");
            return TopicsOutcome {
                status: TopicsStatus::Failed,
                added: Vec::new(),
                removed: Vec::new(),
                warning: Some(format!("failed to fetch topics: {e}")),
            };
        }
    };

    let (added, removed) = diff_topics(desired, &current);
    if added.is_empty() && removed.is_empty() {
        return TopicsOutcome {
            status: TopicsStatus::Unchanged,
            added,
            removed,
            warning: None,
        };
    }

    if dry_run {
        return TopicsOutcome {
            status: TopicsStatus::WouldUpdate,
            added,
            removed,
            warning: None,
        };
    }

    match host.replace_topics(desired).await {
        Ok(()) => TopicsOutcome {
            status: TopicsStatus::Updated,
            added,
            removed,
            warning: None,
        },
        Err(e) => {
            tracing::warn!(repo = %host.repo_id(), error = %e, "failed to replace topics");
            TopicsOutcome {
                status: TopicsStatus::Failed,
                added,
                removed,
                warning: Some(format!("failed to replace topics: {e}")),
            }
        }
    }
}
