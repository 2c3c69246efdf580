//! Generic boolean toggle reconciliation.
//!
//! Immutable releases, secret scanning, push protection, Dependabot alerts,
//! and Dependabot security updates all share one shape: read current state
//! (absent reads as disabled), diff against the desired tri-state, apply an
//! enable/disable call. One parameterized routine handles all five; the
//! descriptor table is [`crate::types::Toggle::ALL`].

use crate::github::RepoHost;
use crate::types::{Toggle, ToggleOutcome, ToggleStatus};

/// Reconciles one toggle toward its desired state.
///
/// Every failure here is a warning on the outcome, never an error: one
/// failing toggle must not prevent the remaining toggles from being
/// attempted, nor flip the repository's overall success.
pub async fn reconcile_toggle<H: RepoHost>(
    host: &H,
    toggle: Toggle,
    desired: bool,
    dry_run: bool,
) -> ToggleOutcome {
    let field = toggle.field();

    let current = match host.get_toggle(toggle).await {
        Ok(enabled) => enabled,
        Err(e) => {
            tracing::warn!(repo = %host.repo_id(), toggle = field, error = %e, "failed to read toggle");
            return ToggleOutcome {
                field: field.to_string(),
                status: ToggleStatus::Failed,
                warning: Some(format!("failed to read {field}: {e}")),
            };
        }
    };

    if current == desired {
        return ToggleOutcome {
            field: field.to_string(),
            status: ToggleStatus::Unchanged,
            warning: None,
        };
    }

    if dry_run {
        let status = if desired {
            ToggleStatus::WouldEnable
        } else {
            ToggleStatus::WouldDisable
        };
        return ToggleOutcome {
            field: field.to_string(),
            status,
            warning: None,
        };
    }

    match host.set_toggle(toggle, desired).await {
        Ok(()) => {
            tracing::info!(repo = %host.repo_id(), toggle = field, enabled = desired, "toggle updated");
            let status = if desired {
                ToggleStatus::Enabled
            } else {
                ToggleStatus::Disabled
            };
            ToggleOutcome {
                field: field.to_string(),
                status,
                warning: None,
            }
        }
        Err(e) => {
            tracing::warn!(repo = %host.repo_id(), toggle = field, error = %e, "failed to apply toggle");
            ToggleOutcome {
                field: field.to_string(),
                status: ToggleStatus::Failed,
                warning: Some(format!("failed to apply {field}: {e}")),
            }
        }
    }
}
