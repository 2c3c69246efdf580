//! Code scanning default-setup reconciliation.
//!
//! A 404 on the read is a valid state ("not configured"), and an apply
//! failure (e.g. the repository has no supported language) is a warning,
//! never fatal.

use crate::github::{CodeScanningState, RepoHost};
use crate::types::{CodeScanningOutcome, CodeScanningStatus};

/// Ensures code scanning default setup matches the desired flag.
pub async fn reconcile_code_scanning<H: RepoHost>(
    host: &H,
    desired: bool,
    dry_run: bool,
) -> CodeScanningOutcome {
    let current = match host.get_code_scanning_setup().await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(repo = %host.repo_id(), error = %e, "failed to read code scanning setup");
            return CodeScanningOutcome {
                status: CodeScanningStatus::Failed,
                warning: Some(format!("failed to read code scanning setup: {e}")),
            };
        }
    };

    let target = if desired {
        CodeScanningState::Configured
    } else {
        CodeScanningState::NotConfigured
    };

    if current == target {
        return CodeScanningOutcome {
            status: CodeScanningStatus::Unchanged,
            warning: None,
        };
    }

    if dry_run {
        let status = if desired {
            CodeScanningStatus::WouldConfigure
        } else {
            CodeScanningStatus::WouldDisable
        };
        return CodeScanningOutcome {
            status,
            warning: None,
        };
    }

    match host.update_code_scanning_setup(target).await {
        Ok(()) => {
            tracing::info!(repo = %host.repo_id(), configured = desired, "code scanning setup updated");
            let status = if desired {
                CodeScanningStatus::Configured
            } else {
                CodeScanningStatus::Disabled
            };
            CodeScanningOutcome {
                status,
                warning: None,
            }
        }
        Err(e) => {
            // Typical case: default setup unsupported for the repository's
            // languages. Recorded and moved past.
            tracing::warn!(repo = %host.repo_id(), error = %e, "failed to update code scanning setup");
            CodeScanningOutcome {
                status: CodeScanningStatus::Failed,
                warning: Some(format!("failed to update code scanning setup: {e}")),
            }
        }
    }
}
