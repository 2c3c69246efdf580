//! Per-resource reconciliation outcomes.
//!
//! Each reconciler returns its own outcome struct; the driver collects them
//! into one [`RepoReport`] per repository. A resource failing never
//! invalidates outcomes already captured for other resources of the same
//! repository, so every outcome carries its own `success`/`error` pair, and
//! the dry-run flag is echoed through for the presenter.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One field-level difference between actual and desired state.
///
/// Produced only when actual differs from desired for a *touched* field; the
/// full list drives both the apply payload and the human-readable summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRecord {
    pub field: String,
    pub from: Value,
    pub to: Value,
}

impl ChangeRecord {
    pub fn new(field: impl Into<String>, from: impl Into<Value>, to: impl Into<Value>) -> Self {
        ChangeRecord {
            field: field.into(),
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Why the settings reconciler classified a repository as unusable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PermissionGap {
    /// The repository record carried no `permissions` object at all.
    NoAccess,
    /// All six merge/branch fields were absent from the record; the
    /// integration can see the repository but cannot read (and therefore
    /// presumably cannot write) its settings.
    SettingsUnreadable,
}

/// Outcome status for the settings update itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SettingsStatus {
    Unchanged,
    Updated,
    WouldUpdate,
    /// The repository could not be reconciled at all (fetch failure or
    /// permission classification).
    Failed,
}

/// Outcome of a topics replace-all.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicsOutcome {
    pub status: TopicsStatus,
    /// `desired − current`.
    pub added: Vec<String>,
    /// `current − desired`.
    pub removed: Vec<String>,
    /// Non-fatal failure detail; topics failures never escalate.
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TopicsStatus {
    Unchanged,
    Updated,
    WouldUpdate,
    Failed,
}

/// Outcome of the code scanning default-setup reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeScanningOutcome {
    pub status: CodeScanningStatus,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeScanningStatus {
    Unchanged,
    Configured,
    Disabled,
    WouldConfigure,
    WouldDisable,
    Failed,
}

/// Outcome of one boolean toggle (immutable releases, secret scanning, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    /// The result-field name (see [`crate::types::Toggle::field`]).
    pub field: String,
    pub status: ToggleStatus,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToggleStatus {
    Unchanged,
    Enabled,
    Disabled,
    WouldEnable,
    WouldDisable,
    Failed,
}

/// Aggregate outcome of the settings/toggle reconciler for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingsOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub status: SettingsStatus,
    pub error: Option<String>,

    /// The repository fetch returned 403.
    pub access_denied: bool,
    /// Permission classification, when access was technically granted but
    /// insufficient.
    pub insufficient_permissions: Option<PermissionGap>,

    /// Field-level changes for the six merge/branch settings.
    pub changes: Vec<ChangeRecord>,

    pub topics: Option<TopicsOutcome>,
    pub code_scanning: Option<CodeScanningOutcome>,
    pub toggles: Vec<ToggleOutcome>,
}

impl SettingsOutcome {
    /// A fatal outcome recorded before any sub-resource was attempted.
    pub fn failed(dry_run: bool, error: impl Into<String>) -> Self {
        SettingsOutcome {
            success: false,
            dry_run,
            status: SettingsStatus::Failed,
            error: Some(error.into()),
            access_denied: false,
            insufficient_permissions: None,
            changes: Vec::new(),
            topics: None,
            code_scanning: None,
            toggles: Vec::new(),
        }
    }
}

/// Status of a file-sync-via-PR call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSyncStatus {
    /// Default branch already matches; no branch, no PR, no writes.
    Unchanged,
    /// A new PR was opened and every committed file was new to the repo.
    Created,
    /// A new PR was opened and every committed file already existed.
    Updated,
    /// A new PR was opened with a mix of new and pre-existing files.
    Mixed,
    /// An open PR exists and its branch already matches; no writes.
    PrUpToDate,
    /// Stale files were recommitted to an existing PR branch.
    PrUpdated,
    /// Files new to the PR branch were committed to it.
    PrUpdatedCreated,
    /// A mix of new and pre-existing files was committed to the PR branch.
    PrUpdatedMixed,
    /// Dry run: a PR would be opened creating every target file.
    WouldCreate,
    /// Dry run: a PR would be opened updating at least one existing file.
    WouldUpdate,
    /// Dry run: an existing PR branch would receive new commits.
    WouldUpdatePr,
    Failed,
}

impl FileSyncStatus {
    /// True for statuses that represent zero write calls.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            FileSyncStatus::Unchanged
                | FileSyncStatus::PrUpToDate
                | FileSyncStatus::WouldCreate
                | FileSyncStatus::WouldUpdate
                | FileSyncStatus::WouldUpdatePr
        )
    }
}

/// Outcome of one file-sync call (possibly batching several files into one
/// branch/PR).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSyncOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub status: FileSyncStatus,
    pub error: Option<String>,

    /// The sync branch this call manages.
    pub branch: String,
    /// PR number touched or created, when one exists.
    pub pr_number: Option<u64>,
    /// Paths that were (or would be) committed.
    pub paths: Vec<String>,
}

impl FileSyncOutcome {
    pub fn failed(dry_run: bool, branch: impl Into<String>, error: impl Into<String>) -> Self {
        FileSyncOutcome {
            success: false,
            dry_run,
            status: FileSyncStatus::Failed,
            error: Some(error.into()),
            branch: branch.into(),
            pr_number: None,
            paths: Vec::new(),
        }
    }
}

/// Outcome of the ruleset reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulesetOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub status: RulesetStatus,
    pub error: Option<String>,

    /// Names of unmanaged rulesets that were (or would be) deleted.
    pub deleted: Vec<String>,
    /// Per-ruleset deletion failures; these never abort remaining deletions
    /// or affect the managed ruleset's own status.
    pub delete_warnings: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RulesetStatus {
    Unchanged,
    Created,
    Updated,
    WouldCreate,
    WouldUpdate,
    Failed,
}

/// Outcome of the autolink reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutolinkOutcome {
    pub success: bool,
    pub dry_run: bool,
    pub status: AutolinkStatus,
    pub error: Option<String>,

    /// Key prefixes created (or that would be created).
    pub created: Vec<String>,
    /// Key prefixes deleted (or that would be deleted), including
    /// delete-then-recreate victims.
    pub deleted: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AutolinkStatus {
    Unchanged,
    Updated,
    WouldUpdate,
    Failed,
}

/// The aggregate per-repository result: independent resources are namespaced
/// fields, so a failure in one leaves the others' captured outcomes intact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoReport {
    /// The `owner/name` string as configured (kept verbatim so malformed
    /// identifiers still appear in the report).
    pub repo: String,
    pub dry_run: bool,

    /// Fatal error recorded before any reconciler ran (e.g. malformed
    /// identifier).
    pub error: Option<String>,

    pub settings: Option<SettingsOutcome>,
    /// File-sync outcomes keyed by the configured result key.
    pub files: Vec<(String, FileSyncOutcome)>,
    pub ruleset: Option<RulesetOutcome>,
    pub autolinks: Option<AutolinkOutcome>,
    pub package_json: Option<FileSyncOutcome>,
}

impl RepoReport {
    pub fn new(repo: impl Into<String>, dry_run: bool) -> Self {
        RepoReport {
            repo: repo.into(),
            dry_run,
            error: None,
            settings: None,
            files: Vec::new(),
            ruleset: None,
            autolinks: None,
            package_json: None,
        }
    }

    /// Overall success: no fatal error and every attempted resource
    /// succeeded. Sub-resource warnings do not count as failures.
    pub fn success(&self) -> bool {
        self.error.is_none()
            && self.settings.as_ref().is_none_or(|s| s.success)
            && self.files.iter().all(|(_, f)| f.success)
            && self.ruleset.as_ref().is_none_or(|r| r.success)
            && self.autolinks.as_ref().is_none_or(|a| a.success)
            && self.package_json.as_ref().is_none_or(|p| p.success)
    }
}
