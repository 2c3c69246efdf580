//! The per-run snapshot of a remote repository's state.
//!
//! A [`RepoRecord`] is fetched fresh for every repository on every run and is
//! never cached across repositories or updated in place after a write.
//! Callers derive "would become" values from the computed diff, not from a
//! second fetch.

use serde::{Deserialize, Serialize};

use super::desired::MergeSettings;

/// The viewer's permissions on a repository, as reported by the API.
///
/// The absence of this object entirely (not merely `admin: false`) is what
/// classifies a repository as inaccessible to the settings reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoPermissions {
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub push: bool,
    #[serde(default)]
    pub pull: bool,
}

/// Secret scanning state as read from the repository record.
///
/// `None` means the `security_and_analysis` block (or the specific feature)
/// was absent from the response, which the toggle reconciler treats the same
/// as disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecuritySnapshot {
    pub secret_scanning: Option<bool>,
    pub secret_scanning_push_protection: Option<bool>,
}

/// A freshly fetched repository record: everything the settings reconciler
/// reads in one round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoRecord {
    /// The repository's default branch name (e.g. "main").
    pub default_branch: String,

    /// Permissions block; `None` when the API omitted it entirely.
    pub permissions: Option<RepoPermissions>,

    /// Actual values of the six merge/branch settings. A `None` field was
    /// absent from the response; all six absent means the caller cannot read
    /// settings (likely a missing app installation).
    pub merge: MergeSettings,

    /// Secret scanning state from `security_and_analysis`.
    pub security: SecuritySnapshot,
}

impl RepoRecord {
    /// True if none of the six merge/branch fields were present in the
    /// response.
    pub fn merge_settings_unreadable(&self) -> bool {
        self.merge.is_empty()
    }
}
