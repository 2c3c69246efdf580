//! Desired-state types.
//!
//! Every boolean setting is tri-state: `Some(true)`, `Some(false)`, or `None`
//! ("do not touch"). An unset field must never be compared against actual
//! state and must never appear in an apply payload; unset is distinct from
//! `false`.

use serde::{Deserialize, Serialize};

/// The six merge/branch settings managed on a repository record.
///
/// The same shape is used both for desired state (`None` = leave as-is) and
/// for the fetched snapshot (`None` = field absent from the API response,
/// which signals that the caller cannot read merge settings at all).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    pub allow_squash_merge: Option<bool>,
    pub allow_merge_commit: Option<bool>,
    pub allow_rebase_merge: Option<bool>,
    pub allow_auto_merge: Option<bool>,
    pub delete_branch_on_merge: Option<bool>,
    pub allow_update_branch: Option<bool>,
}

impl MergeSettings {
    /// Field names, in the order they are diffed and reported.
    pub const FIELDS: [&'static str; 6] = [
        "allow_squash_merge",
        "allow_merge_commit",
        "allow_rebase_merge",
        "allow_auto_merge",
        "delete_branch_on_merge",
        "allow_update_branch",
    ];

    /// Returns the tri-state value of a field by name.
    ///
    /// # Panics
    ///
    /// Panics if `field` is not one of [`MergeSettings::FIELDS`]; callers only
    /// ever iterate that list.
    pub fn get(&self, field: &str) -> Option<bool> {
        match field {
            "allow_squash_merge" => self.allow_squash_merge,
            "allow_merge_commit" => self.allow_merge_commit,
            "allow_rebase_merge" => self.allow_rebase_merge,
            "allow_auto_merge" => self.allow_auto_merge,
            "delete_branch_on_merge" => self.delete_branch_on_merge,
            "allow_update_branch" => self.allow_update_branch,
            other => panic!("unknown merge settings field: {other}"),
        }
    }

    /// True if every field is unset.
    pub fn is_empty(&self) -> bool {
        Self::FIELDS.iter().all(|f| self.get(f).is_none())
    }
}

/// The boolean security/feature toggles that share one read-diff-apply shape.
///
/// Each toggle has its own read and enable/disable endpoints; the reconciler
/// treats them uniformly through [`crate::github::RepoHost::get_toggle`] and
/// [`crate::github::RepoHost::set_toggle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    ImmutableReleases,
    SecretScanning,
    SecretScanningPushProtection,
    DependabotAlerts,
    DependabotSecurityUpdates,
}

impl Toggle {
    /// All toggles, in reconciliation order.
    pub const ALL: [Toggle; 5] = [
        Toggle::ImmutableReleases,
        Toggle::SecretScanning,
        Toggle::SecretScanningPushProtection,
        Toggle::DependabotAlerts,
        Toggle::DependabotSecurityUpdates,
    ];

    /// The result-field name this toggle reports under.
    pub fn field(&self) -> &'static str {
        match self {
            Toggle::ImmutableReleases => "immutable_releases",
            Toggle::SecretScanning => "secret_scanning",
            Toggle::SecretScanningPushProtection => "secret_scanning_push_protection",
            Toggle::DependabotAlerts => "dependabot_alerts",
            Toggle::DependabotSecurityUpdates => "dependabot_security_updates",
        }
    }
}

/// The complete desired state for one repository's settings-shaped resources.
///
/// File syncs, rulesets, and autolinks are configured separately; this bundle
/// covers everything the settings reconciler touches in one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DesiredSettings {
    /// Merge/branch settings (tri-state per field).
    pub merge: MergeSettings,

    /// Desired topics; `None` leaves topics untouched, `Some` replaces all.
    pub topics: Option<Vec<String>>,

    /// Code scanning default setup: `Some(true)` ensures configured,
    /// `Some(false)` ensures not configured.
    pub code_scanning: Option<bool>,

    pub immutable_releases: Option<bool>,
    pub secret_scanning: Option<bool>,
    pub secret_scanning_push_protection: Option<bool>,
    pub dependabot_alerts: Option<bool>,
    pub dependabot_security_updates: Option<bool>,
}

impl DesiredSettings {
    /// Returns the desired tri-state for a toggle.
    pub fn toggle(&self, toggle: Toggle) -> Option<bool> {
        match toggle {
            Toggle::ImmutableReleases => self.immutable_releases,
            Toggle::SecretScanning => self.secret_scanning,
            Toggle::SecretScanningPushProtection => self.secret_scanning_push_protection,
            Toggle::DependabotAlerts => self.dependabot_alerts,
            Toggle::DependabotSecurityUpdates => self.dependabot_security_updates,
        }
    }
}
