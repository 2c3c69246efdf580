//! Core domain types shared across reconcilers.

pub mod desired;
pub mod ids;
pub mod record;
pub mod result;

pub use desired::{DesiredSettings, MergeSettings, Toggle};
pub use ids::{InvalidRepoId, RepoId};
pub use record::{RepoPermissions, RepoRecord, SecuritySnapshot};
pub use result::{
    AutolinkOutcome, AutolinkStatus, ChangeRecord, CodeScanningOutcome, CodeScanningStatus,
    FileSyncOutcome, FileSyncStatus, PermissionGap, RepoReport, RulesetOutcome, RulesetStatus,
    SettingsOutcome, SettingsStatus, ToggleOutcome, ToggleStatus, TopicsOutcome, TopicsStatus,
};
