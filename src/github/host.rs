//! The repository hosting client capability.
//!
//! `RepoHost` is the single seam between the reconcilers and the GitHub API:
//! every network operation the engine performs goes through one of these
//! methods. The production implementation executes against octocrab; tests
//! use an in-memory host that records write calls, which is what makes the
//! "zero write calls" properties directly assertable.
//!
//! Implementations are constructed with a `RepoId`, so every method is
//! scoped to that repository.

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::autolinks::AutolinkSpec;
use crate::types::{RepoId, RepoRecord, Toggle};

use super::error::ApiError;

/// A file fetched from a ref, already base64-decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    /// Blob SHA, required by the contents API for updates.
    pub sha: String,
}

/// The subset of pull request data the sync engine needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrInfo {
    pub number: u64,
    pub head_ref: String,
    pub title: String,
}

/// Code scanning default setup state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeScanningState {
    Configured,
    NotConfigured,
}

/// A ruleset as returned by the list endpoint (summary only; the full
/// document requires a second fetch).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RulesetSummary {
    pub id: u64,
    pub name: String,
}

/// An autolink as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AutolinkEntry {
    pub id: u64,
    pub key_prefix: String,
    pub url_template: String,
    #[serde(default = "default_true")]
    pub is_alphanumeric: bool,
}

fn default_true() -> bool {
    true
}

/// Partial repository update payload. Only set fields are serialized, which
/// is what keeps unset desired fields out of the apply call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RepoSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_squash_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_merge_commit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_rebase_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_auto_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_branch_on_merge: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_update_branch: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub security_and_analysis: Option<Value>,
}

impl RepoSettingsPatch {
    /// Sets one of the six merge/branch fields by name.
    ///
    /// # Panics
    ///
    /// Panics on an unknown field name; callers only iterate
    /// [`crate::types::MergeSettings::FIELDS`].
    pub fn set(&mut self, field: &str, value: bool) {
        match field {
            "allow_squash_merge" => self.allow_squash_merge = Some(value),
            "allow_merge_commit" => self.allow_merge_commit = Some(value),
            "allow_rebase_merge" => self.allow_rebase_merge = Some(value),
            "allow_auto_merge" => self.allow_auto_merge = Some(value),
            "delete_branch_on_merge" => self.delete_branch_on_merge = Some(value),
            "allow_update_branch" => self.allow_update_branch = Some(value),
            other => panic!("unknown merge settings field: {other}"),
        }
    }

    /// True if no field is set (nothing to apply).
    pub fn is_empty(&self) -> bool {
        self == &RepoSettingsPatch::default()
    }
}

/// Repository hosting operations used by the reconcilers.
///
/// All methods return fresh remote state; nothing is cached between calls.
/// Errors are surfaced once, with no retry, and carry an HTTP status where
/// one could be determined so callers can classify 403/404 responses.
pub trait RepoHost {
    /// The repository this host is scoped to.
    fn repo_id(&self) -> &RepoId;

    // ─── Repository record ────────────────────────────────────────────────

    /// Fetches the repository record (settings, permissions, default branch,
    /// security analysis block).
    fn get_repository(&self) -> impl Future<Output = Result<RepoRecord, ApiError>> + Send;

    /// Applies a partial settings update.
    fn update_repository(
        &self,
        patch: &RepoSettingsPatch,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Topics ───────────────────────────────────────────────────────────

    fn get_topics(&self) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// Replaces all topics in one call.
    fn replace_topics(
        &self,
        topics: &[String],
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Code scanning default setup ──────────────────────────────────────

    /// Reads the default-setup state. A 404 is mapped to
    /// [`CodeScanningState::NotConfigured`], not an error.
    fn get_code_scanning_setup(
        &self,
    ) -> impl Future<Output = Result<CodeScanningState, ApiError>> + Send;

    fn update_code_scanning_setup(
        &self,
        state: CodeScanningState,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Boolean toggles ──────────────────────────────────────────────────

    /// Reads a toggle's current state; absent (404) reads as disabled.
    fn get_toggle(&self, toggle: Toggle) -> impl Future<Output = Result<bool, ApiError>> + Send;

    fn set_toggle(
        &self,
        toggle: Toggle,
        enabled: bool,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Git refs ─────────────────────────────────────────────────────────

    /// Returns the tip SHA of a branch, or `None` if the ref does not exist.
    fn get_branch_sha(
        &self,
        branch: &str,
    ) -> impl Future<Output = Result<Option<String>, ApiError>> + Send;

    fn create_branch(
        &self,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Force-updates a branch ref to the given SHA, discarding any commits
    /// not reachable from it.
    fn force_update_branch(
        &self,
        branch: &str,
        sha: &str,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Contents ─────────────────────────────────────────────────────────

    /// Fetches a file at a ref; `None` on 404.
    fn get_file(
        &self,
        path: &str,
        r#ref: &str,
    ) -> impl Future<Output = Result<Option<RemoteFile>, ApiError>> + Send;

    /// Creates or updates a file on a branch (`sha` present means update).
    fn put_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Pull requests ────────────────────────────────────────────────────

    /// Finds an open PR whose head ref is the given branch.
    fn find_open_pr_by_head(
        &self,
        branch: &str,
    ) -> impl Future<Output = Result<Option<PrInfo>, ApiError>> + Send;

    fn create_pr(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> impl Future<Output = Result<PrInfo, ApiError>> + Send;

    // ─── Rulesets ─────────────────────────────────────────────────────────

    fn list_rulesets(&self) -> impl Future<Output = Result<Vec<RulesetSummary>, ApiError>> + Send;

    /// Fetches the full ruleset document (includes API-only fields the
    /// comparison strips).
    fn get_ruleset(&self, id: u64) -> impl Future<Output = Result<Value, ApiError>> + Send;

    fn create_ruleset(&self, doc: &Value) -> impl Future<Output = Result<(), ApiError>> + Send;

    /// Updates a ruleset with the full posted document (not a partial
    /// patch).
    fn update_ruleset(
        &self,
        id: u64,
        doc: &Value,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete_ruleset(&self, id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;

    // ─── Autolinks ────────────────────────────────────────────────────────

    fn list_autolinks(&self)
    -> impl Future<Output = Result<Vec<AutolinkEntry>, ApiError>> + Send;

    fn create_autolink(
        &self,
        spec: &AutolinkSpec,
    ) -> impl Future<Output = Result<(), ApiError>> + Send;

    fn delete_autolink(&self, id: u64) -> impl Future<Output = Result<(), ApiError>> + Send;
}
