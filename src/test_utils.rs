//! In-memory test double for [`crate::github::RepoHost`].
//!
//! `MockHost` keeps the whole remote repository in a mutex-guarded state
//! struct and records every write call in order, so tests can assert both
//! the converged state and the exact write traffic (in particular, that
//! dry runs and no-op runs issue zero writes).

use std::collections::HashMap;
use std::sync::Mutex;

use serde_json::Value;

use crate::autolinks::AutolinkSpec;
use crate::github::{
    ApiError, AutolinkEntry, CodeScanningState, PrInfo, RemoteFile, RepoHost, RepoSettingsPatch,
    RulesetSummary,
};
use crate::types::{MergeSettings, RepoId, RepoPermissions, RepoRecord, SecuritySnapshot, Toggle};

/// One recorded mutating call, in issue order.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteCall {
    UpdateRepository(Value),
    ReplaceTopics(Vec<String>),
    UpdateCodeScanning(CodeScanningState),
    SetToggle(Toggle, bool),
    CreateBranch(String),
    ForceUpdateBranch(String),
    PutFile { branch: String, path: String },
    CreatePr { head: String },
    CreateRuleset,
    UpdateRuleset(u64),
    DeleteRuleset(u64),
    CreateAutolink(String),
    DeleteAutolink(u64),
}

#[derive(Debug)]
struct MockState {
    record: RepoRecord,
    topics: Vec<String>,
    code_scanning: CodeScanningState,
    toggles: HashMap<Toggle, bool>,
    /// Branch name to tip SHA.
    branches: HashMap<String, String>,
    /// (branch, path) to file.
    files: HashMap<(String, String), RemoteFile>,
    prs: Vec<PrInfo>,
    rulesets: Vec<(RulesetSummary, Value)>,
    autolinks: Vec<AutolinkEntry>,

    next_sha: u64,
    next_pr: u64,
    next_ruleset_id: u64,
    next_autolink_id: u64,

    fetch_repository_status: Option<u16>,
    update_repository_status: Option<u16>,
    get_topics_status: Option<u16>,
    replace_topics_status: Option<u16>,
    update_code_scanning_status: Option<u16>,
    get_toggle_status: Option<u16>,
    set_toggle_status: Option<u16>,
    list_prs_status: Option<u16>,
    /// Ruleset IDs whose deletion fails with 403.
    delete_ruleset_failures: Vec<u64>,
}

/// In-memory host scoped to one repository.
#[derive(Debug)]
pub struct MockHost {
    repo: RepoId,
    state: Mutex<MockState>,
    calls: Mutex<Vec<WriteCall>>,
}

impl MockHost {
    /// A host whose repository has all six merge settings readable (all
    /// `false`), a permissions object, and an empty `main` default branch.
    pub fn new() -> Self {
        let record = RepoRecord {
            default_branch: "main".to_string(),
            permissions: Some(RepoPermissions {
                admin: true,
                push: true,
                pull: true,
            }),
            merge: MergeSettings {
                allow_squash_merge: Some(false),
                allow_merge_commit: Some(false),
                allow_rebase_merge: Some(false),
                allow_auto_merge: Some(false),
                delete_branch_on_merge: Some(false),
                allow_update_branch: Some(false),
            },
            security: SecuritySnapshot::default(),
        };
        let mut branches = HashMap::new();
        branches.insert("main".to_string(), "sha-main-0".to_string());
        MockHost {
            repo: RepoId::new("octocat", "hello-world"),
            state: Mutex::new(MockState {
                record,
                topics: Vec::new(),
                code_scanning: CodeScanningState::NotConfigured,
                toggles: HashMap::new(),
                branches,
                files: HashMap::new(),
                prs: Vec::new(),
                rulesets: Vec::new(),
                autolinks: Vec::new(),
                next_sha: 1,
                next_pr: 1,
                next_ruleset_id: 1,
                next_autolink_id: 1,
                fetch_repository_status: None,
                update_repository_status: None,
                get_topics_status: None,
                replace_topics_status: None,
                update_code_scanning_status: None,
                get_toggle_status: None,
                set_toggle_status: None,
                list_prs_status: None,
                delete_ruleset_failures: Vec::new(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    // ─── Setup ────────────────────────────────────────────────────────────

    pub fn set_merge(&self, merge: MergeSettings) {
        self.state.lock().unwrap().record.merge = merge;
    }

    pub fn set_permissions(&self, permissions: Option<RepoPermissions>) {
        self.state.lock().unwrap().record.permissions = permissions;
    }

    pub fn set_topics(&self, topics: &[&str]) {
        self.state.lock().unwrap().topics = topics.iter().map(|t| t.to_string()).collect();
    }

    pub fn set_code_scanning(&self, state: CodeScanningState) {
        self.state.lock().unwrap().code_scanning = state;
    }

    pub fn set_toggle_state(&self, toggle: Toggle, enabled: bool) {
        self.state.lock().unwrap().toggles.insert(toggle, enabled);
    }

    /// Puts a file on a branch without recording a write call.
    pub fn seed_file(&self, branch: &str, path: &str, content: &str) {
        let mut state = self.state.lock().unwrap();
        let sha = format!("blob-{}", state.next_sha);
        state.next_sha += 1;
        state.files.insert(
            (branch.to_string(), path.to_string()),
            RemoteFile {
                content: content.to_string(),
                sha,
            },
        );
    }

    /// Creates a branch ref (with no file copy) without recording a call.
    pub fn seed_branch(&self, branch: &str, sha: &str) {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string(), sha.to_string());
    }

    /// Registers an open PR without recording a call.
    pub fn seed_pr(&self, head_ref: &str, title: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let number = state.next_pr;
        state.next_pr += 1;
        state.prs.push(PrInfo {
            number,
            head_ref: head_ref.to_string(),
            title: title.to_string(),
        });
        number
    }

    pub fn seed_ruleset(&self, name: &str, doc: Value) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_ruleset_id;
        state.next_ruleset_id += 1;
        let mut full = doc;
        full["id"] = Value::from(id);
        state.rulesets.push((
            RulesetSummary {
                id,
                name: name.to_string(),
            },
            full,
        ));
        id
    }

    pub fn seed_autolink(&self, key_prefix: &str, url_template: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        let id = state.next_autolink_id;
        state.next_autolink_id += 1;
        state.autolinks.push(AutolinkEntry {
            id,
            key_prefix: key_prefix.to_string(),
            url_template: url_template.to_string(),
            is_alphanumeric: true,
        });
        id
    }

    pub fn fail_fetch_repository(&self, status: u16) {
        self.state.lock().unwrap().fetch_repository_status = Some(status);
    }

    pub fn fail_update_repository(&self, status: u16) {
        self.state.lock().unwrap().update_repository_status = Some(status);
    }

    pub fn fail_get_topics(&self, status: u16) {
        self.state.lock().unwrap().get_topics_status = Some(status);
    }

    pub fn fail_replace_topics(&self, status: u16) {
        self.state.lock().unwrap().replace_topics_status = Some(status);
    }

    pub fn fail_update_code_scanning(&self, status: u16) {
        self.state.lock().unwrap().update_code_scanning_status = Some(status);
    }

    pub fn fail_get_toggle(&self, status: u16) {
        self.state.lock().unwrap().get_toggle_status = Some(status);
    }

    pub fn fail_set_toggle(&self, status: u16) {
        self.state.lock().unwrap().set_toggle_status = Some(status);
    }

    pub fn fail_list_prs(&self, status: u16) {
        self.state.lock().unwrap().list_prs_status = Some(status);
    }

    pub fn fail_delete_ruleset(&self, id: u64) {
        self.state.lock().unwrap().delete_ruleset_failures.push(id);
    }

    // ─── Inspection ───────────────────────────────────────────────────────

    pub fn write_calls(&self) -> Vec<WriteCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn file(&self, branch: &str, path: &str) -> Option<RemoteFile> {
        self.state
            .lock()
            .unwrap()
            .files
            .get(&(branch.to_string(), path.to_string()))
            .cloned()
    }

    pub fn open_prs(&self) -> Vec<PrInfo> {
        self.state.lock().unwrap().prs.clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.state.lock().unwrap().topics.clone()
    }

    pub fn toggle_state(&self, toggle: Toggle) -> bool {
        *self
            .state
            .lock()
            .unwrap()
            .toggles
            .get(&toggle)
            .unwrap_or(&false)
    }

    pub fn merge_settings(&self) -> MergeSettings {
        self.state.lock().unwrap().record.merge.clone()
    }

    pub fn ruleset_names(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .rulesets
            .iter()
            .map(|(s, _)| s.name.clone())
            .collect()
    }

    pub fn autolink_prefixes(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .autolinks
            .iter()
            .map(|e| e.key_prefix.clone())
            .collect()
    }

    fn record_call(&self, call: WriteCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn fresh_sha(state: &mut MockState, prefix: &str) -> String {
        let sha = format!("{prefix}-{}", state.next_sha);
        state.next_sha += 1;
        sha
    }

    /// Replaces `branch`'s files with a copy of the branch whose tip is
    /// `sha`, mirroring what a real ref reset does to a branch's tree.
    fn copy_tree_at(state: &mut MockState, sha: &str, branch: &str) {
        let origin = state
            .branches
            .iter()
            .find(|(_, tip)| tip.as_str() == sha)
            .map(|(name, _)| name.clone());
        let copied: Vec<((String, String), RemoteFile)> = match origin {
            Some(origin) => state
                .files
                .iter()
                .filter(|((b, _), _)| *b == origin)
                .map(|((_, path), file)| {
                    ((branch.to_string(), path.clone()), file.clone())
                })
                .collect(),
            None => Vec::new(),
        };
        state.files.retain(|(b, _), _| b != branch);
        state.files.extend(copied);
    }
}

fn err(status: u16) -> ApiError {
    ApiError::status(status, "mock failure")
}

impl RepoHost for MockHost {
    fn repo_id(&self) -> &RepoId {
        &self.repo
    }

    async fn get_repository(&self) -> Result<RepoRecord, ApiError> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.fetch_repository_status {
            return Err(err(status));
        }
        Ok(state.record.clone())
    }

    async fn update_repository(&self, patch: &RepoSettingsPatch) -> Result<(), ApiError> {
        let payload = serde_json::to_value(patch).expect("patch serializes");
        self.record_call(WriteCall::UpdateRepository(payload));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.update_repository_status {
            return Err(err(status));
        }
        for field in MergeSettings::FIELDS {
            let value = match field {
                "allow_squash_merge" => patch.allow_squash_merge,
                "allow_merge_commit" => patch.allow_merge_commit,
                "allow_rebase_merge" => patch.allow_rebase_merge,
                "allow_auto_merge" => patch.allow_auto_merge,
                "delete_branch_on_merge" => patch.delete_branch_on_merge,
                "allow_update_branch" => patch.allow_update_branch,
                _ => None,
            };
            if let Some(value) = value {
                match field {
                    "allow_squash_merge" => state.record.merge.allow_squash_merge = Some(value),
                    "allow_merge_commit" => state.record.merge.allow_merge_commit = Some(value),
                    "allow_rebase_merge" => state.record.merge.allow_rebase_merge = Some(value),
                    "allow_auto_merge" => state.record.merge.allow_auto_merge = Some(value),
                    "delete_branch_on_merge" => {
                        state.record.merge.delete_branch_on_merge = Some(value)
                    }
                    "allow_update_branch" => state.record.merge.allow_update_branch = Some(value),
                    _ => {}
                }
            }
        }
        Ok(())
    }

    async fn get_topics(&self) -> Result<Vec<String>, ApiError> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.get_topics_status {
            return Err(err(status));
        }
        Ok(state.topics.clone())
    }

    async fn replace_topics(&self, topics: &[String]) -> Result<(), ApiError> {
        self.record_call(WriteCall::ReplaceTopics(topics.to_vec()));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.replace_topics_status {
            return Err(err(status));
        }
        state.topics = topics.to_vec();
        Ok(())
    }

    async fn get_code_scanning_setup(&self) -> Result<CodeScanningState, ApiError> {
        Ok(self.state.lock().unwrap().code_scanning)
    }

    async fn update_code_scanning_setup(&self, new: CodeScanningState) -> Result<(), ApiError> {
        self.record_call(WriteCall::UpdateCodeScanning(new));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.update_code_scanning_status {
            return Err(err(status));
        }
        state.code_scanning = new;
        Ok(())
    }

    async fn get_toggle(&self, toggle: Toggle) -> Result<bool, ApiError> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.get_toggle_status {
            return Err(err(status));
        }
        Ok(*state.toggles.get(&toggle).unwrap_or(&false))
    }

    async fn set_toggle(&self, toggle: Toggle, enabled: bool) -> Result<(), ApiError> {
        self.record_call(WriteCall::SetToggle(toggle, enabled));
        let mut state = self.state.lock().unwrap();
        if let Some(status) = state.set_toggle_status {
            return Err(err(status));
        }
        state.toggles.insert(toggle, enabled);
        Ok(())
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<Option<String>, ApiError> {
        Ok(self.state.lock().unwrap().branches.get(branch).cloned())
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<(), ApiError> {
        self.record_call(WriteCall::CreateBranch(branch.to_string()));
        let mut state = self.state.lock().unwrap();
        Self::copy_tree_at(&mut state, sha, branch);
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn force_update_branch(&self, branch: &str, sha: &str) -> Result<(), ApiError> {
        self.record_call(WriteCall::ForceUpdateBranch(branch.to_string()));
        let mut state = self.state.lock().unwrap();
        Self::copy_tree_at(&mut state, sha, branch);
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(())
    }

    async fn get_file(&self, path: &str, r#ref: &str) -> Result<Option<RemoteFile>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .files
            .get(&(r#ref.to_string(), path.to_string()))
            .cloned())
    }

    async fn put_file(
        &self,
        path: &str,
        _message: &str,
        content: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<(), ApiError> {
        self.record_call(WriteCall::PutFile {
            branch: branch.to_string(),
            path: path.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let key = (branch.to_string(), path.to_string());
        match (sha, state.files.get(&key)) {
            (Some(_), None) => {
                return Err(err(409));
            }
            (None, Some(_)) => {
                return Err(err(422));
            }
            _ => {}
        }
        let blob = Self::fresh_sha(&mut state, "blob");
        state.files.insert(
            key,
            RemoteFile {
                content: content.to_string(),
                sha: blob,
            },
        );
        let tip = Self::fresh_sha(&mut state, "commit");
        state.branches.insert(branch.to_string(), tip);
        Ok(())
    }

    async fn find_open_pr_by_head(&self, branch: &str) -> Result<Option<PrInfo>, ApiError> {
        let state = self.state.lock().unwrap();
        if let Some(status) = state.list_prs_status {
            return Err(err(status));
        }
        Ok(state.prs.iter().find(|pr| pr.head_ref == branch).cloned())
    }

    async fn create_pr(
        &self,
        title: &str,
        _body: &str,
        head: &str,
        _base: &str,
    ) -> Result<PrInfo, ApiError> {
        self.record_call(WriteCall::CreatePr {
            head: head.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        let number = state.next_pr;
        state.next_pr += 1;
        let pr = PrInfo {
            number,
            head_ref: head.to_string(),
            title: title.to_string(),
        };
        state.prs.push(pr.clone());
        Ok(pr)
    }

    async fn list_rulesets(&self) -> Result<Vec<RulesetSummary>, ApiError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .rulesets
            .iter()
            .map(|(summary, _)| summary.clone())
            .collect())
    }

    async fn get_ruleset(&self, id: u64) -> Result<Value, ApiError> {
        self.state
            .lock()
            .unwrap()
            .rulesets
            .iter()
            .find(|(summary, _)| summary.id == id)
            .map(|(_, doc)| doc.clone())
            .ok_or_else(|| err(404))
    }

    async fn create_ruleset(&self, doc: &Value) -> Result<(), ApiError> {
        self.record_call(WriteCall::CreateRuleset);
        let name = doc
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| err(422))?
            .to_string();
        let mut state = self.state.lock().unwrap();
        let id = state.next_ruleset_id;
        state.next_ruleset_id += 1;
        let mut full = doc.clone();
        full["id"] = Value::from(id);
        state.rulesets.push((RulesetSummary { id, name }, full));
        Ok(())
    }

    async fn update_ruleset(&self, id: u64, doc: &Value) -> Result<(), ApiError> {
        self.record_call(WriteCall::UpdateRuleset(id));
        let mut state = self.state.lock().unwrap();
        let slot = state
            .rulesets
            .iter_mut()
            .find(|(summary, _)| summary.id == id)
            .ok_or_else(|| err(404))?;
        let mut full = doc.clone();
        full["id"] = Value::from(id);
        if let Some(name) = doc.get("name").and_then(Value::as_str) {
            slot.0.name = name.to_string();
        }
        slot.1 = full;
        Ok(())
    }

    async fn delete_ruleset(&self, id: u64) -> Result<(), ApiError> {
        self.record_call(WriteCall::DeleteRuleset(id));
        let mut state = self.state.lock().unwrap();
        if state.delete_ruleset_failures.contains(&id) {
            return Err(err(403));
        }
        let before = state.rulesets.len();
        state.rulesets.retain(|(summary, _)| summary.id != id);
        if state.rulesets.len() == before {
            return Err(err(404));
        }
        Ok(())
    }

    async fn list_autolinks(&self) -> Result<Vec<AutolinkEntry>, ApiError> {
        Ok(self.state.lock().unwrap().autolinks.clone())
    }

    async fn create_autolink(&self, spec: &AutolinkSpec) -> Result<(), ApiError> {
        self.record_call(WriteCall::CreateAutolink(spec.key_prefix.clone()));
        let mut state = self.state.lock().unwrap();
        if state
            .autolinks
            .iter()
            .any(|e| e.key_prefix == spec.key_prefix)
        {
            return Err(err(422));
        }
        let id = state.next_autolink_id;
        state.next_autolink_id += 1;
        state.autolinks.push(AutolinkEntry {
            id,
            key_prefix: spec.key_prefix.clone(),
            url_template: spec.url_template.clone(),
            is_alphanumeric: spec.is_alphanumeric,
        });
        Ok(())
    }

    async fn delete_autolink(&self, id: u64) -> Result<(), ApiError> {
        self.record_call(WriteCall::DeleteAutolink(id));
        let mut state = self.state.lock().unwrap();
        let before = state.autolinks.len();
        state.autolinks.retain(|e| e.id != id);
        if state.autolinks.len() == before {
            return Err(err(404));
        }
        Ok(())
    }
}
