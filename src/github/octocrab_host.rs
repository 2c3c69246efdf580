//! `RepoHost` implementation backed by octocrab.
//!
//! Typed octocrab handlers are used where they exist (`repos`, `pulls`); the
//! remaining resources (topics, code scanning default setup, boolean
//! toggles, rulesets, autolinks) go through the generic authenticated verbs
//! with hand-rolled routes, since octocrab has no typed helpers for them.

use serde::Deserialize;
use serde_json::{Value, json};

use crate::autolinks::AutolinkSpec;
use crate::types::{MergeSettings, RepoId, RepoPermissions, RepoRecord, SecuritySnapshot, Toggle};

use super::client::OctocrabClient;
use super::error::ApiError;
use super::host::{
    AutolinkEntry, CodeScanningState, PrInfo, RemoteFile, RepoHost, RepoSettingsPatch,
    RulesetSummary,
};

// ─── Wire Types ───────────────────────────────────────────────────────────────

/// Repository record fields we read, deserialized directly from the REST
/// response rather than through octocrab's `Repository` model (which lags
/// behind the API for newer fields such as `allow_update_branch`).
#[derive(Debug, Deserialize)]
struct RepoRecordWire {
    default_branch: Option<String>,
    permissions: Option<RepoPermissions>,
    allow_squash_merge: Option<bool>,
    allow_merge_commit: Option<bool>,
    allow_rebase_merge: Option<bool>,
    allow_auto_merge: Option<bool>,
    delete_branch_on_merge: Option<bool>,
    allow_update_branch: Option<bool>,
    security_and_analysis: Option<SecurityWire>,
}

#[derive(Debug, Deserialize)]
struct SecurityWire {
    secret_scanning: Option<FeatureStatusWire>,
    secret_scanning_push_protection: Option<FeatureStatusWire>,
}

#[derive(Debug, Deserialize)]
struct FeatureStatusWire {
    status: Option<String>,
}

impl FeatureStatusWire {
    fn enabled(&self) -> Option<bool> {
        self.status.as_deref().map(|s| s == "enabled")
    }
}

impl RepoRecordWire {
    fn into_record(self) -> Result<RepoRecord, ApiError> {
        let default_branch = self
            .default_branch
            .ok_or_else(|| ApiError::message("repository record missing default_branch"))?;
        let security = self
            .security_and_analysis
            .map(|s| SecuritySnapshot {
                secret_scanning: s.secret_scanning.as_ref().and_then(FeatureStatusWire::enabled),
                secret_scanning_push_protection: s
                    .secret_scanning_push_protection
                    .as_ref()
                    .and_then(FeatureStatusWire::enabled),
            })
            .unwrap_or_default();
        Ok(RepoRecord {
            default_branch,
            permissions: self.permissions,
            merge: MergeSettings {
                allow_squash_merge: self.allow_squash_merge,
                allow_merge_commit: self.allow_merge_commit,
                allow_rebase_merge: self.allow_rebase_merge,
                allow_auto_merge: self.allow_auto_merge,
                delete_branch_on_merge: self.delete_branch_on_merge,
                allow_update_branch: self.allow_update_branch,
            },
            security,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TopicsWire {
    names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CodeScanningSetupWire {
    state: String,
}

// ─── Helpers ──────────────────────────────────────────────────────────────────

impl OctocrabClient {
    /// Probes a boolean resource endpoint: 200/204 reads as enabled, 404 as
    /// disabled, anything else is an error.
    async fn probe_enabled(&self, route: String) -> Result<bool, ApiError> {
        let resp = self
            .inner()
            ._get(route.clone())
            .await
            .map_err(ApiError::from_octocrab)?;
        match resp.status().as_u16() {
            200 | 204 => Ok(true),
            404 => Ok(false),
            code => Err(ApiError::status(
                code,
                format!("unexpected response probing {route}"),
            )),
        }
    }

    /// Enables (PUT) or disables (DELETE) a boolean resource endpoint.
    async fn write_enabled(&self, route: String, enabled: bool) -> Result<(), ApiError> {
        let resp = if enabled {
            self.inner()
                ._put(route.clone(), None::<&()>)
                .await
                .map_err(ApiError::from_octocrab)?
        } else {
            self.inner()
                ._delete(route.clone(), None::<&()>)
                .await
                .map_err(ApiError::from_octocrab)?
        };
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::status(
                status.as_u16(),
                format!("failed to write {route}"),
            ))
        }
    }

    fn toggle_route(toggle: Toggle) -> Option<&'static str> {
        match toggle {
            Toggle::ImmutableReleases => Some("/immutable-releases"),
            Toggle::DependabotAlerts => Some("/vulnerability-alerts"),
            Toggle::DependabotSecurityUpdates => Some("/automated-security-fixes"),
            // Secret scanning variants live on the repository record.
            Toggle::SecretScanning | Toggle::SecretScanningPushProtection => None,
        }
    }

    fn security_analysis_patch(toggle: Toggle, enabled: bool) -> RepoSettingsPatch {
        let status = if enabled { "enabled" } else { "disabled" };
        let key = match toggle {
            Toggle::SecretScanning => "secret_scanning",
            Toggle::SecretScanningPushProtection => "secret_scanning_push_protection",
            other => panic!("{other:?} is not a security_and_analysis toggle"),
        };
        RepoSettingsPatch {
            security_and_analysis: Some(json!({ key: { "status": status } })),
            ..RepoSettingsPatch::default()
        }
    }
}

// ─── RepoHost Implementation ──────────────────────────────────────────────────

impl RepoHost for OctocrabClient {
    fn repo_id(&self) -> &RepoId {
        self.repo()
    }

    async fn get_repository(&self) -> Result<RepoRecord, ApiError> {
        let wire: RepoRecordWire = self
            .inner()
            .get(self.route(""), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)?;
        wire.into_record()
    }

    async fn update_repository(&self, patch: &RepoSettingsPatch) -> Result<(), ApiError> {
        let _: Value = self
            .inner()
            .patch(self.route(""), Some(patch))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn get_topics(&self) -> Result<Vec<String>, ApiError> {
        let wire: TopicsWire = self
            .inner()
            .get(self.route("/topics"), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(wire.names)
    }

    async fn replace_topics(&self, topics: &[String]) -> Result<(), ApiError> {
        let _: TopicsWire = self
            .inner()
            .put(self.route("/topics"), Some(&json!({ "names": topics })))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn get_code_scanning_setup(&self) -> Result<CodeScanningState, ApiError> {
        let result: Result<CodeScanningSetupWire, _> = self
            .inner()
            .get(self.route("/code-scanning/default-setup"), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab);
        match result {
            Ok(wire) if wire.state == "configured" => Ok(CodeScanningState::Configured),
            Ok(_) => Ok(CodeScanningState::NotConfigured),
            Err(e) if e.is_not_found() => Ok(CodeScanningState::NotConfigured),
            Err(e) => Err(e),
        }
    }

    async fn update_code_scanning_setup(&self, state: CodeScanningState) -> Result<(), ApiError> {
        let body = match state {
            CodeScanningState::Configured => {
                json!({ "state": "configured", "query_suite": "default" })
            }
            CodeScanningState::NotConfigured => json!({ "state": "not-configured" }),
        };
        let _: Value = self
            .inner()
            .patch(self.route("/code-scanning/default-setup"), Some(&body))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn get_toggle(&self, toggle: Toggle) -> Result<bool, ApiError> {
        match Self::toggle_route(toggle) {
            Some(route) => self.probe_enabled(self.route(route)).await,
            None => {
                // Secret scanning state is only visible on the repository
                // record; an absent block reads as disabled.
                let record = self.get_repository().await?;
                let enabled = match toggle {
                    Toggle::SecretScanning => record.security.secret_scanning,
                    Toggle::SecretScanningPushProtection => {
                        record.security.secret_scanning_push_protection
                    }
                    _ => unreachable!("toggle_route covers the endpoint-backed toggles"),
                };
                Ok(enabled.unwrap_or(false))
            }
        }
    }

    async fn set_toggle(&self, toggle: Toggle, enabled: bool) -> Result<(), ApiError> {
        match Self::toggle_route(toggle) {
            Some(route) => self.write_enabled(self.route(route), enabled).await,
            None => {
                let patch = Self::security_analysis_patch(toggle, enabled);
                self.update_repository(&patch).await
            }
        }
    }

    async fn get_branch_sha(&self, branch: &str) -> Result<Option<String>, ApiError> {
        use octocrab::models::repos::Object;
        use octocrab::params::repos::Reference;

        let result = self
            .inner()
            .repos(self.owner(), self.repo_name())
            .get_ref(&Reference::Branch(branch.to_string()))
            .await;
        match result {
            Ok(r) => match r.object {
                Object::Commit { sha, .. } | Object::Tag { sha, .. } => Ok(Some(sha)),
                _ => Err(ApiError::message(format!(
                    "ref heads/{branch} does not point at a commit"
                ))),
            },
            Err(e) => {
                let err = ApiError::from_octocrab(e);
                if err.is_not_found() { Ok(None) } else { Err(err) }
            }
        }
    }

    async fn create_branch(&self, branch: &str, sha: &str) -> Result<(), ApiError> {
        use octocrab::params::repos::Reference;

        self.inner()
            .repos(self.owner(), self.repo_name())
            .create_ref(&Reference::Branch(branch.to_string()), sha)
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn force_update_branch(&self, branch: &str, sha: &str) -> Result<(), ApiError> {
        let route = self.route(&format!("/git/refs/heads/{branch}"));
        let _: Value = self
            .inner()
            .patch(route, Some(&json!({ "sha": sha, "force": true })))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn get_file(&self, path: &str, r#ref: &str) -> Result<Option<RemoteFile>, ApiError> {
        let result = self
            .inner()
            .repos(self.owner(), self.repo_name())
            .get_content()
            .path(path)
            .r#ref(r#ref)
            .send()
            .await;
        match result {
            Ok(contents) => {
                let item = contents.items.into_iter().next().ok_or_else(|| {
                    ApiError::message(format!("contents response for {path} was empty"))
                })?;
                let sha = item.sha.clone();
                let content = item.decoded_content().ok_or_else(|| {
                    ApiError::message(format!("contents of {path} could not be decoded"))
                })?;
                Ok(Some(RemoteFile { content, sha }))
            }
            Err(e) => {
                let err = ApiError::from_octocrab(e);
                if err.is_not_found() { Ok(None) } else { Err(err) }
            }
        }
    }

    async fn put_file(
        &self,
        path: &str,
        message: &str,
        content: &str,
        branch: &str,
        sha: Option<&str>,
    ) -> Result<(), ApiError> {
        let repos = self.inner().repos(self.owner(), self.repo_name());
        let result = match sha {
            Some(sha) => {
                repos
                    .update_file(path, message, content, sha)
                    .branch(branch)
                    .send()
                    .await
            }
            None => {
                repos
                    .create_file(path, message, content)
                    .branch(branch)
                    .send()
                    .await
            }
        };
        result.map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn find_open_pr_by_head(&self, branch: &str) -> Result<Option<PrInfo>, ApiError> {
        let mut page = 1u32;
        loop {
            let result = self
                .inner()
                .pulls(self.owner(), self.repo_name())
                .list()
                .state(octocrab::params::State::Open)
                .per_page(100)
                .page(page)
                .send()
                .await;
            match result {
                Ok(page_result) => {
                    let items = page_result.items;
                    let is_last_page = items.len() < 100;
                    for pull in items {
                        if pull.head.ref_field == branch {
                            return Ok(Some(PrInfo {
                                number: pull.number,
                                head_ref: pull.head.ref_field,
                                title: pull.title.unwrap_or_default(),
                            }));
                        }
                    }
                    if is_last_page {
                        return Ok(None);
                    }
                    page += 1;
                }
                Err(e) => return Err(ApiError::from_octocrab(e)),
            }
        }
    }

    async fn create_pr(
        &self,
        title: &str,
        body: &str,
        head: &str,
        base: &str,
    ) -> Result<PrInfo, ApiError> {
        let pull = self
            .inner()
            .pulls(self.owner(), self.repo_name())
            .create(title, head, base)
            .body(body)
            .send()
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(PrInfo {
            number: pull.number,
            head_ref: pull.head.ref_field,
            title: pull.title.unwrap_or_default(),
        })
    }

    async fn list_rulesets(&self) -> Result<Vec<RulesetSummary>, ApiError> {
        self.inner()
            .get(self.route("/rulesets?per_page=100"), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)
    }

    async fn get_ruleset(&self, id: u64) -> Result<Value, ApiError> {
        self.inner()
            .get(self.route(&format!("/rulesets/{id}")), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)
    }

    async fn create_ruleset(&self, doc: &Value) -> Result<(), ApiError> {
        let _: Value = self
            .inner()
            .post(self.route("/rulesets"), Some(doc))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn update_ruleset(&self, id: u64, doc: &Value) -> Result<(), ApiError> {
        let _: Value = self
            .inner()
            .put(self.route(&format!("/rulesets/{id}")), Some(doc))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn delete_ruleset(&self, id: u64) -> Result<(), ApiError> {
        let route = self.route(&format!("/rulesets/{id}"));
        let resp = self
            .inner()
            ._delete(route.clone(), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::status(
                status.as_u16(),
                format!("failed to delete {route}"),
            ))
        }
    }

    async fn list_autolinks(&self) -> Result<Vec<AutolinkEntry>, ApiError> {
        self.inner()
            .get(self.route("/autolinks?per_page=100"), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)
    }

    async fn create_autolink(&self, spec: &AutolinkSpec) -> Result<(), ApiError> {
        let _: Value = self
            .inner()
            .post(self.route("/autolinks"), Some(spec))
            .await
            .map_err(ApiError::from_octocrab)?;
        Ok(())
    }

    async fn delete_autolink(&self, id: u64) -> Result<(), ApiError> {
        let route = self.route(&format!("/autolinks/{id}"));
        let resp = self
            .inner()
            ._delete(route.clone(), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ApiError::status(
                status.as_u16(),
                format!("failed to delete {route}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_record_wire_maps_security_block() {
        let wire: RepoRecordWire = serde_json::from_value(json!({
            "default_branch": "main",
            "permissions": { "admin": true, "push": true, "pull": true },
            "allow_squash_merge": true,
            "security_and_analysis": {
                "secret_scanning": { "status": "enabled" },
                "secret_scanning_push_protection": { "status": "disabled" }
            }
        }))
        .unwrap();
        let record = wire.into_record().unwrap();
        assert_eq!(record.default_branch, "main");
        assert_eq!(record.security.secret_scanning, Some(true));
        assert_eq!(record.security.secret_scanning_push_protection, Some(false));
        assert_eq!(record.merge.allow_squash_merge, Some(true));
        assert_eq!(record.merge.allow_merge_commit, None);
    }

    #[test]
    fn repo_record_wire_requires_default_branch() {
        let wire: RepoRecordWire = serde_json::from_value(json!({})).unwrap();
        assert!(wire.into_record().is_err());
    }

    #[test]
    fn security_patch_shape() {
        let patch = OctocrabClient::security_analysis_patch(Toggle::SecretScanning, true);
        assert_eq!(
            serde_json::to_value(&patch).unwrap(),
            json!({ "security_and_analysis": { "secret_scanning": { "status": "enabled" } } })
        );
    }
}
