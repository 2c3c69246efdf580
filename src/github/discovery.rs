//! Repository discovery for `owner/*` patterns.
//!
//! The configuration may name a whole owner instead of individual
//! repositories. Discovery probes whether the owner is an organization, then
//! lists its repositories (paginated, 100 per page). This is a read-only
//! concern, so a failed probe or listing is a driver-level configuration
//! error, not a per-repository result.

use std::future::Future;

use serde::Deserialize;

use super::error::ApiError;

/// Listing operations that are not scoped to a single repository.
pub trait RepoDirectory {
    /// True if the owner exists as an organization.
    fn org_exists(&self, owner: &str) -> impl Future<Output = Result<bool, ApiError>> + Send;

    /// Lists repository names belonging to an organization.
    fn list_org_repos(
        &self,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;

    /// Lists repository names belonging to a user.
    fn list_user_repos(
        &self,
        owner: &str,
    ) -> impl Future<Output = Result<Vec<String>, ApiError>> + Send;
}

/// Lists all repository names for an owner, probing for org vs user first.
pub async fn list_owner_repos<D: RepoDirectory>(
    directory: &D,
    owner: &str,
) -> Result<Vec<String>, ApiError> {
    if directory.org_exists(owner).await? {
        directory.list_org_repos(owner).await
    } else {
        directory.list_user_repos(owner).await
    }
}

#[derive(Debug, Deserialize)]
struct RepoNameWire {
    name: String,
}

async fn list_paginated(client: &octocrab::Octocrab, base: &str) -> Result<Vec<String>, ApiError> {
    let mut names = Vec::new();
    let mut page = 1u32;
    loop {
        let route = format!("{base}?per_page=100&page={page}");
        let items: Vec<RepoNameWire> = client
            .get(route, None::<&()>)
            .await
            .map_err(ApiError::from_octocrab)?;
        let is_last_page = items.len() < 100;
        names.extend(items.into_iter().map(|r| r.name));
        if is_last_page {
            return Ok(names);
        }
        page += 1;
    }
}

impl RepoDirectory for octocrab::Octocrab {
    async fn org_exists(&self, owner: &str) -> Result<bool, ApiError> {
        let result: Result<serde_json::Value, _> = self
            .get(format!("/orgs/{owner}"), None::<&()>)
            .await
            .map_err(ApiError::from_octocrab);
        match result {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn list_org_repos(&self, owner: &str) -> Result<Vec<String>, ApiError> {
        list_paginated(self, &format!("/orgs/{owner}/repos")).await
    }

    async fn list_user_repos(&self, owner: &str) -> Result<Vec<String>, ApiError> {
        list_paginated(self, &format!("/users/{owner}/repos")).await
    }
}
