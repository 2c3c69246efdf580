//! The run driver: expands the configured repository list, runs every
//! reconciler for every repository, and collects the per-repository reports.
//!
//! Repositories are processed strictly sequentially (the GitHub secondary
//! rate limiter punishes concurrent writes from one token), and every
//! resource of every repository is attempted regardless of earlier
//! failures; a malformed identifier is the only thing that skips a
//! repository, and even that still yields a report entry.

use crate::config::{ConfigFile, RepoEntry};
use crate::filesync::{
    ContentProcessor, FileSyncRequest, FileSyncTarget, GitignoreProcessor, sync_files,
};
use crate::github::{ApiError, RepoDirectory, RepoHost, list_owner_repos};
use crate::package_json::reconcile_package_json;
use crate::settings::reconcile_settings;
use crate::types::{RepoId, RepoReport};

/// Expands `owner/*` entries into concrete repositories via the directory.
///
/// Expanded repositories inherit the pattern entry's overrides. Expansion
/// failures are fatal: a partial owner listing would silently skip
/// repositories, which is worse than failing loudly.
pub async fn expand_repositories<D: RepoDirectory>(
    directory: &D,
    entries: &[RepoEntry],
) -> Result<Vec<RepoEntry>, ApiError> {
    let mut expanded = Vec::with_capacity(entries.len());
    for entry in entries {
        match entry.repo.strip_suffix("/*") {
            Some(owner) if !owner.is_empty() && !owner.contains('/') => {
                let names = list_owner_repos(directory, owner).await?;
                tracing::info!(owner, repos = names.len(), "expanded owner pattern");
                for name in names {
                    expanded.push(RepoEntry {
                        repo: format!("{owner}/{name}"),
                        overrides: entry.overrides.clone(),
                    });
                }
            }
            _ => expanded.push(entry.clone()),
        }
    }
    Ok(expanded)
}

/// Runs every configured reconciler for one repository.
pub async fn reconcile_repository<H: RepoHost>(
    host: &H,
    config: &ConfigFile,
    entry: &RepoEntry,
    dry_run: bool,
) -> RepoReport {
    let mut report = RepoReport::new(entry.repo.clone(), dry_run);

    let desired = entry.overrides.merged_over(&config.settings).to_desired();
    report.settings = Some(reconcile_settings(host, &desired, dry_run).await);

    let gitignore = GitignoreProcessor;
    for sync in &config.file_syncs {
        // Config validation only admits "gitignore" here.
        let processor: Option<&dyn ContentProcessor> = match sync.processor.as_deref() {
            Some(_) => Some(&gitignore),
            None => None,
        };
        let targets: Vec<FileSyncTarget> = sync
            .targets
            .iter()
            .map(|t| FileSyncTarget::new(t.source.clone(), t.target.clone()))
            .collect();
        let request = FileSyncRequest {
            targets: &targets,
            branch: &sync.branch,
            pr_title: &sync.title,
            pr_body: sync.body.as_deref().unwrap_or("Managed file sync."),
            processor,
            dry_run,
        };
        let outcome = sync_files(host, &request).await;
        report.files.push((sync.key.clone(), outcome));
    }

    if let Some(ruleset) = &config.ruleset {
        report.ruleset = Some(
            crate::rulesets::reconcile_ruleset(host, ruleset, config.delete_other_rulesets, dry_run)
                .await,
        );
    }

    if let Some(autolinks) = &config.autolinks {
        report.autolinks =
            Some(crate::autolinks::reconcile_autolinks(host, autolinks, dry_run).await);
    }

    if let Some(block) = &config.package_json {
        report.package_json = Some(
            reconcile_package_json(
                host,
                &block.source,
                &block.fields,
                &block.branch,
                &block.title,
                block.body.as_deref().unwrap_or("Managed file sync."),
                dry_run,
            )
            .await,
        );
    }

    report
}

/// Runs the whole configuration, building a host per repository with
/// `make_host`. Returns one report per (expanded) repository, in order.
pub async fn run_all<H, F>(
    config: &ConfigFile,
    entries: &[RepoEntry],
    dry_run: bool,
    make_host: F,
) -> Vec<RepoReport>
where
    H: RepoHost,
    F: Fn(RepoId) -> H,
{
    let mut reports = Vec::with_capacity(entries.len());
    for entry in entries {
        let id = match RepoId::parse(&entry.repo) {
            Ok(id) => id,
            Err(e) => {
                tracing::error!(repo = %entry.repo, error = %e, "skipping repository");
                let mut report = RepoReport::new(entry.repo.clone(), dry_run);
                report.error = Some(e.to_string());
                reports.push(report);
                continue;
            }
        };
        tracing::info!(repo = %id, "reconciling repository");
        let host = make_host(id);
        reports.push(reconcile_repository(&host, config, entry, dry_run).await);
    }
    reports
}
