//! File-sync-via-pull-request engine.
//!
//! Delivers one or more desired file contents to a repository through a
//! single shared branch and pull request, idempotently:
//!
//! - if the default branch already matches, nothing is written at all;
//! - if an open sync PR exists, its branch (not the default branch) is
//!   re-diffed, so a stale PR catches up instead of spawning duplicates;
//! - otherwise the sync branch is created from (or force-reset to) the
//!   default branch tip, the stale files are committed, and a PR is opened.
//!
//! The engine is a small two-state loop (no PR / PR exists) around one
//! shared "diff a set of files against a ref" helper; the only difference
//! between the two states is which ref is diffed and which ref receives the
//! commits.

use std::path::PathBuf;

use thiserror::Error;

use crate::github::{ApiError, RemoteFile, RepoHost};
use crate::types::{FileSyncOutcome, FileSyncStatus};

use super::content::{ContentProcessor, MergeError};

/// One file to deliver: a local source and its path in the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSyncTarget {
    pub source_path: PathBuf,
    pub repo_path: String,
}

impl FileSyncTarget {
    pub fn new(source_path: impl Into<PathBuf>, repo_path: impl Into<String>) -> Self {
        FileSyncTarget {
            source_path: source_path.into(),
            repo_path: repo_path.into(),
        }
    }
}

/// A batch of targets delivered through one branch/PR.
pub struct FileSyncRequest<'a> {
    pub targets: &'a [FileSyncTarget],
    /// The long-lived sync branch, reused across runs.
    pub branch: &'a str,
    pub pr_title: &'a str,
    pub pr_body: &'a str,
    /// Optional processor when only part of each file is managed.
    pub processor: Option<&'a dyn ContentProcessor>,
    pub dry_run: bool,
}

/// Failure modes internal to a sync call; the public surface converts these
/// into a failed [`FileSyncOutcome`].
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to read source file {path}: {source}")]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Merge(#[from] MergeError),

    #[error("{0}")]
    Validation(String),
}

/// A source file read into memory, keyed by its repository path.
#[derive(Debug, Clone)]
struct SourceFile {
    repo_path: String,
    content: String,
}

/// The state of one target relative to a ref.
#[derive(Debug, Clone)]
enum FileState {
    /// The file does not exist at the ref.
    Missing,
    /// The file exists but its comparable portion differs from the source.
    Stale { existing: RemoteFile },
    /// The file's comparable portion already matches the source.
    UpToDate,
}

#[derive(Debug, Clone)]
struct FilePlan {
    source: SourceFile,
    state: FileState,
}

impl FilePlan {
    fn needs_update(&self) -> bool {
        !matches!(self.state, FileState::UpToDate)
    }
}

/// Synchronizes the requested files, returning a per-call outcome.
///
/// Never panics and never returns `Err`: every failure is folded into a
/// `success: false` outcome so the caller can keep reconciling other
/// resources.
pub async fn sync_files<H: RepoHost>(host: &H, request: &FileSyncRequest<'_>) -> FileSyncOutcome {
    match run_sync(host, request).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                repo = %host.repo_id(),
                branch = request.branch,
                error = %e,
                "file sync failed"
            );
            FileSyncOutcome::failed(request.dry_run, request.branch, e.to_string())
        }
    }
}

async fn run_sync<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
) -> Result<FileSyncOutcome, SyncError> {
    // Read every source up front; a single unreadable source fails the whole
    // call before any remote state is touched.
    let sources = read_sources(request.targets)?;
    run_sync_with_sources(host, request, &sources).await
}

/// Commits stale files to an existing PR branch, re-diffing against that
/// branch first: it may already carry partial or stale updates, and if it is
/// fully caught up no write is issued at all.
async fn update_existing_pr<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
    sources: &[SourceFile],
    pr_number: u64,
) -> Result<FileSyncOutcome, SyncError> {
    let branch_plan = diff_against_ref(host, sources, request.branch, request.processor).await?;

    if branch_plan.iter().all(|p| !p.needs_update()) {
        tracing::debug!(
            repo = %host.repo_id(),
            pr = pr_number,
            "existing pull request already up to date"
        );
        return Ok(outcome(
            request,
            FileSyncStatus::PrUpToDate,
            Some(pr_number),
            Vec::new(),
        ));
    }

    let stale: Vec<&FilePlan> = branch_plan.iter().filter(|p| p.needs_update()).collect();
    let paths: Vec<String> = stale.iter().map(|p| p.source.repo_path.clone()).collect();

    if request.dry_run {
        return Ok(outcome(
            request,
            FileSyncStatus::WouldUpdatePr,
            Some(pr_number),
            paths,
        ));
    }

    let (mut any_created, mut any_updated) = (false, false);
    for plan in &stale {
        commit_plan(host, request, plan, request.branch).await?;
        match plan.state {
            FileState::Missing => any_created = true,
            FileState::Stale { .. } => any_updated = true,
            FileState::UpToDate => {}
        }
    }

    let status = match (any_created, any_updated) {
        (true, true) => FileSyncStatus::PrUpdatedMixed,
        (true, false) => FileSyncStatus::PrUpdatedCreated,
        _ => FileSyncStatus::PrUpdated,
    };
    tracing::info!(
        repo = %host.repo_id(),
        pr = pr_number,
        files = paths.len(),
        "committed updates to existing pull request"
    );
    Ok(outcome(request, status, Some(pr_number), paths))
}

/// Creates (or force-resets) the sync branch at the default branch tip,
/// commits every stale file, and opens a pull request.
async fn open_new_pr<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
    default_branch: &str,
    default_plan: &[FilePlan],
) -> Result<FileSyncOutcome, SyncError> {
    let tip = host
        .get_branch_sha(default_branch)
        .await?
        .ok_or_else(|| SyncError::Validation(format!("default branch {default_branch} has no tip")))?;

    // The sync branch is always rebased to the latest default tip before
    // committing. This discards unmerged commits someone may have pushed to
    // it out-of-band; see the design notes before changing this policy.
    match host.get_branch_sha(request.branch).await? {
        Some(_) => host.force_update_branch(request.branch, &tip).await?,
        None => host.create_branch(request.branch, &tip).await?,
    }

    let stale: Vec<&FilePlan> = default_plan.iter().filter(|p| p.needs_update()).collect();
    let paths: Vec<String> = stale.iter().map(|p| p.source.repo_path.clone()).collect();

    let (mut any_created, mut any_updated) = (false, false);
    for plan in &stale {
        commit_plan(host, request, plan, request.branch).await?;
        match plan.state {
            FileState::Missing => any_created = true,
            FileState::Stale { .. } => any_updated = true,
            FileState::UpToDate => {}
        }
    }

    let pr = host
        .create_pr(
            request.pr_title,
            request.pr_body,
            request.branch,
            default_branch,
        )
        .await?;

    let status = match (any_created, any_updated) {
        (true, true) => FileSyncStatus::Mixed,
        (true, false) => FileSyncStatus::Created,
        _ => FileSyncStatus::Updated,
    };
    tracing::info!(
        repo = %host.repo_id(),
        pr = pr.number,
        files = paths.len(),
        "opened sync pull request"
    );
    Ok(outcome(request, status, Some(pr.number), paths))
}

/// Commits one planned file to a branch, merging through the content
/// processor when the file already exists.
async fn commit_plan<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
    plan: &FilePlan,
    branch: &str,
) -> Result<(), SyncError> {
    let (content, sha) = match &plan.state {
        FileState::Missing => (plan.source.content.clone(), None),
        FileState::Stale { existing } => {
            let merged = match request.processor {
                Some(proc) => proc.merge_final(&plan.source.content, &existing.content)?,
                None => plan.source.content.clone(),
            };
            (merged, Some(existing.sha.as_str()))
        }
        FileState::UpToDate => return Ok(()),
    };
    let message = format!("chore: sync {}", plan.source.repo_path);
    host.put_file(&plan.source.repo_path, &message, &content, branch, sha)
        .await?;
    Ok(())
}

/// Diffs every source against the given ref.
///
/// Sources were already reduced to their comparable form when the run
/// started, so only the remote side goes through the processor here; the
/// same marker logic applies whether the ref is the default branch or an
/// existing PR branch.
async fn diff_against_ref<H: RepoHost>(
    host: &H,
    sources: &[SourceFile],
    r#ref: &str,
    processor: Option<&dyn ContentProcessor>,
) -> Result<Vec<FilePlan>, SyncError> {
    let mut plans = Vec::with_capacity(sources.len());
    for source in sources {
        let remote = host.get_file(&source.repo_path, r#ref).await?;
        let state = match remote {
            None => FileState::Missing,
            Some(existing) => {
                let theirs = match processor {
                    Some(proc) => proc.extract_comparable(&existing.content),
                    None => existing.content.clone(),
                };
                if theirs.trim() == source.content.trim() {
                    FileState::UpToDate
                } else {
                    FileState::Stale { existing }
                }
            }
        };
        plans.push(FilePlan {
            source: source.clone(),
            state,
        });
    }
    Ok(plans)
}

fn read_sources(targets: &[FileSyncTarget]) -> Result<Vec<SourceFile>, SyncError> {
    targets
        .iter()
        .map(|target| {
            let content =
                std::fs::read_to_string(&target.source_path).map_err(|source| {
                    SyncError::SourceRead {
                        path: target.source_path.clone(),
                        source,
                    }
                })?;
            Ok(SourceFile {
                repo_path: target.repo_path.clone(),
                content,
            })
        })
        .collect()
}

fn outcome(
    request: &FileSyncRequest<'_>,
    status: FileSyncStatus,
    pr_number: Option<u64>,
    paths: Vec<String>,
) -> FileSyncOutcome {
    FileSyncOutcome {
        success: true,
        dry_run: request.dry_run,
        status,
        error: None,
        branch: request.branch.to_string(),
        pr_number,
        paths,
    }
}

/// Synchronizes in-memory contents instead of on-disk sources.
///
/// The package.json reconciler builds its source document programmatically;
/// this entry point shares the entire engine with [`sync_files`] apart from
/// the source-reading step.
pub async fn sync_contents<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
    contents: &[(String, String)],
) -> FileSyncOutcome {
    let sources: Vec<SourceFile> = contents
        .iter()
        .map(|(repo_path, content)| SourceFile {
            repo_path: repo_path.clone(),
            content: content.clone(),
        })
        .collect();
    match run_sync_with_sources(host, request, &sources).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                repo = %host.repo_id(),
                branch = request.branch,
                error = %e,
                "file sync failed"
            );
            FileSyncOutcome::failed(request.dry_run, request.branch, e.to_string())
        }
    }
}

async fn run_sync_with_sources<H: RepoHost>(
    host: &H,
    request: &FileSyncRequest<'_>,
    sources: &[SourceFile],
) -> Result<FileSyncOutcome, SyncError> {
    if sources.is_empty() {
        return Err(SyncError::Validation(
            "file sync requires at least one target".to_string(),
        ));
    }

    // Reduce every source to its comparable form once. A source that
    // accidentally carries its own preserved-section marker contributes only
    // its managed portion, so a merge can never duplicate the marker.
    let normalized: Vec<SourceFile>;
    let sources = match request.processor {
        Some(proc) => {
            normalized = sources
                .iter()
                .map(|s| SourceFile {
                    repo_path: s.repo_path.clone(),
                    content: proc.extract_comparable(&s.content),
                })
                .collect();
            normalized.as_slice()
        }
        None => sources,
    };

    let default_branch = host.get_repository().await?.default_branch;

    // State 1: does the default branch need anything at all?
    let default_plan = diff_against_ref(host, sources, &default_branch, request.processor).await?;
    if default_plan.iter().all(|p| !p.needs_update()) {
        tracing::debug!(repo = %host.repo_id(), branch = request.branch, "all files up to date");
        return Ok(outcome(
            request,
            FileSyncStatus::Unchanged,
            None,
            Vec::new(),
        ));
    }

    // State 2: is there already an open PR for the sync branch? A listing
    // failure is logged and treated as "no PR found" so a transient list
    // error cannot block a legitimate sync.
    let existing_pr = match host.find_open_pr_by_head(request.branch).await {
        Ok(pr) => pr,
        Err(e) => {
            tracing::warn!(
                repo = %host.repo_id(),
                branch = request.branch,
                error = %e,
                "failed to list open pull requests; assuming none"
            );
            None
        }
    };

    if let Some(pr) = existing_pr {
        return update_existing_pr(host, request, sources, pr.number).await;
    }

    let stale_paths: Vec<String> = default_plan
        .iter()
        .filter(|p| p.needs_update())
        .map(|p| p.source.repo_path.clone())
        .collect();

    if request.dry_run {
        let all_missing = default_plan
            .iter()
            .filter(|p| p.needs_update())
            .all(|p| matches!(p.state, FileState::Missing));
        let status = if all_missing {
            FileSyncStatus::WouldCreate
        } else {
            FileSyncStatus::WouldUpdate
        };
        return Ok(outcome(request, status, None, stale_paths));
    }

    open_new_pr(host, request, &default_branch, &default_plan).await
}
