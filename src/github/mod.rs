//! GitHub API client layer: the repository hosting capability and its
//! octocrab-backed implementation.

pub mod client;
pub mod discovery;
pub mod error;
pub mod host;
mod octocrab_host;

pub use client::OctocrabClient;
pub use discovery::{RepoDirectory, list_owner_repos};
pub use error::ApiError;
pub use host::{
    AutolinkEntry, CodeScanningState, PrInfo, RemoteFile, RepoHost, RepoSettingsPatch,
    RulesetSummary,
};
