//! repo-align - declarative reconciliation of GitHub repository configuration.
//!
//! One YAML file describes the desired state of a fleet of repositories
//! (merge settings, topics, security toggles, synced files, a ruleset,
//! autolinks, package.json fields); each run diffs every repository against
//! it and applies only what differs, delivering file changes through pull
//! requests.

pub mod autolinks;
pub mod config;
pub mod driver;
pub mod filesync;
pub mod github;
pub mod package_json;
pub mod report;
pub mod rulesets;
pub mod settings;
pub mod types;

#[cfg(test)]
pub(crate) mod test_utils;
