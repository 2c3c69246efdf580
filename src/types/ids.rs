//! Newtype wrappers for domain identifiers.
//!
//! These types prevent accidental mixing of identifiers (e.g., passing a branch
//! name where an `owner/repo` pair is expected) and centralize the validation
//! that every reconciler depends on: a malformed repository identifier is a
//! fatal configuration error and must short-circuit before any API call.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error produced when an `owner/repo` string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository identifier {input:?}: expected \"owner/name\" with non-empty parts")]
pub struct InvalidRepoId {
    /// The input that failed to parse.
    pub input: String,
}

/// A repository identifier (owner/repo format).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId {
    pub owner: String,
    pub repo: String,
}

impl RepoId {
    /// Creates a `RepoId` from pre-validated parts.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        RepoId {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parses an `owner/name` string.
    ///
    /// Exactly one `/` separating two non-empty parts is accepted. Anything
    /// else (missing slash, empty owner or name, nested paths) is rejected,
    /// and the caller is expected to fail the whole repository without making
    /// any API call.
    pub fn parse(input: &str) -> Result<Self, InvalidRepoId> {
        let mut parts = input.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
                Ok(RepoId::new(owner, repo))
            }
            _ => Err(InvalidRepoId {
                input: input.to_string(),
            }),
        }
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
