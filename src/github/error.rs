//! GitHub API error type.
//!
//! Reconcilers make classification decisions on HTTP status codes: a 404 on a
//! toggle read means "disabled", a 403 on the repository fetch means "access
//! denied", and everything else is surfaced once with no retry. This module
//! wraps octocrab errors with a best-effort status code so those decisions
//! are possible at the call site.

use std::fmt;
use thiserror::Error;

/// A GitHub API error carrying an HTTP status when one could be determined.
#[derive(Debug, Error)]
pub struct ApiError {
    /// The HTTP status code, if available.
    pub status: Option<u16>,

    /// A human-readable description of the error.
    pub message: String,

    /// The underlying octocrab error, if available.
    #[source]
    pub source: Option<octocrab::Error>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(code) => write!(f, "GitHub API error (HTTP {}): {}", code, self.message),
            None => write!(f, "GitHub API error: {}", self.message),
        }
    }
}

impl ApiError {
    /// Creates an error with an explicit status and no octocrab source.
    pub fn status(code: u16, message: impl Into<String>) -> Self {
        ApiError {
            status: Some(code),
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error with no status and no octocrab source.
    pub fn message(message: impl Into<String>) -> Self {
        ApiError {
            status: None,
            message: message.into(),
            source: None,
        }
    }

    /// Wraps an octocrab error, extracting the HTTP status when possible.
    pub fn from_octocrab(err: octocrab::Error) -> Self {
        let status = extract_status_code(&err);
        ApiError {
            status,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// True for 404 responses ("resource absent", which several reconcilers
    /// treat as a valid state rather than an error).
    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// True for 403 responses.
    pub fn is_forbidden(&self) -> bool {
        self.status == Some(403)
    }
}

/// Extracts the HTTP status code from an octocrab error, if present.
///
/// The typed `GitHub` variant exposes the status directly; other variants
/// (serialization, hyper transport) only embed it in the message, so a string
/// scan over common patterns is the fallback. Returning `None` is safe: the
/// caller then treats the failure as a generic error instead of classifying
/// it.
fn extract_status_code(err: &octocrab::Error) -> Option<u16> {
    if let octocrab::Error::GitHub { source, .. } = err {
        return Some(source.status_code.as_u16());
    }

    let err_str = err.to_string();
    if let Some(idx) = err_str.find("status: ") {
        let rest = &err_str[idx + 8..];
        if let Some(end) = rest.find(|c: char| !c.is_ascii_digit()) {
            if let Ok(code) = rest[..end].parse() {
                return Some(code);
            }
        } else if let Ok(code) = rest.trim().parse() {
            return Some(code);
        }
    }

    let lower = err_str.to_lowercase();
    if err_str.contains("404") && lower.contains("not found") {
        return Some(404);
    }
    if err_str.contains("403") && lower.contains("forbidden") {
        return Some(403);
    }
    if err_str.contains("409") && lower.contains("conflict") {
        return Some(409);
    }
    if err_str.contains("422") {
        return Some(422);
    }

    None
}
