//! Idempotent file delivery through pull requests.

pub mod content;
pub mod engine;


pub use content::{
    ContentProcessor, GITIGNORE_PRESERVE_MARKER, GitignoreProcessor, MergeError, canonical_json,
};
pub use engine::{FileSyncRequest, FileSyncTarget, SyncError, sync_contents, sync_files};
