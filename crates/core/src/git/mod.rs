//! Version-control access for the extractor.
//!
//! [`VersionControl`] is the seam between the history window extractor and
//! whatever actually moves the working copy and renders diffs.
//! [`GitClient`] is the `git2` implementation.

pub mod client;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::errors::GitError;

pub use client::GitClient;

/// Operations the extractor needs from a version-control system.
///
/// Implementations mutate the working copy at `repo_root`; callers must not
/// run two cycles against the same clone concurrently.
pub trait VersionControl {
    /// Check out the newest commit on `branch` whose commit time is at or
    /// before `until`.
    ///
    /// Returns [`GitError::CommitNotFound`] if the branch has no such commit.
    /// Calling it again with the same arguments is a no-op.
    fn checkout_to_date(
        &self,
        repo_root: &Path,
        branch: &str,
        until: DateTime<Utc>,
    ) -> Result<(), GitError>;

    /// Hash of the newest commit on `branch` at or before `date`, if any.
    fn last_commit_before(
        &self,
        repo_root: &Path,
        branch: &str,
        date: DateTime<Utc>,
    ) -> Result<Option<String>, GitError>;

    /// Unified diff from `base` (or the empty tree when `None`) to the
    /// checked-out `HEAD`.
    fn diff_text(&self, repo_root: &Path, base: Option<&str>) -> Result<String, GitError>;
}
