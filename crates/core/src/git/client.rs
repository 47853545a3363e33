//! Local Git repository operations via `git2`.

use std::path::Path;

use chrono::{DateTime, Utc};
use git2::build::CheckoutBuilder;
use git2::{BranchType, DiffFormat, DiffOptions, Oid, Repository, Sort};
use tracing::{debug, info, instrument};

use super::VersionControl;
use crate::errors::GitError;

/// [`VersionControl`] backed by `git2`.
///
/// Stateless: every call opens the repository at the given root, so one
/// client can serve any number of clones.
#[derive(Debug, Clone, Default)]
pub struct GitClient {
    /// Lines of context around each hunk in [`VersionControl::diff_text`].
    context_lines: u32,
}

impl GitClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render diffs with `lines` of context instead of none.
    pub fn with_context_lines(mut self, lines: u32) -> Self {
        self.context_lines = lines;
        self
    }

    fn open(repo_root: &Path) -> Result<Repository, GitError> {
        Repository::open(repo_root)
            .map_err(|_| GitError::RepositoryNotFound(repo_root.display().to_string()))
    }

    /// Resolve `branch` to its tip, preferring the local branch over
    /// `origin/<branch>`.
    fn branch_tip(repo: &Repository, branch: &str) -> Result<Oid, GitError> {
        let found = repo
            .find_branch(branch, BranchType::Local)
            .or_else(|_| repo.find_branch(&format!("origin/{branch}"), BranchType::Remote))
            .map_err(|_| GitError::BranchNotFound(branch.to_string()))?;
        let commit = found.get().peel_to_commit()?;
        Ok(commit.id())
    }

    /// Newest commit reachable from the branch tip with commit time <= `cutoff`.
    fn find_commit_at_or_before(
        repo: &Repository,
        branch: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Option<Oid>, GitError> {
        let tip = Self::branch_tip(repo, branch)?;
        let mut revwalk = repo.revwalk()?;
        revwalk.push(tip)?;
        revwalk.set_sorting(Sort::TIME)?;
        let cutoff = cutoff.timestamp();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = repo.find_commit(oid)?;
            if commit.time().seconds() <= cutoff {
                return Ok(Some(oid));
            }
        }
        Ok(None)
    }
}

impl VersionControl for GitClient {
    #[instrument(skip(self), fields(repo = %repo_root.display()))]
    fn checkout_to_date(
        &self,
        repo_root: &Path,
        branch: &str,
        until: DateTime<Utc>,
    ) -> Result<(), GitError> {
        let repo = Self::open(repo_root)?;
        let oid = Self::find_commit_at_or_before(&repo, branch, until)?.ok_or_else(|| {
            GitError::CommitNotFound {
                branch: branch.to_string(),
                until: until.to_rfc3339(),
            }
        })?;
        let commit = repo.find_commit(oid)?;
        repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
        repo.set_head_detached(oid)?;
        info!(sha = %oid, "checked out commit");
        Ok(())
    }

    #[instrument(skip(self), fields(repo = %repo_root.display()))]
    fn last_commit_before(
        &self,
        repo_root: &Path,
        branch: &str,
        date: DateTime<Utc>,
    ) -> Result<Option<String>, GitError> {
        let repo = Self::open(repo_root)?;
        let found = Self::find_commit_at_or_before(&repo, branch, date)?;
        debug!(found = ?found, "looked up base commit");
        Ok(found.map(|oid| oid.to_string()))
    }

    #[instrument(skip(self), fields(repo = %repo_root.display()))]
    fn diff_text(&self, repo_root: &Path, base: Option<&str>) -> Result<String, GitError> {
        let repo = Self::open(repo_root)?;
        let head_tree = repo.head()?.peel_to_tree()?;
        let base_tree = match base {
            Some(sha) => Some(repo.find_commit(Oid::from_str(sha)?)?.tree()?),
            None => None,
        };

        let mut opts = DiffOptions::new();
        opts.context_lines(self.context_lines);
        let diff =
            repo.diff_tree_to_tree(base_tree.as_ref(), Some(&head_tree), Some(&mut opts))?;

        let mut out = Vec::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                out.push(line.origin() as u8);
            }
            out.extend_from_slice(line.content());
            true
        })?;
        debug!(bytes = out.len(), "rendered diff");
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use git2::{Signature, Time};

    use super::*;

    /// Commit the current working tree with a fixed timestamp.
    fn commit_at(repo: &Repository, secs: i64, message: &str) -> Oid {
        let mut index = repo.index().unwrap();
        index
            .add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)
            .unwrap();
        index.update_all(["*"].iter(), None).unwrap();
        index.write().unwrap();
        let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
        let sig = Signature::new("Test", "test@test.com", &Time::new(secs, 0)).unwrap();
        let parent = repo.head().ok().map(|h| h.peel_to_commit().unwrap());
        let parents: Vec<&git2::Commit> = parent.iter().collect();
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    fn utc(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn branch_name(repo: &Repository) -> String {
        repo.head().unwrap().shorthand().unwrap().to_string()
    }

    #[test]
    fn test_checkout_to_date_picks_latest_before() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        let first = commit_at(&repo, 1_000, "first");
        std::fs::write(dir.path().join("a.txt"), "two\n").unwrap();
        commit_at(&repo, 2_000, "second");
        let branch = branch_name(&repo);

        let client = GitClient::new();
        client.checkout_to_date(dir.path(), &branch, utc(1_500)).unwrap();
        assert_eq!(repo.head().unwrap().target().unwrap(), first);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "one\n");

        // Same arguments again is fine.
        client.checkout_to_date(dir.path(), &branch, utc(1_500)).unwrap();
        assert_eq!(repo.head().unwrap().target().unwrap(), first);
    }

    #[test]
    fn test_checkout_before_history_is_commit_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        commit_at(&repo, 1_000, "first");
        let branch = branch_name(&repo);

        let err = GitClient::new()
            .checkout_to_date(dir.path(), &branch, utc(10))
            .unwrap_err();
        assert!(err.is_commit_not_found());
    }

    #[test]
    fn test_unknown_branch() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        commit_at(&repo, 1_000, "first");

        let err = GitClient::new()
            .checkout_to_date(dir.path(), "no-such-branch", utc(5_000))
            .unwrap_err();
        assert!(matches!(err, GitError::BranchNotFound(_)));
    }

    #[test]
    fn test_repo_not_found() {
        let err = GitClient::new()
            .diff_text(Path::new("/nonexistent/repo"), None)
            .unwrap_err();
        assert!(matches!(err, GitError::RepositoryNotFound(_)));
    }

    #[test]
    fn test_diff_text_markers() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("keep.txt"), "keep\n").unwrap();
        std::fs::write(dir.path().join("gone.txt"), "gone\n").unwrap();
        let base = commit_at(&repo, 1_000, "base");
        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();
        std::fs::write(dir.path().join("keep.txt"), "keep\nmore\n").unwrap();
        commit_at(&repo, 2_000, "change");

        let client = GitClient::new();
        let diff = client
            .diff_text(dir.path(), Some(&base.to_string()))
            .unwrap();
        assert!(diff.contains("+++ b/keep.txt\n"), "{diff}");
        assert!(diff.contains("+++ /dev/null\n"), "{diff}");
        assert!(diff.contains("+more\n"), "{diff}");

        let full = client.diff_text(dir.path(), None).unwrap();
        assert!(full.contains("+++ b/keep.txt\n"), "{full}");
        assert!(!full.contains("gone.txt"), "{full}");
    }

    #[test]
    fn test_last_commit_before() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        std::fs::write(dir.path().join("a.txt"), "one\n").unwrap();
        let first = commit_at(&repo, 1_000, "first");
        let branch = branch_name(&repo);

        let client = GitClient::new();
        assert_eq!(
            client.last_commit_before(dir.path(), &branch, utc(1_000)).unwrap(),
            Some(first.to_string())
        );
        assert_eq!(client.last_commit_before(dir.path(), &branch, utc(999)).unwrap(), None);
    }
}
