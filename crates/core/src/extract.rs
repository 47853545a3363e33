//! Time-windowed file-change extraction.
//!
//! For one repository / branch / until-date, [`HistoryWindowExtractor`]
//! checks the working copy out at the until-date, asks for the diff of the
//! window and turns it into [`FileChangeRecord`]s for the files that still
//! exist at that point.
//!
//! # Per-call state machine
//!
//! ```text
//! START ──checkout ok──▶ CHECKED_OUT ──diff + parse──▶ PARSED ──▶ DONE
//!   │
//!   └──CommitNotFound──▶ NO_HISTORY ───────────────────────────▶ DONE (empty)
//! ```
//!
//! Only `CommitNotFound` is absorbed; every other failure is returned.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::errors::{GitError, ValidationError};
use crate::git::VersionControl;
use crate::identity::validate::validate_globs;
use crate::identity::IgnoreGlobMatcher;

/// Target path git prints for a removed file.
const FILE_DELETED_SYMBOL: &str = "/dev/null";

/// Start of a per-file section in `git diff` output.
const DIFF_FILE_HEADER: &str = "diff --git ";

static FILE_CHANGED_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\+\+\+ (?P<target>b?/.*)$").expect("file-changed pattern is valid")
});

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A file that changed within the window and still exists at its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChangeRecord {
    /// Repository-relative path as reported by the diff.
    pub file_path: String,
    /// Number of added lines in this file's diff section.
    pub lines_added: usize,
}

/// Result of parsing one diff text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDiff {
    /// Retained records, in diff order.
    pub records: Vec<FileChangeRecord>,
    /// Sections without a `+++` marker (binary, mode-only, empty files).
    pub unmarked: usize,
    /// Sections whose target is the deletion sentinel.
    pub deleted: usize,
}

/// Parse unified diff text into file-change records.
///
/// Sections are delimited by `diff --git` headers; text with no header at
/// all is treated as a single section.
pub fn parse_diff(diff: &str) -> ParsedDiff {
    let mut parsed = ParsedDiff::default();
    for section in file_sections(diff) {
        let Some(caps) = FILE_CHANGED_PATTERN.captures(section) else {
            if !section.trim().is_empty() {
                parsed.unmarked += 1;
            }
            continue;
        };
        let Some(target) = caps.name("target") else {
            parsed.unmarked += 1;
            continue;
        };
        let target_str = target.as_str().trim_end_matches('\r');
        if target_str == FILE_DELETED_SYMBOL {
            parsed.deleted += 1;
            continue;
        }
        let file_path = target_str
            .strip_prefix("b/")
            .or_else(|| target_str.strip_prefix('/'))
            .unwrap_or(target_str)
            .to_string();
        let lines_added = section[target.end()..]
            .lines()
            .skip(1)
            .filter(|line| line.starts_with('+'))
            .count();
        parsed.records.push(FileChangeRecord {
            file_path,
            lines_added,
        });
    }
    parsed
}

/// Split `diff` at every line that starts a `diff --git` header.
fn file_sections(diff: &str) -> Vec<&str> {
    let mut starts: Vec<usize> = diff
        .match_indices(DIFF_FILE_HEADER)
        .map(|(idx, _)| idx)
        .filter(|&idx| idx == 0 || diff.as_bytes()[idx - 1] == b'\n')
        .collect();
    if starts.first() != Some(&0) {
        starts.insert(0, 0);
    }
    let mut sections = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(diff.len());
        sections.push(&diff[start..end]);
    }
    sections
}

// ---------------------------------------------------------------------------
// Extraction config
// ---------------------------------------------------------------------------

/// One extraction target: a working copy, a branch and a date window.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Root of the working copy. Must not be shared with a concurrent run.
    pub repo_root: PathBuf,
    pub branch: String,
    /// Inclusive lower bound. `None` diffs against the empty tree.
    pub since: Option<DateTime<Utc>>,
    /// Inclusive upper bound; the checkout point.
    pub until: DateTime<Utc>,
    /// Repository-wide exclusions.
    pub ignore_globs: IgnoreGlobMatcher,
    /// Lower-cased file extensions to keep. Empty keeps everything.
    pub file_formats: Vec<String>,
}

impl ExtractionConfig {
    pub fn new(repo_root: impl Into<PathBuf>, branch: impl Into<String>, until: DateTime<Utc>) -> Self {
        Self {
            repo_root: repo_root.into(),
            branch: branch.into(),
            since: None,
            until,
            ignore_globs: IgnoreGlobMatcher::empty(),
            file_formats: Vec::new(),
        }
    }

    pub fn with_since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    /// Set repository-wide ignore globs, validated like author globs.
    pub fn with_ignore_globs<S: AsRef<str>>(mut self, globs: &[S]) -> Result<Self, ValidationError> {
        validate_globs(globs)?;
        self.ignore_globs = IgnoreGlobMatcher::compile(globs);
        Ok(self)
    }

    pub fn with_file_formats<S: AsRef<str>>(mut self, formats: &[S]) -> Self {
        self.file_formats = formats
            .iter()
            .map(|f| f.as_ref().trim_start_matches('.').to_lowercase())
            .collect();
        self
    }

    /// Whether `path` has one of the configured extensions.
    pub fn is_format_included(&self, path: &str) -> bool {
        if self.file_formats.is_empty() {
            return true;
        }
        let Some(ext) = Path::new(path).extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_lowercase();
        self.file_formats.iter().any(|f| *f == ext)
    }
}

/// First instant of `date`, UTC.
pub fn start_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Last second of `date`, UTC.
pub fn end_of_day_utc(date: NaiveDate) -> DateTime<Utc> {
    start_of_day_utc(date) + Duration::seconds(86_399)
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// How an extraction finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStatus {
    /// The branch had a commit at or before the until-date.
    Found,
    /// History does not reach the until-date; the result is empty.
    Missing,
}

/// Records plus the bookkeeping callers may want to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOutcome {
    pub status: HistoryStatus,
    pub records: Vec<FileChangeRecord>,
    /// Sections skipped for lacking a `+++` marker.
    pub unmarked: usize,
    /// Sections skipped as deletions.
    pub deleted: usize,
    /// Records dropped by repository-wide globs or file formats.
    pub filtered: usize,
}

impl ExtractOutcome {
    fn no_history() -> Self {
        Self {
            status: HistoryStatus::Missing,
            records: Vec::new(),
            unmarked: 0,
            deleted: 0,
            filtered: 0,
        }
    }
}

/// Drives one checkout / diff / parse cycle through a [`VersionControl`].
#[derive(Debug, Clone)]
pub struct HistoryWindowExtractor<V> {
    vcs: V,
}

impl<V: VersionControl> HistoryWindowExtractor<V> {
    pub fn new(vcs: V) -> Self {
        Self { vcs }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Files changed in the window that survive at its end.
    ///
    /// A branch with no history at the until-date yields an empty list, the
    /// same as a window with no changes; use [`Self::extract_outcome`] to
    /// tell them apart.
    pub fn extract(&self, config: &ExtractionConfig) -> Result<Vec<FileChangeRecord>, GitError> {
        Ok(self.extract_outcome(config)?.records)
    }

    #[instrument(skip(self, config), fields(repo = %config.repo_root.display(), branch = %config.branch))]
    pub fn extract_outcome(&self, config: &ExtractionConfig) -> Result<ExtractOutcome, GitError> {
        match self
            .vcs
            .checkout_to_date(&config.repo_root, &config.branch, config.until)
        {
            Ok(()) => {}
            Err(GitError::CommitNotFound { branch, until }) => {
                warn!(
                    %branch,
                    %until,
                    "no commit at or before until-date (history too short or wrong branch), nothing to extract"
                );
                return Ok(ExtractOutcome::no_history());
            }
            Err(e) => return Err(e),
        }
        debug!("checked out");

        let base = match config.since {
            Some(since) => {
                let cutoff = since - Duration::seconds(1);
                self.vcs
                    .last_commit_before(&config.repo_root, &config.branch, cutoff)?
            }
            None => None,
        };
        debug!(base = base.as_deref().unwrap_or("<empty tree>"), "diff base");

        let diff = self.vcs.diff_text(&config.repo_root, base.as_deref())?;
        let parsed = parse_diff(&diff);

        let mut filtered = 0;
        let mut records = Vec::with_capacity(parsed.records.len());
        for record in parsed.records {
            if let Some(pattern) = config.ignore_globs.matching_pattern(&record.file_path) {
                debug!(path = %record.file_path, pattern, "dropped by ignore glob");
                filtered += 1;
            } else if !config.is_format_included(&record.file_path) {
                debug!(path = %record.file_path, "dropped by file format");
                filtered += 1;
            } else {
                records.push(record);
            }
        }

        info!(
            files = records.len(),
            unmarked = parsed.unmarked,
            deleted = parsed.deleted,
            filtered,
            "extracted file changes"
        );
        Ok(ExtractOutcome {
            status: HistoryStatus::Found,
            records,
            unmarked: parsed.unmarked,
            deleted: parsed.deleted,
            filtered,
        })
    }
}
