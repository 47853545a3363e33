//! Canonical author identity record.
//!
//! An [`Author`] is keyed by its git id, compared case-insensitively. The
//! email, alias and glob collections are held behind `Arc`s: `Clone` yields a
//! shared snapshot, and every setter swaps in a fresh collection rather than
//! editing the shared one. Use [`Author::detached`] for an unshared copy.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use tracing::debug;

use super::author_file::StandaloneAuthor;
use super::glob_matcher::IgnoreGlobMatcher;
use super::validate::{validate_emails, validate_globs};
use crate::errors::ValidationError;
use crate::extract::FileChangeRecord;

/// Display name used for the "nobody committed in this window" sentinel.
pub const NAME_NO_AUTHOR_WITH_COMMITS_FOUND: &str =
    "NO AUTHOR WITH COMMITS FOUND WITHIN THIS PERIOD OF TIME";

/// Reserved git id of the unknown author.
pub const UNKNOWN_AUTHOR_GIT_ID: &str = "-";

const STANDARD_GITHUB_EMAIL_DOMAIN: &str = "@users.noreply.github.com";
const STANDARD_GITLAB_EMAIL_DOMAIN: &str = "@users.noreply.gitlab.com";

/// One contributor's identity-matching configuration.
#[derive(Debug, Clone)]
pub struct Author {
    git_id: String,
    /// Lower-cased `git_id`; the equality and hash key.
    key: String,
    display_name: String,
    emails: Arc<Vec<String>>,
    aliases: Arc<Vec<String>>,
    ignore_globs: Arc<Vec<String>>,
    ignore_matcher: Arc<IgnoreGlobMatcher>,
}

impl Author {
    /// Minimal identity: display name is the id and the only emails are the
    /// two standard host emails.
    pub fn new(git_id: impl Into<String>) -> Self {
        let git_id = git_id.into();
        let emails = standard_git_host_emails(&git_id).to_vec();
        Self {
            key: git_id.to_lowercase(),
            display_name: git_id.clone(),
            git_id,
            emails: Arc::new(emails),
            aliases: Arc::new(Vec::new()),
            ignore_globs: Arc::new(Vec::new()),
            ignore_matcher: Arc::new(IgnoreGlobMatcher::empty()),
        }
    }

    /// Import a standalone author description.
    ///
    /// Emails and globs go through the same validating setters as later
    /// mutation; an empty display name falls back to the git id.
    pub fn from_standalone(sa: &StandaloneAuthor) -> Result<Self, ValidationError> {
        let mut author = Self::new(sa.git_id.clone());
        if !sa.display_name.is_empty() {
            author.display_name = sa.display_name.clone();
        }
        author.aliases = Arc::new(sa.author_names.clone());
        author.set_emails(&sa.emails)?;
        author.set_ignore_glob_list(&sa.ignore_glob_list)?;
        Ok(author)
    }

    /// The "unknown author" sentinel.
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_AUTHOR_GIT_ID)
    }

    /// The sentinel reported when no author committed within the window.
    pub fn no_author_with_commits() -> Self {
        Self::new(NAME_NO_AUTHOR_WITH_COMMITS_FOUND)
    }

    pub fn is_unknown(&self) -> bool {
        self.git_id == UNKNOWN_AUTHOR_GIT_ID
    }

    /// Copy that shares nothing with `self`.
    pub fn detached(&self) -> Self {
        Self {
            git_id: self.git_id.clone(),
            key: self.key.clone(),
            display_name: self.display_name.clone(),
            emails: Arc::new(self.emails.as_ref().clone()),
            aliases: Arc::new(self.aliases.as_ref().clone()),
            ignore_globs: Arc::new(self.ignore_globs.as_ref().clone()),
            ignore_matcher: Arc::new(self.ignore_matcher.as_ref().clone()),
        }
    }

    /// Convert back to the on-disk description.
    pub fn to_standalone(&self) -> StandaloneAuthor {
        StandaloneAuthor {
            git_id: self.git_id.clone(),
            display_name: self.display_name.clone(),
            emails: self.emails.as_ref().clone(),
            author_names: self.aliases.as_ref().clone(),
            ignore_glob_list: self.ignore_globs.as_ref().clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn git_id(&self) -> &str {
        &self.git_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) {
        self.display_name = display_name.into();
    }

    pub fn emails(&self) -> &[String] {
        &self.emails
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn set_aliases(&mut self, aliases: Vec<String>) {
        self.aliases = Arc::new(aliases);
    }

    pub fn ignore_glob_list(&self) -> &[String] {
        &self.ignore_globs
    }

    // -----------------------------------------------------------------------
    // Validating setters
    // -----------------------------------------------------------------------

    /// Replace the emails with a deduplicated copy of `emails`, then append
    /// the standard host emails if absent.
    ///
    /// On a validation failure nothing is changed.
    pub fn set_emails<S: AsRef<str>>(&mut self, emails: &[S]) -> Result<(), ValidationError> {
        validate_emails(emails)?;
        let mut updated = Vec::with_capacity(emails.len() + 2);
        for email in emails {
            push_unique(&mut updated, email.as_ref());
        }
        for standard in standard_git_host_emails(&self.git_id) {
            push_unique(&mut updated, &standard);
        }
        self.emails = Arc::new(updated);
        Ok(())
    }

    /// Replace the ignore globs with a deduplicated copy of `globs` and
    /// recompile the matcher.
    ///
    /// On a validation failure nothing is changed.
    pub fn set_ignore_glob_list<S: AsRef<str>>(
        &mut self,
        globs: &[S],
    ) -> Result<(), ValidationError> {
        validate_globs(globs)?;
        let mut updated = Vec::with_capacity(globs.len());
        for glob in globs {
            push_unique(&mut updated, glob.as_ref());
        }
        self.replace_ignore_globs(updated);
        Ok(())
    }

    /// Add `globs` to the existing ignore globs, skipping ones already
    /// present, and recompile the matcher.
    pub fn import_ignore_glob_list<S: AsRef<str>>(
        &mut self,
        globs: &[S],
    ) -> Result<(), ValidationError> {
        validate_globs(globs)?;
        let mut updated = self.ignore_globs.as_ref().clone();
        for glob in globs {
            push_unique(&mut updated, glob.as_ref());
        }
        self.replace_ignore_globs(updated);
        Ok(())
    }

    /// `true` if this author's contributions to `file_path` are excluded.
    pub fn is_ignoring_file(&self, file_path: &str) -> bool {
        self.ignore_matcher.matches(file_path)
    }

    /// Records this author has not excluded, in input order.
    pub fn relevant_files<'a>(&self, records: &'a [FileChangeRecord]) -> Vec<&'a FileChangeRecord> {
        records
            .iter()
            .filter(|r| !self.is_ignoring_file(&r.file_path))
            .collect()
    }

    fn replace_ignore_globs(&mut self, globs: Vec<String>) {
        let matcher = IgnoreGlobMatcher::compile(&globs);
        debug!(git_id = %self.git_id, count = globs.len(), "recompiled ignore glob matcher");
        self.ignore_globs = Arc::new(globs);
        self.ignore_matcher = Arc::new(matcher);
    }
}

impl PartialEq for Author {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Author {}

impl Hash for Author {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.git_id)
    }
}

/// The GitHub and GitLab no-reply addresses for `git_id`.
pub fn standard_git_host_emails(git_id: &str) -> [String; 2] {
    [
        format!("{git_id}{STANDARD_GITHUB_EMAIL_DOMAIN}"),
        format!("{git_id}{STANDARD_GITLAB_EMAIL_DOMAIN}"),
    ]
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v == value) {
        list.push(value.to_string());
    }
}
