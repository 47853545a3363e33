//! Error types for the authorship core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// An email or ignore glob was rejected by the common-pattern allow-list.
///
/// The message always carries the offending value verbatim so the user can
/// find it in their configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("The provided email, {0}, uses uncommon pattern.")]
    UncommonEmail(String),

    #[error("The provided ignore glob, {0}, uses uncommon pattern.")]
    UncommonGlob(String),
}

impl ValidationError {
    /// The rejected value.
    pub fn value(&self) -> &str {
        match self {
            Self::UncommonEmail(v) | Self::UncommonGlob(v) => v,
        }
    }
}

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from the version-control collaborator.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// Neither a local nor an `origin` remote-tracking branch exists.
    #[error("git branch not found: {0}")]
    BranchNotFound(String),

    /// The branch has no commit at or before the requested date.
    #[error("no commit on branch '{branch}' at or before {until}")]
    CommitNotFound {
        branch: String,
        until: String,
    },

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),
}

impl GitError {
    /// `true` for the recoverable "history does not reach the date" case.
    pub fn is_commit_not_found(&self) -> bool {
        matches!(self, Self::CommitNotFound { .. })
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// An author definition was rejected.
    #[error("invalid author definition: {0}")]
    Identity(#[from] IdentityError),

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Identity errors
// ---------------------------------------------------------------------------

/// Errors from the author identity subsystem.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The author file could not be loaded.
    #[error("author file error at '{path}': {detail}")]
    AuthorFileError {
        path: String,
        detail: String,
    },

    /// An author definition carries an email or glob outside the allow-list.
    #[error("author '{git_id}': {source}")]
    Validation {
        git_id: String,
        #[source]
        source: ValidationError,
    },

    /// TOML parse error when reading the author file.
    #[error("author file parse error: {0}")]
    ParseError(String),

    /// Generic I/O error.
    #[error("identity I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_messages() {
        let err = ValidationError::UncommonEmail("bad@@mail".into());
        assert_eq!(
            err.to_string(),
            "The provided email, bad@@mail, uses uncommon pattern."
        );

        let err = ValidationError::UncommonGlob("src/$HOME".into());
        assert!(err.to_string().contains("src/$HOME"));
        assert_eq!(err.value(), "src/$HOME");

        let err = GitError::CommitNotFound {
            branch: "main".into(),
            until: "2020-01-01".into(),
        };
        assert_eq!(
            err.to_string(),
            "no commit on branch 'main' at or before 2020-01-01"
        );
        assert!(err.is_commit_not_found());

        let err = GitError::RepositoryNotFound("/tmp/repo".into());
        assert!(!err.is_commit_not_found());

        let err: GitError = git2::Error::from_str("object not found").into();
        assert!(matches!(err, GitError::Git2Error(_)));
        assert!(!err.is_commit_not_found());
    }

    #[test]
    fn test_identity_error_names_author_and_value() {
        let err = IdentityError::Validation {
            git_id: "alice".into(),
            source: ValidationError::UncommonGlob("a;b".into()),
        };
        let msg = err.to_string();
        assert!(msg.contains("alice"));
        assert!(msg.contains("a;b"));
    }

    #[test]
    fn test_core_error_from_subsystem() {
        let core_err: CoreError = ValidationError::UncommonEmail("x".into()).into();
        assert!(matches!(core_err, CoreError::Validation(_)));

        let core_err: CoreError = GitError::BranchNotFound("dev".into()).into();
        assert!(matches!(core_err, CoreError::Git(_)));
    }
}
