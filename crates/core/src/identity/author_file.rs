//! TOML-based author configuration reader/writer.
//!
//! The author file format:
//!
//! ```toml
//! [[authors]]
//! git_id = "jdoe"
//! display_name = "John Doe"
//! emails = ["jdoe@example.com"]
//! author_names = ["John Doe", "J. Doe"]
//! ignore_glob_list = ["docs/**", "*.lock"]
//! ```
//!
//! Only `git_id` is required.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::author::Author;
use crate::errors::IdentityError;

/// A single author description as written by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandaloneAuthor {
    /// Canonical handle.
    pub git_id: String,
    /// Label for reports; empty means "use the git id".
    #[serde(default)]
    pub display_name: String,
    /// Extra emails seen in commit metadata.
    #[serde(default)]
    pub emails: Vec<String>,
    /// Alternate author names seen in commit metadata.
    #[serde(default)]
    pub author_names: Vec<String>,
    /// Files whose changes by this author are excluded.
    #[serde(default)]
    pub ignore_glob_list: Vec<String>,
}

/// Wrapper around the TOML author file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorFileData {
    /// The `[[authors]]` array.
    #[serde(default)]
    pub authors: Vec<StandaloneAuthor>,
}

/// Utilities for loading and saving the author file.
pub struct AuthorFile;

impl AuthorFile {
    /// Load the author file from disk and return the raw descriptions.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<StandaloneAuthor>, IdentityError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading author file");

        if !path.exists() {
            return Err(IdentityError::AuthorFileError {
                path: path.display().to_string(),
                detail: "file not found".into(),
            });
        }

        let contents = std::fs::read_to_string(path)?;
        let data: AuthorFileData =
            toml::from_str(&contents).map_err(|e| IdentityError::ParseError(e.to_string()))?;

        debug!(count = data.authors.len(), "loaded author descriptions");
        Ok(data.authors)
    }

    /// Load the author file and validate every entry into an [`Author`].
    pub fn load_authors<P: AsRef<Path>>(path: P) -> Result<Vec<Author>, IdentityError> {
        to_authors(&Self::load(path)?)
    }

    /// Save authors back to disk in TOML format.
    pub fn save<P: AsRef<Path>>(path: P, authors: &[Author]) -> Result<(), IdentityError> {
        let path = path.as_ref();
        info!(path = %path.display(), "saving author file");

        let data = AuthorFileData {
            authors: authors.iter().map(Author::to_standalone).collect(),
        };

        let toml_str =
            toml::to_string_pretty(&data).map_err(|e| IdentityError::ParseError(e.to_string()))?;
        std::fs::write(path, toml_str)?;

        debug!(count = authors.len(), "saved authors");
        Ok(())
    }
}

/// Validate standalone descriptions into authors, naming the offending author
/// on failure.
pub fn to_authors(descriptions: &[StandaloneAuthor]) -> Result<Vec<Author>, IdentityError> {
    descriptions
        .iter()
        .map(|sa| {
            Author::from_standalone(sa).map_err(|source| IdentityError::Validation {
                git_id: sa.git_id.clone(),
                source,
            })
        })
        .collect()
}
