//! Canonical author lookup.
//!
//! [`AuthorRegistry`] folds the many ways an author shows up in commit
//! metadata (several emails, old display names, differently-cased handles)
//! onto one canonical [`Author`].
//!
//! Lookup order for [`AuthorRegistry::resolve`]:
//! 1. Email (case-insensitive)
//! 2. Alias (case-insensitive)
//! 3. Git id (case-insensitive)
//! 4. Fallback: [`Author::unknown`]

use std::collections::HashMap;

use tracing::{debug, info, warn};

use super::author::Author;
use crate::errors::ValidationError;

/// Deduplicated set of canonical authors with lookup indexes.
#[derive(Debug, Clone, Default)]
pub struct AuthorRegistry {
    authors: Vec<Author>,
    by_id: HashMap<String, usize>,
    by_email: HashMap<String, usize>,
    by_alias: HashMap<String, usize>,
}

impl AuthorRegistry {
    /// Build a registry. Later definitions of an id already seen (compared
    /// case-insensitively) are dropped.
    pub fn new(authors: impl IntoIterator<Item = Author>) -> Self {
        let mut registry = Self::default();
        for author in authors {
            registry.insert(author);
        }
        info!(count = registry.authors.len(), "author registry built");
        registry
    }

    /// Add an author. Returns `false` if an author with the same id exists.
    pub fn insert(&mut self, author: Author) -> bool {
        let id_key = author.git_id().to_lowercase();
        if self.by_id.contains_key(&id_key) {
            warn!(git_id = author.git_id(), "duplicate author definition ignored");
            return false;
        }
        let idx = self.authors.len();
        self.by_id.insert(id_key, idx);
        for email in author.emails() {
            index_first(&mut self.by_email, email, idx, "email");
        }
        for alias in author.aliases() {
            index_first(&mut self.by_alias, alias, idx, "alias");
        }
        self.authors.push(author);
        true
    }

    pub fn authors(&self) -> &[Author] {
        &self.authors
    }

    pub fn len(&self) -> usize {
        self.authors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.authors.is_empty()
    }

    /// Look up by canonical id.
    pub fn get(&self, git_id: &str) -> Option<&Author> {
        self.by_id
            .get(&git_id.to_lowercase())
            .map(|&idx| &self.authors[idx])
    }

    /// Map commit metadata to a canonical author.
    pub fn resolve(&self, author_name: &str, author_email: &str) -> Author {
        if let Some(&idx) = self.by_email.get(&author_email.to_lowercase()) {
            debug!(author_email, "resolved by email");
            return self.authors[idx].clone();
        }
        let name_key = author_name.to_lowercase();
        if let Some(&idx) = self.by_alias.get(&name_key) {
            debug!(author_name, "resolved by alias");
            return self.authors[idx].clone();
        }
        if let Some(&idx) = self.by_id.get(&name_key) {
            debug!(author_name, "resolved by git id");
            return self.authors[idx].clone();
        }
        debug!(author_name, author_email, "no matching author, using unknown");
        Author::unknown()
    }

    /// Merge `globs` into every author's ignore globs.
    ///
    /// Validation happens once up front, so on failure no author is changed.
    pub fn import_ignore_globs<S: AsRef<str>>(&mut self, globs: &[S]) -> Result<(), ValidationError> {
        super::validate::validate_globs(globs)?;
        for author in &mut self.authors {
            author.import_ignore_glob_list(globs)?;
        }
        Ok(())
    }
}

fn index_first(index: &mut HashMap<String, usize>, value: &str, idx: usize, kind: &str) {
    let key = value.to_lowercase();
    if index.contains_key(&key) {
        warn!(kind, value, "already claimed by another author, ignoring");
        return;
    }
    index.insert(key, idx);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StandaloneAuthor;

    fn alice() -> Author {
        Author::from_standalone(&StandaloneAuthor {
            git_id: "alice".into(),
            display_name: "Alice".into(),
            emails: vec!["alice@example.com".into()],
            author_names: vec!["Alice Smith".into()],
            ignore_glob_list: vec![],
        })
        .unwrap()
    }

    #[test]
    fn test_resolve_by_email() {
        let reg = AuthorRegistry::new([alice(), Author::new("bob")]);
        let a = reg.resolve("Somebody Else", "ALICE@example.com");
        assert_eq!(a.git_id(), "alice");
    }

    #[test]
    fn test_resolve_by_standard_email() {
        let reg = AuthorRegistry::new([Author::new("bob")]);
        let b = reg.resolve("B", "bob@users.noreply.github.com");
        assert_eq!(b.git_id(), "bob");
    }

    #[test]
    fn test_resolve_by_alias_then_id() {
        let reg = AuthorRegistry::new([alice(), Author::new("bob")]);
        assert_eq!(reg.resolve("alice smith", "x@y.org").git_id(), "alice");
        assert_eq!(reg.resolve("BOB", "x@y.org").git_id(), "bob");
    }

    #[test]
    fn test_resolve_unknown() {
        let reg = AuthorRegistry::new([alice()]);
        assert!(reg.resolve("carol", "carol@example.com").is_unknown());
    }

    #[test]
    fn test_duplicate_ids_deduplicated() {
        let reg = AuthorRegistry::new([alice(), Author::new("ALICE")]);
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get("Alice").unwrap().display_name(), "Alice");
    }

    #[test]
    fn test_import_ignore_globs_applies_to_all() {
        let mut reg = AuthorRegistry::new([alice(), Author::new("bob")]);
        reg.import_ignore_globs(&["*.lock"]).unwrap();
        reg.import_ignore_globs(&["*.lock"]).unwrap();
        for author in reg.authors() {
            assert_eq!(author.ignore_glob_list(), ["*.lock".to_string()]);
            assert!(author.is_ignoring_file("Cargo.lock"));
        }
        // The resolved copy sees the globs too.
        assert!(reg.resolve("bob", "").is_ignoring_file("yarn.lock"));
    }

    #[test]
    fn test_import_ignore_globs_rejected_changes_nothing() {
        let mut reg = AuthorRegistry::new([alice()]);
        assert!(reg.import_ignore_globs(&["ok/**", "bad|glob"]).is_err());
        assert!(reg.authors()[0].ignore_glob_list().is_empty());
    }
}
