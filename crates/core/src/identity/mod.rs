//! Author identity model.
//!
//! - [`validate`]: allow-list checks for emails and ignore globs
//! - [`glob_matcher`]: compiled OR-of-globs path predicate
//! - [`author`]: the canonical [`Author`] record
//! - [`author_file`]: TOML author descriptions
//! - [`registry`]: commit metadata → canonical author lookup

pub mod author;
pub mod author_file;
pub mod glob_matcher;
pub mod registry;
pub mod validate;

pub use author::{Author, NAME_NO_AUTHOR_WITH_COMMITS_FOUND, UNKNOWN_AUTHOR_GIT_ID};
pub use author_file::{AuthorFile, StandaloneAuthor};
pub use glob_matcher::IgnoreGlobMatcher;
pub use registry::AuthorRegistry;
