//! authorship core library.
//!
//! This crate provides the pieces that turn raw version-control data into
//! trustworthy inputs for authorship attribution: canonical author
//! identities with validated emails and ignore globs, and time-windowed
//! extraction of the files that changed and still exist at the end of a
//! date window.

pub mod config;
pub mod errors;
pub mod extract;
pub mod git;
pub mod identity;

// Re-exports for convenience.
pub use config::AppConfig;
pub use extract::{ExtractionConfig, FileChangeRecord, HistoryWindowExtractor};
pub use git::{GitClient, VersionControl};
pub use identity::{Author, AuthorRegistry};
