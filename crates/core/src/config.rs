//! TOML-based configuration for authorship analysis runs.
//!
//! A config file names the analysis window, the working copies to analyze
//! and the canonical authors. Authors can be listed inline under
//! `[[authors]]`, loaded from a separate author file, or both.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::ConfigError;
use crate::extract::{end_of_day_utc, start_of_day_utc, ExtractionConfig};
use crate::identity::author_file::{to_authors, AuthorFile, StandaloneAuthor};
use crate::identity::validate::validate_globs;
use crate::identity::AuthorRegistry;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Analysis window and repository-wide filters.
    pub analysis: AnalysisConfig,

    /// Working copies to analyze. Each must be a separate clone.
    #[serde(default)]
    pub repos: Vec<RepoConfig>,

    /// Inline author definitions.
    #[serde(default)]
    pub authors: Vec<StandaloneAuthor>,

    /// Optional separate author file, merged after the inline authors.
    #[serde(default)]
    pub author_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

/// Date window and filters shared by every repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Inclusive start date (`YYYY-MM-DD`). Absent means "from the beginning".
    #[serde(default)]
    pub since: Option<NaiveDate>,

    /// Inclusive end date (`YYYY-MM-DD`), interpreted as the end of that day UTC.
    pub until: NaiveDate,

    /// Minimum tracing level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Globs applied to every repository and every author.
    #[serde(default)]
    pub ignore_globs: Vec<String>,

    /// File extensions to analyze. Empty means all.
    #[serde(default)]
    pub file_formats: Vec<String>,
}

fn default_log_level() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// One working copy and the branch to analyze in it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    /// Path to the working copy.
    pub path: PathBuf,

    /// Branch to analyze (default `main`).
    #[serde(default = "default_branch")]
    pub branch: String,
}

fn default_branch() -> String {
    "main".into()
}

// ---------------------------------------------------------------------------
// Loading & validating
// ---------------------------------------------------------------------------

impl AppConfig {
    /// Load an [`AppConfig`] from a TOML file at the given path.
    ///
    /// This does **not** validate values -- call [`validate`](Self::validate)
    /// afterwards.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = %path.display(), "loading configuration");

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        debug!("configuration parsed successfully");
        Ok(config)
    }

    /// Validate that all required fields are present and sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(since) = self.analysis.since {
            if since > self.analysis.until {
                return Err(ConfigError::InvalidValue {
                    field: "analysis.since".into(),
                    detail: format!(
                        "since date {} is after until date {}",
                        since, self.analysis.until
                    ),
                });
            }
        }
        if self.repos.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "repos".into(),
                detail: "at least one repository must be configured".into(),
            });
        }
        let mut seen = HashSet::new();
        for (i, repo) in self.repos.iter().enumerate() {
            if repo.branch.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("repos[{i}].branch"),
                    detail: "branch must not be empty".into(),
                });
            }
            if !seen.insert(&repo.path) {
                return Err(ConfigError::InvalidValue {
                    field: format!("repos[{i}].path"),
                    detail: format!(
                        "working copy {} is listed twice; use a separate clone per branch",
                        repo.path.display()
                    ),
                });
            }
        }
        validate_globs(&self.analysis.ignore_globs).map_err(|e| ConfigError::InvalidValue {
            field: "analysis.ignore_globs".into(),
            detail: e.to_string(),
        })?;

        Ok(())
    }

    /// Convenience: load and validate in one call.
    pub fn load_and_validate<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// One [`ExtractionConfig`] per configured repository.
    pub fn extraction_configs(&self) -> Result<Vec<ExtractionConfig>, ConfigError> {
        let until = end_of_day_utc(self.analysis.until);
        let since = self.analysis.since.map(start_of_day_utc);
        self.repos
            .iter()
            .map(|repo| {
                let mut config = ExtractionConfig::new(&repo.path, &repo.branch, until)
                    .with_ignore_globs(&self.analysis.ignore_globs)
                    .map_err(|e| ConfigError::InvalidValue {
                        field: "analysis.ignore_globs".into(),
                        detail: e.to_string(),
                    })?
                    .with_file_formats(&self.analysis.file_formats);
                if let Some(since) = since {
                    config = config.with_since(since);
                }
                Ok(config)
            })
            .collect()
    }

    /// Validate every author definition (inline first, then the author
    /// file) into a registry, with the repository-wide globs imported into
    /// each author.
    pub fn build_registry(&self) -> Result<AuthorRegistry, ConfigError> {
        let mut authors = to_authors(&self.authors)?;
        if let Some(ref path) = self.author_file {
            authors.extend(AuthorFile::load_authors(path)?);
        }
        let mut registry = AuthorRegistry::new(authors);
        registry
            .import_ignore_globs(&self.analysis.ignore_globs)
            .map_err(|e| ConfigError::InvalidValue {
                field: "analysis.ignore_globs".into(),
                detail: e.to_string(),
            })?;
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_toml() -> &'static str {
        r#"
[analysis]
since = "2024-01-01"
until = "2024-06-30"
log_level = "debug"
ignore_globs = ["vendor/**"]
file_formats = ["rs", "toml"]

[[repos]]
path = "/work/alpha"
branch = "develop"

[[repos]]
path = "/work/beta"

[[authors]]
git_id = "alice"
display_name = "Alice"
emails = ["alice@example.com"]
author_names = ["Alice Smith"]
ignore_glob_list = ["*.md"]

[[authors]]
git_id = "bob"
"#
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(sample_toml()).expect("failed to parse toml");
        assert_eq!(config.analysis.until, NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(config.repos.len(), 2);
        assert_eq!(config.repos[0].branch, "develop");
        assert_eq!(config.authors[0].author_names, vec!["Alice Smith"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(sample_toml().as_bytes()).unwrap();

        let config = AppConfig::load_and_validate(&path).expect("load failed");
        assert_eq!(config.analysis.log_level, "debug");
    }

    #[test]
    fn test_file_not_found() {
        let result = AppConfig::load_from_file("/nonexistent/config.toml");
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_bad_date_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analysis]\nuntil = \"June 30\"\n").unwrap();
        assert!(matches!(
            AppConfig::load_from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_inverted_window() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.analysis.since = NaiveDate::from_ymd_opt(2025, 1, 1);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "analysis.since"
        ));
    }

    #[test]
    fn test_validate_rejects_no_repos() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.repos.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "repos"
        ));
    }

    #[test]
    fn test_validate_rejects_shared_working_copy() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.repos[1].path = config.repos[0].path.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "repos[1].path"
        ));
    }

    #[test]
    fn test_validate_rejects_uncommon_glob() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.analysis.ignore_globs.push("~/secrets".into());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, ref detail })
                if field == "analysis.ignore_globs" && detail.contains("~/secrets")
        ));
    }

    #[test]
    fn test_defaults() {
        let minimal = r#"
[analysis]
until = "2024-06-30"

[[repos]]
path = "."
"#;
        let config: AppConfig = toml::from_str(minimal).unwrap();
        assert_eq!(config.analysis.log_level, "info");
        assert_eq!(config.analysis.since, None);
        assert_eq!(config.repos[0].branch, "main");
        assert!(config.authors.is_empty());
        assert!(config.author_file.is_none());
    }

    #[test]
    fn test_extraction_configs() {
        let config: AppConfig = toml::from_str(sample_toml()).unwrap();
        let targets = config.extraction_configs().unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].branch, "develop");
        assert_eq!(targets[1].repo_root, PathBuf::from("/work/beta"));
        assert_eq!(
            targets[0].until.to_rfc3339(),
            "2024-06-30T23:59:59+00:00"
        );
        assert_eq!(
            targets[0].since.unwrap().to_rfc3339(),
            "2024-01-01T00:00:00+00:00"
        );
        assert!(targets[0].ignore_globs.matches("vendor/lib/x.rs"));
        assert!(!targets[0].is_format_included("README.md"));
    }

    #[test]
    fn test_build_registry_merges_author_file() {
        let dir = tempfile::tempdir().unwrap();
        let authors_path = dir.path().join("authors.toml");
        std::fs::write(
            &authors_path,
            "[[authors]]\ngit_id = \"carol\"\n\n[[authors]]\ngit_id = \"ALICE\"\n",
        )
        .unwrap();

        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.author_file = Some(authors_path);

        let registry = config.build_registry().unwrap();
        assert_eq!(registry.len(), 3);
        // Inline definition wins over the file's duplicate.
        assert_eq!(registry.get("alice").unwrap().display_name(), "Alice");
        let alice = registry.resolve("Alice Smith", "nobody@example.org");
        assert!(alice.is_ignoring_file("README.md"));
        assert!(alice.is_ignoring_file("vendor/x/y.rs"));
        assert!(registry.get("carol").unwrap().is_ignoring_file("vendor/z.rs"));
    }

    #[test]
    fn test_build_registry_rejects_bad_author() {
        let mut config: AppConfig = toml::from_str(sample_toml()).unwrap();
        config.authors[1].emails = vec!["bob at example".into()];
        assert!(matches!(
            config.build_registry(),
            Err(ConfigError::Identity(_))
        ));
    }
}
