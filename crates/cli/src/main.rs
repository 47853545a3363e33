//! authorship command-line tool.
//!
//! Runs the time-windowed file-change extraction over every configured
//! working copy, and inspects the canonical author list the analysis would
//! attribute changes to.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use authorship_core::config::AppConfig;
use authorship_core::extract::{ExtractOutcome, HistoryStatus};
use authorship_core::{
    Author, AuthorRegistry, ExtractionConfig, FileChangeRecord, GitClient, HistoryWindowExtractor,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// authorship command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "authorship",
    version,
    about = "Attribute surviving file changes to canonical authors over a date window"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "./authorship.toml")]
    config: PathBuf,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract the files changed within the window for every repository.
    Extract {
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,

        /// Only list files this author has not excluded.
        #[arg(long)]
        author: Option<String>,
    },

    /// List the canonical authors.
    Authors,

    /// Show which canonical author a commit's name/email resolves to.
    Resolve {
        /// Author name as recorded in the commit.
        name: String,
        /// Author email as recorded in the commit.
        email: String,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./authorship.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { output } => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_init(&output)
        }
        Commands::Validate => {
            init_logging(cli.log_level.as_deref().unwrap_or("warn"));
            cmd_validate(&cli.config)
        }
        command => {
            let config = load_config(&cli.config)?;
            init_logging(
                cli.log_level
                    .as_deref()
                    .unwrap_or(&config.analysis.log_level),
            );
            let registry = config
                .build_registry()
                .context("failed to load author definitions")?;

            match command {
                Commands::Extract { json, author } => {
                    cmd_extract(&config, &registry, json, author.as_deref()).await
                }
                Commands::Authors => cmd_authors(&registry),
                Commands::Resolve { name, email } => cmd_resolve(&registry, &name, &email),
                Commands::Init { .. } | Commands::Validate => unreachable!(),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

fn load_config(path: &Path) -> Result<AppConfig> {
    AppConfig::load_and_validate(path).context("failed to load configuration file")
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

/// Per-repository result, as printed with `--json`.
#[derive(Debug, Serialize)]
struct RepoReport {
    repo: String,
    branch: String,
    history_found: bool,
    files: Vec<FileChangeRecord>,
}

async fn cmd_extract(
    config: &AppConfig,
    registry: &AuthorRegistry,
    json: bool,
    author: Option<&str>,
) -> Result<()> {
    let author: Option<Author> = match author {
        Some(id) => Some(
            registry
                .get(id)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("author '{}' is not configured", id))?,
        ),
        None => None,
    };

    // One blocking task per working copy; validation guarantees the clones
    // are distinct, so no two tasks touch the same checkout.
    let mut handles = Vec::new();
    for target in config.extraction_configs()? {
        handles.push(tokio::task::spawn_blocking(move || {
            let outcome = HistoryWindowExtractor::new(GitClient::new()).extract_outcome(&target);
            (target, outcome)
        }));
    }

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        let (target, outcome) = handle.await.context("extraction task panicked")?;
        let outcome = outcome
            .with_context(|| format!("extraction failed for {}", target.repo_root.display()))?;
        reports.push(to_report(&target, outcome, author.as_ref()));
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    for report in &reports {
        println!("{} ({})", report.repo, report.branch);
        println!("{}", "-".repeat(60));
        if !report.history_found {
            println!("  no history at or before the until-date");
        } else if report.files.is_empty() {
            println!("  no changed files");
        }
        for file in &report.files {
            println!("  {:<50} +{}", truncate(&file.file_path, 48), file.lines_added);
        }
        println!();
    }
    let total: usize = reports.iter().map(|r| r.files.len()).sum();
    println!("{} file(s) across {} repository(ies)", total, reports.len());

    Ok(())
}

fn to_report(target: &ExtractionConfig, outcome: ExtractOutcome, author: Option<&Author>) -> RepoReport {
    let files = match author {
        Some(a) => a
            .relevant_files(&outcome.records)
            .into_iter()
            .cloned()
            .collect(),
        None => outcome.records,
    };
    debug!(repo = %target.repo_root.display(), files = files.len(), "report built");
    RepoReport {
        repo: target.repo_root.display().to_string(),
        branch: target.branch.clone(),
        history_found: outcome.status == HistoryStatus::Found,
        files,
    }
}

fn cmd_authors(registry: &AuthorRegistry) -> Result<()> {
    if registry.is_empty() {
        println!("No authors configured.");
        return Ok(());
    }

    for author in registry.authors() {
        println!("{} ({})", author.git_id(), author.display_name());
        println!("  emails       : {}", author.emails().join(", "));
        if !author.aliases().is_empty() {
            println!("  aliases      : {}", author.aliases().join(", "));
        }
        if !author.ignore_glob_list().is_empty() {
            println!("  ignore globs : {}", author.ignore_glob_list().join(", "));
        }
    }
    println!();
    println!("{} author(s)", registry.len());

    Ok(())
}

fn cmd_resolve(registry: &AuthorRegistry, name: &str, email: &str) -> Result<()> {
    let author = registry.resolve(name, email);
    if author.is_unknown() {
        println!("{} <{}> -> unknown author", name, email);
    } else {
        println!(
            "{} <{}> -> {} ({})",
            name,
            email,
            author.git_id(),
            author.display_name()
        );
    }
    Ok(())
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# authorship configuration

[analysis]
# since = "2024-01-01"
until = "2024-12-31"
log_level = "info"
ignore_globs = []
file_formats = []

# One entry per working copy. Analyze different branches of the same
# repository from separate clones.
[[repos]]
path = "."
branch = "main"

# [[authors]]
# git_id = "jdoe"
# display_name = "John Doe"
# emails = ["jdoe@example.com"]
# author_names = ["John Doe"]
# ignore_glob_list = ["docs/**"]

# author_file = "authors.toml"
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;
    info!(path = %output.display(), "wrote default configuration");

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Set the analysis window and list your working copies");
    println!("  2. Add author definitions");
    println!(
        "  3. Validate with: authorship validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config = AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    if let Err(e) = config.validate() {
        println!("  [FAIL] Validation error: {}", e);
        anyhow::bail!("configuration validation failed");
    }
    println!("  [OK] All required fields are valid");

    let registry = match config.build_registry() {
        Ok(r) => r,
        Err(e) => {
            println!("  [FAIL] Author definitions: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    };
    println!("  [OK] Author definitions are valid");

    println!();
    println!("Configuration summary:");
    println!(
        "  Window        : {} .. {}",
        config
            .analysis
            .since
            .map(|d| d.to_string())
            .unwrap_or_else(|| "beginning".to_string()),
        config.analysis.until
    );
    println!("  Repositories  : {}", config.repos.len());
    println!("  Authors       : {}", registry.len());
    println!("  Ignore globs  : {}", config.analysis.ignore_globs.len());
    println!();
    println!("Configuration is valid.");

    Ok(())
}

/// Truncate a string to `max` chars, appending "..." if needed.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
