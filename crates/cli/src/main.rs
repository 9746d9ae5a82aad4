//! rulecheck command-line tool.
//!
//! Pre-merge gate for XML rule repositories: refuses change sets that
//! introduce duplicate or conflicting numeric rule identifiers relative
//! to a reference branch. The exit status is the machine-readable
//! signal; diagnostics go to stdout.

mod report;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use rulecheck_core::check::ConflictChecker;
use rulecheck_core::config::AppConfig;
use rulecheck_core::extract::extract_rule_ids;
use rulecheck_core::git::GitClient;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Pre-merge rule ID conflict check for XML rule repositories.
#[derive(Parser, Debug)]
#[command(
    name = "rulecheck",
    version,
    about = "Detect rule ID conflicts between a change set and a reference branch"
)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when absent.
    #[arg(short, long, global = true, default_value = "rulecheck.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check the current change set for rule ID conflicts.
    Check {
        /// Repository to check (any path inside it).
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Override the configured base ref (e.g. origin/main).
        #[arg(long)]
        base: Option<String>,

        /// Output format.
        #[arg(long, value_enum, default_value = "text")]
        format: Format,
    },

    /// Print the rule IDs extracted from a single file.
    Extract {
        /// The rule file to read.
        file: PathBuf,
    },

    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file.
        #[arg(short, long, default_value = "./rulecheck.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file.
    Validate,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    // Minimal logging; user-facing diagnostics go through the reporter.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .without_time()
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check { repo, base, format } => cmd_check(&cli.config, &repo, base, format),
        Commands::Extract { file } => cmd_extract(&file),
        Commands::Init { output } => {
            cmd_init(&output)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Validate => {
            cmd_validate(&cli.config)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the config file if it exists, otherwise fall back to defaults.
fn load_config(path: &Path) -> Result<AppConfig> {
    let config = if path.exists() {
        AppConfig::load_from_file(path).context("failed to load configuration file")?
    } else {
        debug!(path = %path.display(), "no config file; using defaults");
        AppConfig::default()
    };
    config.validate().context("invalid configuration")?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_check(
    config_path: &Path,
    repo: &Path,
    base: Option<String>,
    format: Format,
) -> Result<ExitCode> {
    let mut config = load_config(config_path)?;
    if let Some(base) = base {
        config.check.base_ref = base;
    }

    let client = GitClient::open(repo).context("failed to open git repository")?;
    let checker = ConflictChecker::new(&client, &config);
    let outcome = checker.run().context("rule ID check could not run")?;

    match format {
        Format::Text => report::render_text(&outcome),
        Format::Json => report::render_json(&outcome)?,
    }

    Ok(if outcome.is_failure() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn cmd_extract(file: &Path) -> Result<ExitCode> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let extraction = extract_rule_ids(&content);

    if let Some(issue) = &extraction.issue {
        println!("XML parse error: {}", issue.message);
        println!("content preview: {}", issue.preview);
    }
    for id in &extraction.ids {
        println!("{}", id);
    }
    if extraction.ids.is_empty() && extraction.issue.is_none() {
        println!("no rule IDs found in {}", file.display());
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_init(output: &Path) -> Result<()> {
    let default_config = r#"# rulecheck configuration
# All values shown are the defaults.

[rules]
# Directory prefix rule files live under.
root = "rules/"
# File extension of rule files.
extension = ".xml"
# Glob patterns for rule files to exclude from checking.
ignore = []

[check]
# The reference revision the change set is compared against.
base_ref = "origin/main"
# Recommended custom rule ID range (inclusive). IDs outside it warn.
id_range_min = 100000
id_range_max = 120000
"#;

    if output.exists() {
        anyhow::bail!(
            "file already exists: {}. Use a different path or remove the existing file.",
            output.display()
        );
    }

    std::fs::write(output, default_config).context("failed to write config file")?;

    println!("Default configuration written to {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. Adjust the rule path convention and base ref if needed");
    println!(
        "  2. Validate with: rulecheck validate --config {}",
        output.display()
    );
    println!("  3. Run the check: rulecheck check");

    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;
    println!("  [OK] TOML structure is valid");

    match config.validate() {
        Ok(()) => println!("  [OK] All field values are valid"),
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    println!();
    println!("Configuration summary:");
    println!("  Rule root     : {}", config.rules.root);
    println!("  Rule extension: {}", config.rules.extension);
    println!("  Ignore globs  : {}", config.rules.ignore.len());
    println!("  Base ref      : {}", config.check.base_ref);
    println!(
        "  ID range      : {}-{}",
        config.check.id_range_min, config.check.id_range_max
    );
    println!();
    println!("Configuration is valid.");

    Ok(())
}
