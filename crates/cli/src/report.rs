//! Rendering of check outcomes.
//!
//! All diagnostics go to standard output with a severity marker; the
//! process exit status is the only machine-readable signal in text mode.
//! JSON mode serializes the whole outcome instead.

use anyhow::Result;
use console::Style;

use rulecheck_core::check::{CheckOutcome, FileReport, Finding, RunReport, Violation};
use rulecheck_core::models::RuleId;

// ---------------------------------------------------------------------------
// Style helpers
// ---------------------------------------------------------------------------

fn success(msg: &str) -> String {
    format!("{} {}", Style::new().green().apply_to("✓"), msg)
}

fn error(msg: &str) -> String {
    format!("{} {}", Style::new().red().apply_to("✗"), msg)
}

fn warn(msg: &str) -> String {
    format!("{} {}", Style::new().yellow().apply_to("⚠"), msg)
}

fn info(msg: &str) -> String {
    format!("{} {}", Style::new().cyan().apply_to("ℹ"), msg)
}

fn header(msg: &str) -> String {
    Style::new().bold().apply_to(msg).to_string()
}

fn dim(msg: &str) -> String {
    Style::new().dim().apply_to(msg).to_string()
}

fn join_ids(ids: &[RuleId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

/// Render the outcome as human-readable text on stdout.
pub fn render_text(outcome: &CheckOutcome) {
    println!("{}", header("Rule ID conflict check"));
    println!();

    match outcome {
        CheckOutcome::NoRuleChanges => {
            println!("{}", success("No rule files changed."));
        }
        CheckOutcome::Passed(report) => {
            render_report(report);
            println!();
            println!(
                "{}",
                success("All rule file changes passed conflict checks.")
            );
        }
        CheckOutcome::Failed { report, violation } => {
            render_report(report);
            println!();
            render_violation(violation);
            println!();
            println!("{}", error("Rule ID check failed."));
        }
    }
}

fn render_report(report: &RunReport) {
    for warning in &report.index_warnings {
        println!(
            "{}",
            warn(&format!("could not index {}: {}", warning.path, warning.detail))
        );
    }

    for file in &report.files {
        render_file(file);
    }
}

fn render_file(file: &FileReport) {
    println!("{} ({})", header(&file.path), file.status);
    for finding in &file.findings {
        match finding {
            Finding::Deleted => println!("  {}", info("file was deleted")),
            Finding::Unreadable { detail } => {
                println!(
                    "  {}",
                    warn(&format!("could not read working copy: {}", detail))
                );
            }
            Finding::ParseIssue { message, preview } => {
                println!("  {}", warn(&format!("XML parse error: {}", message)));
                println!("  {}", dim(&format!("content preview: {}", preview)));
            }
            Finding::NoIds => println!("  {}", info("no rule IDs found")),
            Finding::OutOfRange { ids, min, max } => {
                println!(
                    "  {}",
                    warn(&format!(
                        "rule IDs outside recommended range ({}-{}): {}",
                        min,
                        max,
                        join_ids(ids)
                    ))
                );
            }
            Finding::IdsUnchanged => {
                println!("  {}", info("modified but rule IDs unchanged"));
            }
            Finding::Passed => println!("  {}", success("no conflicting rule IDs")),
        }
    }
}

fn render_violation(violation: &Violation) {
    match violation {
        Violation::DuplicateIds { path, ids } => {
            println!(
                "{}",
                error(&format!("duplicate rule IDs in {}: {}", path, join_ids(ids)))
            );
        }
        Violation::IdConflicts { path, conflicts } => {
            println!("{}", error(&format!("conflicts detected in {}:", path)));
            for conflict in conflicts {
                println!("  - Rule ID {} already declared in:", conflict.id);
                for owner in &conflict.owners {
                    println!("      • {}", owner);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// JSON rendering
// ---------------------------------------------------------------------------

/// Render the outcome as pretty-printed JSON on stdout.
pub fn render_json(outcome: &CheckOutcome) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}
