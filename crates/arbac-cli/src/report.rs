//! Per-file policy evaluation and reporting.
//!
//! Each file is parsed and evaluated independently: a parse or validation
//! failure is reported against its file name and never corrupts the results
//! of other files.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::Serialize;
use tracing::warn;

use arbac_engine::{Outcome, Policy, ReachabilityEngine, RuleApplication, SearchConfig};

/// One entry of the JSON report.
#[derive(Serialize)]
struct FileReport {
    file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Finds every `.arbac` file directly inside `dir`, sorted by name.
pub fn discover_policies(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("cannot read directory '{}'", dir.display()))?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "arbac"))
        .collect();
    files.sort();

    if files.is_empty() {
        warn!(dir = %dir.display(), "no .arbac files found");
    }
    Ok(files)
}

/// Evaluates every file and prints the report.
///
/// Returns the number of files that failed to parse or validate.
pub fn run_files(
    files: &[PathBuf],
    config: &SearchConfig,
    print_witness: bool,
    json: bool,
) -> Result<usize> {
    let mut reports = Vec::with_capacity(files.len());
    let mut failures = 0usize;

    for file in files {
        let name = file.display().to_string();
        match evaluate(file, config) {
            Ok((policy, outcome)) => {
                if !json {
                    print_verdict(&name, &policy, &outcome, print_witness);
                }
                reports.push(FileReport {
                    file: name,
                    outcome: Some(outcome),
                    error: None,
                });
            }
            Err(err) => {
                failures += 1;
                if !json {
                    eprintln!("{}: {} {err:#}", name, "error:".red().bold());
                }
                reports.push(FileReport {
                    file: name,
                    outcome: None,
                    error: Some(format!("{err:#}")),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(failures)
}

/// Parses one file and runs the engine on it.
fn evaluate(file: &Path, config: &SearchConfig) -> Result<(Policy, Outcome)> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("cannot read '{}'", file.display()))?;
    let policy = arbac_parser::parse_policy(&text)
        .with_context(|| format!("cannot parse '{}'", file.display()))?;

    let engine = ReachabilityEngine::with_config(policy, config.clone());
    let outcome = engine.run();
    Ok((engine.policy().clone(), outcome))
}

fn print_verdict(name: &str, policy: &Policy, outcome: &Outcome, print_witness: bool) {
    match outcome {
        Outcome::Reachable { witness } => {
            println!("{name}: {}", "REACHABLE".green().bold());
            if print_witness && let Some(steps) = witness {
                if steps.is_empty() {
                    println!("  goal role '{}' held in the initial assignment", policy.goal());
                }
                for (index, step) in steps.iter().enumerate() {
                    println!("  {}. {}", index + 1, describe(policy, step));
                }
            }
        }
        Outcome::Unreachable => {
            println!("{name}: {}", "NOT REACHABLE".red().bold());
        }
        Outcome::Unknown { explored } => {
            println!(
                "{name}: {} (budget exceeded after {explored} states)",
                "UNKNOWN".yellow().bold()
            );
        }
    }
}

/// Renders one witness step against the policy's rule lists.
fn describe(policy: &Policy, step: &RuleApplication) -> String {
    match step {
        RuleApplication::Assign { rule, target } => {
            let rule = &policy.assign_rules()[*rule];
            format!(
                "grant '{}' to {} (admin role '{}')",
                rule.target_role, target, rule.admin_role
            )
        }
        RuleApplication::Revoke { rule, target } => {
            let rule = &policy.revoke_rules()[*rule];
            format!(
                "revoke '{}' from {} (admin role '{}')",
                rule.target_role, target, rule.admin_role
            )
        }
    }
}
