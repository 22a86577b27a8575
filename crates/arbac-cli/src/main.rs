//! ARBAC reachability checker CLI.
//!
//! Audits administrative role-based access-control policies for
//! privilege-escalation paths: for each policy file, decides whether any
//! sequence of rule applications can give the goal role to some user.
//!
//! # Quick Start
//!
//! ```bash
//! # Check specific policy files
//! arbac check policy1.arbac policy2.arbac
//!
//! # Discover and check every .arbac file in a directory
//! arbac scan ./policies
//!
//! # Print the escalation path when one exists
//! arbac check --witness policy.arbac
//! ```

mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use arbac_engine::SearchConfig;

/// ARBAC reachability checker - audits role-administration policies for
/// privilege-escalation paths.
#[derive(Parser)]
#[command(name = "arbac")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the given policy files.
    Check {
        /// Policy files in the textual .arbac format.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        options: EngineOptions,
    },

    /// Discover and check every .arbac file in a directory.
    Scan {
        /// Directory to scan (defaults to the current directory).
        #[arg(default_value = ".")]
        dir: PathBuf,

        #[command(flatten)]
        options: EngineOptions,
    },
}

/// Engine flags shared by `check` and `scan`.
#[derive(Args)]
struct EngineOptions {
    /// Give up with an UNKNOWN verdict after exploring this many states.
    #[arg(long, value_name = "N")]
    max_states: Option<usize>,

    /// Print the sequence of rule applications when the goal is reachable.
    #[arg(long)]
    witness: bool,

    /// Expand each search level in parallel.
    #[arg(long)]
    parallel: bool,

    /// Reject states in which every user holds zero roles (non-standard).
    #[arg(long)]
    forbid_empty: bool,

    /// Emit a machine-readable JSON report instead of text.
    #[arg(long)]
    json: bool,
}

impl EngineOptions {
    fn search_config(&self) -> SearchConfig {
        SearchConfig {
            max_states: self.max_states,
            forbid_fully_revoked: self.forbid_empty,
            record_witness: self.witness,
            parallel: self.parallel,
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let (files, options) = match cli.command {
        Commands::Check { files, options } => (files, options),
        Commands::Scan { dir, options } => (report::discover_policies(&dir)?, options),
    };

    let failures = report::run_files(&files, &options.search_config(), options.witness, options.json)?;
    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}
