//! recmerge command-line merge driver.
//!
//! Performs a three-way merge of THIS, OTHER and BASE, writing the
//! result to stdout or (with `--git`) back over THIS the way a git merge
//! driver is expected to. Exit code 1 signals unresolved conflicts;
//! everything else that terminates normally exits 0.
//!
//! Typical git configuration:
//!
//! ```text
//! [merge "recmerge"]
//!     name = recmerge
//!     driver = recmerge --git %A %B %O --conflictlen=%L --target=%P
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use recmerge_core::chunks::{join_chunks, split_chunks};
use recmerge_core::config::MergeConfig;
use recmerge_core::resolvers::{MergeOutcome, ResolverRegistry};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Format-aware three-way merge driver.
#[derive(Parser, Debug)]
#[command(
    name = "recmerge",
    version,
    about = "Merge structured text files at the record level"
)]
struct Cli {
    /// Behave as a git merge driver: write the result over THIS, or
    /// remove it when the merge resolves to a deletion.
    #[arg(long)]
    git: bool,

    /// List registered resolvers and exit.
    #[arg(short, long)]
    list: bool,

    /// Repository-relative path used for resolver matching (git passes
    /// %P here). Defaults to the THIS path.
    #[arg(long)]
    target: Option<String>,

    /// Width of normalized conflict-marker lines.
    #[arg(long)]
    conflictlen: Option<usize>,

    /// Path to the TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Current version of the file (%A).
    this: Option<PathBuf>,

    /// Incoming version of the file (%B).
    other: Option<PathBuf>,

    /// Common ancestor version (%O).
    base: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    // Diagnostics go to stderr; stdout carries the merge result.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RECMERGE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => {
            MergeConfig::load_from_file(path).context("failed to load configuration file")?
        }
        None => MergeConfig::discover(),
    };
    if let Some(conflictlen) = cli.conflictlen {
        config.conflictlen = conflictlen;
    }
    config.validate().context("invalid configuration")?;

    let registry = ResolverRegistry::with_defaults(&config);

    if cli.list {
        for resolver in registry.resolvers() {
            let availability = if resolver.is_available() {
                "available"
            } else {
                "unavailable"
            };
            println!("{} ({})", resolver.name(), availability);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let (Some(this), Some(other), Some(base)) = (&cli.this, &cli.other, &cli.base) else {
        bail!("expected THIS OTHER BASE arguments; see --help");
    };

    let this_chunks = read_chunks(this)?;
    let other_chunks = read_chunks(other)?;
    let base_chunks = read_chunks(base)?;

    let path = cli
        .target
        .clone()
        .unwrap_or_else(|| this.display().to_string());

    let outcome = registry.merge(&path, &base_chunks, &this_chunks, &other_chunks);

    match &outcome {
        MergeOutcome::Success { chunks } | MergeOutcome::Conflicted { chunks } => {
            if cli.git {
                std::fs::write(this, join_chunks(chunks))
                    .with_context(|| format!("failed to write merge result to {}", this.display()))?;
            } else {
                print!("{}", join_chunks(chunks));
            }
        }
        MergeOutcome::Delete => {
            if cli.git {
                std::fs::remove_file(this)
                    .with_context(|| format!("failed to remove {}", this.display()))?;
            }
        }
        MergeOutcome::NotApplicable => {}
    }

    Ok(match outcome {
        MergeOutcome::Conflicted { .. } => ExitCode::from(1),
        _ => ExitCode::SUCCESS,
    })
}

// ---------------------------------------------------------------------------
// File helpers
// ---------------------------------------------------------------------------

/// Read a version file as chunks. An empty path stands for a missing
/// side (file added or deleted), which reads as empty content.
fn read_chunks(path: &Path) -> Result<Vec<String>> {
    if path.as_os_str().is_empty() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(split_chunks(&text))
}
