//! Halite replay linter.
//!
//! Prints frame-by-frame notifications and end-of-match summary tables for
//! each replay file given.
//!
//! # Usage
//!
//! ```bash
//! # Lint a replay
//! halint 1234.hlt
//!
//! # Only report on some bots, with every optional notification
//! halint 1234.hlt --names "djma erdman" --show-caploss-from-production \
//!     --show-overkill --show-flip-flops
//!
//! # Many replays, four at a time, with JSON reports
//! halint replays/*.hlt --parallel 4 --json-report reports/
//! ```
//!
//! Lint output goes to stdout; logs go to stderr.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use halint_cli::{lint_files, LintConfig, MatchOutcome, Overrides};

#[derive(Parser)]
#[command(name = "halint")]
#[command(about = "Find wasted strength and odd moves in Halite replays")]
#[command(version)]
struct Cli {
    /// Replay files to lint
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Restrict notifications to these bots (whitespace-separated name fragments)
    #[arg(long)]
    names: Option<String>,

    /// Show cap loss which occurred solely due to production
    #[arg(long, alias = "show_caploss_from_production")]
    show_caploss_from_production: bool,

    /// Show detailed overkill frame by frame
    #[arg(long, alias = "show_overkill")]
    show_overkill: bool,

    /// Show pieces that flip-flop between adjacent squares
    #[arg(long, alias = "show_flip_flops")]
    show_flip_flops: bool,

    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write one JSON report per replay into this directory
    #[arg(long)]
    json_report: Option<PathBuf>,

    /// Files to analyze at once (0 = one per core)
    #[arg(short = 'j', long)]
    parallel: Option<usize>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            names: self.names.clone(),
            show_caploss_from_production: self.show_caploss_from_production,
            show_overkill: self.show_overkill,
            show_flip_flops: self.show_flip_flops,
            parallel: self.parallel,
            json_report: self.json_report.clone(),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logs to stderr (stdout is for lint output)
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let base = match &cli.config {
        Some(path) => match LintConfig::load(path) {
            Ok(config) => {
                info!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                error!("{e}");
                return ExitCode::FAILURE;
            }
        },
        None => LintConfig::default(),
    };
    let config = base.with_overrides(cli.overrides());

    let outcomes = lint_files(&cli.files, &config.to_options(), config.parallel);

    let mut failed = false;
    for outcome in &outcomes {
        print!("{}", outcome.render());
        if let Err(e) = &outcome.result {
            error!("Lint failed for {}: {e}", outcome.display_name());
            failed = true;
        }
        if let Some(dir) = &config.json_report {
            if let Err(e) = write_report(dir, outcome) {
                error!("Failed to write report for {}: {e}", outcome.display_name());
                failed = true;
            }
        }
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn write_report(dir: &Path, outcome: &MatchOutcome) -> std::io::Result<()> {
    let Some(report) = outcome.report() else {
        return Ok(());
    };
    let mut name = outcome
        .path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "replay".into());
    name.push(".json");
    let path = dir.join(name);
    report.save(&path)?;
    info!("Report saved to {}", path.display());
    Ok(())
}
