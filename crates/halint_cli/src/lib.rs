//! Command-line front end for the Halite replay linter.
//!
//! The `halint` binary analyzes one or more replay files with
//! [`halint_core`] and prints, per file:
//!
//! - **Notifications**: one line per detected event, frame by frame
//! - **Summary tables**: cap loss, movement cost, move efficiency, overkill
//!
//! Optionally a JSON report per file is written for further processing.
//!
//! # Example
//!
//! ```bash
//! # Lint two replays, showing overkill for one bot only
//! cargo run -p halint_cli -- 1234.hlt 5678.hlt --names djma --show-overkill
//!
//! # Settings from a file, reports to a directory
//! cargo run -p halint_cli -- replays/*.hlt --config halint.ron --json-report out/
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod batch;
pub mod config;
pub mod report;

pub use batch::{lint_file, lint_files, MatchOutcome};
pub use config::{ConfigError, LintConfig, Overrides};
pub use report::{render_summary, MatchReport, Table};
