//! Batch linting of replay files.
//!
//! Files are analyzed in parallel using rayon; outcomes come back in the
//! order the files were given so printed output never interleaves.

use std::path::{Path, PathBuf};

use halint_core::error::LintError;
use halint_core::notify::{LintOptions, Notification};
use halint_core::replay::Replay;
use halint_core::session::analyze_replay;
use halint_core::stats::LintStats;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::report::{render_summary, MatchReport};

/// Link printed after every match.
pub const REPLAY_URL: &str = "https://halite.io/game.php?replay=";

/// Result of linting one file.
#[derive(Debug)]
pub struct MatchOutcome {
    /// File as given.
    pub path: PathBuf,
    /// Notifications in emission order. Empty when analysis fails.
    pub notifications: Vec<Notification>,
    /// Final totals, or why there are none.
    pub result: Result<LintStats, LintError>,
}

impl MatchOutcome {
    /// Whether analysis ran to the end.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// File name as shown in banners.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.path.display().to_string()
    }

    /// Everything printed to stdout for this match.
    ///
    /// A failed match prints only its start banner; the error itself goes
    /// to the log.
    #[must_use]
    pub fn render(&self) -> String {
        let name = self.display_name();
        let mut out = format!("Starting halint for {name}\n");
        for notification in &self.notifications {
            out.push_str(&notification.to_string());
            out.push('\n');
        }
        if let Ok(stats) = &self.result {
            out.push_str(&render_summary(stats));
            out.push_str(&format!("Replay may be available at {REPLAY_URL}{name}\n"));
            out.push_str(&format!("Completed halint for {name}\n"));
        }
        out.push('\n');
        out
    }

    /// JSON report, if analysis succeeded.
    #[must_use]
    pub fn report(&self) -> Option<MatchReport> {
        self.result
            .as_ref()
            .ok()
            .map(|stats| MatchReport::new(self.display_name(), stats.clone(), self.notifications.clone()))
    }
}

/// Lint a single replay file.
pub fn lint_file(path: &Path, options: &LintOptions) -> MatchOutcome {
    let mut notifications: Vec<Notification> = Vec::new();
    let result = Replay::load(path).and_then(|replay| {
        debug!(
            file = %path.display(),
            width = replay.width(),
            height = replay.height(),
            turns = replay.turn_count(),
            "Replay loaded"
        );
        analyze_replay(&replay, options, &mut notifications)
    });
    if result.is_err() {
        notifications.clear();
    }
    MatchOutcome {
        path: path.to_path_buf(),
        notifications,
        result,
    }
}

/// Lint every file, `parallel` at a time (0 = rayon default).
///
/// Outcomes are returned in input order.
pub fn lint_files(paths: &[PathBuf], options: &LintOptions, parallel: usize) -> Vec<MatchOutcome> {
    let run = || -> Vec<MatchOutcome> {
        paths
            .par_iter()
            .map(|path| lint_file(path, options))
            .collect()
    };

    let outcomes = if parallel > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(parallel).build() {
            Ok(pool) => pool.install(run),
            Err(e) => {
                warn!("Failed to build a {parallel}-thread pool: {e}, using the default");
                run()
            }
        }
    } else {
        run()
    };

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    info!("Batch complete: {} files, {} failed", outcomes.len(), failed);
    outcomes
}
