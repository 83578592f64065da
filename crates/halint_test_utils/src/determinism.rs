//! Determinism testing utilities.
//!
//! Lint output must be reproducible: the same replay and options always
//! produce the same notifications, in the same order, and the same totals.
//! Sources of non-determinism to guard against:
//!
//! - **Floating-point math**: derived ratios use
//!   [`halint_core::math::Fixed`] instead.
//!
//! - **`HashMap` iteration order**: accumulators and interaction sets are
//!   ordered maps; only lookups go through hash maps.
//!
//! - **Thread scheduling**: batch runs analyze files in parallel and must
//!   still report exactly what a sequential run reports.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use halint_core::error::Result;
use halint_core::notify::{LintOptions, Notification};
use halint_core::replay::Replay;
use halint_core::session::analyze_replay;
use halint_core::stats::LintStats;

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames analyzed per run.
    pub frames: usize,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, frames: usize) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            frames,
        }
    }

    /// All unique hashes (1 for a deterministic analysis).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert every run matched.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Analysis is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Analyze `replay` once and hash the totals together with every
/// notification in emission order.
///
/// # Errors
/// Propagates analysis errors.
pub fn analysis_hash(replay: &Replay, options: &LintOptions) -> Result<u64> {
    let mut sink: Vec<Notification> = Vec::new();
    let stats: LintStats = analyze_replay(replay, options, &mut sink)?;
    Ok(compute_hash(&(stats, sink)))
}

/// Analyze `replay` `runs` times in sequence and compare the results.
///
/// # Errors
/// Propagates the first analysis error.
pub fn verify_determinism(runs: usize, replay: &Replay, options: &LintOptions) -> Result<DeterminismResult> {
    let hashes = (0..runs)
        .map(|_| analysis_hash(replay, options))
        .collect::<Result<Vec<_>>>()?;
    Ok(DeterminismResult::from_hashes(hashes, replay.turn_count()))
}

/// Analyze `replay` on `runs` scoped threads at once and compare the results.
///
/// # Errors
/// Propagates the first analysis error.
///
/// # Panics
///
/// Panics if an analysis thread panics.
pub fn run_parallel_analyses_scoped(
    runs: usize,
    replay: &Replay,
    options: &LintOptions,
) -> Result<DeterminismResult> {
    let results: Vec<Result<u64>> = thread::scope(|s| {
        let handles: Vec<_> = (0..runs)
            .map(|_| s.spawn(|| analysis_hash(replay, options)))
            .collect();

        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let hashes = results.into_iter().collect::<Result<Vec<_>>>()?;
    Ok(DeterminismResult::from_hashes(hashes, replay.turn_count()))
}

/// Proptest strategies for replay-level property tests.
///
/// Generated replays are always structurally valid: every owner has a
/// name and every move code is in range.
pub mod strategies {
    use halint_core::replay::ReplayData;
    use halint_core::PlayerId;
    use proptest::collection::vec;
    use proptest::prelude::*;

    /// A square's `(owner, strength)` with owners in `0..=players`.
    pub fn arb_square(players: PlayerId) -> impl Strategy<Value = (PlayerId, u32)> {
        (0..=players, 0u32..=255)
    }

    /// A raw move code, `0..=4`.
    pub fn arb_move_code() -> impl Strategy<Value = u8> {
        0u8..=4
    }

    /// Replay data with sides in `3..=max_side`, `1..=max_turns` turns and
    /// `players` named players.
    pub fn arb_replay_data(
        max_side: usize,
        max_turns: usize,
        players: PlayerId,
    ) -> impl Strategy<Value = ReplayData> {
        (3..=max_side, 3..=max_side, 1..=max_turns).prop_flat_map(move |(width, height, turns)| {
            let productions = vec(vec(0u32..=15, width), height);
            let frames = vec(vec(vec(arb_square(players), width), height), turns);
            let moves = vec(vec(vec(arb_move_code(), width), height), turns);
            (productions, frames, moves).prop_map(move |(productions, frames, moves)| ReplayData {
                width,
                height,
                productions,
                frames,
                moves,
                player_names: (1..=players).map(|p| format!("bot{p}")).collect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::skirmish;
    use proptest::prelude::*;

    fn all_shown() -> LintOptions {
        LintOptions {
            show_caploss_from_production: true,
            show_overkill: true,
            show_flip_flops: true,
            ..LintOptions::default()
        }
    }

    #[test]
    fn test_compute_hash_is_stable() {
        assert_eq!(compute_hash(&(1u32, "a")), compute_hash(&(1u32, "a")));
        assert_ne!(compute_hash(&1u32), compute_hash(&2u32));
    }

    #[test]
    fn test_skirmish_determinism() {
        let replay = Replay::from_data(skirmish(15, 12, 20)).unwrap();
        let result = verify_determinism(4, &replay, &all_shown()).unwrap();
        result.assert_deterministic();
        assert_eq!(result.frames, 20);
        assert_eq!(result.unique_hashes().len(), 1);
    }

    #[test]
    fn test_parallel_skirmish_analyses() {
        let replay = Replay::from_data(skirmish(15, 12, 20)).unwrap();
        let result = run_parallel_analyses_scoped(4, &replay, &all_shown()).unwrap();
        result.assert_deterministic();
    }

    #[test]
    fn test_options_change_the_hash() {
        let replay = Replay::from_data(skirmish(15, 12, 20)).unwrap();
        let quiet = analysis_hash(&replay, &LintOptions::default()).unwrap();
        let loud = analysis_hash(&replay, &all_shown()).unwrap();
        assert_ne!(quiet, loud);
    }

    #[test]
    #[should_panic(expected = "non-deterministic")]
    fn test_assert_deterministic_reports_divergence() {
        DeterminismResult::from_hashes(vec![1, 2], 3).assert_deterministic();
    }

    proptest! {
        #[test]
        fn prop_generated_replays_are_valid(data in strategies::arb_replay_data(8, 4, 3)) {
            prop_assert!(Replay::from_data(data).is_ok());
        }

        #[test]
        fn prop_random_replays_are_deterministic(data in strategies::arb_replay_data(8, 4, 3)) {
            let replay = Replay::from_data(data).unwrap();
            let result = verify_determinism(2, &replay, &all_shown()).unwrap();
            prop_assert!(result.is_deterministic);
        }
    }
}
