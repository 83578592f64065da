//! End-to-end analysis tests for halint_core.
//!
//! Scenarios are built turn by turn with [`ReplayBuilder`]; properties run
//! over generated replays.

use std::collections::BTreeSet;

use halint_core::notify::Notifier;
use halint_core::prelude::*;
use halint_test_utils::determinism::strategies::arb_replay_data;
use halint_test_utils::fixtures::{neutral, unit, ReplayBuilder};
use proptest::prelude::*;

fn all_shown() -> LintOptions {
    LintOptions {
        show_caploss_from_production: true,
        show_overkill: true,
        show_flip_flops: true,
        ..LintOptions::default()
    }
}

fn run(replay: &Replay, options: &LintOptions) -> (LintStats, Vec<Notification>) {
    let mut sink: Vec<Notification> = Vec::new();
    let stats = analyze_replay(replay, options, &mut sink).unwrap();
    (stats, sink)
}

fn reports(replay: &Replay) -> Vec<FrameReport> {
    let options = all_shown();
    let mut sink: Vec<Notification> = Vec::new();
    let mut notifier = Notifier::new(&options, replay.names(), &mut sink);
    let mut session = LintSession::for_replay(replay);
    replay
        .frames()
        .map(|frame| session.analyze_frame(&frame.unwrap(), &mut notifier).unwrap())
        .collect()
}

// =============================================================================
// Flip-flops
// =============================================================================

mod flip_flops {
    use super::*;

    #[test]
    fn test_back_and_forth_flagged_on_third_turn() {
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .turn(&[unit(2, 1, 1, 20, Direction::West)])
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &all_shown());
        assert_eq!(stats.flip_flops(1), 1);

        let flips: Vec<_> = notes
            .iter()
            .filter(|n| n.kind == NotificationKind::FlipFlop)
            .collect();
        assert_eq!(flips.len(), 1);
        assert_eq!((flips[0].frame, flips[0].x, flips[0].y), (2, 1, 1));
        assert_eq!(flips[0].owner_name, "alpha");
    }

    #[test]
    fn test_pause_in_between_is_not_a_flip_flop() {
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .turn(&[unit(2, 1, 1, 20, Direction::Still)])
            .turn(&[unit(2, 1, 1, 20, Direction::West)])
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .build()
            .unwrap();

        let (stats, _) = run(&replay, &all_shown());
        assert_eq!(stats.flip_flops(1), 0);
    }

    #[test]
    fn test_swap_between_owners_is_not_a_flip_flop() {
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .turn(&[unit(2, 1, 2, 20, Direction::West)])
            .turn(&[unit(1, 1, 1, 20, Direction::East)])
            .build()
            .unwrap();

        let (stats, _) = run(&replay, &all_shown());
        assert_eq!(stats.flip_flops(1), 0);
        assert_eq!(stats.flip_flops(2), 0);
    }

    #[test]
    fn test_counted_even_when_hidden() {
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[unit(1, 1, 1, 20, Direction::North)])
            .turn(&[unit(1, 0, 1, 20, Direction::South)])
            .turn(&[unit(1, 1, 1, 20, Direction::North)])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &LintOptions::default());
        assert_eq!(stats.flip_flops(1), 1);
        assert!(notes.iter().all(|n| n.kind != NotificationKind::FlipFlop));
    }
}

// =============================================================================
// Cap loss
// =============================================================================

mod cap_loss {
    use super::*;

    #[test]
    fn test_merge_over_the_wrap_edge() {
        // (0, 1) moving West wraps to (4, 1) and lands on a still unit.
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[
                unit(0, 1, 1, 200, Direction::West),
                unit(4, 1, 1, 100, Direction::Still),
            ])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &LintOptions::default());
        assert_eq!(stats.cap_loss(CapLossKind::Standard, 1), 45);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].kind, NotificationKind::CapLoss);
        assert_eq!((notes[0].x, notes[0].y, notes[0].value), (4, 1, Some(45)));
    }

    #[test]
    fn test_production_categories() {
        // (1, 1) sits at 250 and gains 10; (3, 1) receives a merge it
        // could have held without production.
        let replay = ReplayBuilder::new(5, 3)
            .production(10)
            .turn(&[
                unit(1, 1, 1, 250, Direction::Still),
                unit(3, 1, 1, 200, Direction::Still),
                unit(3, 2, 1, 50, Direction::North),
            ])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &all_shown());
        assert_eq!(stats.cap_loss(CapLossKind::StillBig, 1), 5);
        assert_eq!(stats.cap_loss(CapLossKind::MergeExProduction, 1), 5);
        assert_eq!(stats.cap_loss(CapLossKind::Standard, 1), 0);
        assert_eq!(stats.overflow_loss(1), 10);

        let kinds: BTreeSet<_> = notes.iter().map(|n| n.kind).collect();
        assert!(kinds.contains(&NotificationKind::StillBigCapLoss));
        assert!(kinds.contains(&NotificationKind::CapLossExProduction));
    }

    #[test]
    fn test_still_squares_compound_into_still_big() {
        // Four stationary units gain 10 a turn from 60: 250 on turn 19
        // overflows by 5, then 255 on turn 20 by 10.
        let builder = (0..=20u32).fold(ReplayBuilder::new(2, 2).production(10), |b, t| {
            let strength = (60 + 10 * t).min(STRENGTH_CAP);
            b.turn(&[
                unit(0, 0, 1, strength, Direction::Still),
                unit(1, 0, 1, strength, Direction::Still),
                unit(0, 1, 1, strength, Direction::Still),
                unit(1, 1, 1, strength, Direction::Still),
            ])
        });
        let replay = builder.build().unwrap();

        let frames = reports(&replay);
        assert_eq!(frames.len(), 21);
        assert!(frames[..19].iter().all(|r| r.cap_loss.is_empty()));
        assert!(frames[19]
            .cap_loss
            .iter()
            .all(|e| e.kind == OverflowKind::StillBig && e.amount == 5));
        assert_eq!(frames[19].cap_loss.len(), 4);
        assert!(frames[20].cap_loss.iter().all(|e| e.amount == 10));

        let (stats, _) = run(&replay, &LintOptions::default());
        assert_eq!(stats.cap_loss(CapLossKind::Standard, 1), 0);
        assert_eq!(stats.cap_loss(CapLossKind::StillBig, 1), 60);
    }

    #[test]
    fn test_notifications_follow_arrival_order() {
        // (0, 1) is first reached from (0, 0); (3, 0) comes earlier in
        // row-major order but is first reached from (2, 0).
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[
                unit(0, 0, 1, 200, Direction::South),
                unit(2, 0, 1, 200, Direction::East),
                unit(3, 1, 1, 100, Direction::North),
                unit(0, 2, 1, 100, Direction::North),
            ])
            .build()
            .unwrap();

        let (_, notes) = run(&replay, &LintOptions::default());
        let at: Vec<_> = notes.iter().map(|n| (n.kind, n.x, n.y, n.value)).collect();
        assert_eq!(
            at,
            vec![
                (NotificationKind::CapLoss, 0, 1, Some(45)),
                (NotificationKind::CapLoss, 3, 0, Some(45)),
            ]
        );
    }

    #[test]
    fn test_production_categories_hidden_by_default() {
        let replay = ReplayBuilder::new(3, 3)
            .production(10)
            .turn(&[unit(1, 1, 1, 250, Direction::Still)])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &LintOptions::default());
        assert_eq!(stats.cap_loss(CapLossKind::StillBig, 1), 5);
        assert!(notes.is_empty());
    }

    #[test]
    fn test_movement_forfeits_production() {
        let replay = ReplayBuilder::new(4, 4)
            .production(3)
            .turn(&[
                unit(0, 0, 1, 10, Direction::East),
                unit(2, 2, 1, 10, Direction::South),
                unit(3, 3, 2, 10, Direction::Still),
            ])
            .build()
            .unwrap();

        let (stats, _) = run(&replay, &LintOptions::default());
        assert_eq!(stats.cap_loss(CapLossKind::Movement, 1), 6);
        assert_eq!(stats.cap_loss(CapLossKind::Movement, 2), 0);
        assert_eq!(stats.total_moves(1), 2);
    }
}

// =============================================================================
// Mining and combat
// =============================================================================

mod combat {
    use super::*;

    #[test]
    fn test_weak_attack_on_neutral_is_failed_mining() {
        let replay = ReplayBuilder::new(4, 4)
            .turn(&[unit(1, 1, 1, 30, Direction::East), neutral(2, 1, 40)])
            .build()
            .unwrap();

        let (_, notes) = run(&replay, &LintOptions::default());
        let failed: Vec<_> = notes
            .iter()
            .filter(|n| n.kind == NotificationKind::FailedMining)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!((failed[0].x, failed[0].y), (2, 1));
    }

    #[test]
    fn test_strong_attack_on_neutral_is_fine() {
        let replay = ReplayBuilder::new(4, 4)
            .turn(&[unit(1, 1, 1, 41, Direction::East), neutral(2, 1, 40)])
            .build()
            .unwrap();

        let (_, notes) = run(&replay, &LintOptions::default());
        assert!(notes.is_empty(), "unexpected {notes:?}");
    }

    #[test]
    fn test_attack_into_two_defenders_is_overkill() {
        // Beta's 100 lands between two alpha 90s; each defender is hit by
        // nobody else, so beta is credited 180 against alpha.
        let replay = ReplayBuilder::new(6, 3)
            .turn(&[
                unit(1, 1, 1, 90, Direction::Still),
                unit(3, 1, 1, 90, Direction::Still),
                unit(2, 0, 2, 100, Direction::South),
            ])
            .build()
            .unwrap();

        let (stats, notes) = run(&replay, &all_shown());
        assert_eq!(stats.overkill(2, 1), 80);
        assert_eq!(stats.overkill_total(), 80);

        let over: Vec<_> = notes
            .iter()
            .filter(|n| n.kind == NotificationKind::Overkill)
            .collect();
        assert_eq!(over.len(), 1);
        assert_eq!(over[0].owner_name, "alpha");
        assert_eq!((over[0].x, over[0].y, over[0].value), (2, 1, Some(80)));
    }

    #[test]
    fn test_single_defender_is_not_overkill() {
        let replay = ReplayBuilder::new(5, 3)
            .turn(&[
                unit(1, 1, 1, 90, Direction::Still),
                unit(2, 0, 2, 100, Direction::South),
            ])
            .build()
            .unwrap();

        let (stats, _) = run(&replay, &all_shown());
        assert_eq!(stats.overkill_total(), 0);
    }
}

// =============================================================================
// Name filter
// =============================================================================

mod names {
    use super::*;

    #[test]
    fn test_filter_limits_notifications_not_totals() {
        let replay = ReplayBuilder::new(5, 5)
            .players(&["erdman v17", "djma v3"])
            .turn(&[
                unit(0, 0, 1, 0, Direction::East),
                unit(3, 3, 2, 0, Direction::West),
            ])
            .build()
            .unwrap();

        let options = LintOptions {
            names: NameFilter::parse("djma"),
            ..LintOptions::default()
        };
        let (stats, notes) = run(&replay, &options);

        // Both empty moves also fail to mine the empty neutral they land on.
        assert_eq!(notes.len(), 2);
        assert!(notes.iter().all(|n| n.owner_name == "djma v3"));
        assert_eq!(notes[0].kind, NotificationKind::ZeroStrengthMove);
        assert_eq!(notes[1].kind, NotificationKind::FailedMining);
        assert_eq!(stats.total_moves(1), 1);
        assert_eq!(stats.total_moves(2), 1);
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Distinct neighbors on any board at least 3 wide.
    #[test]
    fn prop_four_distinct_neighbors(data in arb_replay_data(9, 1, 2), x in 0usize..9, y in 0usize..9) {
        let replay = Replay::from_data(data).unwrap();
        let frame = replay.frame(0).unwrap();
        let cell = frame.grid.cell(x % replay.width(), y % replay.height());
        let neighbors: BTreeSet<_> = frame
            .grid
            .neighbors(cell, 1, false)
            .into_iter()
            .map(|c| (c.x, c.y))
            .collect();
        prop_assert_eq!(neighbors.len(), 4);
        for (nx, ny) in neighbors {
            prop_assert_eq!(frame.grid.distance(cell, frame.grid.cell(nx, ny)), 1);
        }
    }

    #[test]
    fn prop_distance_is_symmetric(data in arb_replay_data(9, 1, 2), a in 0usize..81, b in 0usize..81) {
        let replay = Replay::from_data(data).unwrap();
        let grid = replay.frame(0).unwrap().grid;
        let n = grid.width() * grid.height();
        let (ca, cb) = (grid.cell_at(a % n), grid.cell_at(b % n));
        prop_assert_eq!(grid.distance(ca, cb), grid.distance(cb, ca));
        prop_assert!(grid.distance(ca, cb) <= grid.width() / 2 + grid.height() / 2);
    }

    /// Every frame resolves under the cap, charges each placement at most
    /// once and keeps territory equal to the owned squares.
    #[test]
    fn prop_frame_reports_are_consistent(data in arb_replay_data(8, 4, 3)) {
        let replay = Replay::from_data(data).unwrap();
        for (report, frame) in reports(&replay).iter().zip(replay.frames()) {
            let frame = frame.unwrap();

            prop_assert!(report.placements.iter().all(|p| p.strength <= STRENGTH_CAP));

            let mut charged = BTreeSet::new();
            for event in &report.cap_loss {
                prop_assert!(event.amount > 0);
                prop_assert!(charged.insert((event.x, event.y, event.owner)));
            }

            prop_assert_eq!(
                report.tally.territory_total(),
                frame.grid.owned_cells().count() as u64
            );
            prop_assert!(report.overkill.iter().all(|o| o.amount > 0));
        }
    }

    #[test]
    fn prop_notifications_respect_switches(data in arb_replay_data(8, 4, 3)) {
        let replay = Replay::from_data(data).unwrap();
        let (_, notes) = run(&replay, &LintOptions::default());
        prop_assert!(notes.iter().all(|n| !matches!(
            n.kind,
            NotificationKind::Overkill
                | NotificationKind::FlipFlop
                | NotificationKind::StillBigCapLoss
                | NotificationKind::CapLossExProduction
        )));
    }

    #[test]
    fn prop_analysis_is_repeatable(data in arb_replay_data(8, 4, 3)) {
        let replay = Replay::from_data(data).unwrap();
        prop_assert_eq!(run(&replay, &all_shown()), run(&replay, &all_shown()));
    }
}
