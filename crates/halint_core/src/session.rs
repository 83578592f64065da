//! The per-frame analysis pipeline.
//!
//! [`LintSession`] owns everything carried from one frame to the next: the
//! accumulators and the two-frame move history. Each call to
//! [`LintSession::analyze_frame`] runs the fixed stage order
//!
//! 1. placement aggregation (plus per-unit anomaly checks),
//! 2. cap-loss classification,
//! 3. interaction sets, failed mining and overkill,
//!
//! and then rotates the move history. Frames must be fed in turn order.

use tracing::{debug, info};

use crate::anomaly::{self, MoveHistory};
use crate::caploss::{self, CapLossEvent, OverflowKind};
use crate::combat::{self, Interactions, OverkillEvent};
use crate::error::{LintError, Result};
use crate::grid::Cell;
use crate::notify::{LintOptions, NotificationKind, NotificationSink, Notifier};
use crate::placement::{self, FrameTally, Placement, PlacementTable};
use crate::replay::{Frame, Replay};
use crate::stats::LintStats;

/// Everything detected in one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame index.
    pub frame: usize,
    /// Aggregation counters.
    pub tally: FrameTally,
    /// Placements after cap-loss resolution.
    pub placements: PlacementTable,
    /// Units that moved with zero strength, row-major.
    pub zero_strength_moves: Vec<Cell>,
    /// Units whose move completed a flip-flop, row-major.
    pub flip_flops: Vec<Cell>,
    /// Overflows in placement order.
    pub cap_loss: Vec<CapLossEvent>,
    /// Placements that could not capture their neutral target.
    pub failed_mining: Vec<Placement>,
    /// Redundant attacks.
    pub overkill: Vec<OverkillEvent>,
}

/// Analysis state for one match.
#[derive(Debug, Clone, Default)]
pub struct LintSession {
    stats: LintStats,
    history: MoveHistory,
}

impl LintSession {
    /// Fresh session for the given 1-indexed player names.
    #[must_use]
    pub fn new(player_names: Vec<String>) -> Self {
        Self {
            stats: LintStats::new(player_names),
            history: MoveHistory::new(),
        }
    }

    /// Fresh session sized for `replay`.
    #[must_use]
    pub fn for_replay(replay: &Replay) -> Self {
        Self::new(replay.names().to_vec())
    }

    /// Totals so far.
    #[must_use]
    pub const fn stats(&self) -> &LintStats {
        &self.stats
    }

    /// End the session and hand back the totals.
    #[must_use]
    pub fn finish(self) -> LintStats {
        self.stats
    }

    /// Run every stage on `frame` and fold the results into the totals.
    ///
    /// # Errors
    /// Returns [`LintError::InvariantViolated`] if aggregation lost or
    /// invented strength or territory.
    pub fn analyze_frame(&mut self, frame: &Frame, notifier: &mut Notifier<'_>) -> Result<FrameReport> {
        let grid = &frame.grid;
        let (mut table, tally) = placement::aggregate(frame);
        check_conservation(frame, &table, &tally)?;

        let mut zero_strength_moves = Vec::new();
        let mut flip_flops = Vec::new();
        for (cell, direction) in frame.units() {
            if anomaly::is_zero_strength_move(cell, direction) {
                zero_strength_moves.push(*cell);
                notifier.emit(
                    NotificationKind::ZeroStrengthMove,
                    frame.index,
                    cell.owner,
                    cell.x,
                    cell.y,
                    None,
                );
            }
            let target = grid.target(cell, direction);
            if self.history.is_flip_flop(cell, direction, target) {
                flip_flops.push(*cell);
                self.stats.record_flip_flop(cell.owner);
                notifier.emit(
                    NotificationKind::FlipFlop,
                    frame.index,
                    cell.owner,
                    cell.x,
                    cell.y,
                    None,
                );
            }
        }
        self.stats.record_tally(&tally);

        let cap_loss = caploss::resolve(frame, &mut table);
        for event in &cap_loss {
            self.stats.record_cap_loss(event.kind.into(), event.owner, event.amount);
            let kind = match event.kind {
                OverflowKind::Standard => NotificationKind::CapLoss,
                OverflowKind::MergeExProduction => NotificationKind::CapLossExProduction,
                OverflowKind::StillBig => NotificationKind::StillBigCapLoss,
            };
            notifier.emit(kind, frame.index, event.owner, event.x, event.y, Some(event.amount));
        }

        let interactions = Interactions::build(grid, &table);
        let mut failed_mining = Vec::new();
        let mut overkill = Vec::new();
        for p in table.iter() {
            let target = grid.cell(p.x, p.y);
            if anomaly::is_failed_mining(target, p.strength) {
                failed_mining.push(p);
                notifier.emit(NotificationKind::FailedMining, frame.index, p.owner, p.x, p.y, None);
            }

            for event in combat::overkill_for(&p, &interactions) {
                self.stats
                    .record_overkill(event.attacker.owner, event.defender_owner, event.amount);
                notifier.emit(
                    NotificationKind::Overkill,
                    frame.index,
                    event.defender_owner,
                    p.x,
                    p.y,
                    Some(event.amount),
                );
                overkill.push(event);
            }
        }

        self.history.push(frame);

        debug!(
            frame = frame.index,
            placements = table.len(),
            cap_loss_events = cap_loss.len(),
            overkill_events = overkill.len(),
            flip_flops = flip_flops.len(),
            "Frame analyzed"
        );

        Ok(FrameReport {
            frame: frame.index,
            tally,
            placements: table,
            zero_strength_moves,
            flip_flops,
            cap_loss,
            failed_mining,
            overkill,
        })
    }
}

fn check_conservation(frame: &Frame, table: &PlacementTable, tally: &FrameTally) -> Result<()> {
    let owned = frame.grid.owned_cells().count() as u64;
    if tally.territory_total() != owned {
        return Err(LintError::InvariantViolated {
            frame: frame.index,
            message: format!(
                "territory tally {} != {owned} owned squares",
                tally.territory_total()
            ),
        });
    }

    let strength: u64 = frame
        .grid
        .owned_cells()
        .map(|c| u64::from(c.strength))
        .sum();
    if table.total_strength() != strength {
        return Err(LintError::InvariantViolated {
            frame: frame.index,
            message: format!(
                "placed strength {} != {strength} strength on the board",
                table.total_strength()
            ),
        });
    }
    Ok(())
}

/// Analyze a whole replay in turn order.
///
/// Notifications permitted by `options` go to `sink` as they are found.
///
/// # Errors
/// Returns the first frame error; no partial totals are returned.
pub fn analyze_replay(
    replay: &Replay,
    options: &LintOptions,
    sink: &mut dyn NotificationSink,
) -> Result<LintStats> {
    let mut session = LintSession::for_replay(replay);
    let mut notifier = Notifier::new(options, replay.names(), sink);

    for frame in replay.frames() {
        session.analyze_frame(&frame?, &mut notifier)?;
    }

    let stats = session.finish();
    info!(
        width = replay.width(),
        height = replay.height(),
        players = replay.player_count(),
        starting_players = replay.starting_player_count(),
        frames = stats.frames_analyzed,
        notifications = notifier.emitted(),
        overflow_loss = stats.overflow_loss_total(),
        overkill = stats.overkill_total(),
        "Replay analyzed"
    );
    Ok(stats)
}
