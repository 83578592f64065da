//! Match-scoped accumulators.
//!
//! [`LintStats`] only sums what the pipeline hands it; it makes no
//! decisions. One instance lives for one match analysis.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::caploss::CapLossKind;
use crate::math::{self, Fixed};
use crate::placement::FrameTally;
use crate::PlayerId;

/// Number of segments the game is split into for move efficiency.
pub const EFFICIENCY_SEGMENTS: usize = 5;

/// Cap-loss categories caused by exceeding the strength ceiling.
pub const OVERFLOW_KINDS: [CapLossKind; 3] = [
    CapLossKind::Standard,
    CapLossKind::MergeExProduction,
    CapLossKind::StillBig,
];

/// Cap loss per category, each row indexed by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapLossTable {
    /// Merge overflow.
    pub standard: Vec<u64>,
    /// Production overflow with merging strength.
    pub merge_ex_production: Vec<u64>,
    /// Production overflow on a stationary square.
    pub still_big: Vec<u64>,
    /// Production forfeited by moving.
    pub movement: Vec<u64>,
}

impl CapLossTable {
    fn with_owners(owners: usize) -> Self {
        Self {
            standard: vec![0; owners],
            merge_ex_production: vec![0; owners],
            still_big: vec![0; owners],
            movement: vec![0; owners],
        }
    }

    /// Row for one category.
    #[must_use]
    pub fn row(&self, kind: CapLossKind) -> &[u64] {
        match kind {
            CapLossKind::Standard => &self.standard,
            CapLossKind::MergeExProduction => &self.merge_ex_production,
            CapLossKind::StillBig => &self.still_big,
            CapLossKind::Movement => &self.movement,
        }
    }

    fn row_mut(&mut self, kind: CapLossKind) -> &mut Vec<u64> {
        match kind {
            CapLossKind::Standard => &mut self.standard,
            CapLossKind::MergeExProduction => &mut self.merge_ex_production,
            CapLossKind::StillBig => &mut self.still_big,
            CapLossKind::Movement => &mut self.movement,
        }
    }
}

/// Running totals for one match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LintStats {
    /// Player names, 1-indexed; entry 0 is the no-owner name.
    pub player_names: Vec<String>,
    /// Cap loss by category and owner.
    pub cap_loss: CapLossTable,
    /// Units moved per frame, per owner. One entry per frame the owner held territory.
    pub move_counts: BTreeMap<PlayerId, Vec<u32>>,
    /// Squares held per frame, per owner. Same length as the move series.
    pub territory_counts: BTreeMap<PlayerId, Vec<u32>>,
    /// Overkill keyed attacker owner, then defender owner.
    pub overkill: BTreeMap<PlayerId, BTreeMap<PlayerId, u64>>,
    /// Flip-flop moves per owner.
    pub flip_flops: Vec<u64>,
    /// Frames folded into these totals.
    pub frames_analyzed: usize,
}

impl LintStats {
    /// Empty totals for the given 1-indexed name list.
    #[must_use]
    pub fn new(player_names: Vec<String>) -> Self {
        let owners = player_names.len();
        Self {
            player_names,
            cap_loss: CapLossTable::with_owners(owners),
            flip_flops: vec![0; owners],
            ..Default::default()
        }
    }

    /// Players (excluding the no-owner slot) with their ids.
    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &str)> + '_ {
        self.player_names
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, name)| (i as PlayerId, name.as_str()))
    }

    /// Add cap loss.
    pub fn record_cap_loss(&mut self, kind: CapLossKind, owner: PlayerId, amount: u32) {
        bump(self.cap_loss.row_mut(kind), owner, u64::from(amount));
    }

    /// Fold one frame's aggregation counters in.
    pub fn record_tally(&mut self, tally: &FrameTally) {
        for (&owner, &count) in &tally.territory {
            self.territory_counts.entry(owner).or_default().push(count);
        }
        for (&owner, &count) in &tally.moves {
            self.move_counts.entry(owner).or_default().push(count);
        }
        for (&owner, &amount) in &tally.movement_loss {
            bump(&mut self.cap_loss.movement, owner, amount);
        }
        self.frames_analyzed += 1;
    }

    /// Add overkill from `attacker` against `defender`.
    pub fn record_overkill(&mut self, attacker: PlayerId, defender: PlayerId, amount: u32) {
        *self
            .overkill
            .entry(attacker)
            .or_default()
            .entry(defender)
            .or_default() += u64::from(amount);
    }

    /// Count one flip-flop.
    pub fn record_flip_flop(&mut self, owner: PlayerId) {
        bump(&mut self.flip_flops, owner, 1);
    }

    /// Cap loss of one category for one owner.
    #[must_use]
    pub fn cap_loss(&self, kind: CapLossKind, owner: PlayerId) -> u64 {
        self.cap_loss
            .row(kind)
            .get(usize::from(owner))
            .copied()
            .unwrap_or(0)
    }

    /// Cap loss of one category over all owners.
    #[must_use]
    pub fn cap_loss_total(&self, kind: CapLossKind) -> u64 {
        self.cap_loss.row(kind).iter().sum()
    }

    /// Merge and production cap loss for one owner; movement excluded.
    #[must_use]
    pub fn overflow_loss(&self, owner: PlayerId) -> u64 {
        OVERFLOW_KINDS
            .into_iter()
            .map(|kind| self.cap_loss(kind, owner))
            .sum()
    }

    /// Merge and production cap loss over all owners; movement excluded.
    #[must_use]
    pub fn overflow_loss_total(&self) -> u64 {
        OVERFLOW_KINDS
            .into_iter()
            .map(|kind| self.cap_loss_total(kind))
            .sum()
    }

    /// Moves made by an owner over the whole match.
    #[must_use]
    pub fn total_moves(&self, owner: PlayerId) -> u64 {
        self.move_counts
            .get(&owner)
            .map_or(0, |series| series.iter().map(|&c| u64::from(c)).sum())
    }

    /// Production forfeited per move, `None` if the owner never moved.
    #[must_use]
    pub fn production_cost_per_move(&self, owner: PlayerId) -> Option<Fixed> {
        math::ratio(
            self.cap_loss(CapLossKind::Movement, owner),
            self.total_moves(owner),
        )
    }

    /// Length of one efficiency segment: a fifth of the longest series.
    #[must_use]
    pub fn segment_length(&self) -> usize {
        self.territory_counts
            .values()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
            / EFFICIENCY_SEGMENTS
    }

    /// Moves per held square for each fifth of the owner's series.
    #[must_use]
    pub fn move_efficiency(&self, owner: PlayerId) -> [Fixed; EFFICIENCY_SEGMENTS] {
        let len = self.segment_length();
        let empty = Vec::new();
        let moves = self.move_counts.get(&owner).unwrap_or(&empty);
        let territory = self.territory_counts.get(&owner).unwrap_or(&empty);

        std::array::from_fn(|n| {
            let range = n * len..(n + 1) * len;
            math::move_efficiency(segment_sum(moves, range.clone()), segment_sum(territory, range))
        })
    }

    /// Overkill from `attacker` against `defender`.
    #[must_use]
    pub fn overkill(&self, attacker: PlayerId, defender: PlayerId) -> u64 {
        self.overkill
            .get(&attacker)
            .and_then(|row| row.get(&defender))
            .copied()
            .unwrap_or(0)
    }

    /// Overkill committed by `attacker` against anyone.
    #[must_use]
    pub fn overkill_from(&self, attacker: PlayerId) -> u64 {
        self.overkill
            .get(&attacker)
            .map_or(0, |row| row.values().sum())
    }

    /// Overkill suffered by `defender` from anyone.
    #[must_use]
    pub fn overkill_against(&self, defender: PlayerId) -> u64 {
        self.overkill
            .values()
            .filter_map(|row| row.get(&defender))
            .sum()
    }

    /// All overkill in the match.
    #[must_use]
    pub fn overkill_total(&self) -> u64 {
        self.overkill.values().flat_map(BTreeMap::values).sum()
    }

    /// Flip-flops by one owner.
    #[must_use]
    pub fn flip_flops(&self, owner: PlayerId) -> u64 {
        self.flip_flops
            .get(usize::from(owner))
            .copied()
            .unwrap_or(0)
    }
}

fn bump(row: &mut Vec<u64>, owner: PlayerId, amount: u64) {
    let idx = usize::from(owner);
    if row.len() <= idx {
        row.resize(idx + 1, 0);
    }
    row[idx] += amount;
}

fn segment_sum(series: &[u32], range: std::ops::Range<usize>) -> u64 {
    let end = range.end.min(series.len());
    let start = range.start.min(end);
    series[start..end].iter().map(|&c| u64::from(c)).sum()
}
