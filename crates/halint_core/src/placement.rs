//! Per-frame placement aggregation.
//!
//! Every unit's strength is projected onto the square its move lands on and
//! summed per owner. The resulting [`PlacementTable`] is the raw "who lands
//! where with how much" table that cap-loss classification and combat
//! resolution read from.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::Cell;
use crate::replay::Frame;
use crate::PlayerId;

/// Strength an owner routes into one square this turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Placement {
    /// Target column.
    pub x: usize,
    /// Target row.
    pub y: usize,
    /// Owner of the incoming strength.
    pub owner: PlayerId,
    /// Aggregated strength.
    pub strength: u32,
}

impl Placement {
    /// Whether two placements are the same (square, owner) slot.
    #[must_use]
    pub const fn same_slot(&self, other: &Placement) -> bool {
        self.x == other.x && self.y == other.y && self.owner == other.owner
    }
}

/// Two-level `(square, owner) -> strength` table with a zero default.
///
/// Iteration follows arrival: squares in the order strength first landed
/// on them, and on each square owners in the order they arrived.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementTable {
    width: usize,
    height: usize,
    slots: Vec<Vec<(PlayerId, u32)>>,
    arrivals: Vec<usize>,
}

impl PlacementTable {
    /// Empty table for a `width x height` board.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            slots: vec![Vec::new(); width * height],
            arrivals: Vec::new(),
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        (y % self.height) * self.width + (x % self.width)
    }

    fn slot_mut(&mut self, idx: usize, owner: PlayerId) -> &mut u32 {
        if self.slots[idx].is_empty() {
            self.arrivals.push(idx);
        }
        let slot = &mut self.slots[idx];
        let pos = match slot.iter().position(|&(o, _)| o == owner) {
            Some(pos) => pos,
            None => {
                slot.push((owner, 0));
                slot.len() - 1
            }
        };
        &mut slot[pos].1
    }

    /// Add `strength` from `owner` into `target`.
    pub fn add(&mut self, target: &Cell, owner: PlayerId, strength: u32) {
        let idx = self.index(target.x, target.y);
        *self.slot_mut(idx, owner) += strength;
    }

    /// Overwrite the strength of an existing or new slot.
    pub fn set(&mut self, x: usize, y: usize, owner: PlayerId, strength: u32) {
        let idx = self.index(x, y);
        *self.slot_mut(idx, owner) = strength;
    }

    /// Strength `owner` routes into `(x, y)`, zero if none.
    #[must_use]
    pub fn get(&self, x: usize, y: usize, owner: PlayerId) -> u32 {
        self.slots[self.index(x, y)]
            .iter()
            .find(|&&(o, _)| o == owner)
            .map_or(0, |&(_, strength)| strength)
    }

    /// Placements landing on `(x, y)`, owners in arrival order.
    pub fn at(&self, x: usize, y: usize) -> impl Iterator<Item = Placement> + '_ {
        let (x, y) = (x % self.width, y % self.height);
        self.slots[self.index(x, y)]
            .iter()
            .map(move |&(owner, strength)| Placement {
                x,
                y,
                owner,
                strength,
            })
    }

    /// All placements in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = Placement> + '_ {
        let width = self.width;
        self.arrivals.iter().flat_map(move |&i| {
            self.slots[i].iter().map(move |&(owner, strength)| Placement {
                x: i % width,
                y: i / width,
                owner,
                strength,
            })
        })
    }

    /// Number of non-empty slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }

    /// Whether no strength was placed anywhere.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }

    /// Sum of every slot.
    #[must_use]
    pub fn total_strength(&self) -> u64 {
        self.iter().map(|p| u64::from(p.strength)).sum()
    }
}

/// Per-owner counters gathered during aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameTally {
    /// Units that moved (direction != Still), per owner.
    pub moves: BTreeMap<PlayerId, u32>,
    /// Squares held, per owner.
    pub territory: BTreeMap<PlayerId, u32>,
    /// Production forfeited at the source by moving units, per owner.
    pub movement_loss: BTreeMap<PlayerId, u64>,
}

impl FrameTally {
    /// Total squares held by all owners.
    #[must_use]
    pub fn territory_total(&self) -> u64 {
        self.territory.values().map(|&c| u64::from(c)).sum()
    }
}

/// Project every unit of `frame` onto its destination.
#[must_use]
pub fn aggregate(frame: &Frame) -> (PlacementTable, FrameTally) {
    let grid = &frame.grid;
    let mut table = PlacementTable::new(grid.width(), grid.height());
    let mut tally = FrameTally::default();

    for (cell, direction) in frame.units() {
        let target = grid.target(cell, direction);
        table.add(target, cell.owner, cell.strength);

        *tally.territory.entry(cell.owner).or_default() += 1;
        *tally.moves.entry(cell.owner).or_default() += u32::from(direction.is_move());
        if direction.is_move() {
            *tally.movement_loss.entry(cell.owner).or_default() += u64::from(cell.production);
        }
    }

    (table, tally)
}
