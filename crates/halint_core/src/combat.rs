//! Interaction sets and the overkill heuristic.
//!
//! Halite resolves combat by adjacency: strength on a square damages every
//! rival on the same square or one of its four orthogonal neighbors. For a
//! resolved placement P the *interaction set* is exactly those rival
//! placements.
//!
//! Overkill is computed per attacker P and defender D in P's set:
//!
//! ```text
//! other_damage = Σ min(D, Q)   for Q in interactions(D), Q != P
//! contribution = min(max(0, D - other_damage), P)
//! ```
//!
//! Contributions are summed per defender owner; whatever exceeds P's own
//! strength is overkill for `(P.owner, defender owner)`. This is a bound on
//! redundant offense, not a replay of the engine's resolution order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::placement::{Placement, PlacementTable};
use crate::PlayerId;

type SlotKey = (usize, usize, PlayerId);

fn key(p: &Placement) -> SlotKey {
    (p.y, p.x, p.owner)
}

/// Interaction sets for every placement of a frame.
#[derive(Debug, Clone, Default)]
pub struct Interactions {
    sets: BTreeMap<SlotKey, Vec<Placement>>,
}

impl Interactions {
    /// Build the interaction set of every placement in `table`.
    #[must_use]
    pub fn build(grid: &Grid, table: &PlacementTable) -> Self {
        let sets = table
            .iter()
            .map(|p| (key(&p), interaction_set(grid, table, &p)))
            .collect();
        Self { sets }
    }

    /// Rivals of `placement`; empty if it is not in the table.
    #[must_use]
    pub fn of(&self, placement: &Placement) -> &[Placement] {
        self.sets
            .get(&key(placement))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Rival placements at `placement`'s square or its orthogonal neighbors.
///
/// Neighbors are visited North, East, South, West, then the square itself.
/// On boards narrower than three squares a neighbor can repeat; it is then
/// counted once per adjacency, like the engine does.
#[must_use]
pub fn interaction_set(grid: &Grid, table: &PlacementTable, placement: &Placement) -> Vec<Placement> {
    let center = grid.cell(placement.x, placement.y);
    grid.neighbors(center, 1, true)
        .into_iter()
        .flat_map(|n| table.at(n.x, n.y))
        .filter(|q| q.owner != placement.owner)
        .collect()
}

/// Damage `attacker` is credited against each defender owner, owners in
/// the order they are first met in the interaction set.
#[must_use]
pub fn damage_by_defender(attacker: &Placement, interactions: &Interactions) -> Vec<(PlayerId, u32)> {
    let mut damage: Vec<(PlayerId, u32)> = Vec::new();
    for defender in interactions.of(attacker) {
        let other_damage: u32 = interactions
            .of(defender)
            .iter()
            .filter(|q| !q.same_slot(attacker))
            .map(|q| defender.strength.min(q.strength))
            .sum();
        let contribution = defender
            .strength
            .saturating_sub(other_damage)
            .min(attacker.strength);
        match damage.iter_mut().find(|(owner, _)| *owner == defender.owner) {
            Some((_, total)) => *total += contribution,
            None => damage.push((defender.owner, contribution)),
        }
    }
    damage
}

/// Redundant attack strength of one placement against one owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverkillEvent {
    /// The attacking placement.
    pub attacker: Placement,
    /// Owner of the defenders.
    pub defender_owner: PlayerId,
    /// Damage beyond the attacker's own strength.
    pub amount: u32,
}

/// Overkill of a single attacker, defender owners in first-met order.
#[must_use]
pub fn overkill_for(attacker: &Placement, interactions: &Interactions) -> Vec<OverkillEvent> {
    damage_by_defender(attacker, interactions)
        .into_iter()
        .filter(|&(_, damage)| damage > attacker.strength)
        .map(|(defender_owner, damage)| OverkillEvent {
            attacker: *attacker,
            defender_owner,
            amount: damage - attacker.strength,
        })
        .collect()
}
