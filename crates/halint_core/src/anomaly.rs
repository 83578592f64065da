//! Anomaly detectors.
//!
//! Stateless checks run per unit or per placement; the flip-flop check
//! reads a two-frame [`MoveHistory`].

use std::collections::HashMap;

use crate::direction::Direction;
use crate::grid::Cell;
use crate::replay::Frame;
use crate::{PlayerId, STRENGTH_CAP};

/// A unit issued a move with no strength to carry.
#[must_use]
pub fn is_zero_strength_move(cell: &Cell, direction: Direction) -> bool {
    cell.strength == 0 && direction.is_move()
}

/// The resolved force against a neutral square could never capture it.
#[must_use]
pub fn is_failed_mining(target: &Cell, resolved: u32) -> bool {
    !target.is_owned() && resolved <= target.strength.min(STRENGTH_CAP - 1)
}

/// Moves of one frame keyed by `(x, y, owner)`.
pub type MoveMap = HashMap<(usize, usize, PlayerId), Direction>;

fn move_map(frame: &Frame) -> MoveMap {
    frame
        .units()
        .map(|(cell, dir)| ((cell.x, cell.y, cell.owner), dir))
        .collect()
}

/// Ring buffer of the last two frames' moves.
///
/// Pushing a frame evicts the oldest one.
#[derive(Debug, Clone, Default)]
pub struct MoveHistory {
    slots: [Option<MoveMap>; 2],
    newest: usize,
}

impl MoveHistory {
    /// Empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `frame` as the most recent turn.
    pub fn push(&mut self, frame: &Frame) {
        self.push_map(move_map(frame));
    }

    /// Record an explicit move map as the most recent turn.
    pub fn push_map(&mut self, moves: MoveMap) {
        self.newest = 1 - self.newest;
        self.slots[self.newest] = Some(moves);
    }

    /// Moves from turn T-1.
    #[must_use]
    pub fn previous(&self) -> Option<&MoveMap> {
        self.slots[self.newest].as_ref()
    }

    /// Moves from turn T-2.
    #[must_use]
    pub fn before_previous(&self) -> Option<&MoveMap> {
        self.slots[1 - self.newest].as_ref()
    }

    /// Whether both slots are filled.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Flip-flop check for the unit on `cell` moving `direction` onto
    /// `target` this turn.
    ///
    /// Flags when, at T-1, the owner's unit on `target` moved back onto
    /// `cell`, and at T-2 the owner's unit on `cell` made this same move.
    #[must_use]
    pub fn is_flip_flop(&self, cell: &Cell, direction: Direction, target: &Cell) -> bool {
        let (Some(prev), Some(prev2)) = (self.previous(), self.before_previous()) else {
            return false;
        };
        if !direction.is_move() {
            return false;
        }
        prev.get(&(target.x, target.y, cell.owner)) == Some(&direction.opposite())
            && prev2.get(&(cell.x, cell.y, cell.owner)) == Some(&direction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(x: usize, y: usize, owner: PlayerId, strength: u32) -> Cell {
        Cell {
            x,
            y,
            owner,
            strength,
            production: 1,
        }
    }

    fn moves(entries: &[((usize, usize, PlayerId), Direction)]) -> MoveMap {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_zero_strength_move() {
        assert!(is_zero_strength_move(&cell(0, 0, 1, 0), Direction::North));
        assert!(!is_zero_strength_move(&cell(0, 0, 1, 0), Direction::Still));
        assert!(!is_zero_strength_move(&cell(0, 0, 1, 1), Direction::North));
    }

    #[test]
    fn test_failed_mining() {
        assert!(is_failed_mining(&cell(0, 0, 0, 50), 50));
        assert!(is_failed_mining(&cell(0, 0, 0, 50), 10));
        assert!(!is_failed_mining(&cell(0, 0, 0, 50), 51));
        assert!(!is_failed_mining(&cell(0, 0, 2, 50), 10));
        // A full-strength neutral can still be taken by a full-strength attack.
        assert!(!is_failed_mining(&cell(0, 0, 0, 255), 255));
        assert!(is_failed_mining(&cell(0, 0, 0, 255), 254));
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut history = MoveHistory::new();
        assert!(history.previous().is_none());

        history.push_map(moves(&[((0, 0, 1), Direction::North)]));
        assert!(!history.is_full());
        history.push_map(moves(&[((0, 0, 1), Direction::East)]));
        assert!(history.is_full());
        history.push_map(moves(&[((0, 0, 1), Direction::South)]));

        assert_eq!(history.previous().unwrap()[&(0, 0, 1)], Direction::South);
        assert_eq!(history.before_previous().unwrap()[&(0, 0, 1)], Direction::East);
    }

    #[test]
    fn test_flip_flop_detected() {
        let mut history = MoveHistory::new();
        history.push_map(moves(&[((0, 0, 1), Direction::East)])); // T-2
        history.push_map(moves(&[((1, 0, 1), Direction::West)])); // T-1

        let here = cell(0, 0, 1, 10);
        let there = cell(1, 0, 1, 10);
        assert!(history.is_flip_flop(&here, Direction::East, &there));
    }

    #[test]
    fn test_flip_flop_requires_same_owner() {
        let mut history = MoveHistory::new();
        history.push_map(moves(&[((0, 0, 1), Direction::East)]));
        history.push_map(moves(&[((1, 0, 2), Direction::West)]));

        assert!(!history.is_flip_flop(&cell(0, 0, 1, 10), Direction::East, &cell(1, 0, 2, 10)));
    }

    #[test]
    fn test_flip_flop_needs_two_frames() {
        let mut history = MoveHistory::new();
        history.push_map(moves(&[((1, 0, 1), Direction::West)]));
        assert!(!history.is_flip_flop(&cell(0, 0, 1, 10), Direction::East, &cell(1, 0, 1, 10)));
    }

    #[test]
    fn test_still_is_never_flip_flop() {
        let mut history = MoveHistory::new();
        history.push_map(moves(&[((0, 0, 1), Direction::Still)]));
        history.push_map(moves(&[((0, 0, 1), Direction::Still)]));
        let c = cell(0, 0, 1, 10);
        assert!(!history.is_flip_flop(&c, Direction::Still, &c));
    }
}
