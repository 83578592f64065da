//! The five canonical moves.
//!
//! Replays store moves 1-shifted (`0` means "no data" and decodes to
//! [`Direction::Still`]). Decoding goes through an exhaustive table; codes
//! outside `0..=4` are rejected rather than wrapped.

use serde::{Deserialize, Serialize};

/// A unit's move for one turn.
///
/// The discriminant order matches the neighbor enumeration order of
/// [`crate::grid::Grid::neighbors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Direction {
    /// Up (y - 1).
    North,
    /// Right (x + 1).
    East,
    /// Down (y + 1).
    South,
    /// Left (x - 1).
    West,
    /// Stay in place.
    #[default]
    Still,
}

impl Direction {
    /// All directions in enumeration order.
    pub const ALL: [Direction; 5] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
        Direction::Still,
    ];

    /// The four cardinal directions in enumeration order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    /// Decode a raw replay move code, `(code - 1) mod 5`.
    ///
    /// Returns `None` for codes outside `0..=4`.
    #[must_use]
    pub const fn from_raw_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Direction::Still),
            1 => Some(Direction::North),
            2 => Some(Direction::East),
            3 => Some(Direction::South),
            4 => Some(Direction::West),
            _ => None,
        }
    }

    /// Encode back to the replay's raw move code.
    #[must_use]
    pub const fn to_raw_code(self) -> u8 {
        match self {
            Direction::Still => 0,
            Direction::North => 1,
            Direction::East => 2,
            Direction::South => 3,
            Direction::West => 4,
        }
    }

    /// Grid offset `(dx, dy)` for one step.
    #[must_use]
    pub const fn offset(self) -> (isize, isize) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
            Direction::Still => (0, 0),
        }
    }

    /// The opposing cardinal direction. `Still` stays `Still`.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
            Direction::Still => Direction::Still,
        }
    }

    /// Whether this direction moves the unit.
    #[must_use]
    pub const fn is_move(self) -> bool {
        !matches!(self, Direction::Still)
    }
}
