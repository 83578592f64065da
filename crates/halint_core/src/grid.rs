//! Toroidal grid of cells.
//!
//! Every coordinate maps to exactly one [`Cell`]; all lookups wrap modulo
//! the grid dimensions, so out-of-range coordinates cannot occur.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{LintError, Result};
use crate::{PlayerId, NEUTRAL};

/// Snapshot of one square at one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Owning player, [`NEUTRAL`] if unowned.
    pub owner: PlayerId,
    /// Strength on the square.
    pub strength: u32,
    /// Static production of the square.
    pub production: u32,
}

impl Cell {
    /// Whether a player holds this square.
    #[must_use]
    pub const fn is_owned(&self) -> bool {
        self.owner != NEUTRAL
    }
}

/// The board for a single turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl Grid {
    /// Build a grid from row-major cells.
    ///
    /// # Errors
    /// Returns an error if either dimension is zero, if the cell count does
    /// not equal `width * height`, or if a cell's coordinates disagree with
    /// its position.
    pub fn new(width: usize, height: usize, cells: Vec<Cell>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(LintError::InvalidReplay(format!(
                "grid must be non-empty, got {width}x{height}"
            )));
        }
        if cells.len() != width * height {
            return Err(LintError::DimensionMismatch {
                what: "grid cells".to_string(),
                expected: width * height,
                actual: cells.len(),
            });
        }
        if let Some((i, cell)) = cells
            .iter()
            .enumerate()
            .find(|(i, c)| c.x != i % width || c.y != i / width)
        {
            return Err(LintError::InvalidReplay(format!(
                "cell #{i} claims ({},{}) but sits at ({},{})",
                cell.x,
                cell.y,
                i % width,
                i / width
            )));
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Grid width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.width
    }

    /// Grid height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.height
    }

    /// Row-major index of a (wrapped) coordinate.
    #[must_use]
    pub fn index(&self, x: usize, y: usize) -> usize {
        (y % self.height) * self.width + (x % self.width)
    }

    /// Cell at a (wrapped) coordinate.
    #[must_use]
    pub fn cell(&self, x: usize, y: usize) -> &Cell {
        &self.cells[self.index(x, y)]
    }

    /// Cell at a row-major index.
    #[must_use]
    pub fn cell_at(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// Iterate all cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter()
    }

    /// Iterate owned cells in row-major order.
    pub fn owned_cells(&self) -> impl Iterator<Item = &Cell> + '_ {
        self.cells.iter().filter(|c| c.is_owned())
    }

    /// Number of distinct non-neutral owners on the board.
    #[must_use]
    pub fn player_count(&self) -> usize {
        let mut seen = [false; 256];
        for cell in self.owned_cells() {
            seen[usize::from(cell.owner)] = true;
        }
        seen.iter().filter(|s| **s).count()
    }

    fn offset(&self, cell: &Cell, dx: isize, dy: isize) -> &Cell {
        let x = wrap(cell.x, dx, self.width);
        let y = wrap(cell.y, dy, self.height);
        &self.cells[y * self.width + x]
    }

    /// The one-step neighbor in `direction`. `Still` returns the cell itself.
    #[must_use]
    pub fn target(&self, cell: &Cell, direction: Direction) -> &Cell {
        let (dx, dy) = direction.offset();
        self.offset(cell, dx, dy)
    }

    /// Neighbors of `cell` within Manhattan distance `n`.
    ///
    /// For `n == 1` the order is North, East, South, West and then the cell
    /// itself when `include_self` is set, so the position in the result is
    /// the [`Direction`] index. For larger `n` the offsets are visited
    /// row by row (`dy` outer, `dx` inner).
    ///
    /// # Panics
    /// Panics if `n == 0`.
    #[must_use]
    pub fn neighbors(&self, cell: &Cell, n: usize, include_self: bool) -> Vec<&Cell> {
        assert!(n > 0, "neighbor distance must be positive");
        if n == 1 {
            return Direction::ALL
                .iter()
                .filter(|d| include_self || d.is_move())
                .map(|d| self.target(cell, *d))
                .collect();
        }
        let n = n as isize;
        let mut out = Vec::new();
        for dy in -n..=n {
            for dx in -n..=n {
                if dx.abs() + dy.abs() > n {
                    continue;
                }
                if dx == 0 && dy == 0 && !include_self {
                    continue;
                }
                out.push(self.offset(cell, dx, dy));
            }
        }
        out
    }

    /// Toroidal Manhattan distance between two cells.
    #[must_use]
    pub fn distance(&self, a: &Cell, b: &Cell) -> usize {
        axis_distance(a.x, b.x, self.width) + axis_distance(a.y, b.y, self.height)
    }
}

fn wrap(v: usize, delta: isize, dim: usize) -> usize {
    (v as isize + delta).rem_euclid(dim as isize) as usize
}

fn axis_distance(a: usize, b: usize, dim: usize) -> usize {
    let direct = a.abs_diff(b);
    direct.min(dim - direct)
}
