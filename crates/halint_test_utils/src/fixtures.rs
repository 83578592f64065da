//! Test fixtures and helpers.
//!
//! [`ReplayBuilder`] assembles replays turn by turn from a handful of
//! units, so tests can describe a scenario without writing the raw
//! `[turn][y][x]` arrays by hand.

use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use halint_core::direction::Direction;
use halint_core::error::Result;
use halint_core::replay::{Replay, ReplayData};
use halint_core::PlayerId;

/// A square's content for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unit {
    /// Column.
    pub x: usize,
    /// Row.
    pub y: usize,
    /// Owner, `0` for a neutral square.
    pub owner: PlayerId,
    /// Strength.
    pub strength: u32,
    /// Move issued this turn.
    pub direction: Direction,
}

/// An owned unit.
#[must_use]
pub const fn unit(x: usize, y: usize, owner: PlayerId, strength: u32, direction: Direction) -> Unit {
    Unit {
        x,
        y,
        owner,
        strength,
        direction,
    }
}

/// A neutral square with some strength on it.
#[must_use]
pub const fn neutral(x: usize, y: usize, strength: u32) -> Unit {
    unit(x, y, 0, strength, Direction::Still)
}

/// Builds [`ReplayData`] turn by turn. Unlisted squares are neutral and empty.
#[derive(Debug, Clone)]
pub struct ReplayBuilder {
    width: usize,
    height: usize,
    productions: Vec<Vec<u32>>,
    names: Vec<String>,
    frames: Vec<Vec<Vec<(PlayerId, u32)>>>,
    moves: Vec<Vec<Vec<u8>>>,
}

impl ReplayBuilder {
    /// Empty `width x height` replay with zero production and two players.
    #[must_use]
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            productions: vec![vec![0; width]; height],
            names: vec!["alpha".to_string(), "beta".to_string()],
            frames: Vec::new(),
            moves: Vec::new(),
        }
    }

    /// Same production on every square.
    #[must_use]
    pub fn production(mut self, production: u32) -> Self {
        self.productions = vec![vec![production; self.width]; self.height];
        self
    }

    /// Production of one square.
    #[must_use]
    pub fn production_at(mut self, x: usize, y: usize, production: u32) -> Self {
        self.productions[y][x] = production;
        self
    }

    /// Player names, in owner order starting at owner 1.
    #[must_use]
    pub fn players(mut self, names: &[&str]) -> Self {
        self.names = names.iter().map(|n| (*n).to_string()).collect();
        self
    }

    fn grids(&self, units: &[Unit]) -> (Vec<Vec<(PlayerId, u32)>>, Vec<Vec<u8>>) {
        let mut frame = vec![vec![(0, 0); self.width]; self.height];
        let mut moves = vec![vec![0; self.width]; self.height];
        for u in units {
            frame[u.y][u.x] = (u.owner, u.strength);
            moves[u.y][u.x] = u.direction.to_raw_code();
        }
        (frame, moves)
    }

    /// Append a turn: board state plus the moves issued from it.
    #[must_use]
    pub fn turn(mut self, units: &[Unit]) -> Self {
        let (frame, moves) = self.grids(units);
        self.frames.push(frame);
        self.moves.push(moves);
        self
    }

    /// Append the closing board state, which carries no moves.
    #[must_use]
    pub fn final_frame(mut self, units: &[Unit]) -> Self {
        let (frame, _) = self.grids(units);
        self.frames.push(frame);
        self
    }

    /// The raw data built so far.
    #[must_use]
    pub fn data(&self) -> ReplayData {
        ReplayData {
            width: self.width,
            height: self.height,
            productions: self.productions.clone(),
            frames: self.frames.clone(),
            moves: self.moves.clone(),
            player_names: self.names.clone(),
        }
    }

    /// Validate into a [`Replay`].
    pub fn build(&self) -> Result<Replay> {
        Replay::from_data(self.data())
    }
}

/// A `width x height` replay where every player holds a block of squares
/// and sweeps them across the board for `turns` turns.
///
/// Produces a realistic mix of merges, collisions and cap loss; used by
/// benches and determinism tests.
#[must_use]
pub fn skirmish(width: usize, height: usize, turns: usize) -> ReplayData {
    let mut builder = ReplayBuilder::new(width, height).players(&["alpha", "beta", "gamma"]);
    builder.productions = (0..height)
        .map(|y| (0..width).map(|x| ((x * 7 + y * 3) % 11) as u32 + 1).collect())
        .collect();

    for t in 0..turns {
        let mut units = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let owner = ((x + t) / 3 + y / 3) % 4;
                let strength = ((x * 31 + y * 17 + t * 13) % 256) as u32;
                let direction = Direction::ALL[(x + y * 2 + t) % 5];
                if owner == 0 {
                    units.push(neutral(x, y, strength / 4));
                } else {
                    units.push(unit(x, y, owner as PlayerId, strength, direction));
                }
            }
        }
        builder = builder.turn(&units);
    }
    builder.data()
}

/// Write a replay as plain JSON.
pub fn write_json(data: &ReplayData, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_vec(data).map_err(std::io::Error::other)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

/// Write a replay as gzip-compressed JSON.
pub fn write_gzip(data: &ReplayData, dir: &Path, name: &str) -> std::io::Result<PathBuf> {
    let path = dir.join(name);
    let json = serde_json::to_vec(data).map_err(std::io::Error::other)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    std::fs::write(&path, encoder.finish()?)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_places_units() {
        let replay = ReplayBuilder::new(3, 2)
            .production(4)
            .turn(&[unit(1, 1, 2, 40, Direction::West), neutral(0, 0, 9)])
            .build()
            .unwrap();

        let frame = replay.frame(0).unwrap();
        let cell = frame.grid.cell(1, 1);
        assert_eq!((cell.owner, cell.strength, cell.production), (2, 40, 4));
        assert_eq!(frame.direction(cell), Direction::West);
        assert_eq!(frame.grid.cell(0, 0).strength, 9);
    }

    #[test]
    fn test_final_frame_has_no_moves() {
        let replay = ReplayBuilder::new(2, 2)
            .turn(&[unit(0, 0, 1, 1, Direction::Still)])
            .final_frame(&[unit(0, 0, 1, 2, Direction::Still)])
            .build()
            .unwrap();
        assert_eq!(replay.turn_count(), 1);
    }

    #[test]
    fn test_skirmish_is_valid() {
        let replay = Replay::from_data(skirmish(12, 9, 6)).unwrap();
        assert_eq!(replay.turn_count(), 6);
        assert_eq!(replay.player_count(), 3);
        assert_eq!(replay.starting_player_count(), 3);
    }

    #[test]
    fn test_writers_roundtrip_through_loader() {
        let dir = tempfile::tempdir().unwrap();
        let data = skirmish(6, 6, 3);

        let plain = write_json(&data, dir.path(), "plain.hlt").unwrap();
        let gz = write_gzip(&data, dir.path(), "packed.hlt").unwrap();

        assert_eq!(Replay::load(&plain).unwrap().data(), &data);
        assert_eq!(Replay::load(&gz).unwrap().data(), &data);
    }
}
