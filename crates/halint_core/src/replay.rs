//! Replay data and the frame sequencer.
//!
//! A replay is the decoded match log: static production, one
//! `[owner, strength]` grid per turn, and one raw move-code grid per turn.
//! [`Replay`] validates the whole file up front and then hands out
//! fully materialized [`Frame`]s in turn order.

use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{LintError, Result};
use crate::grid::{Cell, Grid};
use crate::{PlayerId, MAX_PRODUCTION, STRENGTH_CAP};

/// Display name reserved for owner `0`.
pub const NO_OWNER_NAME: &str = "PLAYER_ZERO";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Raw replay file contents as written by the Halite environment.
///
/// Unknown fields (`version`, `num_frames`, ...) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayData {
    /// Map width.
    pub width: usize,
    /// Map height.
    pub height: usize,
    /// Static production, indexed `[y][x]`.
    pub productions: Vec<Vec<u32>>,
    /// Per-turn `(owner, strength)` grids, indexed `[turn][y][x]`.
    pub frames: Vec<Vec<Vec<(PlayerId, u32)>>>,
    /// Per-turn raw move codes, indexed `[turn][y][x]`.
    pub moves: Vec<Vec<Vec<u8>>>,
    /// Player display names; owner `n` is `player_names[n - 1]`.
    pub player_names: Vec<String>,
}

impl ReplayData {
    /// Parse replay JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LintError::Parse {
            path: "<memory>".to_string(),
            message: e.to_string(),
        })
    }

    /// Serialize to replay JSON.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| LintError::Parse {
            path: "<memory>".to_string(),
            message: e.to_string(),
        })
    }
}

/// One turn of the match: the board plus every square's decoded move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Turn index, starting at 0.
    pub index: usize,
    /// Board state at the start of the turn.
    pub grid: Grid,
    moves: Vec<Direction>,
}

impl Frame {
    /// Assemble a frame from a grid and row-major directions.
    ///
    /// # Errors
    /// Returns an error if there is not exactly one direction per square.
    pub fn new(index: usize, grid: Grid, moves: Vec<Direction>) -> Result<Self> {
        let expected = grid.width() * grid.height();
        if moves.len() != expected {
            return Err(LintError::DimensionMismatch {
                what: format!("moves of frame {index}"),
                expected,
                actual: moves.len(),
            });
        }
        Ok(Self { index, grid, moves })
    }

    /// Move issued from `cell`.
    #[must_use]
    pub fn direction(&self, cell: &Cell) -> Direction {
        self.moves[self.grid.index(cell.x, cell.y)]
    }

    /// Decoded moves of every square, row-major.
    #[must_use]
    pub fn directions(&self) -> &[Direction] {
        &self.moves
    }

    /// Every square holding a unit, with its move, in row-major order.
    pub fn units(&self) -> impl Iterator<Item = (&Cell, Direction)> + '_ {
        self.grid
            .cells()
            .zip(self.moves.iter().copied())
            .filter(|(cell, _)| cell.is_owned())
    }
}

/// A validated replay.
#[derive(Debug, Clone)]
pub struct Replay {
    data: ReplayData,
    names: Vec<String>,
    starting_player_count: usize,
}

impl Replay {
    /// Validate decoded replay data.
    ///
    /// # Errors
    /// Returns an error for any dimension mismatch, out-of-range move code,
    /// strength or production, or owner without a player name.
    pub fn from_data(data: ReplayData) -> Result<Self> {
        validate(&data)?;

        let mut names = Vec::with_capacity(data.player_names.len() + 1);
        names.push(NO_OWNER_NAME.to_string());
        names.extend(data.player_names.iter().cloned());

        let mut replay = Self {
            data,
            names,
            starting_player_count: 0,
        };
        replay.starting_player_count = replay.build_grid(0)?.player_count();

        if replay.data.moves.len() > replay.data.frames.len() {
            tracing::warn!(
                frames = replay.data.frames.len(),
                move_frames = replay.data.moves.len(),
                "Replay truncated; analysis stops at the last complete frame"
            );
        }
        Ok(replay)
    }

    /// Parse and validate replay JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Self::from_data(ReplayData::from_json_str(json)?)
    }

    /// Decode replay bytes, gzip-compressed or plain JSON.
    ///
    /// `label` names the source in error messages.
    pub fn from_bytes(bytes: &[u8], label: &str) -> Result<Self> {
        let parse_err = |message: String| LintError::Parse {
            path: label.to_string(),
            message,
        };

        let data: ReplayData = if bytes.starts_with(&GZIP_MAGIC) {
            let mut json = String::new();
            GzDecoder::new(bytes)
                .read_to_string(&mut json)
                .map_err(|e| parse_err(format!("gzip: {e}")))?;
            serde_json::from_str(&json).map_err(|e| parse_err(e.to_string()))?
        } else {
            serde_json::from_slice(bytes).map_err(|e| parse_err(e.to_string()))?
        };

        Self::from_data(data)
    }

    /// Load a replay file.
    ///
    /// # Errors
    /// Returns an error if reading, decoding or validation fails.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| LintError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_bytes(&bytes, &path.display().to_string())
    }

    /// Map width.
    #[must_use]
    pub const fn width(&self) -> usize {
        self.data.width
    }

    /// Map height.
    #[must_use]
    pub const fn height(&self) -> usize {
        self.data.height
    }

    /// Display names, 1-indexed; entry 0 is [`NO_OWNER_NAME`].
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of named players.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.names.len() - 1
    }

    /// Display name of an owner.
    #[must_use]
    pub fn player_name(&self, owner: PlayerId) -> &str {
        self.names
            .get(usize::from(owner))
            .map_or(NO_OWNER_NAME, String::as_str)
    }

    /// Distinct owners present on the first frame.
    #[must_use]
    pub const fn starting_player_count(&self) -> usize {
        self.starting_player_count
    }

    /// Number of analyzable turns: frames that have both a board and moves.
    #[must_use]
    pub fn turn_count(&self) -> usize {
        self.data.moves.len().min(self.data.frames.len())
    }

    /// Raw data this replay was built from.
    #[must_use]
    pub const fn data(&self) -> &ReplayData {
        &self.data
    }

    fn build_grid(&self, index: usize) -> Result<Grid> {
        let (width, height) = (self.data.width, self.data.height);
        let cells = self.data.frames[index]
            .iter()
            .zip(&self.data.productions)
            .enumerate()
            .flat_map(|(y, (row, prod_row))| {
                row.iter()
                    .zip(prod_row)
                    .enumerate()
                    .map(move |(x, (&(owner, strength), &production))| Cell {
                        x,
                        y,
                        owner,
                        strength,
                        production,
                    })
            })
            .collect();
        Grid::new(width, height, cells)
    }

    /// Materialize turn `index`.
    ///
    /// # Errors
    /// Returns an error if `index` is past the last analyzable turn or a
    /// move code does not decode.
    pub fn frame(&self, index: usize) -> Result<Frame> {
        if index >= self.turn_count() {
            return Err(LintError::InvalidReplay(format!(
                "frame {index} out of range ({} turns)",
                self.turn_count()
            )));
        }
        let grid = self.build_grid(index)?;
        let moves = self.data.moves[index]
            .iter()
            .enumerate()
            .flat_map(|(y, row)| {
                row.iter().enumerate().map(move |(x, &code)| {
                    Direction::from_raw_code(code).ok_or(LintError::InvalidMoveCode {
                        code,
                        frame: index,
                        x,
                        y,
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Frame::new(index, grid, moves)
    }

    /// All analyzable turns in order.
    pub fn frames(&self) -> impl Iterator<Item = Result<Frame>> + '_ {
        (0..self.turn_count()).map(|i| self.frame(i))
    }
}

fn check_len(what: impl FnOnce() -> String, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(LintError::DimensionMismatch {
            what: what(),
            expected,
            actual,
        })
    }
}

fn validate(data: &ReplayData) -> Result<()> {
    let (width, height) = (data.width, data.height);
    if width == 0 || height == 0 {
        return Err(LintError::InvalidReplay(format!(
            "map must be non-empty, got {width}x{height}"
        )));
    }
    if data.frames.is_empty() {
        return Err(LintError::InvalidReplay("replay has no frames".to_string()));
    }

    check_len(|| "production rows".to_string(), height, data.productions.len())?;
    for (y, row) in data.productions.iter().enumerate() {
        check_len(|| format!("production row {y}"), width, row.len())?;
        if let Some((x, &production)) = row
            .iter()
            .enumerate()
            .find(|(_, p)| **p > MAX_PRODUCTION)
        {
            return Err(LintError::OutOfRange {
                what: "production".to_string(),
                value: production,
                limit: MAX_PRODUCTION,
                x,
                y,
            });
        }
    }

    let players = data.player_names.len();
    for (t, frame) in data.frames.iter().enumerate() {
        check_len(|| format!("rows of frame {t}"), height, frame.len())?;
        for (y, row) in frame.iter().enumerate() {
            check_len(|| format!("frame {t} row {y}"), width, row.len())?;
            if let Some(&(owner, _)) = row.iter().find(|(o, _)| usize::from(*o) > players) {
                return Err(LintError::UnknownOwner {
                    owner,
                    frame: t,
                    players,
                });
            }
            if let Some((x, &(_, strength))) = row
                .iter()
                .enumerate()
                .find(|(_, (_, s))| *s > STRENGTH_CAP)
            {
                return Err(LintError::OutOfRange {
                    what: format!("strength in frame {t}"),
                    value: strength,
                    limit: STRENGTH_CAP,
                    x,
                    y,
                });
            }
        }
    }

    for (t, frame) in data.moves.iter().enumerate() {
        check_len(|| format!("move rows of frame {t}"), height, frame.len())?;
        for (y, row) in frame.iter().enumerate() {
            check_len(|| format!("moves of frame {t} row {y}"), width, row.len())?;
            if let Some((x, &code)) = row
                .iter()
                .enumerate()
                .find(|(_, c)| Direction::from_raw_code(**c).is_none())
            {
                return Err(LintError::InvalidMoveCode {
                    code,
                    frame: t,
                    x,
                    y,
                });
            }
        }
    }
    Ok(())
}
