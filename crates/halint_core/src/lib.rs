//! # Halint Core
//!
//! Deterministic replay analysis for Halite matches.
//!
//! This crate contains **only** the analysis logic:
//! - No terminal output
//! - No argument parsing
//! - No floating-point math (ratios use fixed-point)
//!
//! Given a decoded replay it reconstructs, frame by frame, where strength
//! merged and collided on the toroidal board, and reports:
//! - Cap loss (strength wasted above the 255 ceiling)
//! - Overkill (attack strength beyond what other attackers already covered)
//! - Flip-flops, zero-strength moves and failed mining attempts
//! - Move efficiency counters over the course of the game
//!
//! ## Crate Structure
//!
//! - [`grid`] - Toroidal grid of cells
//! - [`direction`] - The five canonical moves and raw code decoding
//! - [`replay`] - Replay data, validation and the frame sequencer
//! - [`placement`] - Per-frame "who lands where" aggregation
//! - [`caploss`] - Capacity overflow classification
//! - [`combat`] - Interaction sets and the overkill heuristic
//! - [`anomaly`] - Per-frame and two-frame anomaly detectors
//! - [`notify`] - Notification stream and its filters
//! - [`stats`] - Match-scoped accumulators
//! - [`session`] - The per-frame analysis pipeline
//! - [`math`] - Fixed-point ratio helpers

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod anomaly;
pub mod caploss;
pub mod combat;
pub mod direction;
pub mod error;
pub mod grid;
pub mod math;
pub mod notify;
pub mod placement;
pub mod replay;
pub mod session;
pub mod stats;

/// Maximum strength a single square can hold.
pub const STRENGTH_CAP: u32 = 255;

/// Largest production a square may have.
pub const MAX_PRODUCTION: u32 = STRENGTH_CAP;

/// Owner id for neutral (unowned) squares.
pub const NEUTRAL: PlayerId = 0;

/// Player index as stored in replay frames. `0` is neutral.
pub type PlayerId = u8;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::caploss::{CapLossKind, OverflowKind};
    pub use crate::direction::Direction;
    pub use crate::error::{LintError, Result};
    pub use crate::grid::{Cell, Grid};
    pub use crate::math::Fixed;
    pub use crate::notify::{
        LintOptions, NameFilter, Notification, NotificationKind, NotificationSink,
    };
    pub use crate::replay::{Frame, Replay, ReplayData};
    pub use crate::session::{analyze_replay, FrameReport, LintSession};
    pub use crate::stats::LintStats;
    pub use crate::{PlayerId, MAX_PRODUCTION, NEUTRAL, STRENGTH_CAP};
}
