//! Error types for replay analysis.

use thiserror::Error;

/// Result type alias using [`LintError`].
pub type Result<T> = std::result::Result<T, LintError>;

/// Top-level error type for replay analysis.
///
/// Anomalies found in a match are never errors; they are reported through
/// [`crate::notify`]. Every variant here aborts analysis of the current
/// match.
#[derive(Debug, Error)]
pub enum LintError {
    /// Failed to read a replay file.
    #[error("Failed to read replay file '{path}': {source}")]
    Io {
        /// Path of the replay.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Replay container could not be decoded as JSON.
    #[error("Failed to parse replay '{path}': {message}")]
    Parse {
        /// Path of the replay (or `<memory>`).
        path: String,
        /// Parser message.
        message: String,
    },

    /// Grid dimensions disagree somewhere in the replay.
    #[error("Dimension mismatch in {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which array was malformed.
        what: String,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// A move code outside the raw 0..=4 range.
    #[error("Invalid move code {code} at frame {frame} ({x},{y})")]
    InvalidMoveCode {
        /// Raw code from the replay.
        code: u8,
        /// Frame index.
        frame: usize,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },

    /// A square owned by a player that is not in the name list.
    #[error("Unknown owner {owner} at frame {frame}: replay lists {players} players")]
    UnknownOwner {
        /// Owner id found in the frame.
        owner: u8,
        /// Frame index.
        frame: usize,
        /// Number of named players.
        players: usize,
    },

    /// A strength or production no square can hold.
    #[error("{what} {value} at ({x},{y}) exceeds {limit}")]
    OutOfRange {
        /// Which value, and where in the replay.
        what: String,
        /// Value found.
        value: u32,
        /// Largest value allowed.
        limit: u32,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },

    /// Structurally valid replay describing an impossible map.
    #[error("Invalid replay: {0}")]
    InvalidReplay(String),

    /// Internal consistency check failed.
    #[error("Invariant violated at frame {frame}: {message}")]
    InvariantViolated {
        /// Frame index.
        frame: usize,
        /// What went wrong.
        message: String,
    },
}
