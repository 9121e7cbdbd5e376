//! Error types shared across the crate.
//!
//! Gameplay failures (a bad swap, an empty hint) are not errors in the `Result`
//! sense: they degrade to a rejection value or `None`. `ComboError` covers the
//! boundaries where something outside the engine can be wrong: board text,
//! configuration files, level selection and persistence.

use std::fmt;
use thiserror::Error;

/// Errors raised at the crate's I/O and configuration boundaries.
#[derive(Debug, Error)]
pub enum ComboError {
    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("unknown level {0}")]
    UnknownLevel(u32),

    #[error("level {0} is locked")]
    LevelLocked(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Why a swap request was turned away. The board and game state are untouched
/// whenever one of these is returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SwapRejection {
    /// One of the coordinates lies outside the grid.
    OutOfBounds,
    /// The two tiles are not orthogonal neighbours.
    NotAdjacent,
    /// A previous resolution is still being presented.
    Busy,
    /// The game has already ended.
    GameOver,
}

impl fmt::Display for SwapRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SwapRejection::OutOfBounds => "coordinate outside the board",
            SwapRejection::NotAdjacent => "tiles are not adjacent",
            SwapRejection::Busy => "board is busy",
            SwapRejection::GameOver => "game is over",
        };
        f.write_str(text)
    }
}
