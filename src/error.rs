//! Error types for board construction and ball spawning

use thiserror::Error;

/// Errors surfaced by the board and simulation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlinkoError {
    /// Board not ready (too few pegs or rows, bad geometry). Retry after reconfiguring.
    #[error("Board not ready: {0}")]
    Configuration(String),

    /// Requested bin is outside the board or cannot be reached from the start lanes
    #[error("Target bin {index} is not reachable (bin count {bin_count})")]
    InvalidTarget { index: usize, bin_count: usize },

    /// A ball was spawned with an empty path
    #[error("Cannot spawn a ball on an empty path")]
    DegeneratePath,

    /// Configuration JSON could not be parsed
    #[error("Config parse error: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read
    #[error("Config I/O error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for PlinkoError {
    fn from(err: serde_json::Error) -> Self {
        PlinkoError::ConfigParse(err.to_string())
    }
}

impl From<std::io::Error> for PlinkoError {
    fn from(err: std::io::Error) -> Self {
        PlinkoError::Io(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PlinkoError>;
