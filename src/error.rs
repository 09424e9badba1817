//! Error types for the frame pipeline

use thiserror::Error;

/// A line that could not be turned into a complete frame
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("frame too short: expected {expected} fields, found {found}")]
    TooShort { expected: usize, found: usize },

    #[error("field {index} is not a number: {field:?}")]
    InvalidField { index: usize, field: String },
}

/// A mapping range that cannot be used
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("degenerate input range: in_min and in_max are both {0}")]
    Degenerate(i64),
}

/// Errors that cost one frame and leave the pipeline running
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("read error: {0}")]
    Io(#[from] std::io::Error),
}
