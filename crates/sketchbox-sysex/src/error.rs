//! Error types for the SysEx subsystem.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("the entry at position {position} is not between 0 and 127: {value}")]
    ByteOutOfRange { position: usize, value: i64 },

    #[error("the entry at position {position} is not a valid hexadecimal value (accepted formats are 0x## or ##): {text}")]
    InvalidHex { position: usize, text: String },

    #[error("the entry at position {position} is not a hexadecimal value between 0x00 and 0x7F: {text}")]
    HexOutOfRange { position: usize, text: String },

    #[error("identity response payload is too short: expected at least {expected} bytes, got {actual}")]
    TruncatedIdentity { expected: usize, actual: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
