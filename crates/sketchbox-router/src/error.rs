//! Error types for the routing core.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("port registration failed: {0}")]
    PortRegistration(String),

    #[error("no device with id {0}")]
    UnknownDevice(i32),

    #[error("rewrite literal {0} is not between 0 and 127")]
    InvalidLiteral(i32),

    #[error(transparent)]
    Sysex(#[from] sketchbox_sysex::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
