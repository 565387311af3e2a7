//! System-Exclusive framing for the Sketchbox routing engine.
//!
//! Composes outgoing SysEx frames (optional manufacturer/family/device
//! prefixes, optional Universal realtime/non-realtime marker, optional
//! checksum), recognises the standard Universal subset on the way in, and
//! materialises device identities from identity responses.

pub mod error;
pub use error::{Error, Result};

mod message;
pub use message::{MessageSettings, PayloadByte, SysexMessage};

mod packing;
pub use packing::{bytes_to_number, number_to_bytes, position_to_bytes, DataAlignment};

mod known;
pub use known::{parse_frame, known_message, IncomingSysex, KnownMessage, UniversalKind};

mod identity;
pub use identity::DeviceIdentity;

mod id_table;
pub use id_table::manufacturer_name;
