//! Device identity as reported by a Universal identity response.

use crate::error::{Error, Result};
use crate::id_table;
use crate::message::SysexMessage;
use serde::{Deserialize, Serialize};

/// The identity a device reports in response to a Universal identity request:
/// manufacturer (1 byte, or 3 bytes starting with 0x00), family (2 bytes),
/// model (2 bytes), and version (4 bytes).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIdentity {
    manufacturer: Vec<u8>,
    family: [u8; 2],
    model: [u8; 2],
    version: [u8; 4],
}

impl DeviceIdentity {
    /// Build an identity from already-extracted fields.
    pub fn from_parts(
        manufacturer: Vec<u8>,
        family: [u8; 2],
        model: [u8; 2],
        version: [u8; 4],
    ) -> Self {
        Self {
            manufacturer,
            family,
            model,
            version,
        }
    }

    /// Extract the identity from an identity-response message payload.
    ///
    /// The payload starts with the four Universal header bytes (realtime
    /// marker, channel, sub-id, sub-id 2), which the recogniser has already
    /// checked; the identity fields follow.
    pub fn from_identity_response(message: &SysexMessage) -> Result<Self> {
        let bytes = message.bytes();
        let mut position = 4;
        let manufacturer_len = if bytes.get(position) == Some(&0x00) { 3 } else { 1 };
        let expected = position + manufacturer_len + 2 + 2 + 4;
        if bytes.len() < expected {
            return Err(Error::TruncatedIdentity {
                expected,
                actual: bytes.len(),
            });
        }
        let manufacturer = bytes[position..position + manufacturer_len].to_vec();
        position += manufacturer_len;
        let family = [bytes[position], bytes[position + 1]];
        position += 2;
        let model = [bytes[position], bytes[position + 1]];
        position += 2;
        let version = [
            bytes[position],
            bytes[position + 1],
            bytes[position + 2],
            bytes[position + 3],
        ];
        Ok(Self {
            manufacturer,
            family,
            model,
            version,
        })
    }

    /// The manufacturer id (1 or 3 bytes).
    #[inline]
    pub fn manufacturer(&self) -> &[u8] {
        &self.manufacturer
    }

    /// The manufacturer's registered name, if known.
    pub fn manufacturer_name(&self) -> Option<&'static str> {
        id_table::manufacturer_name(&self.manufacturer)
    }

    #[inline]
    pub fn family(&self) -> [u8; 2] {
        self.family
    }

    #[inline]
    pub fn model(&self) -> [u8; 2] {
        self.model
    }

    #[inline]
    pub fn version(&self) -> [u8; 4] {
        self.version
    }
}
