//! 7-bit number packing for SysEx payloads.
//!
//! SysEx payload bytes may not set the high bit, so multi-byte values are
//! distributed across 7-bit groups. Bytes are emitted least-significant group
//! first (the convention the Universal master-volume message uses: LSB then
//! MSB).

use serde::{Deserialize, Serialize};

/// How the value's bits sit inside the available 7-bit groups when the value
/// is narrower than the destination.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataAlignment {
    /// The value's most significant bit is aligned with the destination's
    /// most significant bit (sample-dump data packets use this).
    LeftJustified,
    /// The value occupies the least significant bits of the destination.
    #[default]
    RightJustified,
}

#[inline]
fn bit_mask(bit_size: u32) -> u64 {
    if bit_size >= 64 {
        u64::MAX
    } else {
        (1u64 << bit_size) - 1
    }
}

/// Distribute `value` into `byte_count` 7-bit bytes.
///
/// `bit_size` is how many bits of the destination the value occupies; the
/// alignment places those bits within the `7 * byte_count` destination bits.
/// Destinations wider than 9 bytes (63 bits) are not supported.
pub fn number_to_bytes(
    value: u32,
    byte_count: usize,
    bit_size: u32,
    alignment: DataAlignment,
) -> Vec<u8> {
    let byte_count = byte_count.min(9);
    let total_bits = 7 * byte_count as u32;
    let bit_size = bit_size.min(total_bits);
    let field = match alignment {
        DataAlignment::RightJustified => value as u64 & bit_mask(bit_size),
        DataAlignment::LeftJustified => {
            (value as u64 & bit_mask(bit_size)) << (total_bits - bit_size)
        }
    };
    (0..byte_count)
        .map(|index| ((field >> (7 * index as u32)) & 0x7F) as u8)
        .collect()
}

/// The inverse of [`number_to_bytes`].
///
/// Returns 0 if any byte is not a valid 7-bit value.
pub fn bytes_to_number(bytes: &[u8], bit_size: u32, alignment: DataAlignment) -> u32 {
    let bytes = &bytes[..bytes.len().min(9)];
    let total_bits = 7 * bytes.len() as u32;
    let bit_size = bit_size.min(total_bits);
    let mut field = 0u64;
    for (index, &byte) in bytes.iter().enumerate() {
        if byte > 0x7F {
            return 0;
        }
        field |= (byte as u64) << (7 * index as u32);
    }
    let value = match alignment {
        DataAlignment::RightJustified => field & bit_mask(bit_size),
        DataAlignment::LeftJustified => (field >> (total_bits - bit_size)) & bit_mask(bit_size),
    };
    value as u32
}

/// Convert a normalised position within a value range directly to packed
/// bytes. The position is clamped to 0.0 through 1.0.
pub fn position_to_bytes(
    position: f32,
    minimum: i32,
    maximum: i32,
    byte_count: usize,
    alignment: DataAlignment,
) -> Vec<u8> {
    let position = position.clamp(0.0, 1.0);
    let value = minimum as f32 + position * (maximum - minimum) as f32;
    number_to_bytes(
        value.round().max(0.0) as u32,
        byte_count,
        7 * byte_count as u32,
        alignment,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_master_volume_layout() {
        // A 14-bit value splits into LSB then MSB.
        assert_eq!(
            number_to_bytes(0x2000, 2, 14, DataAlignment::RightJustified),
            vec![0x00, 0x40]
        );
        assert_eq!(
            number_to_bytes(16383, 2, 14, DataAlignment::RightJustified),
            vec![0x7F, 0x7F]
        );
        assert_eq!(
            number_to_bytes(1, 2, 14, DataAlignment::RightJustified),
            vec![0x01, 0x00]
        );
    }

    #[test]
    fn test_left_justified_shifts_into_high_bits() {
        // A 7-bit value in a 14-bit destination lands entirely in the second
        // (most significant) byte.
        assert_eq!(
            number_to_bytes(0x55, 2, 7, DataAlignment::LeftJustified),
            vec![0x00, 0x55]
        );
        assert_eq!(
            bytes_to_number(&[0x00, 0x55], 7, DataAlignment::LeftJustified),
            0x55
        );
    }

    #[test]
    fn test_invalid_bytes_decode_to_zero() {
        assert_eq!(
            bytes_to_number(&[0x80, 0x01], 14, DataAlignment::RightJustified),
            0
        );
    }

    #[test]
    fn test_position_to_bytes() {
        assert_eq!(
            position_to_bytes(0.0, 0, 16383, 2, DataAlignment::RightJustified),
            vec![0x00, 0x00]
        );
        assert_eq!(
            position_to_bytes(1.0, 0, 16383, 2, DataAlignment::RightJustified),
            vec![0x7F, 0x7F]
        );
        assert_eq!(
            position_to_bytes(2.0, 0, 16383, 2, DataAlignment::RightJustified),
            vec![0x7F, 0x7F]
        );
    }

    proptest! {
        #[test]
        fn prop_14bit_round_trip(value in 0u32..=16383) {
            let bytes = number_to_bytes(value, 2, 14, DataAlignment::RightJustified);
            prop_assert_eq!(
                bytes_to_number(&bytes, 14, DataAlignment::RightJustified),
                value
            );
        }

        #[test]
        fn prop_21bit_round_trip_both_alignments(value in 0u32..(1 << 16)) {
            for alignment in [DataAlignment::RightJustified, DataAlignment::LeftJustified] {
                let bytes = number_to_bytes(value, 3, 16, alignment);
                prop_assert_eq!(bytes_to_number(&bytes, 16, alignment), value);
            }
        }
    }
}
