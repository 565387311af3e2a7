//! The Universal SysEx subset the engine speaks: known-message constructors
//! and incoming-frame recognition.

use crate::message::{MessageSettings, SysexMessage};
use crate::packing::{number_to_bytes, DataAlignment};
use serde::{Deserialize, Serialize};

/// The standard Universal messages the engine can compose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KnownMessage {
    /// General MIDI enable/disable. One extra field: 0 to disable (assumed
    /// when absent), 1 to enable.
    GmEnable,
    /// Device master volume. One extra field gives the volume as 0 through
    /// 16383, two fields pass the LSB/MSB segments directly, anything else is
    /// volume 0.
    SetMasterVolume,
    /// Identity request; a successful request is answered by an identity
    /// response.
    IdentityRequest,
    /// Sample dump request. Extra fields select the 14-bit sample index the
    /// same way master volume selects its value.
    SampleDumpRequest,
}

/// The Universal messages the engine recognises on the way in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UniversalKind {
    GmEnable,
    MasterVolume,
    IdentityRequest,
    IdentityResponse,
}

/// Build one of the standard Universal frames for the given SysEx channel.
pub fn known_message(kind: KnownMessage, channel: u8, extra_fields: &[i32]) -> SysexMessage {
    let channel = channel.min(0x7F);
    let mut bytes: Vec<u8>;
    let settings;
    match kind {
        KnownMessage::GmEnable => {
            settings = MessageSettings::UNIVERSAL_NON_REALTIME;
            bytes = vec![channel, 0x09];
            bytes.push(extra_fields.first().map(|v| (*v).clamp(0, 1) as u8).unwrap_or(0));
        }
        KnownMessage::SetMasterVolume => {
            settings = MessageSettings::UNIVERSAL_REALTIME;
            bytes = vec![channel, 0x04, 0x01];
            push_14bit(&mut bytes, extra_fields);
        }
        KnownMessage::IdentityRequest => {
            settings = MessageSettings::UNIVERSAL_NON_REALTIME;
            bytes = vec![channel, 0x06, 0x01];
        }
        KnownMessage::SampleDumpRequest => {
            settings = MessageSettings::UNIVERSAL_NON_REALTIME;
            bytes = vec![channel, 0x03];
            push_14bit(&mut bytes, extra_fields);
        }
    }
    let mut message = SysexMessage::new(settings);
    message
        .set_bytes(bytes)
        .expect("known message bytes are 7-bit by construction");
    message
}

fn push_14bit(bytes: &mut Vec<u8>, extra_fields: &[i32]) {
    match extra_fields {
        [value] => {
            let clamped = (*value).clamp(0, 16383) as u32;
            bytes.extend(number_to_bytes(clamped, 2, 14, DataAlignment::RightJustified));
        }
        [low, high] => {
            bytes.push((*low).clamp(0, 127) as u8);
            bytes.push((*high).clamp(0, 127) as u8);
        }
        _ => {
            bytes.push(0x00);
            bytes.push(0x00);
        }
    }
}

/// A recognised incoming frame: the reconstructed message plus the Universal
/// kind it matched, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncomingSysex {
    pub message: SysexMessage,
    pub universal: Option<UniversalKind>,
}

/// Recognise an incoming SysEx frame.
///
/// The frame must be at least four bytes and framed by 0xF0/0xF7; anything
/// else is not SysEx and yields `None`. Universal classification checks the
/// full frame length together with the sub-id pair, then requires the channel
/// byte at index 2 to be the broadcast channel (0x7F) or `sysex_channel`; a
/// frame on another channel is passed through unclassified.
pub fn parse_frame(frame: &[u8], sysex_channel: u8) -> Option<IncomingSysex> {
    if frame.len() < 4 || frame.first() != Some(&0xF0) || frame.last() != Some(&0xF7) {
        return None;
    }
    let mut universal = None;
    let mut settings = MessageSettings::NONE;
    if frame.len() > 5 && (frame[1] == 0x7E || frame[1] == 0x7F) {
        let sub_id = frame[3];
        let sub_id2 = frame[4];
        let kind = match (frame.len(), sub_id, sub_id2) {
            (6, 0x09, 0x00 | 0x01) => Some(UniversalKind::GmEnable),
            (8, 0x04, 0x01) => Some(UniversalKind::MasterVolume),
            (6, 0x06, 0x01) => Some(UniversalKind::IdentityRequest),
            (16, 0x06, 0x02) => Some(UniversalKind::IdentityResponse),
            _ => None,
        };
        // The channel check only makes sense once the frame is known to be a
        // Universal message; other manufacturers put arbitrary data at index 2.
        if kind.is_some() && (frame[2] == 0x7F || frame[2] == sysex_channel) {
            universal = kind;
            if frame[1] == 0x7F {
                settings.set(MessageSettings::UNIVERSAL_REALTIME, true);
            } else {
                settings.set(MessageSettings::UNIVERSAL_NON_REALTIME, true);
            }
            tracing::debug!(?kind, channel = frame[2], "recognised universal sysex frame");
        }
    }
    // Incoming frames have already been on the wire; mask rather than reject
    // so a malformed byte cannot poison the whole frame.
    let payload: Vec<u8> = frame[1..frame.len() - 1]
        .iter()
        .map(|byte| byte & 0x7F)
        .collect();
    let mut message = SysexMessage::new(settings);
    message
        .set_bytes(payload)
        .expect("masked payload bytes are 7-bit");
    Some(IncomingSysex { message, universal })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gm_enable_frame() {
        let message = known_message(KnownMessage::GmEnable, 0x7F, &[1]);
        assert_eq!(
            message.compose(None),
            vec![0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7]
        );
        let off = known_message(KnownMessage::GmEnable, 0x7F, &[]);
        assert_eq!(off.compose(None), vec![0xF0, 0x7E, 0x7F, 0x09, 0x00, 0xF7]);
    }

    #[test]
    fn test_master_volume_frame() {
        let message = known_message(KnownMessage::SetMasterVolume, 0x7F, &[16383]);
        assert_eq!(
            message.compose(None),
            vec![0xF0, 0x7F, 0x7F, 0x04, 0x01, 0x7F, 0x7F, 0xF7]
        );
        let split = known_message(KnownMessage::SetMasterVolume, 0x7F, &[0x12, 0x34]);
        assert_eq!(
            split.compose(None),
            vec![0xF0, 0x7F, 0x7F, 0x04, 0x01, 0x12, 0x34, 0xF7]
        );
    }

    #[test]
    fn test_identity_request_frame() {
        let message = known_message(KnownMessage::IdentityRequest, 0x7F, &[]);
        assert_eq!(
            message.compose(None),
            vec![0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]
        );
    }

    #[test]
    fn test_sample_dump_request_frame() {
        let message = known_message(KnownMessage::SampleDumpRequest, 0x00, &[300]);
        assert_eq!(
            message.compose(None),
            vec![0xF0, 0x7E, 0x00, 0x03, (300u32 & 0x7F) as u8, (300u32 >> 7) as u8, 0xF7]
        );
    }

    #[test]
    fn test_recognise_identity_response() {
        let frame = [
            0xF0, 0x7E, 0x7F, 0x06, 0x02, 0x41, 0x10, 0x01, 0x02, 0x00, 0x00, 0x00, 0x01, 0x00,
            0x00, 0xF7,
        ];
        let incoming = parse_frame(&frame, 0x7F).unwrap();
        assert_eq!(incoming.universal, Some(UniversalKind::IdentityResponse));
        assert!(incoming
            .message
            .has_setting(MessageSettings::UNIVERSAL_NON_REALTIME));
        assert_eq!(incoming.message.bytes()[..4], [0x7E, 0x7F, 0x06, 0x02]);
    }

    #[test]
    fn test_recognise_round_trips_own_frames() {
        for (kind, expected) in [
            (KnownMessage::GmEnable, UniversalKind::GmEnable),
            (KnownMessage::SetMasterVolume, UniversalKind::MasterVolume),
            (KnownMessage::IdentityRequest, UniversalKind::IdentityRequest),
        ] {
            let frame = known_message(kind, 0x7F, &[1]).compose(None);
            let incoming = parse_frame(&frame, 0x7F).unwrap();
            assert_eq!(incoming.universal, Some(expected), "{kind:?}");
        }
    }

    #[test]
    fn test_channel_gate() {
        let frame = known_message(KnownMessage::IdentityRequest, 0x05, &[]).compose(None);
        // Wrong channel: still SysEx, but not classified as Universal.
        let incoming = parse_frame(&frame, 0x06).unwrap();
        assert_eq!(incoming.universal, None);
        // Matching channel classifies.
        let incoming = parse_frame(&frame, 0x05).unwrap();
        assert_eq!(incoming.universal, Some(UniversalKind::IdentityRequest));
        // Broadcast channel always classifies.
        let broadcast = known_message(KnownMessage::IdentityRequest, 0x7F, &[]).compose(None);
        let incoming = parse_frame(&broadcast, 0x05).unwrap();
        assert_eq!(incoming.universal, Some(UniversalKind::IdentityRequest));
    }

    #[test]
    fn test_non_sysex_rejected() {
        assert!(parse_frame(&[0x90, 60, 100], 0x7F).is_none());
        assert!(parse_frame(&[0xF0, 0x41], 0x7F).is_none());
    }
}
