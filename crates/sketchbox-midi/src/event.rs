//! Raw MIDI event with block-relative timing.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// A raw MIDI byte packet with a block-relative frame time.
///
/// Channel-voice messages are 1-3 bytes and stay inline; SysEx frames spill to
/// the heap. An event with no bytes is the "exhausted" sentinel used by the
/// per-block input iteration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiEvent {
    /// Frame offset within the current processing block.
    pub time: u32,
    /// Raw message bytes, status byte first.
    pub bytes: SmallVec<[u8; 4]>,
}

impl MidiEvent {
    /// Create an event from raw bytes.
    #[inline]
    pub fn from_bytes(time: u32, bytes: &[u8]) -> Self {
        Self {
            time,
            bytes: SmallVec::from_slice(bytes),
        }
    }

    /// Create a note on event.
    #[inline]
    pub fn note_on(time: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::from_bytes(time, &[0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    /// Create a note off event.
    #[inline]
    pub fn note_off(time: u32, channel: u8, note: u8, velocity: u8) -> Self {
        Self::from_bytes(time, &[0x80 | (channel & 0x0F), note & 0x7F, velocity & 0x7F])
    }

    /// Create a control change event.
    #[inline]
    pub fn control_change(time: u32, channel: u8, control: u8, value: u8) -> Self {
        Self::from_bytes(time, &[0xB0 | (channel & 0x0F), control & 0x7F, value & 0x7F])
    }

    /// Number of bytes in the event.
    #[inline]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// An empty event marks the end of input iteration.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Reset to the exhausted sentinel without releasing storage.
    #[inline]
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.time = 0;
    }

    /// The status byte, or `None` for an empty event.
    #[inline]
    pub fn status(&self) -> Option<u8> {
        self.bytes.first().copied()
    }

    /// Whether this is a channel-voice message (status 0x80 through 0xEF).
    #[inline]
    pub fn is_channel_voice(&self) -> bool {
        matches!(self.status(), Some(status) if (0x80..0xF0).contains(&status))
    }

    /// The channel carried in the status byte's low nibble, for channel-voice
    /// messages.
    #[inline]
    pub fn channel(&self) -> Option<u8> {
        if self.is_channel_voice() {
            self.status().map(|status| status & 0x0F)
        } else {
            None
        }
    }

    /// Whether this is a note on or note off message (status 0x80 through
    /// 0x9F, carrying at least a note number).
    #[inline]
    pub fn is_note_message(&self) -> bool {
        matches!(self.status(), Some(status) if (0x80..0xA0).contains(&status))
            && self.bytes.len() > 1
    }

    /// Note on with a non-zero velocity.
    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.status(), Some(status) if (0x90..0xA0).contains(&status))
            && self.bytes.get(2).copied().unwrap_or(0) > 0
    }

    /// Note off, including note on with velocity zero.
    #[inline]
    pub fn is_note_off(&self) -> bool {
        match self.status() {
            Some(status) if (0x80..0x90).contains(&status) => true,
            Some(status) if (0x90..0xA0).contains(&status) => {
                self.bytes.get(2).copied().unwrap_or(0) == 0
            }
            _ => false,
        }
    }

    /// Whether this is a control change message.
    #[inline]
    pub fn is_control_change(&self) -> bool {
        matches!(self.status(), Some(status) if (0xB0..0xC0).contains(&status))
    }

    /// Whether this is a SysEx frame (status 0xF0).
    #[inline]
    pub fn is_sysex(&self) -> bool {
        self.status() == Some(0xF0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_note_on() {
        let event = MidiEvent::note_on(100, 5, 60, 100);
        assert_eq!(event.bytes.as_slice(), &[0x95, 60, 100]);
        assert_eq!(event.time, 100);
        assert_eq!(event.channel(), Some(5));
        assert!(event.is_note_on());
        assert!(!event.is_note_off());
        assert!(event.is_note_message());
        assert!(event.is_channel_voice());
    }

    #[test]
    fn test_note_on_zero_velocity_is_note_off() {
        let event = MidiEvent::note_on(0, 0, 60, 0);
        assert!(event.is_note_off());
        assert!(!event.is_note_on());
    }

    #[test]
    fn test_note_off() {
        let event = MidiEvent::note_off(0, 3, 64, 0);
        assert_eq!(event.bytes.as_slice(), &[0x83, 64, 0]);
        assert!(event.is_note_off());
        assert!(event.is_note_message());
    }

    #[test]
    fn test_control_change() {
        let event = MidiEvent::control_change(0, 2, 7, 127);
        assert_eq!(event.bytes.as_slice(), &[0xB2, 7, 127]);
        assert!(event.is_control_change());
        assert!(!event.is_note_message());
    }

    #[test]
    fn test_system_messages_have_no_channel() {
        let clock = MidiEvent::from_bytes(0, &[0xF8]);
        assert!(!clock.is_channel_voice());
        assert_eq!(clock.channel(), None);

        let sysex = MidiEvent::from_bytes(0, &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
        assert!(sysex.is_sysex());
        assert_eq!(sysex.channel(), None);
    }

    #[test]
    fn test_empty_sentinel() {
        let mut event = MidiEvent::note_on(12, 0, 60, 1);
        assert!(!event.is_empty());
        event.clear();
        assert!(event.is_empty());
        assert_eq!(event.status(), None);
        assert!(!event.is_note_message());
    }
}
