//! Rewrite rules: what happens to an event once a filter entry matched it.
//!
//! A Track rule assembles a replacement MIDI event for a destination device;
//! a UI rule raises a UIA command on the origin device's command ring. For
//! input filters the default rule passes the event through unchanged (same
//! size, all bytes original). For output filters the rule bytes read from the
//! pseudo-event [track, slot, value], so `OriginalByte3` is the command value
//! and the add-channel toggles add the track index.

use crate::catalogue::{Slot, Track, UiaCommand, UiaEvent};
use crate::device::Device;
use crate::error::{Error, Result};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use sketchbox_midi::MidiEvent;
use std::cell::UnsafeCell;
use std::sync::Arc;

/// Whether a rule produces a MIDI event or a UIA command.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleType {
    #[default]
    Track,
    Ui,
}

/// Output event size for Track rules.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventSize {
    /// Same number of bytes as the matched event.
    #[default]
    SameAsInput,
    One,
    Two,
    Three,
}

impl EventSize {
    #[inline]
    fn resolve(self, input_len: usize) -> usize {
        match self {
            EventSize::SameAsInput => input_len.clamp(1, 3),
            EventSize::One => 1,
            EventSize::Two => 2,
            EventSize::Three => 3,
        }
    }
}

/// Where an output byte comes from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteSource {
    OriginalByte1,
    OriginalByte2,
    OriginalByte3,
    /// A literal 0 through 127. In byte position 0 the high bit is forced so
    /// the result is a valid status byte.
    Explicit(u8),
}

/// Where a UI rule's command value comes from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueSource {
    Byte1,
    Byte2,
    #[default]
    Byte3,
    EventChannel,
    Explicit(u8),
}

/// Plain configuration snapshot of a rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleConfig {
    pub rule_type: RuleType,
    pub byte_size: EventSize,
    pub bytes: [ByteSource; 3],
    pub add_channel: [bool; 3],
    pub uia_event: UiaEvent,
    pub uia_track: Track,
    pub uia_slot: Slot,
    pub uia_value: ValueSource,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            rule_type: RuleType::Track,
            byte_size: EventSize::SameAsInput,
            bytes: [
                ByteSource::OriginalByte1,
                ByteSource::OriginalByte2,
                ByteSource::OriginalByte3,
            ],
            add_channel: [false; 3],
            uia_event: UiaEvent::None,
            uia_track: Track::CurrentTrack,
            uia_slot: Slot::CurrentSlot,
            uia_value: ValueSource::Byte3,
        }
    }
}

/// A rewrite rule with its preallocated scratch event.
///
/// Configuration is mutated by the UI thread through snapshot swaps; the
/// scratch event is filled during match on the realtime thread, so matching
/// never allocates.
pub struct RewriteRule {
    config: ArcSwap<RuleConfig>,
    scratch: UnsafeCell<MidiEvent>,
}

// SAFETY: the scratch event is only touched on the audio thread, during match
// and the subsequent dispatch; configuration is behind an ArcSwap.
unsafe impl Send for RewriteRule {}
unsafe impl Sync for RewriteRule {}

impl Default for RewriteRule {
    fn default() -> Self {
        Self::new()
    }
}

impl RewriteRule {
    pub fn new() -> Self {
        Self::with_config(RuleConfig::default())
    }

    pub fn with_config(config: RuleConfig) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            scratch: UnsafeCell::new(MidiEvent::default()),
        }
    }

    /// Current configuration snapshot.
    pub fn config(&self) -> Arc<RuleConfig> {
        self.config.load_full()
    }

    /// Apply a change to the configuration via copy and swap.
    pub fn update(&self, change: impl FnOnce(&mut RuleConfig)) {
        let mut config = (*self.config.load_full()).clone();
        change(&mut config);
        self.config.store(Arc::new(config));
    }

    pub fn set_rule_type(&self, rule_type: RuleType) {
        self.update(|config| config.rule_type = rule_type);
    }

    pub fn set_byte_size(&self, byte_size: EventSize) {
        self.update(|config| config.byte_size = byte_size);
    }

    /// Set the source for an output byte position (0 through 2). Explicit
    /// literals outside 0 through 127 are rejected.
    pub fn set_byte_source(&self, position: usize, source: ByteSource) -> Result<()> {
        if let ByteSource::Explicit(value) = source {
            if value > 127 {
                return Err(Error::InvalidLiteral(value as i32));
            }
        }
        if position < 3 {
            self.update(|config| config.bytes[position] = source);
        }
        Ok(())
    }

    pub fn set_add_channel(&self, position: usize, add_channel: bool) {
        if position < 3 {
            self.update(|config| config.add_channel[position] = add_channel);
        }
    }

    pub fn set_uia_event(&self, uia_event: UiaEvent) {
        self.update(|config| config.uia_event = uia_event);
    }

    pub fn set_uia_track(&self, track: Track) {
        self.update(|config| config.uia_track = track);
    }

    pub fn set_uia_slot(&self, slot: Slot) {
        self.update(|config| config.uia_slot = slot);
    }

    pub fn set_uia_value(&self, value: ValueSource) -> Result<()> {
        if let ValueSource::Explicit(literal) = value {
            if literal > 127 {
                return Err(Error::InvalidLiteral(literal as i32));
            }
        }
        self.update(|config| config.uia_value = value);
        Ok(())
    }

    /// Assemble the rewritten event for a matched input event. `channel` is
    /// what the add-channel toggles add: the event's channel on the input
    /// path, the resolved track index on the feedback path.
    pub(crate) fn render(config: &RuleConfig, event: &MidiEvent, channel: u8, out: &mut MidiEvent) {
        let size = config.byte_size.resolve(event.len());
        out.time = event.time;
        out.bytes.clear();
        for position in 0..size {
            let mut byte = match config.bytes[position] {
                ByteSource::OriginalByte1 => event.bytes.first().copied().unwrap_or(0),
                ByteSource::OriginalByte2 => event.bytes.get(1).copied().unwrap_or(0),
                ByteSource::OriginalByte3 => event.bytes.get(2).copied().unwrap_or(0),
                ByteSource::Explicit(value) => {
                    if position == 0 {
                        value | 0x80
                    } else {
                        value
                    }
                }
            };
            if config.add_channel[position] {
                byte = byte.wrapping_add(channel);
            }
            out.bytes.push(byte);
        }
    }

    fn command_for(config: &RuleConfig, event: &MidiEvent, origin_id: i32) -> Option<UiaCommand> {
        let uia_event = config.uia_event;
        if uia_event == UiaEvent::None {
            return None;
        }
        if uia_event.wants_value() {
            let value = match config.uia_value {
                ValueSource::Byte1 => event.bytes.first().copied().unwrap_or(0),
                ValueSource::Byte2 => event.bytes.get(1).copied().unwrap_or(0),
                ValueSource::Byte3 => event.bytes.get(2).copied().unwrap_or(0),
                ValueSource::EventChannel => event.channel().unwrap_or(0),
                ValueSource::Explicit(value) => value,
            };
            Some(UiaCommand {
                event: uia_event,
                origin: origin_id,
                track: config.uia_track,
                slot: config.uia_slot,
                value,
            })
        } else if uia_event.wants_track() {
            Some(UiaCommand {
                event: uia_event,
                origin: origin_id,
                track: config.uia_track,
                slot: config.uia_slot,
                value: 0,
            })
        } else {
            Some(UiaCommand {
                event: uia_event,
                origin: origin_id,
                ..UiaCommand::default()
            })
        }
    }

    /// Apply the rule to a matched event: Track rules fill the scratch event,
    /// UI rules raise their command on the origin's ring immediately (so that
    /// dispatching to several destinations cannot raise it more than once).
    ///
    /// Audio thread only.
    pub(crate) fn mangle(&self, event: &MidiEvent, origin: &Device) {
        let config = self.config.load();
        match config.rule_type {
            RuleType::Track => {
                // SAFETY: audio thread only, per the scratch contract.
                let scratch = unsafe { &mut *self.scratch.get() };
                Self::render(&config, event, event.channel().unwrap_or(0), scratch);
            }
            RuleType::Ui => {
                if let Some(command) = Self::command_for(&config, event, origin.id()) {
                    origin.cuia_ring.write(command);
                }
            }
        }
    }

    /// The scratch event most recently assembled by
    /// [`mangle`](Self::mangle). Audio thread only.
    pub(crate) fn scratch_event(&self) -> &mut MidiEvent {
        // SAFETY: audio thread only; the caller holds the only reference.
        unsafe { &mut *self.scratch.get() }
    }

    /// A human-readable description of the rule.
    pub fn describe(&self) -> String {
        let config = self.config.load();
        match config.rule_type {
            RuleType::Track => {
                let sources: Vec<String> = (0..config.byte_size.resolve(3))
                    .map(|position| {
                        let base = match config.bytes[position] {
                            ByteSource::OriginalByte1 => "byte 1".to_string(),
                            ByteSource::OriginalByte2 => "byte 2".to_string(),
                            ByteSource::OriginalByte3 => "byte 3".to_string(),
                            ByteSource::Explicit(value) => format!("{value:#04X}"),
                        };
                        if config.add_channel[position] {
                            format!("{base} plus channel")
                        } else {
                            base
                        }
                    })
                    .collect();
                format!("Send event [{}]", sources.join(", "))
            }
            RuleType::Ui => {
                let value = match config.uia_value {
                    ValueSource::Explicit(value) => value,
                    _ => 0,
                };
                format!(
                    "Raise {}",
                    config
                        .uia_event
                        .describe(config.uia_track, config.uia_slot, value, None)
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rule_passes_event_through() {
        let rule = RewriteRule::new();
        let event = MidiEvent::from_bytes(9, &[0x95, 0x40, 0x20]);
        let mut out = MidiEvent::default();
        RewriteRule::render(&rule.config(), &event, 5, &mut out);
        assert_eq!(out, event);
    }

    #[test]
    fn test_explicit_status_byte_gets_high_bit() {
        let rule = RewriteRule::new();
        rule.set_byte_size(EventSize::Three);
        rule.set_byte_source(0, ByteSource::Explicit(0x30)).unwrap();
        rule.set_byte_source(1, ByteSource::OriginalByte2).unwrap();
        rule.set_byte_source(2, ByteSource::Explicit(127)).unwrap();
        rule.set_add_channel(0, true);

        let event = MidiEvent::from_bytes(0, &[0x95, 0x40, 0x20]);
        let mut out = MidiEvent::default();
        RewriteRule::render(&rule.config(), &event, 5, &mut out);
        assert_eq!(out.bytes.as_slice(), &[0xB5, 0x40, 0x7F]);
    }

    #[test]
    fn test_shrinking_rewrite() {
        let rule = RewriteRule::new();
        rule.set_byte_size(EventSize::One);
        rule.set_byte_source(0, ByteSource::Explicit(0x7C)).unwrap();
        let event = MidiEvent::from_bytes(3, &[0xB0, 85, 64]);
        let mut out = MidiEvent::default();
        RewriteRule::render(&rule.config(), &event, 0, &mut out);
        assert_eq!(out.bytes.as_slice(), &[0xFC]);
        assert_eq!(out.time, 3);
    }

    #[test]
    fn test_invalid_literal_rejected() {
        let rule = RewriteRule::new();
        assert!(rule.set_byte_source(0, ByteSource::Explicit(200)).is_err());
        // The configuration is untouched.
        assert_eq!(rule.config().bytes[0], ByteSource::OriginalByte1);
        assert!(rule.set_uia_value(ValueSource::Explicit(130)).is_err());
    }

    #[test]
    fn test_command_value_sources() {
        let event = MidiEvent::from_bytes(0, &[0xB3, 0x07, 0x40]);
        let mut config = RuleConfig {
            rule_type: RuleType::Ui,
            uia_event: UiaEvent::SetTrackVolume,
            uia_value: ValueSource::EventChannel,
            ..RuleConfig::default()
        };
        let command = RewriteRule::command_for(&config, &event, 7).unwrap();
        assert_eq!(command.value, 3);
        assert_eq!(command.origin, 7);
        assert_eq!(command.track, Track::CurrentTrack);
        assert_eq!(command.slot, Slot::CurrentSlot);

        config.uia_value = ValueSource::Byte3;
        let command = RewriteRule::command_for(&config, &event, 7).unwrap();
        assert_eq!(command.value, 0x40);

        config.uia_value = ValueSource::Explicit(9);
        let command = RewriteRule::command_for(&config, &event, 7).unwrap();
        assert_eq!(command.value, 9);
    }

    #[test]
    fn test_bare_command_uses_defaults() {
        let event = MidiEvent::from_bytes(0, &[0x90, 60, 100]);
        let config = RuleConfig {
            rule_type: RuleType::Ui,
            uia_event: UiaEvent::AllNotesOff,
            uia_track: Track::Track5,
            uia_slot: Slot::Slot3,
            ..RuleConfig::default()
        };
        let command = RewriteRule::command_for(&config, &event, 1).unwrap();
        // A bare command ignores the configured track and slot.
        assert_eq!(command.track, Track::CurrentTrack);
        assert_eq!(command.slot, Slot::CurrentSlot);
        assert_eq!(command.value, 0);
    }

    #[test]
    fn test_none_command_is_dropped() {
        let event = MidiEvent::from_bytes(0, &[0x90, 60, 100]);
        let config = RuleConfig {
            rule_type: RuleType::Ui,
            ..RuleConfig::default()
        };
        assert!(RewriteRule::command_for(&config, &event, 1).is_none());
    }
}
