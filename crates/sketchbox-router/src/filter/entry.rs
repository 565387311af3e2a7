//! A single entry in a filter: a match predicate plus an ordered list of
//! rewrite rules.

use super::rule::{RewriteRule, RuleType};
use crate::catalogue::{Slot, Track, UiaCommand, UiaEvent};
use crate::device::Device;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use sketchbox_midi::MidiEvent;
use std::sync::Arc;

/// Plain configuration snapshot of an entry.
///
/// Input-direction entries match on byte ranges; output-direction entries
/// match on a UIA command's kind, origin, and value interval. Both sets of
/// fields live here so a filter's direction can be flipped without losing
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Where matched events are routed (input direction).
    pub target_track: Track,
    /// Number of bytes the event must have, 1 through 3.
    pub required_bytes: usize,
    /// When false, only the byte minimums are compared (equality match).
    pub require_range: bool,
    pub byte1_min: u8,
    pub byte1_max: u8,
    pub byte2_min: u8,
    pub byte2_max: u8,
    pub byte3_min: u8,
    pub byte3_max: u8,
    /// The command this entry reacts to (output direction).
    pub uia_event: UiaEvent,
    pub origin_track: Track,
    pub origin_slot: Slot,
    pub value_min: u8,
    pub value_max: u8,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            target_track: Track::CurrentTrack,
            required_bytes: 3,
            require_range: false,
            byte1_min: 128,
            byte1_max: 128,
            byte2_min: 0,
            byte2_max: 0,
            byte3_min: 0,
            byte3_max: 0,
            uia_event: UiaEvent::None,
            origin_track: Track::AnyTrack,
            origin_slot: Slot::AnySlot,
            value_min: 0,
            value_max: 0,
        }
    }
}

/// One match entry. Mutated by the UI thread through snapshot swaps, read on
/// the realtime thread during matching.
pub struct FilterEntry {
    config: ArcSwap<EntryConfig>,
    rules: ArcSwap<Vec<Arc<RewriteRule>>>,
}

impl Default for FilterEntry {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterEntry {
    pub fn new() -> Self {
        Self {
            config: ArcSwap::from_pointee(EntryConfig::default()),
            rules: ArcSwap::from_pointee(Vec::new()),
        }
    }

    pub fn config(&self) -> Arc<EntryConfig> {
        self.config.load_full()
    }

    pub fn update(&self, change: impl FnOnce(&mut EntryConfig)) {
        let mut config = (*self.config.load_full()).clone();
        change(&mut config);
        self.config.store(Arc::new(config));
    }

    pub fn set_target_track(&self, track: Track) {
        self.update(|config| config.target_track = track);
    }

    pub fn set_required_bytes(&self, required_bytes: usize) {
        self.update(|config| config.required_bytes = required_bytes.clamp(1, 3));
    }

    pub fn set_require_range(&self, require_range: bool) {
        self.update(|config| config.require_range = require_range);
    }

    // Every min/max setter restores min <= max by dragging the other bound
    // along.

    pub fn set_byte1_minimum(&self, minimum: u8) {
        self.update(|config| {
            config.byte1_min = minimum.max(128);
            config.byte1_max = config.byte1_max.max(config.byte1_min);
        });
    }

    pub fn set_byte1_maximum(&self, maximum: u8) {
        self.update(|config| {
            config.byte1_max = maximum.max(128);
            config.byte1_min = config.byte1_min.min(config.byte1_max);
        });
    }

    pub fn set_byte2_minimum(&self, minimum: u8) {
        self.update(|config| {
            config.byte2_min = minimum.min(127);
            config.byte2_max = config.byte2_max.max(config.byte2_min);
        });
    }

    pub fn set_byte2_maximum(&self, maximum: u8) {
        self.update(|config| {
            config.byte2_max = maximum.min(127);
            config.byte2_min = config.byte2_min.min(config.byte2_max);
        });
    }

    pub fn set_byte3_minimum(&self, minimum: u8) {
        self.update(|config| {
            config.byte3_min = minimum.min(127);
            config.byte3_max = config.byte3_max.max(config.byte3_min);
        });
    }

    pub fn set_byte3_maximum(&self, maximum: u8) {
        self.update(|config| {
            config.byte3_max = maximum.min(127);
            config.byte3_min = config.byte3_min.min(config.byte3_max);
        });
    }

    pub fn set_uia_event(&self, uia_event: UiaEvent) {
        self.update(|config| config.uia_event = uia_event);
    }

    pub fn set_origin_track(&self, track: Track) {
        self.update(|config| config.origin_track = track);
    }

    pub fn set_origin_slot(&self, slot: Slot) {
        self.update(|config| config.origin_slot = slot);
    }

    pub fn set_value_minimum(&self, minimum: u8) {
        self.update(|config| {
            config.value_min = minimum.min(127);
            config.value_max = config.value_max.max(config.value_min);
        });
    }

    pub fn set_value_maximum(&self, maximum: u8) {
        self.update(|config| {
            config.value_max = maximum.min(127);
            config.value_min = config.value_min.min(config.value_max);
        });
    }

    // ------------------------------------------------------------------
    // Rule list
    // ------------------------------------------------------------------

    /// Snapshot of the rule list.
    pub fn rules(&self) -> Arc<Vec<Arc<RewriteRule>>> {
        self.rules.load_full()
    }

    /// Insert a new rule at the given position (append when `None` or out of
    /// bounds) and return it.
    pub fn add_rule(&self, index: Option<usize>) -> Arc<RewriteRule> {
        let rule = Arc::new(RewriteRule::new());
        let mut rules = (*self.rules.load_full()).clone();
        match index {
            Some(index) if index < rules.len() => rules.insert(index, Arc::clone(&rule)),
            _ => rules.push(Arc::clone(&rule)),
        }
        self.rules.store(Arc::new(rules));
        rule
    }

    /// Remove the rule at the given position; out-of-bounds indices are
    /// ignored.
    pub fn delete_rule(&self, index: usize) {
        let mut rules = (*self.rules.load_full()).clone();
        if index < rules.len() {
            rules.remove(index);
            self.rules.store(Arc::new(rules));
        }
    }

    pub fn index_of_rule(&self, rule: &Arc<RewriteRule>) -> Option<usize> {
        self.rules
            .load()
            .iter()
            .position(|candidate| Arc::ptr_eq(candidate, rule))
    }

    /// Swap two rules by position; does nothing unless both are in range.
    pub fn swap_rules(&self, first: usize, second: usize) {
        let mut rules = (*self.rules.load_full()).clone();
        if first < rules.len() && second < rules.len() {
            rules.swap(first, second);
            self.rules.store(Arc::new(rules));
        }
    }

    // ------------------------------------------------------------------
    // Matching
    // ------------------------------------------------------------------

    /// Whether the event satisfies this entry's byte predicate.
    pub fn matches(&self, event: &MidiEvent) -> bool {
        let config = self.config.load();
        if event.len() != config.required_bytes {
            return false;
        }
        let in_range = |byte: u8, min: u8, max: u8| {
            let max = if config.require_range { max } else { min };
            min <= byte && byte <= max
        };
        if !in_range(event.bytes[0], config.byte1_min, config.byte1_max) {
            return false;
        }
        if config.required_bytes > 1 && !in_range(event.bytes[1], config.byte2_min, config.byte2_max)
        {
            return false;
        }
        if config.required_bytes > 2 && !in_range(event.bytes[2], config.byte3_min, config.byte3_max)
        {
            return false;
        }
        true
    }

    /// Run every rule against the matched event: Track rules fill their
    /// scratch buffers, UI rules raise their commands on the origin's ring.
    ///
    /// Must be called by the match that found the entry, before dispatching
    /// with [`write_event_to_device`](Self::write_event_to_device). Audio
    /// thread only.
    pub(crate) fn mangle(&self, event: &MidiEvent, origin: &Device) {
        let rules = self.rules.load();
        for rule in rules.iter() {
            rule.mangle(event, origin);
        }
    }

    /// Submit the most recently mangled events to a destination device. UI
    /// rules produced their side effect during the match and are skipped
    /// here. Audio thread only.
    pub fn write_event_to_device(&self, device: &Device) {
        let rules = self.rules.load();
        for rule in rules.iter() {
            if rule.config().rule_type == RuleType::Track {
                device.write_event_to_output(rule.scratch_event(), -1);
            }
        }
    }

    /// Whether a UIA command satisfies this entry's output predicate.
    pub fn matches_command(
        &self,
        uia_event: UiaEvent,
        track: Track,
        slot: Slot,
        value: u8,
    ) -> bool {
        let config = self.config.load();
        config.uia_event == uia_event
            && (config.origin_track == Track::AnyTrack || config.origin_track == track)
            && (config.origin_slot == Slot::AnySlot || config.origin_slot == slot)
            && config.value_min <= value
            && value <= config.value_max
    }

    /// Queue the rewritten form of a matched UIA command on the device's
    /// output ring.
    ///
    /// The rule bytes read from the pseudo-event [track, slot, value], with
    /// the resolved track index standing in for the channel, so add-channel
    /// toggles add the track. Runs on the UI thread; the events are written
    /// out at the start of the next block.
    pub fn queue_command_to_device(&self, device: &Device, command: &UiaCommand, current_track: Track) {
        let track_index = command
            .track
            .sketchpad_index()
            .or_else(|| current_track.sketchpad_index())
            .unwrap_or(0) as u8;
        let slot_index = command.slot.sketchpad_index().unwrap_or(0) as u8;
        let pseudo = MidiEvent::from_bytes(0, &[track_index, slot_index, command.value]);
        let rules = self.rules.load();
        for rule in rules.iter() {
            let config = rule.config();
            if config.rule_type == RuleType::Track {
                let mut event = MidiEvent::default();
                RewriteRule::render(&config, &pseudo, track_index, &mut event);
                device.midi_output_ring.write(event);
            }
        }
    }

    /// A human-readable description of the entry.
    pub fn describe(&self, direction: super::FilterDirection) -> String {
        let config = self.config.load();
        let description = match direction {
            super::FilterDirection::Input => {
                let first = describe_message(&[config.byte1_min, config.byte2_min, config.byte3_min][..config.required_bytes]);
                if config.require_range {
                    let second = describe_message(
                        &[config.byte1_max, config.byte2_max, config.byte3_max]
                            [..config.required_bytes],
                    );
                    format!("From {first} to {second}")
                } else {
                    first
                }
            }
            super::FilterDirection::Output => {
                if config.value_min == config.value_max {
                    config.uia_event.describe(
                        config.origin_track,
                        config.origin_slot,
                        config.value_min,
                        None,
                    )
                } else {
                    config.uia_event.describe(
                        config.origin_track,
                        config.origin_slot,
                        config.value_min,
                        Some(config.value_max),
                    )
                }
            }
        };
        match self.rules.load().len() {
            0 => format!("{description} with no rewrite rules"),
            1 => format!("{description} with 1 rewrite rule"),
            count => format!("{description} with {count} rewrite rules"),
        }
    }
}

/// Name a channel-voice message from its bytes, for entry descriptions.
fn describe_message(bytes: &[u8]) -> String {
    let Some(&status) = bytes.first() else {
        return "Empty Message".to_string();
    };
    let channel = (status & 0x0F) + 1;
    let data1 = bytes.get(1).copied().unwrap_or(0);
    let data2 = bytes.get(2).copied().unwrap_or(0);
    match status & 0xF0 {
        0x80 => format!("Note Off (channel {channel}, note {data1}, velocity {data2})"),
        0x90 => format!("Note On (channel {channel}, note {data1}, velocity {data2})"),
        0xA0 => format!("Poly Aftertouch (channel {channel}, note {data1}, pressure {data2})"),
        0xB0 => format!("CC {data1} (channel {channel}, value {data2})"),
        0xC0 => format!("Program Change (channel {channel}, program {data1})"),
        0xD0 => format!("Channel Pressure (channel {channel}, pressure {data1})"),
        0xE0 => format!("Pitch Bend (channel {channel})"),
        _ => format!("Status {status:#04X}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_exact_when_range_not_required() {
        let entry = FilterEntry::new();
        entry.set_required_bytes(3);
        entry.set_byte1_minimum(0x90);
        entry.set_byte1_maximum(0x9F);
        entry.set_byte2_minimum(60);
        entry.set_byte3_minimum(100);
        // Without require_range only the minimums count.
        assert!(entry.matches(&MidiEvent::from_bytes(0, &[0x90, 60, 100])));
        assert!(!entry.matches(&MidiEvent::from_bytes(0, &[0x91, 60, 100])));
        assert!(!entry.matches(&MidiEvent::from_bytes(0, &[0x90, 61, 100])));
    }

    #[test]
    fn test_match_ranges() {
        let entry = FilterEntry::new();
        entry.set_required_bytes(3);
        entry.set_require_range(true);
        entry.set_byte1_minimum(0x90);
        entry.set_byte1_maximum(0x9F);
        entry.set_byte2_minimum(60);
        entry.set_byte2_maximum(72);
        entry.set_byte3_minimum(1);
        entry.set_byte3_maximum(127);

        assert!(entry.matches(&MidiEvent::from_bytes(0, &[0x95, 0x40, 0x20])));
        // Velocity zero is outside the byte-3 range.
        assert!(!entry.matches(&MidiEvent::from_bytes(0, &[0x95, 0x40, 0x00])));
        // Wrong size.
        assert!(!entry.matches(&MidiEvent::from_bytes(0, &[0x95, 0x40])));
        // Note outside the byte-2 range.
        assert!(!entry.matches(&MidiEvent::from_bytes(0, &[0x95, 0x50, 0x20])));
    }

    #[test]
    fn test_min_max_repair() {
        let entry = FilterEntry::new();
        // Raising the minimum above the maximum drags the maximum up.
        entry.set_byte2_maximum(10);
        entry.set_byte2_minimum(20);
        let config = entry.config();
        assert_eq!(config.byte2_min, 20);
        assert_eq!(config.byte2_max, 20);
        // Lowering the maximum below the minimum drags the minimum down.
        entry.set_byte2_maximum(5);
        let config = entry.config();
        assert_eq!(config.byte2_min, 5);
        assert_eq!(config.byte2_max, 5);
        // The same repair applies to the value interval.
        entry.set_value_minimum(40);
        assert_eq!(entry.config().value_max, 40);
        // And byte 1 stays in the status range.
        entry.set_byte1_minimum(0);
        assert_eq!(entry.config().byte1_min, 128);
    }

    #[test]
    fn test_command_match_wildcards() {
        let entry = FilterEntry::new();
        entry.set_uia_event(UiaEvent::SetTrackVolume);
        entry.set_value_maximum(127);
        assert!(entry.matches_command(UiaEvent::SetTrackVolume, Track::Track3, Slot::Slot1, 64));
        assert!(!entry.matches_command(UiaEvent::SetTrackPan, Track::Track3, Slot::Slot1, 64));

        entry.set_origin_track(Track::Track2);
        assert!(!entry.matches_command(UiaEvent::SetTrackVolume, Track::Track3, Slot::Slot1, 64));
        assert!(entry.matches_command(UiaEvent::SetTrackVolume, Track::Track2, Slot::Slot1, 64));

        entry.set_value_minimum(100);
        assert!(!entry.matches_command(UiaEvent::SetTrackVolume, Track::Track2, Slot::Slot1, 64));
    }

    #[test]
    fn test_rule_list_operations() {
        let entry = FilterEntry::new();
        let first = entry.add_rule(None);
        let second = entry.add_rule(None);
        let inserted = entry.add_rule(Some(1));
        assert_eq!(entry.index_of_rule(&first), Some(0));
        assert_eq!(entry.index_of_rule(&inserted), Some(1));
        assert_eq!(entry.index_of_rule(&second), Some(2));

        entry.swap_rules(0, 2);
        assert_eq!(entry.index_of_rule(&second), Some(0));
        assert_eq!(entry.index_of_rule(&first), Some(2));

        entry.delete_rule(1);
        assert_eq!(entry.rules().len(), 2);
        assert_eq!(entry.index_of_rule(&inserted), None);
    }

    #[test]
    fn test_describe() {
        let entry = FilterEntry::new();
        entry.set_required_bytes(3);
        entry.set_byte1_minimum(0x90);
        entry.set_byte2_minimum(60);
        entry.set_byte3_minimum(100);
        let description = entry.describe(super::super::FilterDirection::Input);
        assert_eq!(
            description,
            "Note On (channel 1, note 60, velocity 100) with no rewrite rules"
        );
        entry.add_rule(None);
        assert!(entry
            .describe(super::super::FilterDirection::Input)
            .ends_with("with 1 rewrite rule"));
    }
}
