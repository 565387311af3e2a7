//! Ordered match/rewrite filters.
//!
//! A filter is an ordered list of entries; the first entry whose predicate
//! holds wins. The realtime thread only ever reads the current list snapshot;
//! all mutation copies the list and swaps the pointer, so a half-mutated list
//! is never observable.

mod entry;
mod rule;

pub use entry::{EntryConfig, FilterEntry};
pub use rule::{ByteSource, EventSize, RewriteRule, RuleConfig, RuleType, ValueSource};

use crate::catalogue::{Slot, Track, UiaEvent};
use crate::device::Device;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use sketchbox_midi::MidiEvent;
use std::sync::Arc;

/// Which side of a device the filter sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterDirection {
    /// Applied to events arriving from the device.
    Input,
    /// Matched against UIA commands to produce feedback for the device.
    Output,
}

pub struct Filter {
    direction: FilterDirection,
    entries: ArcSwap<Vec<Arc<FilterEntry>>>,
}

impl Filter {
    pub fn new(direction: FilterDirection) -> Self {
        Self {
            direction,
            entries: ArcSwap::from_pointee(Vec::new()),
        }
    }

    #[inline]
    pub fn direction(&self) -> FilterDirection {
        self.direction
    }

    /// Snapshot of the entry list.
    pub fn entries(&self) -> Arc<Vec<Arc<FilterEntry>>> {
        self.entries.load_full()
    }

    /// Insert a new entry at the given position (append when `None` or out of
    /// bounds) and return it.
    pub fn create_entry(&self, index: Option<usize>) -> Arc<FilterEntry> {
        let entry = Arc::new(FilterEntry::new());
        let mut entries = (*self.entries.load_full()).clone();
        match index {
            Some(index) if index < entries.len() => entries.insert(index, Arc::clone(&entry)),
            _ => entries.push(Arc::clone(&entry)),
        }
        self.entries.store(Arc::new(entries));
        entry
    }

    /// Remove the entry at the given position; out-of-bounds indices are
    /// ignored.
    pub fn delete_entry(&self, index: usize) {
        let mut entries = (*self.entries.load_full()).clone();
        if index < entries.len() {
            entries.remove(index);
            self.entries.store(Arc::new(entries));
        }
    }

    pub fn index_of(&self, entry: &Arc<FilterEntry>) -> Option<usize> {
        self.entries
            .load()
            .iter()
            .position(|candidate| Arc::ptr_eq(candidate, entry))
    }

    /// Swap two entries by position; does nothing unless both are in range.
    pub fn swap_entries(&self, first: usize, second: usize) {
        let mut entries = (*self.entries.load_full()).clone();
        if first < entries.len() && second < entries.len() {
            entries.swap(first, second);
            self.entries.store(Arc::new(entries));
        }
    }

    /// Find the first entry matching the event and mangle it (fill the rule
    /// scratch buffers, raise UI commands on the origin's ring).
    ///
    /// Matching walks the list in order, so when several entries match only
    /// the first one's rules run. Audio thread only.
    pub fn match_event(&self, origin: &Device, event: &MidiEvent) -> Option<Arc<FilterEntry>> {
        let entries = self.entries.load();
        for entry in entries.iter() {
            if entry.matches(event) {
                entry.mangle(event, origin);
                return Some(Arc::clone(entry));
            }
        }
        None
    }

    /// Find the first entry matching a UIA command (output direction).
    pub fn match_command(
        &self,
        uia_event: UiaEvent,
        track: Track,
        slot: Slot,
        value: u8,
    ) -> Option<Arc<FilterEntry>> {
        let entries = self.entries.load();
        for entry in entries.iter() {
            if entry.matches_command(uia_event, track, slot, value) {
                return Some(Arc::clone(entry));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_list_mutation() {
        let filter = Filter::new(FilterDirection::Input);
        let first = filter.create_entry(None);
        let second = filter.create_entry(None);
        assert_eq!(filter.index_of(&first), Some(0));

        filter.swap_entries(0, 1);
        assert_eq!(filter.index_of(&second), Some(0));
        assert_eq!(filter.index_of(&first), Some(1));

        filter.delete_entry(0);
        assert_eq!(filter.entries().len(), 1);
        assert_eq!(filter.index_of(&second), None);

        // A snapshot taken before a mutation is unaffected by it.
        let snapshot = filter.entries();
        filter.create_entry(None);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(filter.entries().len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let filter = Filter::new(FilterDirection::Output);
        let first = filter.create_entry(None);
        first.set_uia_event(UiaEvent::SetTrackVolume);
        first.set_value_maximum(127);
        let second = filter.create_entry(None);
        second.set_uia_event(UiaEvent::SetTrackVolume);
        second.set_value_maximum(127);

        let matched = filter
            .match_command(UiaEvent::SetTrackVolume, Track::Track1, Slot::Slot1, 10)
            .unwrap();
        assert!(Arc::ptr_eq(&matched, &first));

        // After a swap the other entry is found first.
        filter.swap_entries(0, 1);
        let matched = filter
            .match_command(UiaEvent::SetTrackVolume, Track::Track1, Slot::Slot1, 10)
            .unwrap();
        assert!(Arc::ptr_eq(&matched, &second));
    }
}
