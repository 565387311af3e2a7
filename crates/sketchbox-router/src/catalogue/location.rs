//! Sketchpad addressing: tracks and slots, with in-band sentinels for
//! "unset", "wildcard", and "use the current selection".

use serde::{Deserialize, Serialize};

/// Number of sketchpad tracks.
pub const TRACK_COUNT: usize = 10;

/// Number of slots per track.
pub const SLOT_COUNT: usize = 5;

/// A sketchpad track reference.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Track {
    NoTrack = -3,
    AnyTrack = -2,
    #[default]
    CurrentTrack = -1,
    Track1 = 0,
    Track2 = 1,
    Track3 = 2,
    Track4 = 3,
    Track5 = 4,
    Track6 = 5,
    Track7 = 6,
    Track8 = 7,
    Track9 = 8,
    Track10 = 9,
}

impl Track {
    /// Map a raw index to a track. Sentinel values map to their sentinels;
    /// anything else is clamped into the track range.
    pub fn from_index(index: i32) -> Self {
        match index {
            index if index <= -3 => Track::NoTrack,
            -2 => Track::AnyTrack,
            -1 => Track::CurrentTrack,
            _ => match index.clamp(0, TRACK_COUNT as i32 - 1) {
                0 => Track::Track1,
                1 => Track::Track2,
                2 => Track::Track3,
                3 => Track::Track4,
                4 => Track::Track5,
                5 => Track::Track6,
                6 => Track::Track7,
                7 => Track::Track8,
                8 => Track::Track9,
                _ => Track::Track10,
            },
        }
    }

    /// The raw index, sentinels included.
    #[inline]
    pub fn index(self) -> i32 {
        self as i8 as i32
    }

    /// The sketchpad array index, for concrete tracks only.
    #[inline]
    pub fn sketchpad_index(self) -> Option<usize> {
        let index = self.index();
        (index >= 0).then_some(index as usize)
    }

    pub fn label_text(self) -> String {
        match self {
            Track::NoTrack => "No Track".to_string(),
            Track::AnyTrack => "Any Track".to_string(),
            Track::CurrentTrack => "Current Track".to_string(),
            _ => format!("Track {}", self.index() + 1),
        }
    }
}

/// A slot reference within a track.
#[repr(i8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    NoSlot = -3,
    AnySlot = -2,
    #[default]
    CurrentSlot = -1,
    Slot1 = 0,
    Slot2 = 1,
    Slot3 = 2,
    Slot4 = 3,
    Slot5 = 4,
}

impl Slot {
    /// Map a raw index to a slot, clamping concrete values into range.
    pub fn from_index(index: i32) -> Self {
        match index {
            index if index <= -3 => Slot::NoSlot,
            -2 => Slot::AnySlot,
            -1 => Slot::CurrentSlot,
            _ => match index.clamp(0, SLOT_COUNT as i32 - 1) {
                0 => Slot::Slot1,
                1 => Slot::Slot2,
                2 => Slot::Slot3,
                3 => Slot::Slot4,
                _ => Slot::Slot5,
            },
        }
    }

    #[inline]
    pub fn index(self) -> i32 {
        self as i8 as i32
    }

    #[inline]
    pub fn sketchpad_index(self) -> Option<usize> {
        let index = self.index();
        (index >= 0).then_some(index as usize)
    }

    pub fn label_text(self) -> String {
        match self {
            Slot::NoSlot => "No Slot".to_string(),
            Slot::AnySlot => "Any Slot".to_string(),
            Slot::CurrentSlot => "Current Slot".to_string(),
            _ => format!("Slot {}", self.index() + 1),
        }
    }

    pub fn clip_label_text(self) -> String {
        match self {
            Slot::NoSlot => "No Clip".to_string(),
            Slot::AnySlot => "Any Clip".to_string(),
            Slot::CurrentSlot => "Current Clip".to_string(),
            _ => format!("Clip {}", self.index() + 1),
        }
    }

    pub fn fx_label_text(self) -> String {
        match self {
            Slot::NoSlot => "No FX Slot".to_string(),
            Slot::AnySlot => "Any FX Slot".to_string(),
            Slot::CurrentSlot => "Current FX Slot".to_string(),
            _ => format!("FX Slot {}", self.index() + 1),
        }
    }
}
