//! Fixed catalogues: the UIA command set and the sketchpad addressing scheme.

mod location;
pub use location::{Slot, Track, SLOT_COUNT, TRACK_COUNT};

mod uia;
pub use uia::{UiaCommand, UiaEvent};
