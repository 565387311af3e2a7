//! Realtime MIDI routing and transformation core for the Sketchbox engine.
//!
//! Sits between an audio-graph process callback and the UI layer: raw MIDI
//! comes in from an arbitrary set of devices each block, per-device filters
//! match and rewrite it (into replacement MIDI on a destination, or into UI
//! action commands), MPE master-channel conventions are reconciled against the
//! engine's global master, and hanging notes are retired when a device goes
//! away. Lock-free rings carry commands and queued events between the
//! realtime thread and the UI thread.
//!
//! # Threads
//!
//! - The **realtime thread** runs [`Router::process_begin`],
//!   [`Router::process_block`], and [`Router::process_end`] once per block.
//!   It never allocates, blocks, or takes locks.
//! - The **UI thread** owns configuration (filter mutation, device
//!   registration, channel masks) and services the command rings via
//!   [`Router::service_events`]. Configuration reaches the realtime thread
//!   through copy-on-write snapshots.

pub mod error;
pub use error::{Error, Result};

pub mod catalogue;
pub use catalogue::{Slot, Track, UiaCommand, UiaEvent};

pub mod graph;
pub use graph::{GraphError, LoopbackGraph, MidiGraph, PortDirection, PortId, WriteError};

mod sync_timer;
pub use sync_timer::SyncTimer;

pub mod translations;
pub use translations::CcTranslationTable;

mod device;
pub use device::{Device, DeviceDirection, DeviceType};

pub mod filter;
pub use filter::{
    ByteSource, EntryConfig, EventSize, Filter, FilterDirection, FilterEntry, RewriteRule,
    RuleConfig, RuleType, ValueSource,
};

mod sysex;
pub use sysex::SysexBridge;

mod router;
pub use router::Router;

pub use sketchbox_midi::{MidiEvent, RingBuffer};
