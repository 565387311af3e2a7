//! # Sketchbox - realtime MIDI routing and transformation engine
//!
//! Umbrella crate for the Sketchbox appliance core, coordinating:
//! - **sketchbox-midi** - RT-safe event and ring buffer primitives
//! - **sketchbox-sysex** - SysEx framing, Universal messages, device identity
//! - **sketchbox-router** - devices, filters, MPE remapping, the router core
//!
//! ## Quick start
//!
//! ```
//! use std::sync::Arc;
//! use sketchbox::{LoopbackGraph, Router, SyncTimer, Track};
//!
//! struct NoFallback;
//! impl SyncTimer for NoFallback {
//!     fn send_note_immediately(
//!         &self,
//!         _note: u8,
//!         _channel: u8,
//!         _active: bool,
//!         _velocity: u8,
//!         _track: Track,
//!     ) {
//!     }
//! }
//!
//! let graph = Arc::new(LoopbackGraph::new());
//! let router = Router::new(graph.clone(), Arc::new(NoFallback));
//!
//! let pad = router.add_device();
//! pad.set_input_port_name("sketchbox:pad-in");
//! pad.set_input_enabled(true);
//!
//! let synth = router.add_device();
//! synth.set_output_port_name("sketchbox:synth-out");
//! synth.set_output_enabled(true);
//! router.set_track_outputs(Track::Track1, vec![synth.clone()]);
//!
//! // Once per block, from the audio-graph callback:
//! router.process(128);
//! // Asynchronously, from the UI thread:
//! router.service_events();
//! ```

/// Re-export of the routing core for direct access.
pub use sketchbox_router as router;

/// Re-export of the SysEx subsystem for direct access.
pub use sketchbox_sysex as sysex;

/// Re-export of the MIDI primitives for direct access.
pub use sketchbox_midi as midi;

// Core types
pub use sketchbox_midi::{MidiEvent, RingBuffer};

pub use sketchbox_router::{
    ByteSource, Device, DeviceDirection, DeviceType, EventSize, Filter, FilterDirection,
    FilterEntry, GraphError, LoopbackGraph, MidiGraph, PortDirection, PortId, RewriteRule,
    Router, RuleType, Slot, SyncTimer, SysexBridge, Track, UiaCommand, UiaEvent, ValueSource,
    WriteError,
};

pub use sketchbox_sysex::{
    bytes_to_number, number_to_bytes, DataAlignment, DeviceIdentity, KnownMessage,
    MessageSettings, SysexMessage, UniversalKind,
};
