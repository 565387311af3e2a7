//! A representation of a routable endpoint as the router knows it.
//!
//! A device may be input-only, output-only, or bidirectional, and covers both
//! hardware controllers and internal endpoints (synth channels, the timecode
//! generator, sequencers). Configuration is written by the UI thread through
//! atomics and copy-on-write snapshots; the block-scoped iteration state is
//! realtime-thread-only.

use crate::catalogue::{Track, UiaCommand};
use crate::filter::{Filter, FilterDirection};
use crate::graph::{MidiGraph, PortDirection, PortId, WriteError};
use crate::sync_timer::SyncTimer;
use crate::sysex::SysexBridge;
use crate::translations::{self, CcTranslationTable};
use arc_swap::ArcSwap;
use parking_lot::RwLock;
use sketchbox_midi::{MidiEvent, RingBuffer};
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicI8, AtomicU8, Ordering};
use std::sync::Arc;

/// Which way events flow through the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceDirection {
    Input,
    Output,
}

impl DeviceDirection {
    #[inline]
    fn bit(self) -> u8 {
        match self {
            DeviceDirection::Input => 1,
            DeviceDirection::Output => 1 << 1,
        }
    }
}

/// What kind of endpoint the device is. A device can be several at once.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeviceType {
    Controller,
    Synth,
    TimecodeGenerator,
    HardwareDevice,
    MasterTrack,
    Sequencer,
}

impl DeviceType {
    #[inline]
    fn bit(self) -> u8 {
        match self {
            DeviceType::Controller => 1,
            DeviceType::Synth => 1 << 1,
            DeviceType::TimecodeGenerator => 1 << 2,
            DeviceType::HardwareDevice => 1 << 3,
            DeviceType::MasterTrack => 1 << 4,
            DeviceType::Sequencer => 1 << 5,
        }
    }
}

#[derive(Clone, Copy, Default)]
struct DevicePorts {
    input: Option<PortId>,
    output: Option<PortId>,
}

/// Block-scoped iteration state, touched only by the audio thread between
/// `process_begin` and `process_end`.
#[derive(Default)]
struct ProcessState {
    input_port: Option<PortId>,
    output_port: Option<PortId>,
    input_event_count: u32,
    next_input_index: u32,
    current_event: MidiEvent,
    most_recent_output_time: u32,
}

pub struct Device {
    id: i32,
    graph: Arc<dyn MidiGraph>,
    sync_timer: Arc<dyn SyncTimer>,

    hardware_id: RwLock<String>,
    external_id: RwLock<String>,
    human_name: RwLock<String>,
    input_port_name: RwLock<String>,
    output_port_name: RwLock<String>,

    ports: ArcSwap<DevicePorts>,
    input_enabled: AtomicBool,
    output_enabled: AtomicBool,
    direction: AtomicU8,
    device_type: AtomicU8,

    receive_from_channel: [AtomicBool; 16],
    send_to_channel: [AtomicBool; 16],
    accepts_note: [AtomicBool; 128],
    transpose: AtomicI32,

    // MPE master-channel reconciliation. All sixteen entries usually carry the
    // same value; the per-channel shape allows split layouts.
    master_channel: [AtomicI8; 16],
    global_master: AtomicI8,
    lower_master_channel: AtomicI8,
    upper_master_channel: AtomicI8,
    note_split_point: AtomicU8,
    last_lower_zone_member_channel: AtomicU8,

    midi_channel_target_track: [AtomicI32; 16],
    note_state: [[AtomicI32; 128]; 16],
    note_activation_track: [[AtomicI32; 128]; 16],

    cc_translation: ArcSwap<CcTranslationTable>,

    send_timecode: AtomicBool,
    send_beat_clock: AtomicBool,

    /// Filter applied to events arriving from this device.
    pub input_filter: Filter,
    /// Filter matched against UIA commands to produce feedback events.
    pub output_filter: Filter,
    /// UIA commands raised by this device, drained by the UI thread.
    pub cuia_ring: RingBuffer<UiaCommand>,
    /// Events queued by non-realtime code, written at the next block start.
    pub midi_output_ring: RingBuffer<MidiEvent>,
    /// Per-device SysEx bridge.
    pub sysex: SysexBridge,

    process: UnsafeCell<ProcessState>,
}

// SAFETY: `process` is only touched from the audio thread, between
// `process_begin` and `process_end`; everything else is atomics, snapshots,
// locks, or rings that manage their own cross-thread discipline.
unsafe impl Sync for Device {}

impl Device {
    pub fn new(id: i32, graph: Arc<dyn MidiGraph>, sync_timer: Arc<dyn SyncTimer>) -> Self {
        Self {
            id,
            graph,
            sync_timer,
            hardware_id: RwLock::new(String::new()),
            external_id: RwLock::new(String::new()),
            human_name: RwLock::new(String::new()),
            input_port_name: RwLock::new(String::new()),
            output_port_name: RwLock::new(String::new()),
            ports: ArcSwap::from_pointee(DevicePorts::default()),
            input_enabled: AtomicBool::new(false),
            output_enabled: AtomicBool::new(false),
            direction: AtomicU8::new(0),
            device_type: AtomicU8::new(0),
            receive_from_channel: std::array::from_fn(|_| AtomicBool::new(true)),
            send_to_channel: std::array::from_fn(|_| AtomicBool::new(true)),
            accepts_note: std::array::from_fn(|_| AtomicBool::new(true)),
            transpose: AtomicI32::new(0),
            master_channel: std::array::from_fn(|_| AtomicI8::new(-1)),
            global_master: AtomicI8::new(-1),
            lower_master_channel: AtomicI8::new(15),
            upper_master_channel: AtomicI8::new(15),
            note_split_point: AtomicU8::new(127),
            last_lower_zone_member_channel: AtomicU8::new(7),
            midi_channel_target_track: std::array::from_fn(|_| AtomicI32::new(-1)),
            note_state: std::array::from_fn(|_| std::array::from_fn(|_| AtomicI32::new(0))),
            note_activation_track: std::array::from_fn(|_| {
                std::array::from_fn(|_| AtomicI32::new(-1))
            }),
            cc_translation: ArcSwap::new(translations::empty_table()),
            send_timecode: AtomicBool::new(true),
            send_beat_clock: AtomicBool::new(true),
            input_filter: Filter::new(FilterDirection::Input),
            output_filter: Filter::new(FilterDirection::Output),
            cuia_ring: RingBuffer::new(),
            midi_output_ring: RingBuffer::new(),
            sysex: SysexBridge::new(),
            process: UnsafeCell::new(ProcessState::default()),
        }
    }

    /// Id assigned at creation. Reconnecting a device produces a new instance
    /// and a new id.
    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    // ------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------

    pub fn hardware_id(&self) -> String {
        self.hardware_id.read().clone()
    }

    pub fn set_hardware_id(&self, hardware_id: &str) {
        *self.hardware_id.write() = hardware_id.to_string();
    }

    pub fn external_id(&self) -> String {
        self.external_id.read().clone()
    }

    pub fn set_external_id(&self, external_id: &str) {
        *self.external_id.write() = external_id.to_string();
    }

    pub fn human_name(&self) -> String {
        self.human_name.read().clone()
    }

    /// Set the human-readable name, applying the known-device lookups: the CC
    /// translation table and the device's MPE master-channel convention.
    pub fn set_human_name(&self, human_name: &str) {
        {
            let mut stored = self.human_name.write();
            if *stored == human_name {
                return;
            }
            *stored = human_name.to_string();
        }
        self.cc_translation
            .store(translations::table_for_device(human_name));
        let master = translations::default_master_channel(human_name);
        for channel in &self.master_channel {
            channel.store(master, Ordering::Relaxed);
        }
    }

    // ------------------------------------------------------------------
    // Ports and gate flags
    // ------------------------------------------------------------------

    pub fn input_port_name(&self) -> String {
        self.input_port_name.read().clone()
    }

    /// Register (or re-register) the device's input port.
    ///
    /// Marks the device as an input device. An empty name unregisters; a
    /// failed registration leaves the device input-disabled.
    pub fn set_input_port_name(&self, port_name: &str) {
        {
            let mut stored = self.input_port_name.write();
            if *stored == port_name {
                return;
            }
            *stored = port_name.to_string();
        }
        self.set_device_direction(DeviceDirection::Input, true);
        let mut ports = **self.ports.load();
        if let Some(port) = ports.input.take() {
            self.graph.unregister_port(port);
        }
        if !port_name.is_empty() {
            match self.graph.register_port(port_name, PortDirection::Input) {
                Ok(port) => ports.input = Some(port),
                Err(error) => {
                    tracing::warn!(%error, port_name, "failed to register input port");
                }
            }
        }
        if ports.input.is_none() {
            self.input_enabled.store(false, Ordering::Release);
        }
        self.ports.store(Arc::new(ports));
    }

    pub fn output_port_name(&self) -> String {
        self.output_port_name.read().clone()
    }

    /// Register (or re-register) the device's output port. See
    /// [`set_input_port_name`](Self::set_input_port_name).
    pub fn set_output_port_name(&self, port_name: &str) {
        {
            let mut stored = self.output_port_name.write();
            if *stored == port_name {
                return;
            }
            *stored = port_name.to_string();
        }
        self.set_device_direction(DeviceDirection::Output, true);
        let mut ports = **self.ports.load();
        if let Some(port) = ports.output.take() {
            self.graph.unregister_port(port);
        }
        if !port_name.is_empty() {
            match self.graph.register_port(port_name, PortDirection::Output) {
                Ok(port) => ports.output = Some(port),
                Err(error) => {
                    tracing::warn!(%error, port_name, "failed to register output port");
                }
            }
        }
        if ports.output.is_none() {
            self.output_enabled.store(false, Ordering::Release);
        }
        self.ports.store(Arc::new(ports));
    }

    /// The registered input port, if any.
    pub fn input_port(&self) -> Option<PortId> {
        self.ports.load().input
    }

    /// The registered output port, if any.
    pub fn output_port(&self) -> Option<PortId> {
        self.ports.load().output
    }

    #[inline]
    pub fn input_enabled(&self) -> bool {
        self.input_enabled.load(Ordering::Acquire)
    }

    pub fn set_input_enabled(&self, enabled: bool) {
        self.input_enabled.store(enabled, Ordering::Release);
    }

    #[inline]
    pub fn output_enabled(&self) -> bool {
        self.output_enabled.load(Ordering::Acquire)
    }

    pub fn set_output_enabled(&self, enabled: bool) {
        self.output_enabled.store(enabled, Ordering::Release);
    }

    pub fn set_device_direction(&self, direction: DeviceDirection, supported: bool) {
        if supported {
            self.direction.fetch_or(direction.bit(), Ordering::AcqRel);
        } else {
            self.direction.fetch_and(!direction.bit(), Ordering::AcqRel);
        }
    }

    #[inline]
    pub fn supports_direction(&self, direction: DeviceDirection) -> bool {
        self.direction.load(Ordering::Acquire) & direction.bit() != 0
    }

    pub fn set_device_type(&self, device_type: DeviceType, is_type: bool) {
        if is_type {
            self.device_type.fetch_or(device_type.bit(), Ordering::AcqRel);
        } else {
            self.device_type
                .fetch_and(!device_type.bit(), Ordering::AcqRel);
        }
    }

    #[inline]
    pub fn is_type(&self, device_type: DeviceType) -> bool {
        self.device_type.load(Ordering::Acquire) & device_type.bit() != 0
    }

    // ------------------------------------------------------------------
    // Channel and note masks
    // ------------------------------------------------------------------

    /// Mark whether events arriving on the given channels are collected.
    pub fn set_received_channels(&self, channels: &[u8], receive: bool) {
        for &channel in channels {
            if let Some(flag) = self.receive_from_channel.get(channel as usize) {
                flag.store(receive, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub fn receives_channel(&self, channel: u8) -> bool {
        self.receive_from_channel[channel as usize & 0x0F].load(Ordering::Relaxed)
    }

    /// Mark whether events are sent to the given channels.
    pub fn set_send_to_channels(&self, channels: &[u8], send_to: bool) {
        for &channel in channels {
            if let Some(flag) = self.send_to_channel.get(channel as usize) {
                flag.store(send_to, Ordering::Relaxed);
            }
        }
    }

    #[inline]
    pub fn sends_to_channel(&self, channel: u8) -> bool {
        self.send_to_channel[channel as usize & 0x0F].load(Ordering::Relaxed)
    }

    /// Set the acceptability of the listed notes. With `set_others_opposite`,
    /// every note not in the list is first set to the opposite state.
    pub fn set_accepted_notes(&self, notes: &[u8], accepted: bool, set_others_opposite: bool) {
        if set_others_opposite {
            for flag in &self.accepts_note {
                flag.store(!accepted, Ordering::Relaxed);
            }
        }
        for &note in notes {
            self.accepts_note[note.min(127) as usize].store(accepted, Ordering::Relaxed);
        }
    }

    pub fn set_accepts_note(&self, note: u8, accepted: bool) {
        self.accepts_note[note.min(127) as usize].store(accepted, Ordering::Relaxed);
    }

    #[inline]
    pub fn accepts_note(&self, note: u8) -> bool {
        self.accepts_note[note.min(127) as usize].load(Ordering::Relaxed)
    }

    /// Amount notes sent to the device are transposed by, clamped to ±127.
    pub fn set_transpose(&self, transpose: i32) {
        self.transpose
            .store(transpose.clamp(-127, 127), Ordering::Relaxed);
    }

    #[inline]
    pub fn transpose(&self) -> i32 {
        self.transpose.load(Ordering::Relaxed)
    }

    pub fn set_send_timecode(&self, send: bool) {
        self.send_timecode.store(send, Ordering::Relaxed);
    }

    #[inline]
    pub fn send_timecode(&self) -> bool {
        self.send_timecode.load(Ordering::Relaxed)
    }

    pub fn set_send_beat_clock(&self, send: bool) {
        self.send_beat_clock.store(send, Ordering::Relaxed);
    }

    #[inline]
    pub fn send_beat_clock(&self) -> bool {
        self.send_beat_clock.load(Ordering::Relaxed)
    }

    // ------------------------------------------------------------------
    // MPE master channels
    // ------------------------------------------------------------------

    /// Inform the device of the engine-wide master channel it should be
    /// normalised to.
    pub fn set_global_master_channel(&self, global_master: i8) {
        self.global_master
            .store(global_master.clamp(-1, 15), Ordering::Relaxed);
    }

    #[inline]
    pub fn global_master_channel(&self) -> i8 {
        self.global_master.load(Ordering::Relaxed)
    }

    /// Set the device-master for a given incoming channel, or for all sixteen
    /// when `channel` is -1.
    pub fn set_master_channel(&self, channel: i32, master: i8) {
        let master = master.clamp(-1, 15);
        if channel == -1 {
            for entry in &self.master_channel {
                entry.store(master, Ordering::Relaxed);
            }
        } else {
            self.master_channel[channel.clamp(0, 15) as usize].store(master, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn master_channel(&self, channel: u8) -> i8 {
        self.master_channel[channel as usize & 0x0F].load(Ordering::Relaxed)
    }

    pub fn lower_master_channel(&self) -> i8 {
        self.lower_master_channel.load(Ordering::Relaxed)
    }

    pub fn set_lower_master_channel(&self, channel: i8) {
        self.lower_master_channel
            .store(channel.clamp(0, 15), Ordering::Relaxed);
        self.recompute_zone_masters();
    }

    pub fn upper_master_channel(&self) -> i8 {
        self.upper_master_channel.load(Ordering::Relaxed)
    }

    pub fn set_upper_master_channel(&self, channel: i8) {
        self.upper_master_channel
            .store(channel.clamp(0, 15), Ordering::Relaxed);
        self.recompute_zone_masters();
    }

    pub fn note_split_point(&self) -> u8 {
        self.note_split_point.load(Ordering::Relaxed)
    }

    /// The last note of the lower zone; 127 means an all-lower split.
    pub fn set_note_split_point(&self, split_point: u8) {
        self.note_split_point
            .store(split_point.min(127), Ordering::Relaxed);
    }

    pub fn last_lower_zone_member_channel(&self) -> u8 {
        self.last_lower_zone_member_channel.load(Ordering::Relaxed)
    }

    pub fn set_last_lower_zone_member_channel(&self, channel: u8) {
        self.last_lower_zone_member_channel
            .store(channel.min(15), Ordering::Relaxed);
        self.recompute_zone_masters();
    }

    // Zone settings express which channels belong to which zone; the remap
    // itself works from the per-channel master array.
    fn recompute_zone_masters(&self) {
        let lower = self.lower_master_channel.load(Ordering::Relaxed);
        let upper = self.upper_master_channel.load(Ordering::Relaxed);
        let last_lower = self.last_lower_zone_member_channel.load(Ordering::Relaxed);
        for (channel, entry) in self.master_channel.iter().enumerate() {
            let master = if channel as u8 <= last_lower { lower } else { upper };
            entry.store(master, Ordering::Relaxed);
        }
    }

    /// Rewrite an outgoing event's channel from the engine's master-channel
    /// convention to the device's.
    ///
    /// MPE reserves one channel of a zone as its master; when the device and
    /// the engine disagree on which channel that is, the channels between the
    /// two masters slide one slot so that both endpoints see their master in
    /// the expected place. Pure byte rewrite; SysEx and other non-channel
    /// events pass unchanged. [`device_to_engine`](Self::device_to_engine) is
    /// the exact inverse.
    pub fn engine_to_device(&self, event: &mut MidiEvent) {
        let Some(status) = event.status() else { return };
        if !(0x80..0xF0).contains(&status) {
            return;
        }
        let event_channel = (status & 0x0F) as i32;
        let master = self.master_channel[event_channel as usize].load(Ordering::Relaxed) as i32;
        let global = self.global_master.load(Ordering::Relaxed) as i32;
        if master > -1 && master != global {
            let outside = (event_channel > global && event_channel > master)
                || (event_channel < global && event_channel < master);
            if !outside {
                if event_channel > global {
                    event.bytes[0] = status - 1;
                } else if event_channel < global {
                    event.bytes[0] = status + 1;
                } else {
                    event.bytes[0] = (status as i32 - global + master) as u8;
                }
            }
        }
    }

    /// Rewrite an incoming event's channel from the device's master-channel
    /// convention to the engine's. Inverse of
    /// [`engine_to_device`](Self::engine_to_device).
    pub fn device_to_engine(&self, event: &mut MidiEvent) {
        let Some(status) = event.status() else { return };
        if !(0x80..0xF0).contains(&status) {
            return;
        }
        let event_channel = (status & 0x0F) as i32;
        let master = self.master_channel[event_channel as usize].load(Ordering::Relaxed) as i32;
        let global = self.global_master.load(Ordering::Relaxed) as i32;
        if master > -1 && master != global {
            let outside = (event_channel > master && event_channel > global)
                || (event_channel < master && event_channel < global);
            if !outside {
                if event_channel > master {
                    event.bytes[0] = status - 1;
                } else if event_channel < master {
                    event.bytes[0] = status + 1;
                } else {
                    event.bytes[0] = (status as i32 - master + global) as u8;
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Target tracks and note tallies
    // ------------------------------------------------------------------

    /// Lock messages arriving on a channel to a sketchpad track. `channel` -1
    /// sets all channels; `track` -1 restores routing to the current track.
    pub fn set_midi_channel_target_track(&self, channel: i32, track: i32) {
        if channel == -1 {
            for entry in &self.midi_channel_target_track {
                entry.store(track, Ordering::Relaxed);
            }
        } else {
            self.midi_channel_target_track[channel.clamp(0, 15) as usize]
                .store(track, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn target_track_for_channel(&self, channel: u8) -> i32 {
        self.midi_channel_target_track[channel as usize & 0x0F].load(Ordering::Relaxed)
    }

    /// Track a note activation or deactivation.
    ///
    /// Activations count, so overlapping plays of the same note are retired
    /// correctly when the device goes away. The sketchpad track is recorded
    /// when the count leaves zero and cleared when it returns there.
    pub fn set_note_active(&self, track: Track, channel: u8, note: u8, active: bool) {
        if channel > 15 || note > 127 {
            tracing::warn!(channel, note, active, "note activation out of range");
            return;
        }
        let state = &self.note_state[channel as usize][note as usize];
        let activation_track = &self.note_activation_track[channel as usize][note as usize];
        if active {
            if state.fetch_add(1, Ordering::Relaxed) == 0 {
                activation_track.store(track.index(), Ordering::Relaxed);
            }
        } else {
            let remaining = state.fetch_sub(1, Ordering::Relaxed) - 1;
            if remaining == 0 {
                activation_track.store(-1, Ordering::Relaxed);
            } else if remaining < 0 {
                tracing::warn!(channel, note, "note-off without matching note-on");
            }
        }
    }

    /// Current activation count for a note: positive while active, negative
    /// when note-offs were lost.
    #[inline]
    pub fn note_activation_state(&self, channel: u8, note: u8) -> i32 {
        self.note_state[channel.min(15) as usize][note.min(127) as usize].load(Ordering::Relaxed)
    }

    /// The sketchpad track that owns the current activation of a note, or
    /// [`Track::CurrentTrack`]'s index -1 when inactive.
    #[inline]
    pub fn note_activation_track(&self, channel: u8, note: u8) -> i32 {
        self.note_activation_track[channel.min(15) as usize][note.min(127) as usize]
            .load(Ordering::Relaxed)
    }

    /// Zero all activation counters.
    pub fn reset_note_activation(&self) {
        for channel in &self.note_state {
            for note in channel {
                note.store(0, Ordering::Relaxed);
            }
        }
    }

    // ------------------------------------------------------------------
    // Realtime block processing
    // ------------------------------------------------------------------

    /// Prepare the device for a block: fetch and clear the output buffer,
    /// flush queued SysEx, and prime the first input event.
    ///
    /// Audio thread only.
    pub fn process_begin(&self, _nframes: u32) {
        // SAFETY: audio thread only, per the process-state contract.
        let state = unsafe { &mut *self.process.get() };
        let ports = self.ports.load();
        state.output_port = ports.output;
        if let Some(port) = state.output_port {
            self.graph.clear_buffer(port);
            self.sysex.write_pending(self.graph.as_ref(), port);
        }
        state.most_recent_output_time = 0;
        state.next_input_index = 0;
        state.current_event.clear();
        state.input_port = ports.input;
        if let Some(port) = state.input_port {
            state.input_event_count = self.graph.event_count(port);
            self.next_input_event();
        } else {
            state.input_event_count = 0;
        }
    }

    /// The event most recently fetched by
    /// [`next_input_event`](Self::next_input_event); empty when the input is
    /// exhausted. Audio thread only.
    #[inline]
    pub fn current_input_event(&self) -> &MidiEvent {
        // SAFETY: audio thread only.
        unsafe { &(*self.process.get()).current_event }
    }

    /// Fetch the next input event, normalising it on the way in: the channel
    /// is rewritten to the engine's master-channel convention and known CC
    /// quirks are substituted (time code left intact). Audio thread only.
    pub fn next_input_event(&self) {
        // SAFETY: audio thread only.
        let state = unsafe { &mut *self.process.get() };
        state.current_event.clear();
        if let Some(port) = state.input_port {
            if state.next_input_index < state.input_event_count {
                match self.graph.event_get(port, state.next_input_index) {
                    Some(event) => {
                        state.current_event = event;
                        self.device_to_engine_current(state);
                    }
                    None => {
                        tracing::warn!(
                            index = state.next_input_index,
                            count = state.input_event_count,
                            "input event lost"
                        );
                    }
                }
            }
        }
        state.next_input_index += 1;
    }

    fn device_to_engine_current(&self, state: &mut ProcessState) {
        self.device_to_engine(&mut state.current_event);
        if state.current_event.is_control_change() {
            let table = self.cc_translation.load();
            if let Some(replacement) = table.lookup(state.current_event.bytes[1]) {
                let time = state.current_event.time;
                state.current_event = MidiEvent::from_bytes(time, replacement);
            }
        }
    }

    /// Write an event to the device's output buffer.
    ///
    /// Applies, in order: the accepted-notes mask (rejected notes are
    /// dropped), the engine-to-device channel remap, the channel override (a
    /// value of -1 leaves the channel alone), and the transpose amount. The
    /// caller's buffer is restored afterwards, remap included. Audio thread
    /// only.
    pub fn write_event_to_output(&self, event: &mut MidiEvent, override_channel: i32) {
        if event.is_empty() {
            return;
        }
        let is_note_message = event.is_note_message();
        if is_note_message && !self.accepts_note(event.bytes[1]) {
            return;
        }
        self.engine_to_device(event);
        let event_channel = (event.bytes[0] & 0x0F) as i32;
        let override_applies = override_channel > -1 && event.is_channel_voice();
        if override_applies {
            event.bytes[0] = (event.bytes[0] as i32 - event_channel + override_channel) as u8;
        }
        let original_note = if is_note_message { event.bytes[1] } else { 0 };
        if is_note_message {
            let transpose = self.transpose.load(Ordering::Relaxed);
            event.bytes[1] = (original_note as i32 + transpose).clamp(0, 127) as u8;
        }
        // SAFETY: audio thread only.
        let state = unsafe { &mut *self.process.get() };
        if let Some(port) = state.output_port {
            let mut result = self.graph.event_write(port, event.time, &event.bytes);
            if result == Err(WriteError::OutOfOrder) {
                // Out of order means the event belongs earlier than the most
                // recently written one; schedule it alongside that instead.
                result =
                    self.graph
                        .event_write(port, state.most_recent_output_time, &event.bytes);
            }
            match result {
                Ok(()) => {}
                Err(WriteError::NoBufferSpace) => {
                    tracing::warn!(device = self.id, "ran out of space while writing events");
                }
                Err(WriteError::OutOfOrder) => {
                    tracing::warn!(device = self.id, time = event.time, "dropped out-of-order event");
                }
            }
            if state.most_recent_output_time < event.time {
                state.most_recent_output_time = event.time;
            }
        }
        if is_note_message {
            event.bytes[1] = original_note;
        }
        if override_applies {
            event.bytes[0] = (event.bytes[0] as i32 - override_channel + event_channel) as u8;
        }
        self.device_to_engine(event);
    }

    /// Release the block's buffer handles. Audio thread only.
    pub fn process_end(&self) {
        // SAFETY: audio thread only.
        let state = unsafe { &mut *self.process.get() };
        state.output_port = None;
        state.input_port = None;
        state.next_input_index = 0;
        state.input_event_count = 0;
        state.current_event.clear();
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        // Pull down the ports first so the realtime thread can no longer see
        // the device, then retire every note the device left hanging.
        self.set_input_port_name("");
        self.set_output_port_name("");
        for channel in 0..16u8 {
            for note in 0..128u8 {
                let activations = self.note_activation_state(channel, note);
                let track = Track::from_index(self.note_activation_track(channel, note));
                for _ in 0..activations {
                    self.sync_timer
                        .send_note_immediately(note, channel, false, 0, track);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::LoopbackGraph;
    use parking_lot::Mutex;

    #[derive(Default)]
    pub(crate) struct RecordingSyncTimer {
        pub notes: Mutex<Vec<(u8, u8, bool, u8, Track)>>,
    }

    impl SyncTimer for RecordingSyncTimer {
        fn send_note_immediately(
            &self,
            note: u8,
            channel: u8,
            active: bool,
            velocity: u8,
            track: Track,
        ) {
            self.notes.lock().push((note, channel, active, velocity, track));
        }
    }

    fn test_device() -> (Device, Arc<LoopbackGraph>, Arc<RecordingSyncTimer>) {
        let graph = Arc::new(LoopbackGraph::new());
        let timer = Arc::new(RecordingSyncTimer::default());
        let device = Device::new(1, graph.clone(), timer.clone());
        (device, graph, timer)
    }

    #[test]
    fn test_defaults() {
        let (device, _, _) = test_device();
        for channel in 0..16 {
            assert!(device.receives_channel(channel));
            assert!(device.sends_to_channel(channel));
            assert_eq!(device.master_channel(channel), -1);
            assert_eq!(device.target_track_for_channel(channel), -1);
        }
        for note in 0..128 {
            assert!(device.accepts_note(note));
            assert_eq!(device.note_activation_state(0, note), 0);
            assert_eq!(device.note_activation_track(0, note), -1);
        }
        assert_eq!(device.global_master_channel(), -1);
        assert!(!device.input_enabled());
        assert!(!device.output_enabled());
    }

    #[test]
    fn test_master_remap_round_trip() {
        let (device, _, _) = test_device();
        device.set_global_master_channel(15);
        device.set_master_channel(-1, 0);

        // The device's master channel 0 is normalised to the engine master 15.
        let mut event = MidiEvent::from_bytes(0, &[0x90, 60, 100]);
        device.device_to_engine(&mut event);
        assert_eq!(event.bytes.as_slice(), &[0x9F, 60, 100]);
        device.engine_to_device(&mut event);
        assert_eq!(event.bytes.as_slice(), &[0x90, 60, 100]);
    }

    #[test]
    fn test_member_channels_slide_toward_vacated_master() {
        let (device, _, _) = test_device();
        device.set_global_master_channel(15);
        device.set_master_channel(-1, 0);

        // Device members 1..=15 land on engine members 0..=14, preserving the
        // MPE member layout around the relocated master.
        let mut event = MidiEvent::from_bytes(0, &[0x97, 0x3C, 0x50]);
        device.device_to_engine(&mut event);
        assert_eq!(event.bytes.as_slice(), &[0x96, 0x3C, 0x50]);
        device.engine_to_device(&mut event);
        assert_eq!(event.bytes.as_slice(), &[0x97, 0x3C, 0x50]);
    }

    #[test]
    fn test_remap_leaves_non_channel_events_alone() {
        let (device, _, _) = test_device();
        device.set_global_master_channel(15);
        device.set_master_channel(-1, 0);
        let mut clock = MidiEvent::from_bytes(0, &[0xF8]);
        device.device_to_engine(&mut clock);
        assert_eq!(clock.bytes.as_slice(), &[0xF8]);
        let mut sysex = MidiEvent::from_bytes(0, &[0xF0, 0x7E, 0x7F, 0x06, 0x01, 0xF7]);
        device.engine_to_device(&mut sysex);
        assert_eq!(sysex.bytes[0], 0xF0);
    }

    #[test]
    fn test_remap_inverse_property() {
        use proptest::prelude::*;

        proptest!(|(
            global in 0i8..16,
            master in 0i8..16,
            status in 0x80u8..0xF0,
            data1 in 0u8..128,
            data2 in 0u8..128,
        )| {
            let (device, _, _) = test_device();
            device.set_global_master_channel(global);
            device.set_master_channel(-1, master);
            let original = MidiEvent::from_bytes(0, &[status, data1, data2]);

            let mut event = original.clone();
            device.device_to_engine(&mut event);
            device.engine_to_device(&mut event);
            prop_assert_eq!(&event, &original);

            let mut event = original.clone();
            device.engine_to_device(&mut event);
            device.device_to_engine(&mut event);
            prop_assert_eq!(&event, &original);
        });
    }

    #[test]
    fn test_zone_masters() {
        let (device, _, _) = test_device();
        device.set_lower_master_channel(0);
        device.set_upper_master_channel(15);
        device.set_last_lower_zone_member_channel(7);
        for channel in 0..=7 {
            assert_eq!(device.master_channel(channel), 0);
        }
        for channel in 8..16 {
            assert_eq!(device.master_channel(channel), 15);
        }
    }

    #[test]
    fn test_note_activation_counting() {
        let (device, _, _) = test_device();
        device.set_note_active(Track::Track2, 2, 60, true);
        device.set_note_active(Track::Track5, 2, 60, true);
        assert_eq!(device.note_activation_state(2, 60), 2);
        // The owning track is the one recorded at the 0 -> 1 transition.
        assert_eq!(device.note_activation_track(2, 60), Track::Track2.index());

        device.set_note_active(Track::Track2, 2, 60, false);
        assert_eq!(device.note_activation_state(2, 60), 1);
        assert_eq!(device.note_activation_track(2, 60), Track::Track2.index());
        device.set_note_active(Track::Track2, 2, 60, false);
        assert_eq!(device.note_activation_state(2, 60), 0);
        assert_eq!(device.note_activation_track(2, 60), -1);
    }

    #[test]
    fn test_activation_sum_matches_on_minus_off() {
        let (device, _, _) = test_device();
        let mut expected = 0i32;
        for (note, on_count, off_count) in [(60u8, 3, 1), (61, 2, 2), (62, 1, 0)] {
            for _ in 0..on_count {
                device.set_note_active(Track::Track1, 0, note, true);
                expected += 1;
            }
            for _ in 0..off_count {
                device.set_note_active(Track::Track1, 0, note, false);
                expected -= 1;
            }
        }
        let sum: i32 = (0..16)
            .flat_map(|channel| (0..128).map(move |note| (channel, note)))
            .map(|(channel, note)| device.note_activation_state(channel, note))
            .sum();
        assert_eq!(sum, expected);
    }

    #[test]
    fn test_hanging_notes_retired_on_drop() {
        let (device, _, timer) = test_device();
        for _ in 0..3 {
            device.set_note_active(Track::Track2, 2, 60, true);
        }
        drop(device);
        let notes = timer.notes.lock();
        assert_eq!(notes.len(), 3);
        for entry in notes.iter() {
            assert_eq!(*entry, (60, 2, false, 0, Track::Track2));
        }
    }

    #[test]
    fn test_port_registration_lifecycle() {
        let (device, graph, _) = test_device();
        device.set_input_port_name("sketchbox:pad-in");
        assert!(device.supports_direction(DeviceDirection::Input));
        assert_eq!(graph.port_count(), 1);

        // Renaming swaps the registration.
        device.set_input_port_name("sketchbox:pad-in-2");
        assert_eq!(graph.port_count(), 1);

        // An empty name pulls the port down.
        device.set_input_port_name("");
        assert_eq!(graph.port_count(), 0);
        assert!(!device.input_enabled());
    }

    #[test]
    fn test_failed_registration_disables_input() {
        let (device, graph, _) = test_device();
        device.set_input_enabled(true);
        graph.refuse_registrations(true);
        device.set_input_port_name("sketchbox:pad-in");
        assert!(!device.input_enabled());
        assert_eq!(graph.port_count(), 0);
    }

    #[test]
    fn test_accepted_notes_mask() {
        let (device, _, _) = test_device();
        device.set_accepted_notes(&[60, 61], true, true);
        assert!(device.accepts_note(60));
        assert!(device.accepts_note(61));
        assert!(!device.accepts_note(62));
        device.set_accepts_note(62, true);
        assert!(device.accepts_note(62));
    }

    #[test]
    fn test_rejected_note_is_dropped_on_write() {
        let (device, graph, _) = test_device();
        device.set_output_port_name("sketchbox:out");
        let port = device.output_port().unwrap();
        device.set_accepted_notes(&[60], false, false);
        device.process_begin(128);

        let mut rejected = MidiEvent::note_on(0, 0, 60, 100);
        device.write_event_to_output(&mut rejected, -1);
        let mut accepted = MidiEvent::note_on(0, 0, 61, 100);
        device.write_event_to_output(&mut accepted, -1);
        // Non-note messages are not subject to the mask.
        let mut cc = MidiEvent::control_change(0, 0, 60, 1);
        device.write_event_to_output(&mut cc, -1);

        device.process_end();
        let written = graph.written(port);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].bytes[1], 61);
        assert!(written[1].is_control_change());
    }

    #[test]
    fn test_write_restores_caller_buffer() {
        let (device, graph, _) = test_device();
        device.set_output_port_name("sketchbox:out");
        device.set_global_master_channel(15);
        device.set_master_channel(-1, 0);
        device.set_transpose(12);
        device.process_begin(128);

        let mut event = MidiEvent::from_bytes(4, &[0x9F, 60, 100]);
        let original = event.clone();
        device.write_event_to_output(&mut event, 3);
        assert_eq!(event, original);

        device.process_end();
        let port = device.output_port().unwrap();
        let written = graph.written(port);
        assert_eq!(written.len(), 1);
        // Engine master 15 went to device master 0, then the override moved it
        // to channel 3, and the note was transposed up an octave.
        assert_eq!(written[0].bytes.as_slice(), &[0x93, 72, 100]);
    }

    #[test]
    fn test_out_of_order_write_retries_at_most_recent_time() {
        let (device, graph, _) = test_device();
        device.set_output_port_name("sketchbox:out");
        device.process_begin(128);

        let mut late = MidiEvent::note_on(100, 0, 60, 10);
        device.write_event_to_output(&mut late, -1);
        let mut early = MidiEvent::note_on(4, 0, 61, 10);
        device.write_event_to_output(&mut early, -1);

        device.process_end();
        let port = device.output_port().unwrap();
        let written = graph.written(port);
        assert_eq!(written.len(), 2);
        assert_eq!(written[0].time, 100);
        // The early event was clamped forward to the most recent write time.
        assert_eq!(written[1].time, 100);
        assert_eq!(written[1].bytes[1], 61);
    }

    #[test]
    fn test_input_iteration_with_cc_translation() {
        let (device, graph, _) = test_device();
        device.set_input_port_name("sketchbox:in");
        device.set_human_name("PreSonus ATM SQ ATM SQ");
        let port = device.input_port().unwrap();
        graph.queue_input(port, MidiEvent::control_change(7, 0, 85, 64));
        graph.queue_input(port, MidiEvent::note_on(9, 0, 60, 100));

        device.process_begin(128);
        // CC 85 became a stop byte, time preserved.
        assert_eq!(device.current_input_event().bytes.as_slice(), &[0xFC]);
        assert_eq!(device.current_input_event().time, 7);
        device.next_input_event();
        assert!(device.current_input_event().is_note_on());
        device.next_input_event();
        assert!(device.current_input_event().is_empty());
        device.process_end();
    }
}
