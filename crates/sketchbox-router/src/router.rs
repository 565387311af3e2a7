//! The router core: the per-block process step and the UI-thread servicing
//! loop.

use crate::catalogue::{Track, UiaCommand, UiaEvent, TRACK_COUNT};
use crate::device::{Device, DeviceType};
use crate::graph::MidiGraph;
use crate::sync_timer::SyncTimer;
use arc_swap::ArcSwap;
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use sketchbox_midi::MidiEvent;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Which output devices serve each sketchpad track. Owned by higher-level
/// code, exposed to the router as a snapshot.
#[derive(Clone, Default)]
struct TrackRouting {
    outputs: [Vec<Arc<Device>>; TRACK_COUNT],
}

pub struct Router {
    graph: Arc<dyn MidiGraph>,
    sync_timer: Arc<dyn SyncTimer>,
    devices: ArcSwap<Vec<Arc<Device>>>,
    track_outputs: ArcSwap<TrackRouting>,
    current_track: AtomicI32,
    next_device_id: AtomicI32,
    uia_subscribers: Mutex<Vec<Sender<UiaCommand>>>,
}

impl Router {
    pub fn new(graph: Arc<dyn MidiGraph>, sync_timer: Arc<dyn SyncTimer>) -> Self {
        Self {
            graph,
            sync_timer,
            devices: ArcSwap::from_pointee(Vec::new()),
            track_outputs: ArcSwap::from_pointee(TrackRouting::default()),
            current_track: AtomicI32::new(0),
            next_device_id: AtomicI32::new(0),
            uia_subscribers: Mutex::new(Vec::new()),
        }
    }

    // ------------------------------------------------------------------
    // Registry
    // ------------------------------------------------------------------

    /// Create a device and announce it to the realtime thread.
    pub fn add_device(&self) -> Arc<Device> {
        let id = self.next_device_id.fetch_add(1, Ordering::Relaxed);
        let device = Arc::new(Device::new(
            id,
            Arc::clone(&self.graph),
            Arc::clone(&self.sync_timer),
        ));
        let mut devices = (*self.devices.load_full()).clone();
        devices.push(Arc::clone(&device));
        self.devices.store(Arc::new(devices));
        tracing::debug!(id, "device added");
        device
    }

    /// Withdraw a device from routing. Dropping the returned handle (and any
    /// others) retires the device's hanging notes.
    pub fn remove_device(&self, id: i32) -> Option<Arc<Device>> {
        let mut devices = (*self.devices.load_full()).clone();
        let position = devices.iter().position(|device| device.id() == id)?;
        let removed = devices.remove(position);
        self.devices.store(Arc::new(devices));

        let mut routing = (*self.track_outputs.load_full()).clone();
        for outputs in &mut routing.outputs {
            outputs.retain(|device| device.id() != id);
        }
        self.track_outputs.store(Arc::new(routing));
        tracing::debug!(id, "device removed");
        Some(removed)
    }

    pub fn device(&self, id: i32) -> Option<Arc<Device>> {
        self.devices
            .load()
            .iter()
            .find(|device| device.id() == id)
            .cloned()
    }

    /// Snapshot of every registered device.
    pub fn devices(&self) -> Arc<Vec<Arc<Device>>> {
        self.devices.load_full()
    }

    /// The currently-selected sketchpad track.
    pub fn current_track(&self) -> Track {
        Track::from_index(self.current_track.load(Ordering::Relaxed))
    }

    /// Select a sketchpad track; sentinel values are ignored.
    pub fn set_current_track(&self, track: Track) {
        if let Some(index) = track.sketchpad_index() {
            self.current_track.store(index as i32, Ordering::Relaxed);
        }
    }

    /// Replace the output devices serving a track.
    pub fn set_track_outputs(&self, track: Track, outputs: Vec<Arc<Device>>) {
        let Some(index) = track.sketchpad_index() else {
            return;
        };
        let mut routing = (*self.track_outputs.load_full()).clone();
        routing.outputs[index] = outputs;
        self.track_outputs.store(Arc::new(routing));
    }

    /// Receive every UIA command raised by any device.
    pub fn subscribe_uia(&self) -> Receiver<UiaCommand> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.uia_subscribers.lock().push(sender);
        receiver
    }

    // ------------------------------------------------------------------
    // Realtime path
    // ------------------------------------------------------------------

    /// Start a block: prepare every device and write out events queued by
    /// non-realtime code. Audio thread only.
    pub fn process_begin(&self, nframes: u32) {
        let devices = self.devices.load();
        for device in devices.iter() {
            device.process_begin(nframes);
            while let Some(mut event) = device.midi_output_ring.read() {
                event.time = 0;
                device.write_event_to_output(&mut event, -1);
            }
        }
    }

    /// Route every input-enabled device's events. Audio thread only.
    pub fn process_block(&self) {
        let devices = self.devices.load();
        let routing = self.track_outputs.load();
        for device in devices.iter() {
            if !device.input_enabled() {
                continue;
            }
            if device.is_type(DeviceType::TimecodeGenerator) {
                self.disseminate_clock(device, &devices);
                continue;
            }
            loop {
                let event = device.current_input_event().clone();
                if event.is_empty() {
                    break;
                }
                self.route_event(device, event, &routing);
                device.next_input_event();
            }
        }
    }

    /// Finish a block. Audio thread only.
    pub fn process_end(&self) {
        let devices = self.devices.load();
        for device in devices.iter() {
            device.process_end();
        }
    }

    /// The whole block step, for callers that do not need to interleave work
    /// between the phases.
    pub fn process(&self, nframes: u32) {
        self.process_begin(nframes);
        self.process_block();
        self.process_end();
    }

    fn current_track_index(&self) -> usize {
        self.current_track.load(Ordering::Relaxed).clamp(0, TRACK_COUNT as i32 - 1) as usize
    }

    fn resolve_track(&self, track: Track) -> usize {
        track
            .sketchpad_index()
            .unwrap_or_else(|| self.current_track_index())
    }

    fn route_event(&self, origin: &Arc<Device>, mut event: MidiEvent, routing: &TrackRouting) {
        if event.is_sysex() {
            origin.sysex.handle_input_event(&event);
            return;
        }
        if let Some(channel) = event.channel() {
            if !origin.receives_channel(channel) {
                return;
            }
        }
        // Matching mangles: rule scratch buffers fill up and UI commands land
        // on the origin's ring.
        let matched = origin.input_filter.match_event(origin, &event);
        let track_index = match &matched {
            Some(entry) => self.resolve_track(entry.config().target_track),
            None => {
                let channel = event.channel().unwrap_or(0);
                let target = origin.target_track_for_channel(channel);
                if target >= 0 {
                    (target as usize).min(TRACK_COUNT - 1)
                } else {
                    self.current_track_index()
                }
            }
        };
        if event.is_note_message() {
            let channel = event.channel().unwrap_or(0);
            origin.set_note_active(
                Track::from_index(track_index as i32),
                channel,
                event.bytes[1],
                event.is_note_on(),
            );
        }
        let outputs = &routing.outputs[track_index];
        match matched {
            Some(entry) => {
                for target in outputs {
                    if target.output_enabled() {
                        entry.write_event_to_device(target);
                    }
                }
            }
            None => {
                for target in outputs {
                    if target.output_enabled() {
                        target.write_event_to_output(&mut event, -1);
                    }
                }
            }
        }
    }

    // Beat-clock and timecode bytes from the generator go to every output
    // device that asked for them, instead of through track routing.
    fn disseminate_clock(&self, generator: &Arc<Device>, devices: &[Arc<Device>]) {
        loop {
            let event = generator.current_input_event().clone();
            if event.is_empty() {
                break;
            }
            let status = event.bytes[0];
            let is_beat_clock = matches!(status, 0xF8 | 0xFA | 0xFB | 0xFC);
            let is_timecode = status == 0xF1;
            if is_beat_clock || is_timecode {
                for target in devices {
                    if !target.output_enabled() || target.id() == generator.id() {
                        continue;
                    }
                    if (is_beat_clock && target.send_beat_clock())
                        || (is_timecode && target.send_timecode())
                    {
                        let mut out = event.clone();
                        target.write_event_to_output(&mut out, -1);
                    }
                }
            }
            generator.next_input_event();
        }
    }

    // ------------------------------------------------------------------
    // UI-thread servicing
    // ------------------------------------------------------------------

    /// Drain every device's command ring, forward the commands to
    /// subscribers, feed them back through the output filters, and run
    /// UI-side SysEx parsing. UI thread.
    pub fn service_events(&self) {
        let devices = self.devices.load();
        for device in devices.iter() {
            while let Some(command) = device.cuia_ring.read() {
                if command.event == UiaEvent::None {
                    continue;
                }
                self.uia_subscribers
                    .lock()
                    .retain(|subscriber| subscriber.send(command).is_ok());
                self.feed_back_command(&command, &devices);
            }
            device.sysex.handle_postponed_events();
        }
    }

    /// Offer a UIA command to every device's output filter; matches queue
    /// their rewritten events for the next block. Also used by higher-level
    /// code to reflect UI state changes back onto controllers.
    pub fn feed_back_command(&self, command: &UiaCommand, devices: &[Arc<Device>]) {
        let current_track = self.current_track();
        for device in devices {
            if let Some(entry) = device.output_filter.match_command(
                command.event,
                command.track,
                command.slot,
                command.value,
            ) {
                entry.queue_command_to_device(device, command, current_track);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::Slot;
    use crate::graph::LoopbackGraph;

    struct NullSyncTimer;

    impl SyncTimer for NullSyncTimer {
        fn send_note_immediately(
            &self,
            _note: u8,
            _channel: u8,
            _active: bool,
            _velocity: u8,
            _track: Track,
        ) {
        }
    }

    fn test_router() -> (Router, Arc<LoopbackGraph>) {
        let graph = Arc::new(LoopbackGraph::new());
        let router = Router::new(graph.clone(), Arc::new(NullSyncTimer));
        (router, graph)
    }

    #[test]
    fn test_registry_operations() {
        let (router, _) = test_router();
        let first = router.add_device();
        let second = router.add_device();
        assert_ne!(first.id(), second.id());
        assert_eq!(router.devices().len(), 2);
        assert!(router.device(first.id()).is_some());

        router.set_track_outputs(Track::Track1, vec![Arc::clone(&second)]);
        let removed = router.remove_device(second.id()).unwrap();
        assert_eq!(removed.id(), second.id());
        assert_eq!(router.devices().len(), 1);
        assert!(router.device(second.id()).is_none());
        // The routing table no longer references the removed device.
        assert!(router.track_outputs.load().outputs[0].is_empty());
    }

    #[test]
    fn test_current_track_selection() {
        let (router, _) = test_router();
        assert_eq!(router.current_track(), Track::Track1);
        router.set_current_track(Track::Track4);
        assert_eq!(router.current_track(), Track::Track4);
        // Sentinels leave the selection alone.
        router.set_current_track(Track::AnyTrack);
        assert_eq!(router.current_track(), Track::Track4);
    }

    #[test]
    fn test_feedback_queues_midi_for_matched_commands() {
        let (router, _) = test_router();
        let device = router.add_device();
        let entry = device.output_filter.create_entry(None);
        entry.set_uia_event(UiaEvent::SetTrackVolume);
        entry.set_value_maximum(127);
        let rule = entry.add_rule(None);
        rule.set_byte_size(crate::filter::EventSize::Three);
        rule.set_byte_source(0, crate::filter::ByteSource::Explicit(0x30))
            .unwrap();
        rule.set_add_channel(0, true);
        rule.set_byte_source(1, crate::filter::ByteSource::Explicit(0x07))
            .unwrap();
        rule.set_byte_source(2, crate::filter::ByteSource::OriginalByte3)
            .unwrap();

        let command = UiaCommand {
            event: UiaEvent::SetTrackVolume,
            origin: -1,
            track: Track::Track3,
            slot: Slot::CurrentSlot,
            value: 99,
        };
        router.feed_back_command(&command, &router.devices());

        let queued = device.midi_output_ring.read().unwrap();
        // Status 0xB0 plus the track index, CC 7, the command value.
        assert_eq!(queued.bytes.as_slice(), &[0xB2, 0x07, 99]);
        assert!(device.midi_output_ring.read().is_none());
    }
}
