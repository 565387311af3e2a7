//! The audio-graph seam.
//!
//! The engine does not own the audio graph; it registers named MIDI ports on
//! an external client and reads/writes per-block event buffers through the
//! [`MidiGraph`] trait. [`LoopbackGraph`] is an in-memory implementation used
//! by the test suites.

use parking_lot::Mutex;
use sketchbox_midi::MidiEvent;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use thiserror::Error;

/// Opaque handle to a registered port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortId(u64);

impl PortId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortDirection {
    Input,
    Output,
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("port registration failed: {0}")]
    Registration(String),
}

/// Failures reported by a per-block event write.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteError {
    /// The event's time is earlier than the most recent event already in the
    /// buffer.
    #[error("event out of order")]
    OutOfOrder,
    /// The buffer has no room left in this block.
    #[error("no buffer space")]
    NoBufferSpace,
}

/// Contract of the external audio-graph client.
///
/// Port registration happens on the UI thread and may fail (the engine treats
/// a failed registration as a disabled port). The per-block buffer operations
/// are called from the realtime thread and must not block or allocate.
pub trait MidiGraph: Send + Sync {
    /// Register a named port. Names are UTF-8.
    fn register_port(&self, name: &str, direction: PortDirection) -> Result<PortId, GraphError>;

    /// Release a port. Guaranteed to be called on rename and on device
    /// destruction.
    fn unregister_port(&self, port: PortId);

    /// Clear an output port's buffer at the start of a block.
    fn clear_buffer(&self, port: PortId);

    /// Number of events waiting in an input port's buffer this block.
    fn event_count(&self, port: PortId) -> u32;

    /// Fetch an event from an input port's buffer by index.
    fn event_get(&self, port: PortId, index: u32) -> Option<MidiEvent>;

    /// Write an event into an output port's buffer at the given block-relative
    /// time.
    fn event_write(&self, port: PortId, time: u32, bytes: &[u8]) -> Result<(), WriteError>;
}

#[derive(Default)]
struct LoopbackPort {
    direction: Option<PortDirection>,
    queued: Vec<MidiEvent>,
    written: Vec<MidiEvent>,
    last_time: u32,
}

/// An in-memory [`MidiGraph`] for driving the router in tests: queue events on
/// an input port, run a block, inspect what landed on the output ports.
///
/// Uses a plain mutex internally, so it is a test double rather than something
/// to put behind a real process callback.
pub struct LoopbackGraph {
    ports: Mutex<HashMap<u64, LoopbackPort>>,
    next_port: AtomicU64,
    capacity: usize,
    refuse_registrations: AtomicBool,
}

impl LoopbackGraph {
    pub fn new() -> Self {
        Self::with_capacity(512)
    }

    /// Limit output buffers to `capacity` events per block, for overflow
    /// testing.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ports: Mutex::new(HashMap::new()),
            next_port: AtomicU64::new(1),
            capacity,
            refuse_registrations: AtomicBool::new(false),
        }
    }

    /// Make subsequent registrations fail, to exercise the disabled-port
    /// path.
    pub fn refuse_registrations(&self, refuse: bool) {
        self.refuse_registrations.store(refuse, Ordering::Release);
    }

    /// Queue an event on an input port for the next block.
    pub fn queue_input(&self, port: PortId, event: MidiEvent) {
        let mut ports = self.ports.lock();
        if let Some(state) = ports.get_mut(&port.raw()) {
            state.queued.push(event);
        }
    }

    /// Events written to an output port this block.
    pub fn written(&self, port: PortId) -> Vec<MidiEvent> {
        let ports = self.ports.lock();
        ports
            .get(&port.raw())
            .map(|state| state.written.clone())
            .unwrap_or_default()
    }

    /// Drop all queued input and written output, between blocks.
    pub fn clear_all(&self) {
        let mut ports = self.ports.lock();
        for state in ports.values_mut() {
            state.queued.clear();
            state.written.clear();
            state.last_time = 0;
        }
    }

    /// Whether a port is currently registered.
    pub fn is_registered(&self, port: PortId) -> bool {
        self.ports.lock().contains_key(&port.raw())
    }

    pub fn port_count(&self) -> usize {
        self.ports.lock().len()
    }
}

impl Default for LoopbackGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MidiGraph for LoopbackGraph {
    fn register_port(&self, name: &str, direction: PortDirection) -> Result<PortId, GraphError> {
        if self.refuse_registrations.load(Ordering::Acquire) {
            return Err(GraphError::Registration(format!(
                "registration refused for {name}"
            )));
        }
        let id = self.next_port.fetch_add(1, Ordering::Relaxed);
        let mut ports = self.ports.lock();
        ports.insert(
            id,
            LoopbackPort {
                direction: Some(direction),
                ..LoopbackPort::default()
            },
        );
        Ok(PortId::new(id))
    }

    fn unregister_port(&self, port: PortId) {
        self.ports.lock().remove(&port.raw());
    }

    fn clear_buffer(&self, port: PortId) {
        let mut ports = self.ports.lock();
        if let Some(state) = ports.get_mut(&port.raw()) {
            state.written.clear();
            state.last_time = 0;
        }
    }

    fn event_count(&self, port: PortId) -> u32 {
        let ports = self.ports.lock();
        ports
            .get(&port.raw())
            .map(|state| state.queued.len() as u32)
            .unwrap_or(0)
    }

    fn event_get(&self, port: PortId, index: u32) -> Option<MidiEvent> {
        let ports = self.ports.lock();
        ports
            .get(&port.raw())
            .and_then(|state| state.queued.get(index as usize).cloned())
    }

    fn event_write(&self, port: PortId, time: u32, bytes: &[u8]) -> Result<(), WriteError> {
        let mut ports = self.ports.lock();
        let state = ports.get_mut(&port.raw()).ok_or(WriteError::NoBufferSpace)?;
        if state.direction != Some(PortDirection::Output) {
            return Err(WriteError::NoBufferSpace);
        }
        if state.written.len() >= self.capacity {
            return Err(WriteError::NoBufferSpace);
        }
        if time < state.last_time {
            return Err(WriteError::OutOfOrder);
        }
        state.written.push(MidiEvent::from_bytes(time, bytes));
        state.last_time = time;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_write() {
        let graph = LoopbackGraph::new();
        let port = graph
            .register_port("sketchbox:out", PortDirection::Output)
            .unwrap();
        graph.event_write(port, 0, &[0x90, 60, 100]).unwrap();
        graph.event_write(port, 4, &[0x80, 60, 0]).unwrap();
        let written = graph.written(port);
        assert_eq!(written.len(), 2);
        assert_eq!(written[1].time, 4);
    }

    #[test]
    fn test_out_of_order_write_rejected() {
        let graph = LoopbackGraph::new();
        let port = graph
            .register_port("sketchbox:out", PortDirection::Output)
            .unwrap();
        graph.event_write(port, 10, &[0xF8]).unwrap();
        assert_eq!(
            graph.event_write(port, 2, &[0xF8]),
            Err(WriteError::OutOfOrder)
        );
        // Same time is fine.
        graph.event_write(port, 10, &[0xF8]).unwrap();
    }

    #[test]
    fn test_capacity_overflow() {
        let graph = LoopbackGraph::with_capacity(2);
        let port = graph
            .register_port("sketchbox:out", PortDirection::Output)
            .unwrap();
        graph.event_write(port, 0, &[0xF8]).unwrap();
        graph.event_write(port, 0, &[0xF8]).unwrap();
        assert_eq!(
            graph.event_write(port, 0, &[0xF8]),
            Err(WriteError::NoBufferSpace)
        );
    }

    #[test]
    fn test_refused_registration() {
        let graph = LoopbackGraph::new();
        graph.refuse_registrations(true);
        assert!(graph
            .register_port("sketchbox:in", PortDirection::Input)
            .is_err());
    }

    #[test]
    fn test_input_queue_iteration() {
        let graph = LoopbackGraph::new();
        let port = graph
            .register_port("sketchbox:in", PortDirection::Input)
            .unwrap();
        graph.queue_input(port, MidiEvent::note_on(0, 0, 60, 100));
        graph.queue_input(port, MidiEvent::note_off(8, 0, 60, 0));
        assert_eq!(graph.event_count(port), 2);
        assert!(graph.event_get(port, 0).unwrap().is_note_on());
        assert!(graph.event_get(port, 1).unwrap().is_note_off());
        assert_eq!(graph.event_get(port, 2), None);
    }
}
