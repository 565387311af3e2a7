//! Per-device SysEx bridging.
//!
//! Outgoing messages are composed on the UI thread and queued on a ring the
//! realtime thread flushes at block start; incoming frames are queued on a
//! ring the UI thread parses, recognising the Universal subset and keeping
//! the device's identity up to date.

use crate::graph::{MidiGraph, PortId, WriteError};
use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;
use sketchbox_midi::{MidiEvent, RingBuffer};
use sketchbox_sysex::{parse_frame, DeviceIdentity, IncomingSysex, SysexMessage, UniversalKind};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

pub struct SysexBridge {
    /// The SysEx channel Universal messages target this device on. 0x7F
    /// instructs devices to disregard the channel byte.
    channel: AtomicU8,
    identity: arc_swap::ArcSwapOption<DeviceIdentity>,
    outgoing: RingBuffer<MidiEvent>,
    incoming: RingBuffer<MidiEvent>,
    subscribers: Mutex<Vec<Sender<IncomingSysex>>>,
}

impl Default for SysexBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl SysexBridge {
    pub fn new() -> Self {
        Self {
            channel: AtomicU8::new(0x7F),
            identity: arc_swap::ArcSwapOption::empty(),
            outgoing: RingBuffer::new(),
            incoming: RingBuffer::new(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    #[inline]
    pub fn channel(&self) -> u8 {
        self.channel.load(Ordering::Relaxed)
    }

    pub fn set_channel(&self, channel: u8) {
        self.channel.store(channel.min(0x7F), Ordering::Relaxed);
    }

    /// The identity most recently reported by the device, if any.
    pub fn identity(&self) -> Option<Arc<DeviceIdentity>> {
        self.identity.load_full()
    }

    /// Receive every parsed incoming message.
    pub fn subscribe(&self) -> Receiver<IncomingSysex> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.lock().push(sender);
        receiver
    }

    /// Compose the message and queue it for the next block. UI thread.
    pub fn send(&self, message: &SysexMessage) {
        let identity = self.identity.load_full();
        let frame = message.compose(identity.as_deref());
        self.outgoing.write(MidiEvent::from_bytes(0, &frame));
    }

    /// Flush queued frames into the output buffer. When the buffer fills up
    /// the remaining frames stay queued for the next block, preserving SysEx
    /// ordering. Audio thread only.
    pub(crate) fn write_pending(&self, graph: &dyn MidiGraph, port: PortId) {
        while let Some(event) = self.outgoing.peek() {
            match graph.event_write(port, 0, &event.bytes) {
                Ok(()) => self.outgoing.mark_as_read(),
                Err(WriteError::NoBufferSpace) => break,
                Err(WriteError::OutOfOrder) => {
                    tracing::warn!("sysex frame rejected as out of order, dropping");
                    self.outgoing.mark_as_read();
                }
            }
        }
    }

    /// Queue an incoming SysEx frame for UI-thread parsing. Audio thread
    /// only.
    pub(crate) fn handle_input_event(&self, event: &MidiEvent) {
        self.incoming.write(event.clone());
    }

    /// Parse everything the realtime thread queued, announce the messages,
    /// and materialise identity responses. UI thread.
    pub fn handle_postponed_events(&self) {
        while let Some(event) = self.incoming.read() {
            let Some(incoming) = parse_frame(&event.bytes, self.channel()) else {
                continue;
            };
            if incoming.universal == Some(UniversalKind::IdentityResponse) {
                match DeviceIdentity::from_identity_response(&incoming.message) {
                    Ok(identity) => self.identity.store(Some(Arc::new(identity))),
                    Err(error) => {
                        tracing::warn!(%error, "malformed identity response");
                    }
                }
            }
            self.subscribers
                .lock()
                .retain(|subscriber| subscriber.send(incoming.clone()).is_ok());
        }
    }
}
