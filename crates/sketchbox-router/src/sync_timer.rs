//! Scheduled note fallback.

use crate::catalogue::Track;

/// Consumer for note-off fallbacks.
///
/// When a device disappears with notes still sounding, the engine submits one
/// immediate note-off per outstanding activation here, tagged with the
/// sketchpad track the activation was routed to.
pub trait SyncTimer: Send + Sync {
    fn send_note_immediately(&self, note: u8, channel: u8, active: bool, velocity: u8, track: Track);
}
