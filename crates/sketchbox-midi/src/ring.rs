//! Fixed-capacity single-producer/single-consumer ring with per-slot
//! acknowledge flags.
//!
//! The realtime thread must never block or allocate, so the ring prefers
//! progress over back-pressure: a write into a slot whose previous payload was
//! never read logs a warning and overwrites it.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Capacity used by all of the engine's rings.
pub const DEFAULT_RING_CAPACITY: usize = 512;

struct Slot<T> {
    processed: AtomicBool,
    value: UnsafeCell<T>,
}

/// A circular single-producer/single-consumer queue.
///
/// Each slot carries a `processed` flag: the producer clears it on write, the
/// consumer sets it on read. The flag is the only cross-thread handoff
/// (release on publish, acquire on observe); each head is owned exclusively by
/// its side.
///
/// Exactly one thread may write and exactly one thread may read. The consumer
/// calls [`read`](Self::read) (or [`peek`](Self::peek) followed by
/// [`mark_as_read`](Self::mark_as_read)) until it returns `None`.
pub struct RingBuffer<T> {
    slots: Box<[Slot<T>]>,
    write_head: AtomicUsize,
    read_head: AtomicUsize,
}

// SAFETY: slot payloads are handed between exactly one producer and one
// consumer through the `processed` flag; neither side touches a payload the
// flag assigns to the other, except for the documented saturation overwrite.
unsafe impl<T: Send> Send for RingBuffer<T> {}
unsafe impl<T: Send> Sync for RingBuffer<T> {}

impl<T: Default> RingBuffer<T> {
    /// Create a ring with [`DEFAULT_RING_CAPACITY`] slots.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RING_CAPACITY)
    }

    /// Create a ring with the given number of slots.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "ring capacity must be non-zero");
        let slots = (0..capacity)
            .map(|_| Slot {
                processed: AtomicBool::new(true),
                value: UnsafeCell::new(T::default()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();
        Self {
            slots,
            write_head: AtomicUsize::new(0),
            read_head: AtomicUsize::new(0),
        }
    }
}

impl<T: Default> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RingBuffer<T> {
    /// Number of slots in the ring.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    fn advance(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.slots.len() {
            0
        } else {
            next
        }
    }

    /// Store a value into the current write slot and advance the write head.
    ///
    /// If the slot still holds unread data the write proceeds anyway; stalling
    /// the realtime thread would be worse than losing the oldest entry.
    ///
    /// Producer side only.
    pub fn write(&self, value: T) {
        let index = self.write_head.load(Ordering::Relaxed);
        let slot = &self.slots[index];
        if !slot.processed.load(Ordering::Acquire) {
            tracing::warn!(
                index,
                capacity = self.slots.len(),
                "ring saturated, overwriting unread slot"
            );
        }
        // SAFETY: this is the single producer, and the slot is either
        // acknowledged or being deliberately overwritten per the saturation
        // policy above.
        unsafe {
            *slot.value.get() = value;
        }
        slot.processed.store(false, Ordering::Release);
        self.write_head.store(self.advance(index), Ordering::Relaxed);
    }

    /// Whether the slot at the read head holds unread data.
    ///
    /// Consumer side only.
    #[inline]
    pub fn has_pending(&self) -> bool {
        let index = self.read_head.load(Ordering::Relaxed);
        !self.slots[index].processed.load(Ordering::Acquire)
    }

    /// Borrow the unread value at the read head without consuming it.
    ///
    /// Used when the consumer may have to retry later (for example when the
    /// output buffer it forwards into is full). Consumer side only.
    pub fn peek(&self) -> Option<&T> {
        let index = self.read_head.load(Ordering::Relaxed);
        let slot = &self.slots[index];
        if slot.processed.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: single consumer; the producer does not touch an
        // unacknowledged slot outside of the saturation overwrite.
        Some(unsafe { &*slot.value.get() })
    }

    /// Acknowledge the slot at the read head and advance past it, without
    /// touching the payload.
    ///
    /// Consumer side only.
    pub fn mark_as_read(&self) {
        let index = self.read_head.load(Ordering::Relaxed);
        self.slots[index].processed.store(true, Ordering::Release);
        self.read_head.store(self.advance(index), Ordering::Relaxed);
    }
}

impl<T: Default> RingBuffer<T> {
    /// Take the value at the read head, acknowledge the slot, and advance.
    ///
    /// Returns `None` when the ring is empty. Consumer side only.
    pub fn read(&self) -> Option<T> {
        let index = self.read_head.load(Ordering::Relaxed);
        let slot = &self.slots[index];
        if slot.processed.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: single consumer, unread slot; the payload is replaced with a
        // default so no value is ever observed twice.
        let value = unsafe { std::mem::take(&mut *slot.value.get()) };
        slot.processed.store(true, Ordering::Release);
        self.read_head.store(self.advance(index), Ordering::Relaxed);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read_in_order() {
        let ring = RingBuffer::<u32>::with_capacity(8);
        assert!(!ring.has_pending());
        for value in 0..5u32 {
            ring.write(value);
        }
        for expected in 0..5u32 {
            assert_eq!(ring.read(), Some(expected));
        }
        assert_eq!(ring.read(), None);
    }

    #[test]
    fn test_full_capacity_round_trip() {
        // Writing N <= capacity items with no interleaved reads leaves exactly
        // those items observable, in write order.
        let ring = RingBuffer::<u32>::with_capacity(512);
        for value in 0..512u32 {
            ring.write(value);
        }
        for expected in 0..512u32 {
            assert_eq!(ring.read(), Some(expected));
        }
        assert_eq!(ring.read(), None);
    }

    #[test]
    fn test_saturation_overwrites_oldest() {
        let ring = RingBuffer::<u32>::with_capacity(4);
        for value in 0..6u32 {
            ring.write(value);
        }
        // Slots 0 and 1 were overwritten by 4 and 5; the read head has not
        // moved, so the next reads land on the newest data first.
        assert_eq!(ring.read(), Some(4));
        assert_eq!(ring.read(), Some(5));
        assert_eq!(ring.read(), Some(2));
        assert_eq!(ring.read(), Some(3));
        assert_eq!(ring.read(), None);
    }

    #[test]
    fn test_peek_does_not_consume() {
        let ring = RingBuffer::<u32>::with_capacity(4);
        ring.write(7);
        assert_eq!(ring.peek(), Some(&7));
        assert_eq!(ring.peek(), Some(&7));
        ring.mark_as_read();
        assert_eq!(ring.peek(), None);
        assert!(!ring.has_pending());
    }

    #[test]
    fn test_mark_as_read_skips_payload() {
        let ring = RingBuffer::<u32>::with_capacity(4);
        ring.write(1);
        ring.write(2);
        ring.mark_as_read();
        assert_eq!(ring.read(), Some(2));
    }

    #[test]
    fn test_cross_thread_handoff() {
        use std::sync::Arc;

        // Capacity exceeds the write count, so nothing is ever overwritten.
        let ring = Arc::new(RingBuffer::<u64>::with_capacity(2048));
        let writer = {
            let ring = Arc::clone(&ring);
            std::thread::spawn(move || {
                for value in 1..=1000u64 {
                    ring.write(value);
                    if value % 128 == 0 {
                        std::thread::sleep(std::time::Duration::from_micros(50));
                    }
                }
            })
        };
        let mut seen = Vec::new();
        while seen.len() < 1000 {
            if let Some(value) = ring.read() {
                seen.push(value);
            } else {
                std::thread::yield_now();
            }
        }
        writer.join().unwrap();
        assert_eq!(seen, (1..=1000u64).collect::<Vec<_>>());
    }
}
