//! Thread-safe reservoir of completed entropy slices
//!
//! The slotter decouples producer cadence from consumer demand: the harvest
//! session pushes whole slices, clients withdraw arbitrary byte counts. A
//! withdrawal is all-or-nothing and drains strictly in FIFO byte order,
//! spanning slice boundaries when needed. At most one slice is ever in a
//! partially drained state; it lives outside the queue until exhausted.

use bytes::{Buf, Bytes};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Thread-safe FIFO of entropy slices with byte-granular withdrawal
///
/// Cloning is cheap and shares the underlying reservoir; the producer task
/// and every connection task hold a clone.
#[derive(Clone)]
pub struct Slotter {
    inner: Arc<Mutex<SlotterInner>>,
}

struct SlotterInner {
    slice_bytes: usize,
    slots: VecDeque<Bytes>,
    /// Remainder of the slice currently being drained byte-by-byte
    partial: Option<Bytes>,
    /// Bytes immediately withdrawable; kept in step with `slots` + `partial`
    available: u32,
}

impl Slotter {
    /// Create a reservoir for slices of `slice_bytes` each
    pub fn new(slice_bytes: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SlotterInner {
                slice_bytes,
                slots: VecDeque::new(),
                partial: None,
                available: 0,
            })),
        }
    }

    /// Configured slice length
    pub fn slice_bytes(&self) -> usize {
        self.inner.lock().slice_bytes
    }

    /// Append one completed slice to the tail of the reservoir
    ///
    /// Empty input is silently ignored. The slice must be exactly
    /// `slice_bytes` long.
    pub fn push(&self, slice: impl Into<Bytes>) {
        let slice = slice.into();
        if slice.is_empty() {
            return;
        }

        let mut inner = self.inner.lock();
        debug_assert_eq!(slice.len(), inner.slice_bytes);
        inner.available += inner.slice_bytes as u32;
        inner.slots.push_back(slice);
    }

    /// Bytes immediately withdrawable
    pub fn available(&self) -> u32 {
        self.inner.lock().available
    }

    /// Atomic all-or-nothing withdrawal of `dst.len()` bytes
    ///
    /// Returns false and writes nothing if the reservoir holds fewer bytes
    /// than requested. Otherwise fills `dst` with the oldest unreturned
    /// bytes, in push order.
    pub fn request(&self, dst: &mut [u8]) -> bool {
        let count = dst.len() as u32;
        let mut inner = self.inner.lock();

        if count > inner.available {
            return false;
        }

        let mut filled = 0usize;
        while filled < dst.len() {
            let mut part = match inner.partial.take() {
                Some(part) => part,
                None => match inner.slots.pop_front() {
                    Some(slot) => slot,
                    // Unreachable while the `available` accounting holds
                    None => break,
                },
            };

            let take = part.len().min(dst.len() - filled);
            part.copy_to_slice(&mut dst[filled..filled + take]);
            filled += take;

            if !part.is_empty() {
                inner.partial = Some(part);
            }
        }

        debug_assert_eq!(filled, dst.len());
        inner.available -= count;
        true
    }

    #[cfg(test)]
    fn derived_available(&self) -> u32 {
        let inner = self.inner.lock();
        let queued: usize = inner.slots.iter().map(Bytes::len).sum();
        let partial = inner.partial.as_ref().map_or(0, Bytes::len);
        (queued + partial) as u32
    }
}
