//! Entropy estimation and slice emission
//!
//! The aggregator turns an arbitrary-length stream of input events into one
//! fixed-size slice. Every event is absorbed into an incremental hash; a
//! separate, deliberately conservative estimator decides when enough
//! unpredictability has accumulated. The hash absorbs liberally, the
//! estimator is strict: samples that fail the contribution predicate still
//! perturb the digest, they just do not advance the counter.

use sha2::{Digest, Sha256};

use crate::events::{InputEvent, KeySample, MouseSample};
use crate::SLICE_BYTES;

/// Entropy target for one slice, in bits
pub const TARGET_BITS: u32 = (SLICE_BYTES as u32) * 8;

/// Heuristic estimator parameters
///
/// The per-sample credits are not cryptographically derived; they gate the
/// "enough" decision and are exposed through configuration so deployments
/// can harden or relax the threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tunables {
    /// Bits credited per contributing mouse sample
    pub mouse_bits_per_sample: f64,
    /// Bits credited per contributing key sample
    pub key_bits_per_sample: f64,
    /// Minimum interval between two contributing samples
    pub debounce_ms: u32,
}

impl Default for Tunables {
    fn default() -> Self {
        Self {
            mouse_bits_per_sample: 1.5,
            key_bits_per_sample: 1.0,
            debounce_ms: 100,
        }
    }
}

/// One-shot converter from an input-event stream to a single entropy slice
///
/// # Lifecycle
///
/// Construct with the cursor position snapshot, feed events through
/// [`handle`](Self::handle) until [`enough_entropy`](Self::enough_entropy)
/// reports true, then [`prepare_slice`](Self::prepare_slice) and
/// [`take_slice`](Self::take_slice). Taking the slice consumes the
/// aggregator; the driver constructs a fresh one for the next slice.
pub struct Aggregator {
    entropy_bits: f64,
    requested_bits: u32,
    last_pos: (i32, i32),
    last_scan: u8,
    last_tick_ms: u32,
    hasher: Sha256,
    output: Option<[u8; SLICE_BYTES]>,
    tunables: Tunables,
}

impl Aggregator {
    /// Start a new harvest with the current cursor position as baseline
    pub fn new(cursor_pos: (i32, i32), tunables: Tunables) -> Self {
        Self {
            entropy_bits: 0.0,
            requested_bits: TARGET_BITS,
            last_pos: cursor_pos,
            last_scan: 0,
            last_tick_ms: 0,
            hasher: Sha256::new(),
            output: None,
            tunables,
        }
    }

    /// Running entropy estimate, in bits
    pub fn entropy(&self) -> f64 {
        self.entropy_bits
    }

    /// Target bit count for one slice
    pub fn requested(&self) -> u32 {
        self.requested_bits
    }

    /// True once the estimate has reached the target
    pub fn enough_entropy(&self) -> bool {
        self.entropy_bits >= f64::from(self.requested_bits)
    }

    /// Absorb one event; returns true if it advanced the estimate
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        match event {
            InputEvent::Mouse(sample) => self.handle_mouse(sample),
            InputEvent::Key(sample) => self.handle_key(sample),
        }
    }

    /// Absorb a mouse sample
    ///
    /// The sample always enters the hash. It contributes to the estimate
    /// only if the cursor actually moved and the debounce window since the
    /// last contribution has passed.
    pub fn handle_mouse(&mut self, sample: &MouseSample) -> bool {
        self.hasher.update(sample.to_bytes());

        if (sample.x, sample.y) != self.last_pos
            && sample.tick_ms.wrapping_sub(self.last_tick_ms) > self.tunables.debounce_ms
        {
            self.last_pos = (sample.x, sample.y);
            self.last_tick_ms = sample.tick_ms;
            self.entropy_bits += self.tunables.mouse_bits_per_sample;
            return true;
        }

        false
    }

    /// Absorb a key sample
    ///
    /// Releases always contribute; presses contribute only for a new scan
    /// code outside the debounce window.
    pub fn handle_key(&mut self, sample: &KeySample) -> bool {
        self.hasher.update(sample.to_bytes());

        if sample.is_up
            || (sample.scan_code != self.last_scan
                && sample.tick_ms.wrapping_sub(self.last_tick_ms) > self.tunables.debounce_ms)
        {
            self.last_scan = sample.scan_code;
            self.last_tick_ms = sample.tick_ms;
            self.entropy_bits += self.tunables.key_bits_per_sample;
            return true;
        }

        false
    }

    /// Finalize the hash into the internal slice buffer
    ///
    /// Must be called only once [`enough_entropy`](Self::enough_entropy) is
    /// true. The digest is truncated to [`SLICE_BYTES`].
    pub fn prepare_slice(&mut self) {
        debug_assert!(self.enough_entropy());

        let digest = self.hasher.finalize_reset();
        let mut slice = [0u8; SLICE_BYTES];
        slice.copy_from_slice(&digest[..SLICE_BYTES]);
        self.output = Some(slice);
    }

    /// Transfer the prepared slice out, consuming the aggregator
    ///
    /// # Panics
    ///
    /// Panics if [`prepare_slice`](Self::prepare_slice) was not called.
    pub fn take_slice(self) -> [u8; SLICE_BYTES] {
        self.output
            .expect("prepare_slice must be called before take_slice")
    }
}
