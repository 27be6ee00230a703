// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! Request statistics shared between the network side and the progress
//! display

use parking_lot::Mutex;
use std::sync::Arc;

/// Point-in-time view of the request statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Size of the most recent request
    pub last_size: i32,
    /// Size of the most recent successfully served request
    pub last_success_size: i32,
    /// Largest request seen so far
    pub max_size: i32,
    /// Largest successfully served request so far
    pub max_success_size: i32,
    /// Total requests handled
    pub count: i32,
    /// Requests answered with entropy
    pub success_count: i32,
}

/// Thread-safe request counter
///
/// Cloning shares the underlying state; every connection task records into
/// the same counter the progress display reads from.
#[derive(Clone, Default)]
pub struct RequestCounter {
    inner: Arc<Mutex<CounterSnapshot>>,
}

impl RequestCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one handled request and whether it was served
    pub fn register_request(&self, size: i32, success: bool) {
        let mut counter = self.inner.lock();

        counter.last_size = size;
        if counter.last_size > counter.max_size {
            counter.max_size = counter.last_size;
        }
        counter.count += 1;

        if success {
            counter.last_success_size = size;
            if counter.last_success_size > counter.max_success_size {
                counter.max_success_size = counter.last_success_size;
            }
            counter.success_count += 1;
        }
    }

    /// Snapshot the current statistics
    pub fn get(&self) -> CounterSnapshot {
        *self.inner.lock()
    }
}
