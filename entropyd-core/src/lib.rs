// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! entropyd Core Library
//!
//! This crate provides the foundational types for the entropyd server, a
//! local service that condenses the unpredictable timing and positional
//! information of human input events into fixed-size randomness slices and
//! serves them to local clients over a small TCP request/response protocol.
//!
//! # Architecture
//!
//! The library is organized into modules representing core concerns:
//! - `events`: input samples (mouse, key) and their canonical byte encoding
//! - `aggregator`: entropy estimation and slice emission
//! - `slotter`: thread-safe reservoir of completed slices
//! - `protocol`: per-connection request/response state machine
//! - `server`: listening socket and accept loop
//! - `counter`: request statistics shared with the producer side
//! - `config`: configuration management with validation
//! - `error`: unified error types
//!
//! # Data flow
//!
//! ```text
//! input events ──> Aggregator ──slice──> Slotter ──bytes──> Protocol ──> socket
//! ```
//!
//! The producer side (one harvest session owning the current
//! [`Aggregator`](aggregator::Aggregator)) and the consumer side (one task
//! per accepted connection) share exactly two objects: the
//! [`Slotter`](slotter::Slotter) and the
//! [`RequestCounter`](counter::RequestCounter).

pub mod aggregator;
pub mod config;
pub mod counter;
pub mod error;
pub mod events;
pub mod protocol;
pub mod server;
pub mod slotter;

pub use error::{Error, Result};

/// Library version for diagnostics
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of one emitted entropy slice, in bytes
pub const SLICE_BYTES: usize = 20;

/// Well-known TCP port the server listens on
pub const DEFAULT_PORT: u16 = 22062;

/// Size of the per-connection response buffer
pub const DATA_BUF_SIZE: usize = 8192;

/// Largest request payload a single response can carry
pub const MAX_REQUEST_BYTES: usize = DATA_BUF_SIZE - 1;
