// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! Error types for the entropyd system
//!
//! Provides a unified error taxonomy using `thiserror` for ergonomic error
//! handling.

pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for entropyd operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration validation failed
    #[error("Configuration error: {0}")]
    Config(String),

    /// Harvest session could not be started or continued
    #[error("Session error: {0}")]
    Session(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
