// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! entropyd - local user-seeded entropy server
//!
//! Harvests the unpredictable timing of human input, condenses it into
//! fixed-size randomness slices through a cryptographic hash, and serves
//! those bytes to local clients over a small TCP request/response protocol.
//!
//! ```text
//! stdin keys ──> HarvestSession ──slice──> Slotter <──request── clients
//! ```
//!
//! The producer side runs on the main task; the network side runs in its
//! own tasks and shares only the slotter and the request counter.

mod input;
mod session;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use entropyd_core::config::ServerConfig;
use entropyd_core::counter::RequestCounter;
use entropyd_core::slotter::Slotter;
use entropyd_core::{server, SLICE_BYTES};

use session::HarvestSession;

#[derive(Parser, Debug)]
#[command(name = "entropyd")]
#[command(about = "Harvests user-input entropy and serves it over TCP", long_about = None)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .parse::<tracing::Level>()
        .unwrap_or(tracing::Level::INFO);

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(true)
        .json()
        .init();

    info!("entropyd v{}", entropyd_core::VERSION);

    info!("Loading configuration from environment variables");
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let addr = config.listen_addr().context("Invalid listen address")?;

    info!("Listen address: {}", addr);
    info!(
        "Estimator: {} bits/mouse sample, {} bits/key sample, {} ms debounce",
        config.mouse_bits_per_sample, config.key_bits_per_sample, config.debounce_ms
    );

    let slotter = Slotter::new(SLICE_BYTES);
    let counter = RequestCounter::new();

    let listener = server::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    let cancel = CancellationToken::new();

    // Ctrl+C ends the process; in-flight connections get an abortive close
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl+C, shutting down");
                    cancel.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }

    let server_handle = tokio::spawn(server::run(
        listener,
        slotter.clone(),
        counter.clone(),
        cancel.clone(),
    ));

    let (event_tx, event_rx) = mpsc::channel(256);
    let input_handle = input::spawn_stdin_keys(event_tx);

    // No display to query: the cursor baseline for a headless harvest is
    // the origin.
    let session = HarvestSession::new(
        slotter,
        counter,
        config.tunables(),
        (0, 0),
        event_rx,
    );

    tokio::select! {
        result = session.run() => {
            if let Err(e) = result {
                error!("Harvest session failed: {}", e);
            }
            cancel.cancel();
        }
        _ = cancel.cancelled() => {}
    }

    input_handle.abort();
    server_handle
        .await
        .context("Server task panicked")?
        .context("Server failed")?;

    info!("entropyd shut down");
    Ok(())
}
