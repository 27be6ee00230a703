// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! Test client for the entropyd server
//!
//! Sends one big-endian 4-byte request and prints the status and payload.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Read, Write};
use std::net::TcpStream;

use entropyd_core::protocol::{STATUS_INSUFFICIENT, STATUS_SUCCESS};
use entropyd_core::DEFAULT_PORT;

#[derive(Parser)]
#[command(name = "entropyd-client")]
#[command(about = "Request entropy bytes from a running entropyd server")]
struct Args {
    /// Server's IP address or hostname
    #[arg(short, long, default_value = "127.0.0.1")]
    server: String,

    /// Remote port to send to
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of bytes to enquire
    #[arg(short = 'n', long, default_value_t = 20)]
    bytes: u32,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut stream = TcpStream::connect((args.server.as_str(), args.port))
        .with_context(|| format!("Failed to connect to {}:{}", args.server, args.port))?;

    stream
        .write_all(&args.bytes.to_be_bytes())
        .context("Failed to send request")?;

    let mut status = [0u8; 1];
    let read = stream.read(&mut status).context("Failed to read response")?;
    if read == 0 {
        println!("It is a graceful close!");
        return Ok(());
    }

    match status[0] {
        STATUS_INSUFFICIENT => {
            println!("Received 1 byte:");
            println!("Entropy provider would block");
        }
        STATUS_SUCCESS => {
            let mut payload = vec![0u8; args.bytes as usize];
            stream
                .read_exact(&mut payload)
                .context("Failed to read payload")?;
            println!("Received {} bytes:", payload.len() + 1);
            println!("{}", hex::encode(&payload));
        }
        other => {
            anyhow::bail!("Unexpected status byte 0x{:02X}", other);
        }
    }

    Ok(())
}
