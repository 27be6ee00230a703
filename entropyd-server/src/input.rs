//! Input event sources
//!
//! Headless stand-in for a windowing event pump: bytes arriving on stdin
//! become key transitions. Each byte is reported as a press/release pair,
//! which is what a real keystroke delivers. Cursor events are not available
//! without a display; the core types accept them from any richer front end.

use tokio::io::AsyncReadExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use entropyd_core::events::{InputEvent, KeySample, TickClock};
use entropyd_core::{Error, Result};

/// Read stdin and translate each byte into key events until EOF
///
/// A read failure is forwarded through the channel as [`Error::Session`]
/// so the harvest session ends with an error instead of looking like a
/// clean end-of-input.
pub fn spawn_stdin_keys(tx: mpsc::Sender<Result<InputEvent>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let clock = TickClock::new();
        let mut stdin = tokio::io::stdin();
        let mut buf = [0u8; 64];

        loop {
            let read = match stdin.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) => {
                    let failure = Error::Session(format!("stdin read failed: {}", e));
                    let _ = tx.send(Err(failure)).await;
                    return;
                }
            };

            for &byte in &buf[..read] {
                let tick_ms = clock.now_ms();
                let press = KeySample::from_raw_scan(byte, tick_ms, false);
                let release = KeySample::from_raw_scan(byte, tick_ms, true);

                if tx.send(Ok(InputEvent::Key(press))).await.is_err()
                    || tx.send(Ok(InputEvent::Key(release))).await.is_err()
                {
                    return;
                }
            }
        }
    })
}
