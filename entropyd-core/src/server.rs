//! Listening socket and accept loop
//!
//! One listener feeds one task per accepted connection. Connections share
//! only the slotter and the request counter; an error on one connection
//! never affects another.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::{TcpListener, TcpSocket};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::counter::RequestCounter;
use crate::protocol::Connection;
use crate::slotter::Slotter;
use crate::Result;

/// Listen backlog for the entropy port
pub const LISTEN_BACKLOG: u32 = 5;

/// Bind the entropy listener
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.bind(addr)?;
    Ok(socket.listen(LISTEN_BACKLOG)?)
}

/// Accept connections until cancelled
///
/// Each accepted socket is configured for abortive close (linger zero) and
/// handed to its own task running the protocol state machine.
pub async fn run(
    listener: TcpListener,
    slotter: Slotter,
    counter: RequestCounter,
    cancel: CancellationToken,
) -> Result<()> {
    info!(addr = %listener.local_addr()?, "entropy listener started");

    loop {
        let accepted = tokio::select! {
            _ = cancel.cancelled() => {
                info!("entropy listener shutting down");
                return Ok(());
            }
            accepted = listener.accept() => accepted,
        };

        let (stream, peer) = match accepted {
            Ok(pair) => pair,
            Err(e) => {
                warn!(error = %e, "accept failed");
                continue;
            }
        };

        if let Err(e) = stream.set_linger(Some(Duration::ZERO)) {
            warn!(%peer, error = %e, "failed to set linger, dropping connection");
            continue;
        }

        info!(%peer, "client connected");
        let connection = Connection::new(stream, slotter.clone(), counter.clone());
        tokio::spawn(async move {
            match connection.serve().await {
                Ok(()) => info!(%peer, "client disconnected"),
                Err(e) => warn!(%peer, error = %e, "connection dropped"),
            }
        });
    }
}
