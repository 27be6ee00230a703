// SPDX-License-Identifier: MIT
//
// entropyd: Local User-Seeded Entropy Server

//! Per-connection request/response state machine
//!
//! Wire format: the client sends a 4-byte big-endian count of entropy bytes
//! it wants; the server answers with one status byte, followed by the
//! payload only on success. Responses on one connection are strictly
//! ordered after their requests; the next request is read only once the
//! full response has been written.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::counter::RequestCounter;
use crate::slotter::Slotter;
use crate::{Result, DATA_BUF_SIZE, MAX_REQUEST_BYTES};

/// Status byte: request served, payload follows
pub const STATUS_SUCCESS: u8 = 0xFF;

/// Status byte: insufficient entropy, no payload
pub const STATUS_INSUFFICIENT: u8 = 0x00;

/// Length of the request prefix
pub const REQUEST_LEN: usize = 4;

/// Handler for one accepted connection
///
/// Owns its stream; dropping the handler closes the socket. Generic over
/// the stream type so the state machine is testable against in-memory
/// pipes.
pub struct Connection<S> {
    stream: S,
    slotter: Slotter,
    counter: RequestCounter,
    buffer: Box<[u8; DATA_BUF_SIZE]>,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Connection<S> {
    pub fn new(stream: S, slotter: Slotter, counter: RequestCounter) -> Self {
        Self {
            stream,
            slotter,
            counter,
            buffer: Box::new([0u8; DATA_BUF_SIZE]),
        }
    }

    /// Drive the connection until the peer closes or an I/O error occurs
    ///
    /// A clean close (recv of zero bytes between requests) returns `Ok`;
    /// any read or write failure propagates and drops the connection.
    pub async fn serve(mut self) -> Result<()> {
        loop {
            let mut request = [0u8; REQUEST_LEN];
            match self.stream.read_exact(&mut request).await {
                Ok(_) => {}
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
                Err(e) => return Err(e.into()),
            }

            let count = u32::from_be_bytes(request);
            let to_send = self.build_response(count);
            self.stream.write_all(&self.buffer[..to_send]).await?;
        }
    }

    /// Fill the response buffer for one decoded request; returns the
    /// response length
    fn build_response(&mut self, count: u32) -> usize {
        let count_bytes = count as usize;

        // Requests the response buffer cannot carry are treated like an
        // empty reservoir rather than read out of bounds.
        let success = count_bytes <= MAX_REQUEST_BYTES
            && self.slotter.request(&mut self.buffer[1..1 + count_bytes]);

        let to_send = if success {
            self.buffer[0] = STATUS_SUCCESS;
            1 + count_bytes
        } else {
            self.buffer[0] = STATUS_INSUFFICIENT;
            1
        };

        self.counter.register_request(count as i32, success);
        debug!(count, success, "served entropy request");
        to_send
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    fn reservoir_with(patterns: &[u8]) -> Slotter {
        let slotter = Slotter::new(crate::SLICE_BYTES);
        for &pattern in patterns {
            slotter.push(vec![pattern; crate::SLICE_BYTES]);
        }
        slotter
    }

    async fn send_request(client: &mut (impl AsyncWrite + Unpin), count: u32) {
        client
            .write_all(&count.to_be_bytes())
            .await
            .expect("request write failed");
    }

    #[tokio::test]
    async fn test_success_response() {
        let slotter = reservoir_with(&[0x5A]);
        let counter = RequestCounter::new();
        let (mut client, server) = duplex(1024);

        let handle = tokio::spawn(
            Connection::new(server, slotter.clone(), counter.clone()).serve(),
        );

        send_request(&mut client, 5).await;
        let mut response = [0u8; 6];
        client.read_exact(&mut response).await.expect("short response");

        assert_eq!(response[0], STATUS_SUCCESS);
        assert_eq!(&response[1..], &[0x5A; 5]);
        assert_eq!(slotter.available(), 15);

        let snapshot = counter.get();
        assert_eq!(snapshot.count, 1);
        assert_eq!(snapshot.success_count, 1);
        assert_eq!(snapshot.last_size, 5);

        drop(client);
        handle.await.expect("task panicked").expect("serve failed");
    }

    #[tokio::test]
    async fn test_insufficient_response() {
        let slotter = Slotter::new(crate::SLICE_BYTES);
        let counter = RequestCounter::new();
        let (mut client, server) = duplex(1024);

        let handle = tokio::spawn(
            Connection::new(server, slotter.clone(), counter.clone()).serve(),
        );

        send_request(&mut client, 1).await;
        let mut status = [0u8; 1];
        client.read_exact(&mut status).await.expect("short response");
        assert_eq!(status[0], STATUS_INSUFFICIENT);

        // No payload follows: the next thing on the wire is the answer to
        // the next request.
        slotter.push(vec![0x11; crate::SLICE_BYTES]);
        send_request(&mut client, 2).await;
        let mut response = [0u8; 3];
        client.read_exact(&mut response).await.expect("short response");
        assert_eq!(response, [STATUS_SUCCESS, 0x11, 0x11]);

        let snapshot = counter.get();
        assert_eq!(snapshot.count, 2);
        assert_eq!(snapshot.success_count, 1);

        drop(client);
        handle.await.expect("task panicked").expect("serve failed");
    }

    #[tokio::test]
    async fn test_sequential_requests_drain_in_order() {
        let slotter = reservoir_with(&[0x01, 0x02]);
        let counter = RequestCounter::new();
        let (mut client, server) = duplex(1024);

        let handle = tokio::spawn(Connection::new(server, slotter, counter).serve());

        let mut collected = Vec::new();
        for _ in 0..8 {
            send_request(&mut client, 5).await;
            let mut response = [0u8; 6];
            client.read_exact(&mut response).await.expect("short response");
            assert_eq!(response[0], STATUS_SUCCESS);
            collected.extend_from_slice(&response[1..]);
        }

        let mut expected = vec![0x01u8; 20];
        expected.extend_from_slice(&[0x02; 20]);
        assert_eq!(collected, expected);

        drop(client);
        handle.await.expect("task panicked").expect("serve failed");
    }

    #[tokio::test]
    async fn test_split_request_prefix_is_reassembled() {
        let slotter = reservoir_with(&[0x33]);
        let counter = RequestCounter::new();
        let (mut client, server) = duplex(1024);

        let handle = tokio::spawn(Connection::new(server, slotter, counter).serve());

        let request = 4u32.to_be_bytes();
        client.write_all(&request[..2]).await.expect("write failed");
        client.flush().await.expect("flush failed");
        client.write_all(&request[2..]).await.expect("write failed");

        let mut response = [0u8; 5];
        client.read_exact(&mut response).await.expect("short response");
        assert_eq!(response[0], STATUS_SUCCESS);
        assert_eq!(&response[1..], &[0x33; 4]);

        drop(client);
        handle.await.expect("task panicked").expect("serve failed");
    }

    #[tokio::test]
    async fn test_oversized_request_answers_insufficient() {
        let slotter = reservoir_with(&[0x44]);
        let counter = RequestCounter::new();
        let (mut client, server) = duplex(1024);

        let handle = tokio::spawn(
            Connection::new(server, slotter.clone(), counter.clone()).serve(),
        );

        send_request(&mut client, (MAX_REQUEST_BYTES as u32) + 1).await;
        let mut status = [0u8; 1];
        client.read_exact(&mut status).await.expect("short response");
        assert_eq!(status[0], STATUS_INSUFFICIENT);
        assert_eq!(slotter.available(), 20);
        assert_eq!(counter.get().success_count, 0);

        drop(client);
        handle.await.expect("task panicked").expect("serve failed");
    }

    #[tokio::test]
    async fn test_peer_close_ends_serve_cleanly() {
        let slotter = Slotter::new(crate::SLICE_BYTES);
        let counter = RequestCounter::new();
        let (client, server) = duplex(1024);

        let handle = tokio::spawn(Connection::new(server, slotter, counter).serve());
        drop(client);

        handle
            .await
            .expect("task panicked")
            .expect("clean close should not be an error");
    }
}
