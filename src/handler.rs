//! Per-connection state machine.
//!
//! Each accepted connection gets exactly one handler running in its own
//! task: read a payload, transform it, pause for the configured delay,
//! write the reply, repeat until the peer disconnects or an I/O fault
//! ends the connection. A handler suspends only at the read and drain
//! calls (and the delay); it never blocks another connection's
//! progress.

use crate::connection::Connection;
use crate::delay::ProcessingDelay;
use crate::transform::transform;
use bytes::Bytes;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Where the handler currently is in its loop.
enum HandlerState {
    /// Waiting for the next payload from the peer.
    WaitRead,
    /// Transforming a received payload.
    Processing(Bytes),
    /// Pushing the reply back out through the drain point.
    WaitDrain(Vec<u8>),
    /// Terminal; reachable from every other state.
    Closed,
}

/// Serves one connection from accept to close.
pub struct ConnectionHandler<S> {
    conn: Connection<S>,
    read_cap: usize,
    delay: ProcessingDelay,
}

impl<S: AsyncRead + AsyncWrite> ConnectionHandler<S> {
    pub fn new(conn: Connection<S>, read_cap: usize, delay: ProcessingDelay) -> Self {
        Self {
            conn,
            read_cap,
            delay,
        }
    }

    /// Drive the connection until the peer disconnects or a fault ends
    /// it. The connection is closed on every exit path.
    pub async fn run(mut self) -> io::Result<()> {
        let result = self.serve().await;
        if let Err(e) = self.conn.close().await {
            debug!(peer = %self.conn.peer(), error = %e, "error while closing connection");
        }
        result
    }

    async fn serve(&mut self) -> io::Result<()> {
        let mut state = HandlerState::WaitRead;
        loop {
            state = match state {
                HandlerState::WaitRead => match self.conn.read(self.read_cap).await? {
                    Some(payload) => {
                        debug!(peer = %self.conn.peer(), bytes = payload.len(), "received");
                        HandlerState::Processing(payload)
                    }
                    None => {
                        debug!(peer = %self.conn.peer(), "peer closed the stream");
                        HandlerState::Closed
                    }
                },

                HandlerState::Processing(payload) => {
                    let reply = match transform(&payload) {
                        Ok(reply) => reply,
                        Err(e) => {
                            // Decode faults are fatal to this connection
                            // only; no error token is echoed back.
                            warn!(peer = %self.conn.peer(), error = %e, "payload is not valid UTF-8, closing connection");
                            return Err(io::Error::new(io::ErrorKind::InvalidData, e));
                        }
                    };
                    self.delay.wait().await;
                    HandlerState::WaitDrain(reply)
                }

                HandlerState::WaitDrain(reply) => {
                    self.conn.enqueue(&reply)?;
                    self.conn.drain().await?;
                    debug!(peer = %self.conn.peer(), bytes = reply.len(), "sent");
                    HandlerState::WaitRead
                }

                HandlerState::Closed => return Ok(()),
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn spawn_handler(
        stream: tokio::io::DuplexStream,
    ) -> tokio::task::JoinHandle<io::Result<()>> {
        let conn = Connection::from_stream(stream, "test-peer".to_string());
        let handler = ConnectionHandler::new(conn, 1024, ProcessingDelay::None);
        tokio::spawn(handler.run())
    }

    #[tokio::test]
    async fn test_replies_with_uppercase_reversed_payload() {
        let (mut peer, local) = tokio::io::duplex(1024);
        let handle = spawn_handler(local);

        peer.write_all(b"hello").await.unwrap();
        let mut buf = [0u8; 1024];
        let n = peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"OLLEH");

        peer.write_all(b"Hello, World!").await.unwrap();
        let n = peer.read(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"!DLROW ,OLLEH");

        peer.shutdown().await.unwrap();
        handle.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn test_eof_terminates_handler_cleanly() {
        let (mut peer, local) = tokio::io::duplex(1024);
        let handle = spawn_handler(local);

        peer.shutdown().await.unwrap();
        handle.await.unwrap().unwrap();

        // The handler closed its side; the peer sees EOF.
        let mut buf = [0u8; 16];
        assert_eq!(peer.read(&mut buf).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_fatal_to_the_connection() {
        let (mut peer, local) = tokio::io::duplex(1024);
        let handle = spawn_handler(local);

        peer.write_all(&[0xff, 0xfe]).await.unwrap();

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);

        // Connection was closed, not left dangling.
        let mut buf = [0u8; 16];
        assert_eq!(peer.read(&mut buf).await.unwrap(), 0);
    }
}
