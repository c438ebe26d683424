//! One established duplex byte stream and the endpoint it talks to.
//!
//! A `Connection` owns the transport plus its two buffered halves and
//! is the only thing handlers and the client ever touch. It is generic
//! over the underlying stream, so a TLS-style wrapper (or an in-memory
//! pipe in tests) composes without any change to handler or client
//! logic.

use crate::reader::StreamReader;
use crate::writer::StreamWriter;
use bytes::Bytes;
use std::fmt;
use std::io;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};

/// Where a listener binds or a client connects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// An established duplex byte stream.
///
/// Owns the transport resource for its lifetime; the resource is
/// released when the connection is dropped, whichever path the owning
/// handler exits through. Exactly one handler drives a connection, so
/// reads and writes are always sequential.
pub struct Connection<S> {
    reader: StreamReader<S>,
    writer: StreamWriter<S>,
    peer: String,
    closed: bool,
}

impl Connection<TcpStream> {
    /// Open an outbound connection to `endpoint`.
    pub async fn open(endpoint: &Endpoint) -> io::Result<Self> {
        let stream = TcpStream::connect((endpoint.host.as_str(), endpoint.port)).await?;
        let peer = stream.peer_addr()?.to_string();
        Ok(Self::from_stream(stream, peer))
    }

    /// Accept the next inbound connection from `listener`.
    pub async fn accept_from(listener: &TcpListener) -> io::Result<Self> {
        let (stream, addr) = listener.accept().await?;
        Ok(Self::from_stream(stream, addr.to_string()))
    }
}

impl<S: AsyncRead + AsyncWrite> Connection<S> {
    /// Wrap an already-established stream.
    ///
    /// This is the seam where an encrypted or in-memory transport plugs
    /// in: anything readable and writable becomes a connection.
    pub fn from_stream(stream: S, peer: String) -> Self {
        let (read_half, write_half) = tokio::io::split(stream);
        Self {
            reader: StreamReader::new(read_half),
            writer: StreamWriter::new(write_half),
            peer,
            closed: false,
        }
    }

    /// Human-readable identifier for the remote end.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Read up to `max_bytes` from the peer; `Ok(None)` signals
    /// end-of-stream. See [`StreamReader::read`].
    pub async fn read(&mut self, max_bytes: usize) -> io::Result<Option<Bytes>> {
        self.ensure_open()?;
        self.reader.read(max_bytes).await
    }

    /// Queue `bytes` for transmission without suspending.
    pub fn enqueue(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.ensure_open()?;
        self.writer.enqueue(bytes);
        Ok(())
    }

    /// Suspend until the transport has accepted every queued byte.
    pub async fn drain(&mut self) -> io::Result<()> {
        self.ensure_open()?;
        self.writer.drain().await
    }

    /// Flush pending bytes and shut the write side down.
    ///
    /// Idempotent: the first call performs the close handshake and
    /// every later call is a no-op returning `Ok(())`.
    pub async fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.writer.close().await
    }

    fn ensure_open(&self) -> io::Result<()> {
        if self.closed {
            Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection closed",
            ))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_endpoint_display() {
        assert_eq!(Endpoint::new("127.0.0.1", 7770).to_string(), "127.0.0.1:7770");
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let (_peer, local) = tokio::io::duplex(64);
        let mut conn = Connection::from_stream(local, "test".to_string());

        assert!(!conn.is_closed());
        conn.close().await.unwrap();
        assert!(conn.is_closed());

        // Second close: no fault, no observable side effect.
        conn.close().await.unwrap();
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_operations_fail_once_closed() {
        let (_peer, local) = tokio::io::duplex(64);
        let mut conn = Connection::from_stream(local, "test".to_string());
        conn.close().await.unwrap();

        let err = conn.read(1024).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        let err = conn.enqueue(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
        let err = conn.drain().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[tokio::test]
    async fn test_close_flushes_pending_bytes() {
        let (mut peer, local) = tokio::io::duplex(64);
        let mut conn = Connection::from_stream(local, "test".to_string());

        conn.enqueue(b"tail").unwrap();
        conn.close().await.unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(&received, b"tail");
    }
}
