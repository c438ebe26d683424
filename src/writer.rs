//! Buffered outbound side of a connection.
//!
//! `StreamWriter` separates queueing from transmission: `enqueue` only
//! appends to the outbound queue and never suspends the caller, while
//! `drain` is the backpressure point that suspends until the transport
//! has accepted every queued byte. Because the queue is a single
//! contiguous buffer advanced by the number of bytes the transport
//! actually took, partial writes can never reorder, duplicate, or
//! interleave payloads.

use bytes::{Buf, BytesMut};
use std::io;
use tokio::io::{AsyncWrite, AsyncWriteExt, WriteHalf};

/// Buffered writer over the write half of a duplex stream.
pub struct StreamWriter<S> {
    inner: WriteHalf<S>,
    queue: BytesMut,
}

impl<S: AsyncWrite> StreamWriter<S> {
    pub(crate) fn new(inner: WriteHalf<S>) -> Self {
        Self {
            inner,
            queue: BytesMut::new(),
        }
    }

    /// Append `bytes` to the outbound queue.
    ///
    /// Never suspends and never guarantees the bytes reached the peer;
    /// callers must follow up with [`drain`](Self::drain).
    pub fn enqueue(&mut self, bytes: &[u8]) {
        self.queue.extend_from_slice(bytes);
    }

    /// Suspend until the transport has accepted every queued byte, then
    /// flush.
    ///
    /// Handles partial writes: each write advances the queue by exactly
    /// the number of bytes the transport took, preserving enqueue order.
    pub async fn drain(&mut self) -> io::Result<()> {
        while self.queue.has_remaining() {
            let n = self.inner.write(self.queue.chunk()).await?;
            if n == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport refused queued bytes",
                ));
            }
            self.queue.advance(n);
        }
        self.inner.flush().await
    }

    /// Number of bytes waiting for transmission.
    pub fn pending(&self) -> usize {
        self.queue.remaining()
    }

    /// Flush the remaining queue and shut the write side down.
    ///
    /// Completes only once the shutdown handshake has finished, so the
    /// caller can observe full closure before releasing resources.
    pub async fn close(&mut self) -> io::Result<()> {
        self.drain().await?;
        self.inner.shutdown().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio_test::{assert_pending, assert_ready_ok, task};

    fn writer_for(stream: tokio::io::DuplexStream) -> StreamWriter<tokio::io::DuplexStream> {
        let (_read_half, write_half) = tokio::io::split(stream);
        StreamWriter::new(write_half)
    }

    #[tokio::test]
    async fn test_drain_preserves_enqueue_order() {
        let (mut peer, local) = tokio::io::duplex(1024);
        let mut writer = writer_for(local);

        writer.enqueue(b"abc");
        writer.enqueue(b"def");
        assert_eq!(writer.pending(), 6);
        writer.drain().await.unwrap();
        assert_eq!(writer.pending(), 0);

        let mut received = [0u8; 6];
        peer.read_exact(&mut received).await.unwrap();
        assert_eq!(&received, b"abcdef");
    }

    #[tokio::test]
    async fn test_drain_suspends_until_capacity_is_restored() {
        // A 4-byte pipe forces drain to suspend twice before the whole
        // payload fits through.
        let (mut peer, local) = tokio::io::duplex(4);
        let mut writer = writer_for(local);

        let payload = b"0123456789";
        writer.enqueue(payload);

        let mut received = Vec::new();
        {
            let mut drain = task::spawn(writer.drain());

            assert_pending!(drain.poll());
            let mut buf = [0u8; 4];
            let n = peer.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);

            assert!(drain.is_woken());
            assert_pending!(drain.poll());
            let n = peer.read(&mut buf).await.unwrap();
            received.extend_from_slice(&buf[..n]);

            assert!(drain.is_woken());
            assert_ready_ok!(drain.poll());
        }

        let mut buf = [0u8; 4];
        let n = peer.read(&mut buf).await.unwrap();
        received.extend_from_slice(&buf[..n]);

        // Exactly the enqueued bytes, in enqueue order.
        assert_eq!(&received, payload);
        assert_eq!(writer.pending(), 0);
    }

    #[tokio::test]
    async fn test_close_flushes_queue_and_signals_eof() {
        let (mut peer, local) = tokio::io::duplex(64);
        let mut writer = writer_for(local);

        writer.enqueue(b"bye");
        writer.close().await.unwrap();

        let mut received = Vec::new();
        peer.read_to_end(&mut received).await.unwrap();
        assert_eq!(&received, b"bye");
    }
}
