//! Buffered inbound side of a connection.
//!
//! `StreamReader` pulls bytes from the transport into a private buffer
//! and hands them out in chunks capped at the caller's limit. It never
//! waits to fill the cap: as soon as at least one byte is available it
//! returns, which is exactly the framing (or deliberate absence of it)
//! the protocol relies on.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, ReadHalf};

/// Buffered reader over the read half of a duplex stream.
///
/// Owned by exactly one [`Connection`](crate::connection::Connection);
/// reads are driven sequentially by that connection's handler, so the
/// reader never sees concurrent calls.
pub struct StreamReader<S> {
    inner: ReadHalf<S>,
    buffer: BytesMut,
    eof: bool,
}

impl<S: AsyncRead> StreamReader<S> {
    pub(crate) fn new(inner: ReadHalf<S>) -> Self {
        Self {
            inner,
            buffer: BytesMut::new(),
            eof: false,
        }
    }

    /// Read up to `max_bytes` bytes, suspending until at least one byte
    /// is available.
    ///
    /// Returns `Ok(Some(bytes))` with whatever was buffered or freshly
    /// arrived, capped at `max_bytes`. Returns `Ok(None)` once the peer
    /// has signaled end-of-stream and the buffer is empty; EOF is
    /// sticky, so every later call also returns `Ok(None)`.
    ///
    /// `max_bytes` must be non-zero.
    pub async fn read(&mut self, max_bytes: usize) -> io::Result<Option<Bytes>> {
        debug_assert!(max_bytes > 0, "read cap must be non-zero");

        if self.buffer.is_empty() {
            if self.eof {
                return Ok(None);
            }
            let mut dst = (&mut self.buffer).limit(max_bytes);
            let n = self.inner.read_buf(&mut dst).await?;
            if n == 0 {
                self.eof = true;
                return Ok(None);
            }
        }

        let take = self.buffer.remaining().min(max_bytes);
        Ok(Some(self.buffer.split_to(take).freeze()))
    }

    /// Whether end-of-stream has been observed and the buffer is empty.
    pub fn at_eof(&self) -> bool {
        self.eof && self.buffer.is_empty()
    }
}
