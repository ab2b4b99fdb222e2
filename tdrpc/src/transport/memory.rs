//
// Copyright 2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! In-memory transport for tests.
//!
//! A [`MemoryTransport::pair`] behaves like a connected socket pair without
//! touching the network stack: deterministic, allocation-cheap, and usable
//! from any test. Dropping one half reads as a clean EOF on the other, which
//! is exactly how the server loop observes a departing client.

use crate::transport::{Transport, TransportId, TransportMetadata};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

/// One half of an in-process bi-directional byte channel.
///
/// # Examples
///
/// ```rust
/// use tdrpc::transport::MemoryTransport;
/// use tokio::io::{AsyncReadExt, AsyncWriteExt};
///
/// # async fn example() -> std::io::Result<()> {
/// let (mut client, mut server) = MemoryTransport::pair(1024);
/// client.write_all(b"hello").await?;
///
/// let mut buf = [0u8; 5];
/// server.read_exact(&mut buf).await?;
/// assert_eq!(&buf, b"hello");
/// # Ok(())
/// # }
/// ```
pub struct MemoryTransport {
    io: DuplexStream,
    metadata: TransportMetadata,
}

impl MemoryTransport {
    /// Creates a connected pair with the given internal buffer size.
    ///
    /// Writes beyond the buffer simply wait for the peer to read, which
    /// makes small buffers a convenient way to exercise backpressure in
    /// tests.
    pub fn pair(max_buffered: usize) -> (MemoryTransport, MemoryTransport) {
        let (a, b) = tokio::io::duplex(max_buffered);
        (Self::wrap(a), Self::wrap(b))
    }

    fn wrap(io: DuplexStream) -> Self {
        MemoryTransport {
            io,
            metadata: TransportMetadata {
                id: TransportId::next(),
                kind: "memory",
                peer: None,
            },
        }
    }
}

impl Transport for MemoryTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

impl AsyncRead for MemoryTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_read(cx, buf)
    }
}

impl AsyncWrite for MemoryTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().io).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::framing::{read_frame, write_frame};

    #[tokio::test]
    async fn test_frames_cross_the_pair() {
        let (mut client, mut server) = MemoryTransport::pair(256);
        write_frame(&mut client, b"request bytes").await.unwrap();

        let payload = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(payload, b"request bytes");
        assert_eq!(server.metadata().kind, "memory");
    }

    #[tokio::test]
    async fn test_dropped_peer_reads_as_clean_eof() {
        let (client, mut server) = MemoryTransport::pair(256);
        drop(client);
        assert!(read_frame(&mut server).await.unwrap().is_none());
    }
}
