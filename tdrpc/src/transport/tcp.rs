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

//! TCP transport.

use crate::transport::{
    Listener, Transport, TransportError, TransportId, TransportMetadata,
};
use async_trait::async_trait;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tracing::debug;

/// A connected TCP byte stream.
///
/// `TCP_NODELAY` is enabled on every stream: one RPC is one small framed
/// write, and coalescing delays would dominate the round-trip.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    metadata: TransportMetadata,
}

impl TcpTransport {
    /// Connects to `address` (`host:port`).
    ///
    /// # Errors
    ///
    /// [`TransportError::ConnectionFailed`] with the attempted address.
    pub async fn connect(address: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(address).await.map_err(|source| {
            TransportError::ConnectionFailed {
                address: address.to_string(),
                source,
            }
        })?;
        let transport = Self::from_stream(stream);
        debug!(id = %transport.metadata.id, address, "connected");
        Ok(transport)
    }

    pub(crate) fn from_stream(stream: TcpStream) -> Self {
        let _ = stream.set_nodelay(true);
        let peer = stream.peer_addr().ok().map(|addr| addr.to_string());
        TcpTransport {
            stream,
            metadata: TransportMetadata {
                id: TransportId::next(),
                kind: "tcp",
                peer,
            },
        }
    }
}

impl Transport for TcpTransport {
    fn metadata(&self) -> &TransportMetadata {
        &self.metadata
    }
}

impl AsyncRead for TcpTransport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_read(cx, buf)
    }
}

impl AsyncWrite for TcpTransport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        Pin::new(&mut self.get_mut().stream).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().stream).poll_shutdown(cx)
    }
}

/// Accepts [`TcpTransport`]s on a bound address.
pub struct TcpListener {
    inner: tokio::net::TcpListener,
}

impl TcpListener {
    /// Binds to `address` (`host:port`; port `0` picks a free one).
    ///
    /// # Errors
    ///
    /// [`TransportError::BindFailed`] with the attempted address.
    pub async fn bind(address: &str) -> Result<Self, TransportError> {
        let inner = tokio::net::TcpListener::bind(address).await.map_err(|source| {
            TransportError::BindFailed {
                address: address.to_string(),
                source,
            }
        })?;
        Ok(TcpListener { inner })
    }
}

#[async_trait]
impl Listener for TcpListener {
    type Transport = TcpTransport;

    async fn accept(&self) -> Result<TcpTransport, TransportError> {
        let (stream, _) = self.inner.accept().await?;
        Ok(TcpTransport::from_stream(stream))
    }

    fn local_addr(&self) -> Result<String, TransportError> {
        Ok(self.inner.local_addr()?.to_string())
    }
}
