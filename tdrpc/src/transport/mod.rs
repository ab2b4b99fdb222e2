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

//! The byte-level request/response channel.
//!
//! The core treats a transport as an opaque bi-directional byte stream; the
//! only structure imposed on it is the length-prefixed framing of
//! [`framing`]. Two implementations ship with the crate:
//!
//! - [`TcpTransport`] / [`TcpListener`]: real networking;
//! - [`MemoryTransport`]: an in-process pair for tests and benchmarks,
//!   so the whole stack can be exercised without a socket in sight.
//!
//! Everything here is policy-free: no retries, no reconnection, no
//! timeouts. A failed transport operation surfaces as a
//! [`TransportError`] and the call that used it is over.

mod error;
pub mod framing;
mod memory;
mod tcp;

pub use error::TransportError;
pub use memory::MemoryTransport;
pub use tcp::{TcpListener, TcpTransport};

use async_trait::async_trait;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncRead, AsyncWrite};

/// Process-wide counter backing [`TransportId`] allocation.
static NEXT_TRANSPORT_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identifier of a transport within this process.
///
/// Only used for logging and diagnostics; it never crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportId(u64);

impl TransportId {
    /// Allocates the next free identifier.
    pub fn next() -> Self {
        TransportId(NEXT_TRANSPORT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for TransportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "transport-{}", self.0)
    }
}

/// Descriptive metadata attached to every transport.
#[derive(Debug, Clone)]
pub struct TransportMetadata {
    /// Process-unique identifier.
    pub id: TransportId,
    /// Transport flavor, e.g. `"tcp"` or `"memory"`.
    pub kind: &'static str,
    /// Peer address, when the flavor has one.
    pub peer: Option<String>,
}

/// A connected bi-directional byte stream.
///
/// The framework drives transports exclusively through [`framing`]; a
/// transport implementation only needs to be a well-behaved tokio stream
/// and describe itself.
pub trait Transport: AsyncRead + AsyncWrite + Send + Unpin + 'static {
    /// Returns metadata about this transport.
    fn metadata(&self) -> &TransportMetadata;
}

/// Accepts incoming transports on a bound address.
#[async_trait]
pub trait Listener: Send + Sync {
    /// The transport type produced by this listener.
    type Transport: Transport;

    /// Waits for and returns the next incoming connection.
    async fn accept(&self) -> Result<Self::Transport, TransportError>;

    /// Returns the local address this listener is bound to.
    fn local_addr(&self) -> Result<String, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_ids_are_unique() {
        let first = TransportId::next();
        let second = TransportId::next();
        assert_ne!(first, second);
        assert!(first.to_string().starts_with("transport-"));
    }
}
