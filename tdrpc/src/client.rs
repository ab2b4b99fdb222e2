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

//! The client-side invoker.
//!
//! A [`Connection`] drives one synchronous call at a time over one
//! transport: encode the arguments in declaration order, ship the frame,
//! wait for the reply, then either reconstruct the typed return value or
//! raise the remote error. There is no correlation machinery because there
//! is nothing to correlate: one request, one reply, in order.
//!
//! # Examples
//!
//! ```rust,no_run
//! use tdrpc::client::Connection;
//! use tdrpc::method::Method;
//!
//! struct Read;
//!
//! impl Method for Read {
//!     const MODULE: &'static str = "memory";
//!     const NAME: &'static str = "Read";
//!     const REVISION: u32 = 1;
//!     type Args = (u32, u32);
//!     type Output = Vec<u32>;
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut conn = Connection::connect("localhost").await?;
//! conn.load_module("memory", "memory v1.0.1").await?;
//!
//! let words = conn.call::<Read>((0x6640_000c, 1)).await?;
//! println!("read {words:08x?}");
//! # Ok(())
//! # }
//! ```

use crate::error::{RemoteError, RpcError};
use crate::frame::{Frame, ERROR_KEY};
use crate::message::{MessageReader, MessageWriter};
use crate::method::{LoadModule, Method};
use crate::transport::framing::{read_frame, write_frame};
use crate::transport::{TcpTransport, Transport, TransportError};
use crate::wire::{Args, Returns};
use tracing::debug;

/// Default port of a TDRPC server.
pub const DEFAULT_PORT: u16 = 9090;

/// A client connection to one RPC server.
///
/// The connection owns its transport; calls borrow it mutably, which makes
/// the one-call-at-a-time discipline a compile-time property rather than a
/// runtime check.
pub struct Connection<T: Transport = TcpTransport> {
    transport: T,
}

impl Connection<TcpTransport> {
    /// Connects over TCP.
    ///
    /// `host` may be a bare host name, in which case [`DEFAULT_PORT`] is
    /// used, or an explicit `host:port`.
    ///
    /// # Errors
    ///
    /// [`TransportError::ConnectionFailed`] if the peer is unreachable.
    pub async fn connect(host: &str) -> Result<Self, TransportError> {
        let address = if host.contains(':') {
            host.to_string()
        } else {
            format!("{host}:{DEFAULT_PORT}")
        };
        Ok(Self::over(TcpTransport::connect(&address).await?))
    }
}

impl<T: Transport> Connection<T> {
    /// Wraps an already-connected transport.
    ///
    /// This is how tests drive a server over a
    /// [`MemoryTransport`](crate::transport::MemoryTransport) pair.
    pub fn over(transport: T) -> Self {
        Connection { transport }
    }

    /// Verifies that the server carries `name` with the expected version
    /// tag.
    ///
    /// # Errors
    ///
    /// [`RpcError::Remote`] if the module is missing or its version key
    /// differs, plus the usual transport and frame failures.
    pub async fn load_module(
        &mut self,
        name: &str,
        expected_version_key: &str,
    ) -> Result<(), RpcError> {
        self.call::<LoadModule>((name.to_string(), expected_version_key.to_string()))
            .await
    }

    /// Calls the remote method `M` with `args`.
    ///
    /// Arguments are written strictly left to right, matching the server
    /// stub's read order. If the reply carries the reserved `"error"` key a
    /// [`RemoteError`] is raised; otherwise the declared return type is
    /// decoded; a reply that does not match it fails with a frame error,
    /// which indicates version skew or corruption, not a remote failure.
    pub async fn call<M: Method>(&mut self, args: M::Args) -> Result<M::Output, RpcError> {
        let mut request = Frame::request(M::routing_key(), M::REVISION);
        let mut query = MessageWriter::new(&mut request);
        args.encode(&mut query)?;

        let reply = self.round_trip(&request).await?;
        if reply.key_exists(ERROR_KEY) {
            return Err(RemoteError::from_reply(&reply)?.into());
        }

        let mut reader = MessageReader::new(&reply);
        Ok(M::Output::decode(&mut reader)?)
    }

    async fn round_trip(&mut self, request: &Frame) -> Result<Frame, RpcError> {
        debug!(
            transport = %self.transport.metadata().id,
            method = request.method(),
            "sending RPC request"
        );
        let bytes = request.encode()?;
        write_frame(&mut self.transport, &bytes).await?;

        let payload =
            read_frame(&mut self.transport)
                .await?
                .ok_or_else(|| TransportError::ConnectionLost {
                    reason: "server closed the connection before replying".to_string(),
                })?;
        Ok(Frame::parse(&payload)?)
    }
}
