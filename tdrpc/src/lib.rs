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

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

//! # TDRPC - Type-Directed RPC Framework
//!
//! TDRPC lets a caller invoke a remotely registered method by name with the
//! argument and return serialization derived from a single typed
//! declaration. A method is declared once as a [`Method`] signature; the
//! client call-site and the server invocation stub are both monomorphized
//! from it, so neither side hand-writes wire code and the two sides cannot
//! disagree about the wire layout without failing to typecheck.
//!
//! ## Architecture
//!
//! The stack has four layers, bottom to top:
//!
//! - **[`frame`]**: the wire envelope, a self-describing keyed frame over a
//!   closed set of value types (`word`, `string`, `word array`,
//!   `string array`) with strict, deterministic encoding;
//! - **[`message`] + [`wire`]**: the type-directed layer, cursor-disciplined
//!   views that pin the *i*-th argument or return element to the decimal key
//!   `"i"`, driven by sealed traits over the wire type set;
//! - **[`transport`]**: pluggable byte channels (TCP and an in-memory pair
//!   for tests) with length-prefixed framing;
//! - **[`client`] / [`server`] / [`dispatch`]**: the invocation harness,
//!   the blocking round-trip on the caller's side plus the registry,
//!   per-method stub and total error trap on the server's side.
//!
//! ## Quick Start
//!
//! ```rust
//! use tdrpc::client::Connection;
//! use tdrpc::dispatch::{Module, Registry, RegistrationError};
//! use tdrpc::method::{Method, MethodError};
//! use tdrpc::server::RpcServer;
//! use tdrpc::transport::MemoryTransport;
//!
//! // Declare the method once; both sides are derived from this.
//! struct Add;
//!
//! impl Method for Add {
//!     const MODULE: &'static str = "math";
//!     const NAME: &'static str = "Add";
//!     type Args = (u32, u32);
//!     type Output = u32;
//! }
//!
//! struct MathModule;
//!
//! impl Module for MathModule {
//!     fn name(&self) -> &str {
//!         "math"
//!     }
//!
//!     fn version_key(&self) -> &str {
//!         "math v1.0.0"
//!     }
//!
//!     fn init(&self, registry: &mut Registry) -> Result<(), RegistrationError> {
//!         registry.register::<Add, _>(|(a, b)| {
//!             a.checked_add(b).ok_or_else(|| MethodError::new("overflow"))
//!         })
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
//! # runtime.block_on(async {
//! let server = RpcServer::builder().module(&MathModule)?.build();
//!
//! // Serve one in-memory connection; production uses `serve` on a
//! // `TcpListener` instead.
//! let (client_io, server_io) = MemoryTransport::pair(4096);
//! tokio::spawn(async move { server.serve_connection(server_io).await });
//!
//! let mut conn = Connection::over(client_io);
//! conn.load_module("math", "math v1.0.0").await?;
//! assert_eq!(conn.call::<Add>((2, 3)).await?, 5);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # })
//! # }
//! ```
//!
//! ## Error Handling
//!
//! The call path composes three layers into [`RpcError`]:
//!
//! - [`TransportError`]: the bytes did not move;
//! - [`FrameError`](frame::FrameError): the bytes violated the codec
//!   contract; on a reply this means client and server disagree about the
//!   signature;
//! - [`RemoteError`]: the server trapped a failure and reported it, with the
//!   original error text and a best-effort backtrace.
//!
//! On the server every failure path of a method stub (decode, execute,
//! encode, even panics) is trapped into an error reply; the transport
//! always sees a complete frame or a closed connection, never half of one.
//!
//! ## Scope
//!
//! One call is one synchronous round-trip on one connection. There are no
//! streams, no notifications, no concurrent in-flight calls per connection,
//! and no retries anywhere in the core.

pub mod client;
pub mod dispatch;
pub mod error;
pub mod frame;
pub mod message;
pub mod method;
pub mod server;
pub mod transport;
pub mod wire;

pub use client::Connection;
pub use dispatch::{Module, RawHandler, RegistrationError, Registry};
pub use error::{RemoteError, RpcError};
pub use frame::{Frame, FrameError, Value, WireType};
pub use message::{MessageReader, MessageWriter};
pub use method::{Method, MethodError, Signature};
pub use server::RpcServer;
pub use transport::{MemoryTransport, TcpListener, TcpTransport, Transport, TransportError};
