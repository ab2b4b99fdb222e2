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

//! The server: module loading, the accept loop, and request dispatch.
//!
//! An [`RpcServer`] is assembled from [`Module`] implementations: each
//! module registers its methods exactly once, then the registry freezes
//! behind an `Arc` and is shared read-only by every connection task. Within
//! one connection the loop is strictly serial: read one request, dispatch
//! it, write one reply. That is the whole concurrency story the protocol
//! promises.
//!
//! Every request produces a reply frame (possibly an error reply) or the
//! connection closes; a peer never observes a half-written frame.

use crate::dispatch::{write_error_frame, Module, Registry, RegistrationError};
use crate::dispatch::invoke;
use crate::frame::{Frame, FrameError};
use crate::method::{LoadModule, Method, MethodError};
use crate::transport::framing::{read_frame, write_frame};
use crate::transport::{Listener, Transport, TransportError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Builder collecting modules before the registry freezes.
#[derive(Debug, Default)]
pub struct RpcServerBuilder {
    registry: Registry,
    versions: HashMap<String, String>,
}

impl RpcServerBuilder {
    /// Loads a module: runs its registrations and records its version key.
    ///
    /// # Errors
    ///
    /// Any [`RegistrationError`] the module raises, or
    /// [`RegistrationError::DuplicateModule`] if a module of the same name
    /// was already loaded.
    pub fn module(mut self, module: &dyn Module) -> Result<Self, RegistrationError> {
        let name = module.name().to_string();
        if self.versions.contains_key(&name) {
            return Err(RegistrationError::DuplicateModule { module: name });
        }
        module.init(&mut self.registry)?;
        info!(
            module = name.as_str(),
            version_key = module.version_key(),
            "module loaded"
        );
        self.versions.insert(name, module.version_key().to_string());
        Ok(self)
    }

    /// Freezes the registry and produces a servable server.
    pub fn build(self) -> RpcServer {
        RpcServer {
            registry: Arc::new(self.registry),
            versions: Arc::new(self.versions),
        }
    }
}

/// A server with a frozen method registry.
///
/// Cloning is cheap (two `Arc`s) and shares the same registry; the accept
/// loop hands one clone to every connection task.
///
/// # Examples
///
/// ```rust,no_run
/// use tdrpc::server::RpcServer;
/// use tdrpc::transport::TcpListener;
/// # use tdrpc::dispatch::Module;
/// # async fn example(memory: impl Module) -> Result<(), Box<dyn std::error::Error>> {
/// let server = RpcServer::builder().module(&memory)?.build();
/// let listener = TcpListener::bind("0.0.0.0:9090").await?;
/// server.serve(listener).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RpcServer {
    registry: Arc<Registry>,
    versions: Arc<HashMap<String, String>>,
}

impl RpcServer {
    /// Starts collecting modules for a new server.
    pub fn builder() -> RpcServerBuilder {
        RpcServerBuilder::default()
    }

    /// Returns the frozen registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Accepts connections forever, serving each on its own task.
    ///
    /// # Errors
    ///
    /// Only listener failures end the loop; per-connection failures are
    /// logged and the loop keeps accepting.
    pub async fn serve<L>(&self, listener: L) -> Result<(), TransportError>
    where
        L: Listener,
    {
        info!(address = listener.local_addr()?.as_str(), "server listening");
        loop {
            let transport = listener.accept().await?;
            let server = self.clone();
            tokio::spawn(async move {
                if let Err(err) = server.serve_connection(transport).await {
                    warn!(%err, "connection ended with transport error");
                }
            });
        }
    }

    /// Serves one connection to completion.
    ///
    /// Requests are handled strictly in order; the loop ends when the peer
    /// closes the stream.
    ///
    /// # Errors
    ///
    /// Transport failures reading or writing frames.
    pub async fn serve_connection<T>(&self, mut transport: T) -> Result<(), TransportError>
    where
        T: Transport,
    {
        let id = transport.metadata().id;
        debug!(transport = %id, "connection open");

        while let Some(payload) = read_frame(&mut transport).await? {
            let reply = match Frame::parse(&payload) {
                Ok(request) => self.dispatch(&request),
                Err(err) => {
                    // The request never made it to a handler; answer with
                    // the codec diagnostic instead of dropping the peer.
                    warn!(transport = %id, %err, "unparseable request frame");
                    let mut reply = Frame::reply();
                    write_error_frame(&mut reply, &err.to_string());
                    reply
                }
            };

            let bytes = reply
                .encode()
                .map_err(|err: FrameError| TransportError::ConnectionLost {
                    reason: format!("reply frame could not be encoded: {err}"),
                })?;
            write_frame(&mut transport, &bytes).await?;
        }

        debug!(transport = %id, "connection closed by peer");
        Ok(())
    }

    /// Routes one request to its handler and returns the reply frame.
    fn dispatch(&self, request: &Frame) -> Frame {
        let routing_key = request.method();
        debug!(method = routing_key, "dispatching");

        let mut reply = Frame::reply();
        if routing_key == LoadModule::routing_key() {
            invoke::<LoadModule, _>(
                &|(name, expected): (String, String)| check_module(&self.versions, &name, &expected),
                request,
                &mut reply,
            );
            return reply;
        }

        match self.registry.handler(routing_key) {
            Some(handler) => handler(request, &mut reply),
            None => {
                warn!(method = routing_key, "method not found");
                write_error_frame(&mut reply, &format!("method not found: {routing_key}"));
            }
        }
        reply
    }
}

/// Body of the built-in `module.load` handshake.
fn check_module(
    versions: &HashMap<String, String>,
    name: &str,
    expected: &str,
) -> Result<(), MethodError> {
    match versions.get(name) {
        Some(actual) if actual == expected => Ok(()),
        Some(actual) => Err(MethodError::new(format!(
            "module {name} version mismatch: loaded {actual:?}, expected {expected:?}"
        ))),
        None => Err(MethodError::new(format!("module {name} is not loaded"))),
    }
}
