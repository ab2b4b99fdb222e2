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

//! Top-level error types for TDRPC.
//!
//! The call path has a three-layer error hierarchy:
//!
//! 1. **Transport**: the bytes did not move
//!    ([`TransportError`](crate::transport::TransportError));
//! 2. **Frame**: the bytes moved but violated the codec contract
//!    ([`FrameError`](crate::frame::FrameError)); on a response this means
//!    client and server disagree about the method signature, a contract
//!    break rather than a retriable fault;
//! 3. **Remote**: the server executed the method and reported a failure
//!    ([`RemoteError`]).
//!
//! [`RpcError`] composes the three; nothing in the core retries any of
//! them. Registration failures are deliberately *not* part of this
//! hierarchy: they abort module load long before any call exists
//! ([`RegistrationError`](crate::dispatch::RegistrationError)).

use crate::frame::{Frame, FrameError, BACKTRACE_KEY, ERROR_KEY};
use crate::transport::TransportError;
use thiserror::Error;

/// Everything a remote call can fail with.
#[derive(Debug, Error)]
pub enum RpcError {
    /// The transport could not carry the call.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame violated the codec contract (schema break or corruption).
    #[error(transparent)]
    Frame(#[from] FrameError),

    /// The server trapped a failure while executing the method.
    #[error(transparent)]
    Remote(#[from] RemoteError),
}

impl RpcError {
    /// Returns `true` for transport-layer failures.
    pub fn is_transport(&self) -> bool {
        matches!(self, RpcError::Transport(_))
    }

    /// Returns `true` for codec contract breaks.
    pub fn is_frame(&self) -> bool {
        matches!(self, RpcError::Frame(_))
    }

    /// Returns `true` for server-reported failures.
    pub fn is_remote(&self) -> bool {
        matches!(self, RpcError::Remote(_))
    }
}

/// A failure reported by the server, reconstructed from a reply frame
/// carrying the reserved `"error"` key.
///
/// The message is the free-form text the server-side trap produced; the
/// backtrace is present only when the server could capture symbols.
///
/// # Examples
///
/// ```rust
/// use tdrpc::error::RemoteError;
/// use tdrpc::frame::Frame;
///
/// let mut reply = Frame::reply();
/// reply.set_string("error", "read memsvc error: EIO").unwrap();
///
/// let err = RemoteError::from_reply(&reply).unwrap();
/// assert_eq!(err.message(), "read memsvc error: EIO");
/// assert!(!err.has_backtrace());
/// assert!(err.backtrace().is_empty());
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("remote error: {message}")]
pub struct RemoteError {
    message: String,
    has_backtrace: bool,
    backtrace: Vec<String>,
}

impl RemoteError {
    /// Reconstructs the error from a reply frame.
    ///
    /// # Errors
    ///
    /// Propagates frame errors if the reserved keys carry the wrong types,
    /// another shape of contract break.
    pub fn from_reply(reply: &Frame) -> Result<Self, FrameError> {
        let message = reply.get_string(ERROR_KEY)?.to_string();
        let has_backtrace = reply.key_exists(BACKTRACE_KEY);
        let backtrace = if has_backtrace {
            reply.get_string_array(BACKTRACE_KEY)?.to_vec()
        } else {
            Vec::new()
        };
        Ok(RemoteError {
            message,
            has_backtrace,
            backtrace,
        })
    }

    /// The error text exactly as the server produced it.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns `true` if the reply carried a backtrace.
    pub fn has_backtrace(&self) -> bool {
        self.has_backtrace
    }

    /// The remote backtrace; empty when [`has_backtrace`](Self::has_backtrace)
    /// is `false`.
    pub fn backtrace(&self) -> &[String] {
        &self.backtrace
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_with_backtrace_round_trips() {
        let mut reply = Frame::reply();
        reply.set_string(ERROR_KEY, "boom").unwrap();
        reply
            .set_string_array(
                BACKTRACE_KEY,
                vec!["frame_a".to_string(), "frame_b".to_string()],
            )
            .unwrap();

        let err = RemoteError::from_reply(&reply).unwrap();
        assert_eq!(err.message(), "boom");
        assert!(err.has_backtrace());
        assert_eq!(err.backtrace(), &["frame_a", "frame_b"]);
        assert_eq!(err.to_string(), "remote error: boom");
    }

    #[test]
    fn test_mistyped_error_key_is_a_frame_error() {
        let mut reply = Frame::reply();
        reply.set_word(ERROR_KEY, 500).unwrap();
        let err = RemoteError::from_reply(&reply).unwrap_err();
        assert!(matches!(err, FrameError::Type { .. }));
    }

    #[test]
    fn test_rpc_error_predicates() {
        let remote: RpcError = RemoteError::from_reply(&{
            let mut reply = Frame::reply();
            reply.set_string(ERROR_KEY, "x").unwrap();
            reply
        })
        .unwrap()
        .into();
        assert!(remote.is_remote());
        assert!(!remote.is_transport());
        assert!(!remote.is_frame());

        let frame: RpcError = FrameError::BadKey {
            key: "0".to_string(),
        }
        .into();
        assert!(frame.is_frame());

        let transport: RpcError = TransportError::ConnectionLost {
            reason: "gone".to_string(),
        }
        .into();
        assert!(transport.is_transport());
    }
}
