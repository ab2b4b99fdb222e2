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

//! Frame layer error types.
//!
//! Frame errors cover every way a keyed frame can reject an operation:
//! reading a key that is absent, reading a key as the wrong type, writing
//! past the frame's byte budget, writing a key twice, and parsing a byte
//! sequence whose self-description is inconsistent.
//!
//! The `Display` strings of these variants are part of the wire-visible
//! behavior: the server-side dispatcher reports a trapped frame error to the
//! remote caller using exactly the rendering below, so changing a message
//! here changes what clients observe in the `"error"` key.

use crate::frame::WireType;
use thiserror::Error;

/// Errors raised by the [`Frame`](crate::frame::Frame) codec.
///
/// # Examples
///
/// ```rust
/// use tdrpc::frame::{Frame, FrameError};
///
/// let frame = Frame::reply();
/// let err = frame.get_word("0").unwrap_err();
/// assert_eq!(err, FrameError::BadKey { key: "0".to_string() });
/// assert_eq!(err.to_string(), "bad RPC key 0");
/// ```
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FrameError {
    /// A typed getter was asked for a key that is not present in the frame.
    ///
    /// On a response frame this indicates a schema break between the
    /// caller's declared return type and what the server actually produced.
    #[error("bad RPC key {key}")]
    BadKey {
        /// The key that was requested.
        key: String,
    },

    /// A key is present but holds a value of a different wire type than the
    /// one requested.
    #[error("RPC type error")]
    Type {
        /// The key that was requested.
        key: String,
        /// The wire type the caller asked for.
        expected: WireType,
        /// The wire type actually stored under the key.
        found: WireType,
    },

    /// The frame cannot hold the requested write.
    ///
    /// Raised when an insertion would push the encoded size past the frame's
    /// byte budget, and for the degenerate shapes the format cannot express
    /// (key names longer than `u16::MAX` bytes, more than `u16::MAX` keys).
    #[error("RPC buffer too small")]
    BufferTooSmall {
        /// Encoded size the operation would have required.
        needed: usize,
        /// The budget that was exceeded.
        capacity: usize,
    },

    /// A byte sequence handed to [`Frame::parse`](crate::frame::Frame::parse)
    /// is not a well-formed frame.
    #[error("corrupt RPC message: {reason}")]
    Corrupt {
        /// What exactly was inconsistent.
        reason: String,
    },

    /// A setter was asked to write a key that already exists.
    ///
    /// Keys are write-once; the positional discipline of the message layer
    /// never produces the same key twice, so hitting this from a method stub
    /// indicates a handler wrote to the response out of band.
    #[error("duplicate RPC key {key}")]
    KeyExists {
        /// The key that was written twice.
        key: String,
    },
}

impl FrameError {
    /// Shorthand used by the parser for [`FrameError::Corrupt`].
    pub(crate) fn corrupt(reason: impl Into<String>) -> Self {
        FrameError::Corrupt {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_wire_taxonomy() {
        let bad_key = FrameError::BadKey {
            key: "7".to_string(),
        };
        assert_eq!(bad_key.to_string(), "bad RPC key 7");

        let type_err = FrameError::Type {
            key: "0".to_string(),
            expected: WireType::Word,
            found: WireType::Str,
        };
        assert_eq!(type_err.to_string(), "RPC type error");

        let buffer = FrameError::BufferTooSmall {
            needed: 128,
            capacity: 64,
        };
        assert_eq!(buffer.to_string(), "RPC buffer too small");

        let corrupt = FrameError::corrupt("bad magic");
        assert_eq!(corrupt.to_string(), "corrupt RPC message: bad magic");

        let exists = FrameError::KeyExists {
            key: "0".to_string(),
        };
        assert_eq!(exists.to_string(), "duplicate RPC key 0");
    }
}
