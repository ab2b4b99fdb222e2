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

//! The keyed frame: TDRPC's wire envelope.
//!
//! A [`Frame`] is a self-describing key/value container with a frame-level
//! routing key (`method`) and a revision word. Values are drawn from a closed
//! set of four wire types ([`WireType`]); keys are arbitrary strings, though
//! the message layer only ever uses the decimal numerals `"0"`, `"1"`, ... plus
//! the two names reserved on replies, [`ERROR_KEY`] and [`BACKTRACE_KEY`].
//!
//! The frame is the lowest layer of the stack and knows nothing about method
//! signatures or positional cursors; that discipline lives in
//! [`message`](crate::message) and [`wire`](crate::wire).
//!
//! # Examples
//!
//! ```rust
//! use tdrpc::frame::Frame;
//!
//! # fn example() -> Result<(), tdrpc::frame::FrameError> {
//! let mut frame = Frame::request("memory.Read", 1);
//! frame.set_word("0", 0x6640_000c)?;
//! frame.set_word("1", 1)?;
//!
//! assert_eq!(frame.method(), "memory.Read");
//! assert_eq!(frame.get_word("0")?, 0x6640_000c);
//!
//! // Frames survive an encode/parse round-trip unchanged.
//! let bytes = frame.encode()?;
//! assert_eq!(Frame::parse(&bytes)?, frame);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

mod codec;
mod error;

pub use error::FrameError;

use std::fmt;

/// Reserved key on reply frames carrying the remote error text.
pub const ERROR_KEY: &str = "error";

/// Reserved key on reply frames carrying the optional remote backtrace.
pub const BACKTRACE_KEY: &str = "backtrace";

/// Default byte budget of a frame (16 MiB).
///
/// Matches the framing layer's
/// [`MAX_FRAME_SIZE`](crate::transport::framing::MAX_FRAME_SIZE): a frame
/// built against the default budget always fits in one wire frame.
pub const DEFAULT_CAPACITY: usize = 16 * 1024 * 1024;

/// The closed set of transmissible value types.
///
/// This set is part of the wire contract and is deliberately not extensible;
/// serialization everywhere in the crate is a match on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireType {
    /// An unsigned 32-bit integer.
    Word,
    /// A UTF-8 string.
    Str,
    /// An ordered sequence of unsigned 32-bit integers.
    WordArray,
    /// An ordered sequence of UTF-8 strings.
    StrArray,
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Word => "word",
            WireType::Str => "string",
            WireType::WordArray => "word array",
            WireType::StrArray => "string array",
        };
        f.write_str(name)
    }
}

/// An owned value of one of the four wire types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// An unsigned 32-bit integer.
    Word(u32),
    /// A UTF-8 string.
    Str(String),
    /// An ordered sequence of unsigned 32-bit integers.
    WordArray(Vec<u32>),
    /// An ordered sequence of UTF-8 strings.
    StrArray(Vec<String>),
}

impl Value {
    /// Returns the wire type tag of this value.
    pub fn wire_type(&self) -> WireType {
        match self {
            Value::Word(_) => WireType::Word,
            Value::Str(_) => WireType::Str,
            Value::WordArray(_) => WireType::WordArray,
            Value::StrArray(_) => WireType::StrArray,
        }
    }
}

/// A self-describing keyed frame.
///
/// A frame carries a routing key (`method`), a revision word, and an ordered
/// list of named values. Keys are write-once: setters fail with
/// [`FrameError::KeyExists`] rather than overwrite. Every write is checked
/// against the frame's byte budget so that a frame accepted here is always
/// encodable and transmittable.
///
/// Entry order is insertion order and is preserved across
/// [`encode`](Frame::encode) / [`parse`](Frame::parse), which makes encoding
/// deterministic: the same sequence of writes always produces byte-identical
/// frames.
#[derive(Debug, Clone)]
pub struct Frame {
    method: String,
    revision: u32,
    entries: Vec<(String, Value)>,
    /// Byte budget; writes that would exceed it fail with `BufferTooSmall`.
    capacity: usize,
    /// Running encoded size, maintained by every insertion.
    size: usize,
}

impl Frame {
    /// Creates an empty request frame with the given routing key and
    /// revision, using the default byte budget.
    pub fn request(method: impl Into<String>, revision: u32) -> Self {
        Self::with_capacity(method, revision, DEFAULT_CAPACITY)
    }

    /// Creates an empty reply frame.
    ///
    /// Replies carry no routing key; the transport correlates a reply with
    /// its request by position in the stream (one reply per request, in
    /// order).
    pub fn reply() -> Self {
        Self::with_capacity(String::new(), 0, DEFAULT_CAPACITY)
    }

    /// Creates an empty frame with an explicit byte budget.
    ///
    /// Mostly useful in tests that need to provoke
    /// [`FrameError::BufferTooSmall`] without building multi-megabyte
    /// payloads.
    pub fn with_capacity(method: impl Into<String>, revision: u32, capacity: usize) -> Self {
        let method = method.into();
        let size = codec::base_len(&method);
        Frame {
            method,
            revision,
            entries: Vec::new(),
            capacity,
            size,
        }
    }

    /// Returns the routing key (empty on reply frames).
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Returns the revision word.
    ///
    /// The revision is transmitted verbatim and never used for matching.
    pub fn revision(&self) -> u32 {
        self.revision
    }

    /// Returns the number of keys in the frame.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the frame holds no keys.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `true` if a key with the given name exists.
    pub fn key_exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Returns the names of all keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Removes every key, keeping the routing key and revision.
    ///
    /// The server-side error trap uses this to guarantee that an error reply
    /// never carries leftover positional keys from a partially written
    /// response.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.size = codec::base_len(&self.method);
    }

    /// Stores a [`Value`] under `name`.
    ///
    /// # Errors
    ///
    /// [`FrameError::KeyExists`] if the key is already present,
    /// [`FrameError::BufferTooSmall`] if the write does not fit the budget.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Result<(), FrameError> {
        let name = name.into();
        if self.key_exists(&name) {
            return Err(FrameError::KeyExists { key: name });
        }
        // Shapes the byte format cannot express are capacity failures too.
        if name.len() > u16::MAX as usize {
            return Err(FrameError::BufferTooSmall {
                needed: name.len(),
                capacity: u16::MAX as usize,
            });
        }
        if self.entries.len() >= u16::MAX as usize {
            return Err(FrameError::BufferTooSmall {
                needed: self.entries.len() + 1,
                capacity: u16::MAX as usize,
            });
        }
        let needed = self.size + codec::entry_len(&name, &value);
        if needed > self.capacity {
            return Err(FrameError::BufferTooSmall {
                needed,
                capacity: self.capacity,
            });
        }
        self.size = needed;
        self.entries.push((name, value));
        Ok(())
    }

    /// Stores an unsigned 32-bit integer under `name`.
    pub fn set_word(&mut self, name: impl Into<String>, value: u32) -> Result<(), FrameError> {
        self.set(name, Value::Word(value))
    }

    /// Stores a string under `name`.
    pub fn set_string(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), FrameError> {
        self.set(name, Value::Str(value.into()))
    }

    /// Stores a word array under `name`.
    pub fn set_word_array(
        &mut self,
        name: impl Into<String>,
        value: Vec<u32>,
    ) -> Result<(), FrameError> {
        self.set(name, Value::WordArray(value))
    }

    /// Stores a string array under `name`.
    pub fn set_string_array(
        &mut self,
        name: impl Into<String>,
        value: Vec<String>,
    ) -> Result<(), FrameError> {
        self.set(name, Value::StrArray(value))
    }

    /// Returns the value stored under `name`.
    ///
    /// # Errors
    ///
    /// [`FrameError::BadKey`] if the key is absent.
    pub fn get(&self, name: &str) -> Result<&Value, FrameError> {
        self.lookup(name).ok_or_else(|| FrameError::BadKey {
            key: name.to_string(),
        })
    }

    /// Returns the word stored under `name`.
    ///
    /// # Errors
    ///
    /// [`FrameError::BadKey`] if absent, [`FrameError::Type`] if the key
    /// holds a different wire type.
    pub fn get_word(&self, name: &str) -> Result<u32, FrameError> {
        match self.get(name)? {
            Value::Word(value) => Ok(*value),
            other => Err(self.type_error(name, WireType::Word, other)),
        }
    }

    /// Returns the string stored under `name`.
    pub fn get_string(&self, name: &str) -> Result<&str, FrameError> {
        match self.get(name)? {
            Value::Str(value) => Ok(value),
            other => Err(self.type_error(name, WireType::Str, other)),
        }
    }

    /// Returns the word array stored under `name`.
    pub fn get_word_array(&self, name: &str) -> Result<&[u32], FrameError> {
        match self.get(name)? {
            Value::WordArray(value) => Ok(value),
            other => Err(self.type_error(name, WireType::WordArray, other)),
        }
    }

    /// Returns the string array stored under `name`.
    pub fn get_string_array(&self, name: &str) -> Result<&[String], FrameError> {
        match self.get(name)? {
            Value::StrArray(value) => Ok(value),
            other => Err(self.type_error(name, WireType::StrArray, other)),
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        // Frames hold a handful of keys; a scan beats hashing at this size
        // and keeps insertion order as the single source of truth.
        self.entries
            .iter()
            .find(|(key, _)| key.as_str() == name)
            .map(|(_, value)| value)
    }

    fn type_error(&self, name: &str, expected: WireType, found: &Value) -> FrameError {
        FrameError::Type {
            key: name.to_string(),
            expected,
            found: found.wire_type(),
        }
    }
}

/// Equality covers the wire-visible parts of a frame: routing key, revision
/// and entries. The byte budget is a local write-time limit and two frames
/// that differ only in budget still encode identically.
impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method
            && self.revision == other.revision
            && self.entries == other.entries
    }
}

impl Eq for Frame {}
