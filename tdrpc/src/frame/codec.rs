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

//! Byte-level encoding of [`Frame`]s.
//!
//! All integers are big-endian. The layout is self-describing: every value
//! carries a one-byte type tag, so a reader never needs the method signature
//! to walk a frame.
//!
//! # Layout
//!
//! ```text
//! +-------+---------+----------+------------+-----------+-----------+
//! | magic | version | revision | method len |  method   | key count |
//! |  u32  |   u8    |   u32    |    u16     |  n bytes  |    u16    |
//! +-------+---------+----------+------------+-----------+-----------+
//! then per key:
//! +---------+--------+-----+----------------+
//! | name len|  name  | tag |    payload     |
//! |   u16   | n bytes| u8  | tag-dependent  |
//! +---------+--------+-----+----------------+
//! ```
//!
//! Payloads: `word` is a `u32`; `string` is `u32` length + UTF-8 bytes;
//! `word array` is `u32` count + that many `u32`s; `string array` is `u32`
//! count + that many (`u32` length + UTF-8 bytes) items.
//!
//! Parsing is strict: unknown magic, version or tags, truncation, invalid
//! UTF-8, duplicate names and trailing bytes all fail with
//! [`FrameError::Corrupt`].

use crate::frame::{Frame, FrameError, Value};

const MAGIC: [u8; 4] = *b"TDRP";
const VERSION: u8 = 1;

const TAG_WORD: u8 = 1;
const TAG_STR: u8 = 2;
const TAG_WORD_ARRAY: u8 = 3;
const TAG_STR_ARRAY: u8 = 4;

/// Encoded size of a frame with no keys: magic, version, revision, method
/// length + bytes, key count.
pub(crate) fn base_len(method: &str) -> usize {
    4 + 1 + 4 + 2 + method.len() + 2
}

/// Encoded size one key contributes to a frame.
pub(crate) fn entry_len(name: &str, value: &Value) -> usize {
    2 + name.len() + 1 + payload_len(value)
}

fn payload_len(value: &Value) -> usize {
    match value {
        Value::Word(_) => 4,
        Value::Str(s) => 4 + s.len(),
        Value::WordArray(words) => 4 + 4 * words.len(),
        Value::StrArray(items) => 4 + items.iter().map(|s| 4 + s.len()).sum::<usize>(),
    }
}

impl Frame {
    /// Encodes the frame into a byte vector.
    ///
    /// Encoding is deterministic: the same sequence of writes always yields
    /// byte-identical output.
    ///
    /// # Errors
    ///
    /// [`FrameError::BufferTooSmall`] if the routing key is longer than the
    /// format's `u16` length field can express. Every other limit is already
    /// enforced at insertion time.
    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let Ok(method_len) = u16::try_from(self.method.len()) else {
            return Err(FrameError::BufferTooSmall {
                needed: self.method.len(),
                capacity: u16::MAX as usize,
            });
        };

        let mut out = Vec::with_capacity(self.size);
        out.extend_from_slice(&MAGIC);
        out.push(VERSION);
        out.extend_from_slice(&self.revision.to_be_bytes());
        out.extend_from_slice(&method_len.to_be_bytes());
        out.extend_from_slice(self.method.as_bytes());
        out.extend_from_slice(&(self.entries.len() as u16).to_be_bytes());

        for (name, value) in &self.entries {
            out.extend_from_slice(&(name.len() as u16).to_be_bytes());
            out.extend_from_slice(name.as_bytes());
            match value {
                Value::Word(word) => {
                    out.push(TAG_WORD);
                    out.extend_from_slice(&word.to_be_bytes());
                }
                Value::Str(s) => {
                    out.push(TAG_STR);
                    put_str(&mut out, s);
                }
                Value::WordArray(words) => {
                    out.push(TAG_WORD_ARRAY);
                    out.extend_from_slice(&(words.len() as u32).to_be_bytes());
                    for word in words {
                        out.extend_from_slice(&word.to_be_bytes());
                    }
                }
                Value::StrArray(items) => {
                    out.push(TAG_STR_ARRAY);
                    out.extend_from_slice(&(items.len() as u32).to_be_bytes());
                    for item in items {
                        put_str(&mut out, item);
                    }
                }
            }
        }

        debug_assert_eq!(out.len(), self.size);
        Ok(out)
    }

    /// Parses a frame from its encoded byte form.
    ///
    /// # Errors
    ///
    /// [`FrameError::Corrupt`] for any inconsistency in the frame's
    /// self-description.
    pub fn parse(bytes: &[u8]) -> Result<Frame, FrameError> {
        let mut reader = Reader::new(bytes);

        if reader.take(4, "magic")? != MAGIC {
            return Err(FrameError::corrupt("bad magic"));
        }
        let version = reader.u8("version")?;
        if version != VERSION {
            return Err(FrameError::corrupt(format!(
                "unsupported version {version}"
            )));
        }
        let revision = reader.u32("revision")?;
        let method_len = reader.u16("method length")? as usize;
        let method = reader.string(method_len, "method")?;
        let count = reader.u16("key count")?;

        let mut frame = Frame::request(method, revision);
        for _ in 0..count {
            let name_len = reader.u16("key name length")? as usize;
            let name = reader.string(name_len, "key name")?;
            let value = reader.value()?;
            frame.set(name, value).map_err(|err| match err {
                FrameError::KeyExists { key } => {
                    FrameError::corrupt(format!("duplicate key {key}"))
                }
                other => other,
            })?;
        }

        if reader.remaining() != 0 {
            return Err(FrameError::corrupt(format!(
                "{} trailing bytes",
                reader.remaining()
            )));
        }
        Ok(frame)
    }
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(&(s.len() as u32).to_be_bytes());
    out.extend_from_slice(s.as_bytes());
}

/// Strict forward-only reader over an encoded frame.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Reader { buf, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.buf.len().saturating_sub(self.pos)
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8], FrameError> {
        if self.remaining() < len {
            return Err(FrameError::corrupt(format!("truncated {what}")));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, what: &str) -> Result<u8, FrameError> {
        Ok(self.take(1, what)?[0])
    }

    fn u16(&mut self, what: &str) -> Result<u16, FrameError> {
        let bytes = self.take(2, what)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    fn u32(&mut self, what: &str) -> Result<u32, FrameError> {
        let bytes = self.take(4, what)?;
        Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn string(&mut self, len: usize, what: &str) -> Result<String, FrameError> {
        let bytes = self.take(len, what)?;
        let s = std::str::from_utf8(bytes)
            .map_err(|_| FrameError::corrupt(format!("invalid UTF-8 in {what}")))?;
        Ok(s.to_string())
    }

    fn value(&mut self) -> Result<Value, FrameError> {
        let tag = self.u8("value tag")?;
        match tag {
            TAG_WORD => Ok(Value::Word(self.u32("word")?)),
            TAG_STR => {
                let len = self.u32("string length")? as usize;
                Ok(Value::Str(self.string(len, "string")?))
            }
            TAG_WORD_ARRAY => {
                let count = self.u32("word array count")? as usize;
                // Bound the allocation by what the buffer can actually hold.
                if count.checked_mul(4).map_or(true, |len| len > self.remaining()) {
                    return Err(FrameError::corrupt("truncated word array"));
                }
                let mut words = Vec::with_capacity(count);
                for _ in 0..count {
                    words.push(self.u32("word array item")?);
                }
                Ok(Value::WordArray(words))
            }
            TAG_STR_ARRAY => {
                let count = self.u32("string array count")? as usize;
                if count.checked_mul(4).map_or(true, |len| len > self.remaining()) {
                    return Err(FrameError::corrupt("truncated string array"));
                }
                let mut items = Vec::with_capacity(count);
                for _ in 0..count {
                    let len = self.u32("string array item length")? as usize;
                    items.push(self.string(len, "string array item")?);
                }
                Ok(Value::StrArray(items))
            }
            other => Err(FrameError::corrupt(format!("invalid value tag {other}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> Frame {
        let mut frame = Frame::request("memory.Read", 1);
        frame.set_word("0", 0x6640_000c).unwrap();
        frame.set_word("1", 1).unwrap();
        frame.set_string("note", "calibration pass").unwrap();
        frame.set_word_array("data", vec![0xdead_beef, 0xcafe]).unwrap();
        frame
            .set_string_array("tags", vec!["a".to_string(), "bb".to_string()])
            .unwrap();
        frame
    }

    #[test]
    fn test_round_trip_preserves_frame() {
        let frame = sample_frame();
        let bytes = frame.encode().unwrap();
        let parsed = Frame::parse(&bytes).unwrap();
        assert_eq!(parsed, frame);
        assert_eq!(parsed.method(), "memory.Read");
        assert_eq!(parsed.revision(), 1);
    }

    #[test]
    fn test_encode_is_deterministic() {
        // Two independent builds with the same write sequence must be
        // byte-identical.
        let first = sample_frame().encode().unwrap();
        let second = sample_frame().encode().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encoded_size_accounting_matches() {
        let frame = sample_frame();
        let bytes = frame.encode().unwrap();
        assert_eq!(bytes.len(), frame.size);
    }

    #[test]
    fn test_parse_rejects_bad_magic() {
        let mut bytes = sample_frame().encode().unwrap();
        bytes[0] = b'X';
        let err = Frame::parse(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "corrupt RPC message: bad magic");
    }

    #[test]
    fn test_parse_rejects_unknown_version() {
        let mut bytes = sample_frame().encode().unwrap();
        bytes[4] = 99;
        let err = Frame::parse(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "corrupt RPC message: unsupported version 99");
    }

    #[test]
    fn test_parse_rejects_truncation() {
        let bytes = sample_frame().encode().unwrap();
        for cut in [3, 8, bytes.len() / 2, bytes.len() - 1] {
            let err = Frame::parse(&bytes[..cut]).unwrap_err();
            assert!(
                matches!(err, FrameError::Corrupt { .. }),
                "cut at {cut} gave {err:?}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_trailing_bytes() {
        let mut bytes = sample_frame().encode().unwrap();
        bytes.extend_from_slice(&[0, 0, 0]);
        let err = Frame::parse(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "corrupt RPC message: 3 trailing bytes");
    }

    #[test]
    fn test_parse_rejects_unknown_tag() {
        let mut frame = Frame::reply();
        frame.set_word("0", 7).unwrap();
        let mut bytes = frame.encode().unwrap();
        // The tag byte of the only entry sits right after its name.
        let tag_at = bytes.len() - 5;
        bytes[tag_at] = 42;
        let err = Frame::parse(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "corrupt RPC message: invalid value tag 42");
    }

    #[test]
    fn test_parse_rejects_duplicate_keys() {
        // Hand-build a frame whose bytes carry the same name twice.
        let mut frame = Frame::reply();
        frame.set_word("0", 1).unwrap();
        let single = frame.encode().unwrap();
        let entry = &single[base_len("")..];

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&single[..base_len("") - 2]);
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(entry);
        bytes.extend_from_slice(entry);

        let err = Frame::parse(&bytes).unwrap_err();
        assert_eq!(err.to_string(), "corrupt RPC message: duplicate key 0");
    }

    #[test]
    fn test_parse_rejects_invalid_utf8() {
        let mut frame = Frame::reply();
        frame.set_string("0", "abcd").unwrap();
        let mut bytes = frame.encode().unwrap();
        let len = bytes.len();
        bytes[len - 2] = 0xff;
        let err = Frame::parse(&bytes).unwrap_err();
        assert!(err.to_string().contains("invalid UTF-8"));
    }

    #[test]
    fn test_empty_reply_round_trips() {
        let frame = Frame::reply();
        let parsed = Frame::parse(&frame.encode().unwrap()).unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed.method(), "");
    }
}
