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

//! Cursor-disciplined views over a [`Frame`].
//!
//! The positional contract (the *i*-th argument or return element lives
//! under the key `"i"`) is enforced by construction here. A
//! [`MessageWriter`] owns a write cursor starting at 0 and only ever appends
//! at it; a [`MessageReader`] owns a read cursor starting at 0 and only ever
//! consumes at it. The type-directed layer goes through [`push`] and [`pop`]
//! exclusively, so key order always equals declaration order on both sides.
//!
//! Read mode and write mode are separate types over shared and exclusive
//! frame borrows, so a message can never switch modes after creation, and a
//! writer's borrow ends before the transport observes the frame.
//!
//! [`push`]: MessageWriter::push
//! [`pop`]: MessageReader::pop
//!
//! # Examples
//!
//! ```rust
//! use tdrpc::frame::Frame;
//! use tdrpc::message::{MessageReader, MessageWriter};
//!
//! # fn example() -> Result<(), tdrpc::frame::FrameError> {
//! let mut frame = Frame::request("memory.Write", 1);
//! let mut writer = MessageWriter::new(&mut frame);
//! writer.push(0x1000u32)?;
//! writer.push(vec![0xau32, 0xb, 0xc])?;
//!
//! let mut reader = MessageReader::new(&frame);
//! assert_eq!(reader.pop::<u32>()?, 0x1000);
//! assert_eq!(reader.pop::<Vec<u32>>()?, vec![0xa, 0xb, 0xc]);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use crate::frame::{Frame, FrameError};
use crate::wire::Wire;

/// Write-mode view over a frame.
///
/// Each [`push`](MessageWriter::push) stores one element (scalar, string or
/// vector) under the decimal key of the current cursor, then advances the
/// cursor by exactly one.
#[derive(Debug)]
pub struct MessageWriter<'a> {
    frame: &'a mut Frame,
    next_key: u32,
}

impl<'a> MessageWriter<'a> {
    /// Creates a writer with its cursor at key `"0"`.
    pub fn new(frame: &'a mut Frame) -> Self {
        MessageWriter { frame, next_key: 0 }
    }

    /// Writes `value` at the cursor and advances it.
    ///
    /// # Errors
    ///
    /// Propagates the frame's write errors; on error the cursor does not
    /// move.
    pub fn push<T: Wire>(&mut self, value: T) -> Result<(), FrameError> {
        self.frame.set(self.next_key.to_string(), value.into_value())?;
        self.next_key += 1;
        Ok(())
    }

    /// Returns the key index the next [`push`](MessageWriter::push) will use.
    pub fn next_key(&self) -> u32 {
        self.next_key
    }
}

/// Read-mode view over a frame.
///
/// Each [`pop`](MessageReader::pop) consumes one element at the cursor and
/// advances it. The backing frame is borrowed immutably and never changes
/// underneath the reader.
#[derive(Debug)]
pub struct MessageReader<'a> {
    frame: &'a Frame,
    next_key: u32,
}

impl<'a> MessageReader<'a> {
    /// Creates a reader with its cursor at key `"0"`.
    pub fn new(frame: &'a Frame) -> Self {
        MessageReader { frame, next_key: 0 }
    }

    /// Reads the element at the cursor as `T` and advances the cursor.
    ///
    /// # Errors
    ///
    /// [`FrameError::BadKey`] if the cursor key is absent,
    /// [`FrameError::Type`] if it holds a different wire type. On error the
    /// cursor does not move.
    pub fn pop<T: Wire>(&mut self) -> Result<T, FrameError> {
        let key = self.next_key.to_string();
        let value = self.frame.get(&key)?;
        let decoded = T::from_value(value).ok_or_else(|| FrameError::Type {
            key: key.clone(),
            expected: T::WIRE_TYPE,
            found: value.wire_type(),
        })?;
        self.next_key += 1;
        Ok(decoded)
    }

    /// Returns the key index the next [`pop`](MessageReader::pop) will use.
    pub fn next_key(&self) -> u32 {
        self.next_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_assigns_dense_decimal_keys() {
        let mut frame = Frame::request("test.Echo", 0);
        let mut writer = MessageWriter::new(&mut frame);
        writer.push(1u32).unwrap();
        writer.push("two".to_string()).unwrap();
        writer.push(vec![3u32]).unwrap();
        assert_eq!(writer.next_key(), 3);

        let keys: Vec<&str> = frame.keys().collect();
        assert_eq!(keys, ["0", "1", "2"]);
    }

    #[test]
    fn test_vector_occupies_one_key() {
        let mut frame = Frame::reply();
        let mut writer = MessageWriter::new(&mut frame);
        writer.push(vec![1u32, 2, 3, 4]).unwrap();
        assert_eq!(writer.next_key(), 1);
        assert_eq!(frame.len(), 1);
    }

    #[test]
    fn test_pop_reads_in_write_order() {
        let mut frame = Frame::reply();
        let mut writer = MessageWriter::new(&mut frame);
        writer.push(10u32).unwrap();
        writer.push(20u32).unwrap();

        let mut reader = MessageReader::new(&frame);
        assert_eq!(reader.pop::<u32>().unwrap(), 10);
        assert_eq!(reader.pop::<u32>().unwrap(), 20);
    }

    #[test]
    fn test_pop_past_end_is_bad_key() {
        let mut frame = Frame::reply();
        let mut writer = MessageWriter::new(&mut frame);
        writer.push(1u32).unwrap();

        let mut reader = MessageReader::new(&frame);
        reader.pop::<u32>().unwrap();
        assert_eq!(
            reader.pop::<u32>(),
            Err(FrameError::BadKey {
                key: "1".to_string()
            })
        );
    }

    #[test]
    fn test_pop_type_mismatch_leaves_cursor_in_place() {
        let mut frame = Frame::reply();
        let mut writer = MessageWriter::new(&mut frame);
        writer.push("text".to_string()).unwrap();

        let mut reader = MessageReader::new(&frame);
        let err = reader.pop::<u32>().unwrap_err();
        assert!(matches!(err, FrameError::Type { .. }));
        assert_eq!(reader.next_key(), 0);
        // The same element can still be read with the right type.
        assert_eq!(reader.pop::<String>().unwrap(), "text");
    }
}
