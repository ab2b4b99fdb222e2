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

//! Length-prefixed framing over a transport stream.
//!
//! One encoded [`Frame`](crate::frame::Frame) travels as one wire frame:
//!
//! ```text
//! +------------------+-------------------+
//! | length (4 bytes) | payload (N bytes) |
//! +------------------+-------------------+
//! ```
//!
//! The length is a big-endian `u32` and is capped at [`MAX_FRAME_SIZE`] in
//! both directions, so a broken or hostile peer cannot make the reader
//! allocate without bound.

use crate::transport::TransportError;
use std::io;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Maximum wire frame size (16 MiB), matching the frame layer's default
/// byte budget.
pub const MAX_FRAME_SIZE: usize = crate::frame::DEFAULT_CAPACITY;

/// Writes one length-prefixed frame and flushes the stream.
///
/// # Errors
///
/// [`TransportError::FrameTooLarge`] if the payload exceeds
/// [`MAX_FRAME_SIZE`], [`TransportError::WriteFailed`] on I/O failure.
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
{
    if payload.len() > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: payload.len(),
            limit: MAX_FRAME_SIZE,
        });
    }

    let length = (payload.len() as u32).to_be_bytes();
    writer
        .write_all(&length)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;
    writer
        .write_all(payload)
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;
    writer
        .flush()
        .await
        .map_err(|source| TransportError::WriteFailed { source })?;
    Ok(())
}

/// Reads one length-prefixed frame.
///
/// Returns `Ok(None)` when the peer closed the stream cleanly between
/// frames, the server loop's normal exit.
///
/// # Errors
///
/// [`TransportError::FrameTooLarge`] if the announced length exceeds
/// [`MAX_FRAME_SIZE`], [`TransportError::ConnectionLost`] if the stream
/// ends mid-frame, [`TransportError::ReadFailed`] on I/O failure.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, TransportError>
where
    R: AsyncRead + Unpin,
{
    let mut length = [0u8; 4];
    match reader.read_exact(&mut length).await {
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(source) => return Err(TransportError::ReadFailed { source }),
    }

    let length = u32::from_be_bytes(length) as usize;
    if length > MAX_FRAME_SIZE {
        return Err(TransportError::FrameTooLarge {
            size: length,
            limit: MAX_FRAME_SIZE,
        });
    }

    let mut payload = vec![0u8; length];
    reader.read_exact(&mut payload).await.map_err(|source| {
        if source.kind() == io::ErrorKind::UnexpectedEof {
            TransportError::ConnectionLost {
                reason: "stream ended mid-frame".to_string(),
            }
        } else {
            TransportError::ReadFailed { source }
        }
    })?;
    Ok(Some(payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trip_over_a_buffer() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"hello frames").await.unwrap();

        assert_eq!(&buffer[..4], &12u32.to_be_bytes());
        let mut reader = &buffer[..];
        let payload = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(payload, b"hello frames");
    }

    #[tokio::test]
    async fn test_clean_eof_reads_as_none() {
        let mut reader: &[u8] = &[];
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_eof_mid_frame_is_connection_lost() {
        let mut buffer = Vec::new();
        write_frame(&mut buffer, b"truncate me").await.unwrap();
        buffer.truncate(buffer.len() - 3);

        let mut reader = &buffer[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, TransportError::ConnectionLost { .. }));
    }

    #[tokio::test]
    async fn test_oversized_announcement_is_rejected() {
        let mut buffer = Vec::new();
        buffer.extend_from_slice(&(MAX_FRAME_SIZE as u32 + 1).to_be_bytes());

        let mut reader = &buffer[..];
        let err = read_frame(&mut reader).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
    }

    #[tokio::test]
    async fn test_oversized_payload_is_rejected_before_writing() {
        let payload = vec![0u8; MAX_FRAME_SIZE + 1];
        let mut buffer = Vec::new();
        let err = write_frame(&mut buffer, &payload).await.unwrap_err();
        assert!(matches!(err, TransportError::FrameTooLarge { .. }));
        assert!(buffer.is_empty());
    }
}
