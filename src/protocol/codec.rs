//! Protocol codec
//!
//! Encoding and decoding functions for the wire frame.
//!
//! The two-stage length prefix (outer body size plus inner per-field
//! lengths) lets a reader allocate once and check well-formedness before
//! interpreting the body.

use std::io::{ErrorKind, Read, Write};

use crate::error::{NetKvError, Result};
use super::{Frame, FrameType};

/// Byte length of the outer size prefix
pub const SIZE_PREFIX_LEN: usize = 8;

/// Maximum accepted body size (64 MB)
pub const MAX_BODY_SIZE: i64 = 64 * 1024 * 1024;

// =============================================================================
// Buffer-level Encoding/Decoding
// =============================================================================

/// Encode a frame to bytes: size prefix followed by the body
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let body = encode_body(frame);

    let mut message = Vec::with_capacity(SIZE_PREFIX_LEN + body.len());
    message.extend_from_slice(&(body.len() as i64).to_le_bytes());
    message.extend_from_slice(&body);

    message
}

/// Serialize the frame body: type, ttl, key_len + key, value_len + value
fn encode_body(frame: &Frame) -> Vec<u8> {
    let key = frame.key.as_bytes();

    let mut body = Vec::with_capacity(1 + 8 + 8 + key.len() + 8 + frame.value.len());
    body.extend_from_slice(&(frame.frame_type as i8).to_le_bytes());
    body.extend_from_slice(&frame.ttl.to_le_bytes());
    body.extend_from_slice(&(key.len() as i64).to_le_bytes());
    body.extend_from_slice(key);
    body.extend_from_slice(&(frame.value.len() as i64).to_le_bytes());
    body.extend_from_slice(&frame.value);

    body
}

/// Decode a frame from bytes containing the size prefix and body
pub fn decode_frame(bytes: &[u8]) -> Result<Frame> {
    if bytes.len() < SIZE_PREFIX_LEN {
        return Err(NetKvError::Eof);
    }

    let body_size = i64::from_le_bytes(
        bytes[..SIZE_PREFIX_LEN]
            .try_into()
            .map_err(|_| NetKvError::Eof)?,
    );
    check_body_size(body_size)?;

    let total = SIZE_PREFIX_LEN + body_size as usize;
    if bytes.len() < total {
        return Err(NetKvError::InvalidFrame(format!(
            "incomplete body: expected {} bytes, got {}",
            body_size,
            bytes.len() - SIZE_PREFIX_LEN
        )));
    }

    decode_body(&bytes[SIZE_PREFIX_LEN..total])
}

/// Parse a frame body; the whole slice must be consumed exactly
fn decode_body(body: &[u8]) -> Result<Frame> {
    let mut pos = 0usize;

    let tag = read_i8(body, &mut pos)?;
    let frame_type = FrameType::from_tag(tag)?;
    let ttl = read_i64(body, &mut pos)?;

    let key_len = read_i64(body, &mut pos)?;
    let key_bytes = read_bytes(body, &mut pos, key_len, "key")?;
    let key = String::from_utf8(key_bytes.to_vec())
        .map_err(|_| NetKvError::InvalidFrame("key is not valid UTF-8".to_string()))?;

    let value_len = read_i64(body, &mut pos)?;
    let value = read_bytes(body, &mut pos, value_len, "value")?.to_vec();

    if pos != body.len() {
        return Err(NetKvError::InvalidFrame(format!(
            "body has {} trailing bytes",
            body.len() - pos
        )));
    }

    Ok(Frame {
        frame_type,
        ttl,
        key,
        value,
    })
}

fn check_body_size(body_size: i64) -> Result<()> {
    if body_size < 0 {
        return Err(NetKvError::InvalidFrame(format!(
            "negative body size: {}",
            body_size
        )));
    }
    if body_size > MAX_BODY_SIZE {
        return Err(NetKvError::InvalidFrame(format!(
            "body too large: {} bytes (max {})",
            body_size, MAX_BODY_SIZE
        )));
    }
    Ok(())
}

fn read_i8(body: &[u8], pos: &mut usize) -> Result<i8> {
    let byte = body
        .get(*pos)
        .copied()
        .ok_or_else(|| NetKvError::InvalidFrame("truncated operation tag".to_string()))?;
    *pos += 1;
    Ok(byte as i8)
}

fn read_i64(body: &[u8], pos: &mut usize) -> Result<i64> {
    let end = *pos + 8;
    if end > body.len() {
        return Err(NetKvError::InvalidFrame(
            "truncated integer field".to_string(),
        ));
    }
    let v = i64::from_le_bytes(body[*pos..end].try_into().expect("8-byte slice"));
    *pos = end;
    Ok(v)
}

fn read_bytes<'a>(body: &'a [u8], pos: &mut usize, len: i64, field: &str) -> Result<&'a [u8]> {
    if len < 0 {
        return Err(NetKvError::InvalidFrame(format!(
            "negative {} length: {}",
            field, len
        )));
    }
    let end = *pos + len as usize;
    if end > body.len() {
        return Err(NetKvError::InvalidFrame(format!(
            "{} overruns body: {} bytes past end",
            field,
            end - body.len()
        )));
    }
    let bytes = &body[*pos..end];
    *pos = end;
    Ok(bytes)
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one complete frame from a stream
///
/// End of stream before the size prefix maps to `Eof`; a stream that ends
/// mid-body is an `InvalidFrame`.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Frame> {
    let mut prefix = [0u8; SIZE_PREFIX_LEN];
    if let Err(e) = reader.read_exact(&mut prefix) {
        if e.kind() == ErrorKind::UnexpectedEof {
            return Err(NetKvError::Eof);
        }
        return Err(e.into());
    }

    let body_size = i64::from_le_bytes(prefix);
    check_body_size(body_size)?;

    let mut body = vec![0u8; body_size as usize];
    if let Err(e) = reader.read_exact(&mut body) {
        if e.kind() == ErrorKind::UnexpectedEof {
            return Err(NetKvError::InvalidFrame(
                "stream ended mid-body".to_string(),
            ));
        }
        return Err(e.into());
    }

    decode_body(&body)
}

/// Write one frame to a stream
pub fn write_frame<W: Write>(writer: &mut W, frame: &Frame) -> Result<()> {
    let bytes = encode_frame(frame);
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Write the END terminator frame to a stream
pub fn write_end<W: Write>(writer: &mut W) -> Result<()> {
    write_frame(writer, &Frame::end())
}
