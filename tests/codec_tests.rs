//! Codec Tests
//!
//! Tests for frame encoding/decoding and the stream helpers.

use std::io::Cursor;
use std::time::Duration;

use netkv::error::NetKvError;
use netkv::protocol::{
    decode_frame, encode_frame, read_frame, write_end, write_frame, Frame, FrameType,
    SIZE_PREFIX_LEN,
};

// =============================================================================
// Round-trip Tests
// =============================================================================

#[test]
fn test_round_trip_get() {
    let frame = Frame {
        frame_type: FrameType::Get,
        ttl: 5_000_000_000,
        key: "kgsjhdfsghjgfdey".to_string(),
        value: b"vallkfkngkjsdfbgvsdfgvaue".to_vec(),
    };

    let encoded = encode_frame(&frame);
    let decoded = decode_frame(&encoded).unwrap();

    assert_eq!(decoded.frame_type, frame.frame_type);
    assert_eq!(decoded.ttl, frame.ttl);
    assert_eq!(decoded.key, frame.key);
    assert_eq!(decoded.value, frame.value);
}

#[test]
fn test_round_trip_all_types() {
    let frames = vec![
        Frame::set("mykey", b"myvalue".to_vec(), Duration::from_secs(5)),
        Frame::get("mykey"),
        Frame::delete("mykey"),
        Frame::new(FrameType::Clear),
        Frame::has("mykey"),
        Frame::new(FrameType::Keys),
        Frame::error("something went wrong"),
        Frame::end(),
    ];

    for frame in frames {
        let decoded = decode_frame(&encode_frame(&frame)).unwrap();
        assert_eq!(decoded, frame);
    }
}

#[test]
fn test_round_trip_empty_key_and_value() {
    let frame = Frame::new(FrameType::Clear);
    let decoded = decode_frame(&encode_frame(&frame)).unwrap();
    assert!(decoded.key.is_empty());
    assert!(decoded.value.is_empty());
}

#[test]
fn test_round_trip_binary_value() {
    let value: Vec<u8> = (0..=255).collect();
    let frame = Frame::set("binkey", value.clone(), Duration::from_secs(5));
    let decoded = decode_frame(&encode_frame(&frame)).unwrap();
    assert_eq!(decoded.value, value);
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_layout() {
    let frame = Frame {
        frame_type: FrameType::Get,
        ttl: 2,
        key: "test".to_string(),
        value: b"hi".to_vec(),
    };
    let encoded = encode_frame(&frame);

    // body = type(1) + ttl(8) + key_len(8) + key(4) + value_len(8) + value(2)
    let body_size = 1 + 8 + 8 + 4 + 8 + 2;
    assert_eq!(&encoded[..8], &(body_size as i64).to_le_bytes());
    assert_eq!(encoded.len(), SIZE_PREFIX_LEN + body_size);

    let body = &encoded[8..];
    assert_eq!(body[0], 1); // GET tag
    assert_eq!(&body[1..9], &2i64.to_le_bytes()); // ttl, little-endian
    assert_eq!(&body[9..17], &4i64.to_le_bytes()); // key_len
    assert_eq!(&body[17..21], b"test");
    assert_eq!(&body[21..29], &2i64.to_le_bytes()); // value_len
    assert_eq!(&body[29..31], b"hi");
}

#[test]
fn test_wire_format_tags() {
    let tags = [
        (FrameType::Set, 0u8),
        (FrameType::Get, 1),
        (FrameType::Delete, 2),
        (FrameType::Clear, 3),
        (FrameType::Has, 4),
        (FrameType::Keys, 5),
        (FrameType::Error, 6),
        (FrameType::End, 7),
    ];

    for (frame_type, tag) in tags {
        let encoded = encode_frame(&Frame::new(frame_type));
        assert_eq!(encoded[SIZE_PREFIX_LEN], tag);
    }
}

// =============================================================================
// Malformed Frame Tests
// =============================================================================

/// A hand-built frame: the given body behind a prefix claiming `size` bytes
fn framed(size: i64, body: &[u8]) -> Vec<u8> {
    let mut bytes = size.to_le_bytes().to_vec();
    bytes.extend_from_slice(body);
    bytes
}

#[test]
fn test_negative_body_size() {
    let result = decode_frame(&framed(-1, &[]));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_negative_key_length() {
    let mut body = vec![1u8]; // GET
    body.extend_from_slice(&0i64.to_le_bytes()); // ttl
    body.extend_from_slice(&(-1i64).to_le_bytes()); // key_len
    let result = decode_frame(&framed(body.len() as i64, &body));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_key_overruns_body() {
    let mut body = vec![1u8];
    body.extend_from_slice(&0i64.to_le_bytes());
    body.extend_from_slice(&100i64.to_le_bytes()); // key_len far past the end
    body.extend_from_slice(b"shortkey");
    let result = decode_frame(&framed(body.len() as i64, &body));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_value_overruns_body() {
    let mut body = vec![1u8];
    body.extend_from_slice(&0i64.to_le_bytes());
    body.extend_from_slice(&2i64.to_le_bytes());
    body.extend_from_slice(b"ab");
    body.extend_from_slice(&50i64.to_le_bytes()); // value_len with no bytes behind it
    let result = decode_frame(&framed(body.len() as i64, &body));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_trailing_bytes_rejected() {
    let mut encoded = encode_frame(&Frame::get("ab"));
    // Grow the body by three stray bytes and fix up the prefix.
    encoded.extend_from_slice(&[0xAA, 0xBB, 0xCC]);
    let body_size = (encoded.len() - SIZE_PREFIX_LEN) as i64;
    encoded[..8].copy_from_slice(&body_size.to_le_bytes());

    let result = decode_frame(&encoded);
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_unknown_operation_tag() {
    let mut body = vec![42u8];
    body.extend_from_slice(&0i64.to_le_bytes());
    body.extend_from_slice(&0i64.to_le_bytes());
    body.extend_from_slice(&0i64.to_le_bytes());
    let result = decode_frame(&framed(body.len() as i64, &body));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_incomplete_body() {
    // Prefix promises 64 bytes; only 4 follow.
    let result = decode_frame(&framed(64, &[1, 2, 3, 4]));
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_eof_before_prefix() {
    let mut cursor = Cursor::new(Vec::new());
    let result = read_frame(&mut cursor);
    assert!(matches!(result, Err(NetKvError::Eof)));
}

#[test]
fn test_stream_ends_mid_body() {
    let encoded = encode_frame(&Frame::get("somekey"));
    let truncated = &encoded[..encoded.len() - 3];

    let mut cursor = Cursor::new(truncated.to_vec());
    let result = read_frame(&mut cursor);
    assert!(matches!(result, Err(NetKvError::InvalidFrame(_))));
}

#[test]
fn test_stream_write_read_frame() {
    let frame = Frame::set("somekey", b"somevalue".to_vec(), Duration::from_secs(30));

    let mut buffer = Vec::new();
    write_frame(&mut buffer, &frame).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_frame(&mut cursor).unwrap();
    assert_eq!(decoded, frame);
}

#[test]
fn test_stream_multiple_frames() {
    let frames = vec![
        Frame::set("k1", b"v1".to_vec(), Duration::from_secs(5)),
        Frame::get("k1"),
        Frame::delete("k1"),
        Frame::end(),
    ];

    let mut buffer = Vec::new();
    for frame in &frames {
        write_frame(&mut buffer, frame).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &frames {
        let decoded = read_frame(&mut cursor).unwrap();
        assert_eq!(&decoded, expected);
    }
}

#[test]
fn test_write_end_terminator() {
    let mut buffer = Vec::new();
    write_end(&mut buffer).unwrap();

    let mut cursor = Cursor::new(buffer);
    let decoded = read_frame(&mut cursor).unwrap();
    assert_eq!(decoded.frame_type, FrameType::End);
}

#[test]
fn test_ttl_nanosecond_precision() {
    let frame = Frame::set("nk", b"v".to_vec(), Duration::new(5, 250));
    let decoded = decode_frame(&encode_frame(&frame)).unwrap();
    assert_eq!(decoded.ttl, 5_000_000_250);
    assert_eq!(decoded.ttl_duration(), Duration::new(5, 250));
}
