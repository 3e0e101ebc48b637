//! Request handlers
//!
//! One handler per operation tag. Engine errors become an ERROR frame on
//! the wire; an ERROR frame is never followed by END.

use std::net::TcpStream;
use std::sync::Arc;

use crate::cache::Cache;
use crate::error::{NetKvError, Result};
use crate::protocol::{write_end, write_frame, Frame, FrameType};

/// Dispatch one request frame and write the response sequence
///
/// The returned error means the socket itself failed; the caller ends the
/// session on it.
pub(crate) fn dispatch(mut stream: TcpStream, cache: Arc<dyn Cache>, frame: Frame) -> Result<()> {
    let result = match frame.frame_type {
        FrameType::Get => {
            tracing::debug!("Received GET request for key {}", frame.key);
            handle_get(&mut stream, cache.as_ref(), &frame)
        }
        FrameType::Set => {
            tracing::debug!("Received SET request for key {}", frame.key);
            handle_set(cache.as_ref(), &frame)
        }
        FrameType::Delete => {
            tracing::debug!("Received DELETE request for key {}", frame.key);
            handle_delete(cache.as_ref(), &frame)
        }
        FrameType::Clear => {
            tracing::debug!("Received CLEAR request");
            handle_clear(cache.as_ref())
        }
        FrameType::Has => {
            tracing::debug!("Received HAS request for key {}", frame.key);
            handle_has(&mut stream, cache.as_ref(), &frame)
        }
        FrameType::Keys => {
            tracing::debug!("Received KEYS request");
            handle_keys(&mut stream, cache.as_ref())
        }
        // Not requests; nothing to do before the terminator.
        FrameType::Error | FrameType::End => Ok(()),
    };

    match result {
        Ok(()) => write_end(&mut stream),
        Err(e) => write_error(&mut stream, &e),
    }
}

fn write_error(stream: &mut TcpStream, err: &NetKvError) -> Result<()> {
    write_frame(stream, &Frame::error(&err.to_string()))
}

fn handle_get(stream: &mut TcpStream, cache: &dyn Cache, frame: &Frame) -> Result<()> {
    let (value, ttl) = cache.get(&frame.key)?;
    let reply = Frame {
        frame_type: FrameType::Get,
        ttl: ttl.as_nanos() as i64,
        key: frame.key.clone(),
        value,
    };
    write_frame(stream, &reply)
}

fn handle_set(cache: &dyn Cache, frame: &Frame) -> Result<()> {
    cache.set(&frame.key, frame.value.clone(), frame.ttl_duration())?;
    Ok(())
}

fn handle_delete(cache: &dyn Cache, frame: &Frame) -> Result<()> {
    cache.delete(&frame.key)?;
    Ok(())
}

fn handle_clear(cache: &dyn Cache) -> Result<()> {
    cache.clear()
}

fn handle_has(stream: &mut TcpStream, cache: &dyn Cache, frame: &Frame) -> Result<()> {
    let (_, has) = cache.has(&frame.key);
    let reply = Frame {
        frame_type: FrameType::Has,
        ttl: 0,
        key: frame.key.clone(),
        value: if has { b"true".to_vec() } else { b"false".to_vec() },
    };
    write_frame(stream, &reply)
}

fn handle_keys(stream: &mut TcpStream, cache: &dyn Cache) -> Result<()> {
    let keys = cache.keys();
    let reply = Frame {
        frame_type: FrameType::Keys,
        ttl: 0,
        key: String::new(),
        value: keys.join(",").into_bytes(),
    };
    write_frame(stream, &reply)
}
