//! Cache client
//!
//! Each operation validates its key, acquires a pooled connection, writes
//! the request frame, reads the reply (data frame for GET/HAS/KEYS), and
//! waits for the END terminator. An ERROR frame from the server surfaces
//! directly; no END follows it.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::is_valid_key;
use crate::error::{NetKvError, Result};
use crate::protocol::{
    read_frame, write_frame, Frame, FrameType, JsonSerializer, Serializer,
};

use super::pool::{Pool, PooledConn};

/// Default per-operation deadline
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Default number of pooled connections
pub const DEFAULT_POOL_SIZE: usize = 10;

/// A pooled client for the cache server
pub struct Client<S: Serializer = JsonSerializer> {
    pool: Pool,
    serializer: S,
    timeout: Duration,
}

impl Client<JsonSerializer> {
    /// Connect with the default JSON serializer
    pub fn connect(addr: &str, timeout: Duration, connections: usize) -> Result<Self> {
        Self::with_serializer(addr, JsonSerializer, timeout, connections)
    }
}

impl<S: Serializer> Client<S> {
    /// Connect with a custom serializer
    ///
    /// Zero `timeout` or `connections` fall back to the defaults.
    pub fn with_serializer(
        addr: &str,
        serializer: S,
        timeout: Duration,
        connections: usize,
    ) -> Result<Self> {
        let timeout = if timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            timeout
        };
        let connections = if connections == 0 {
            DEFAULT_POOL_SIZE
        } else {
            connections
        };

        Ok(Client {
            pool: Pool::connect(addr, connections)?,
            serializer,
            timeout,
        })
    }

    /// Serialize a typed value and install it under `key`
    pub fn set<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) -> Result<()> {
        self.set_raw(key, self.serializer.serialize(value)?, ttl)
    }

    /// Install raw bytes under `key`
    pub fn set_raw(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<()> {
        is_valid_key(key)?;
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::set(key, value, ttl))?;
        listen_for_end(&mut conn)
    }

    /// Read the value under `key` into a typed destination
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<(T, Duration)> {
        let (bytes, ttl) = self.get_raw(key)?;
        Ok((self.serializer.deserialize(&bytes)?, ttl))
    }

    /// Read the raw bytes under `key`
    pub fn get_raw(&self, key: &str) -> Result<(Vec<u8>, Duration)> {
        is_valid_key(key)?;
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::get(key))?;
        let reply = read_reply(&mut conn, FrameType::Get)?;
        listen_for_end(&mut conn)?;
        let ttl_duration = reply.ttl_duration();
        Ok((reply.value, ttl_duration))
    }

    /// Remove the entry under `key`
    pub fn delete(&self, key: &str) -> Result<()> {
        is_valid_key(key)?;
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::delete(key))?;
        listen_for_end(&mut conn)
    }

    /// Remove every entry
    pub fn clear(&self) -> Result<()> {
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::new(FrameType::Clear))?;
        listen_for_end(&mut conn)
    }

    /// Probe whether `key` exists
    pub fn has(&self, key: &str) -> Result<bool> {
        is_valid_key(key)?;
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::has(key))?;
        let reply = read_reply(&mut conn, FrameType::Has)?;
        listen_for_end(&mut conn)?;
        Ok(reply.value == b"true")
    }

    /// List every key in the cache
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut conn = self.pool.acquire(self.timeout)?;
        write_request(&mut conn, &Frame::new(FrameType::Keys))?;
        let reply = read_reply(&mut conn, FrameType::Keys)?;
        listen_for_end(&mut conn)?;

        let raw = String::from_utf8_lossy(&reply.value);
        let keys = raw
            .trim_matches(',')
            .split(',')
            .map(str::trim)
            .filter(|token| is_valid_key(token).is_ok())
            .map(String::from)
            .collect();
        Ok(keys)
    }

    /// Drop every pooled connection
    pub fn close(self) {
        self.pool.close();
    }
}

/// Write a request frame, marking the connection failed on socket error
fn write_request(conn: &mut PooledConn<'_>, frame: &Frame) -> Result<()> {
    if let Err(e) = write_frame(conn.stream(), frame) {
        conn.fail();
        return Err(e);
    }
    Ok(())
}

/// Read a data frame of the expected type
fn read_reply(conn: &mut PooledConn<'_>, expected: FrameType) -> Result<Frame> {
    let frame = read_checked(conn)?;
    if frame.frame_type == FrameType::Error {
        return Err(NetKvError::Server(
            String::from_utf8_lossy(&frame.value).into_owned(),
        ));
    }
    if frame.frame_type != expected {
        conn.fail();
        return Err(NetKvError::InvalidFrame(format!(
            "unexpected {} frame from server instead of {}",
            frame.frame_type, expected
        )));
    }
    Ok(frame)
}

/// Read the END terminator closing a response sequence
fn listen_for_end(conn: &mut PooledConn<'_>) -> Result<()> {
    let frame = read_checked(conn)?;
    if frame.frame_type == FrameType::Error {
        return Err(NetKvError::Server(
            String::from_utf8_lossy(&frame.value).into_owned(),
        ));
    }
    if frame.frame_type != FrameType::End {
        conn.fail();
        return Err(NetKvError::InvalidFrame(format!(
            "unexpected {} frame from server instead of END",
            frame.frame_type
        )));
    }
    Ok(())
}

fn read_checked(conn: &mut PooledConn<'_>) -> Result<Frame> {
    match read_frame(conn.stream()) {
        Ok(frame) => Ok(frame),
        Err(e) => {
            conn.fail();
            Err(e)
        }
    }
}
