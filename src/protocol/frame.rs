//! Frame definitions
//!
//! Represents one complete wire message.

use std::fmt;
use std::time::Duration;

use crate::error::NetKvError;

/// Operation tags, 8-bit signed on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i8)]
pub enum FrameType {
    Set = 0,
    Get = 1,
    Delete = 2,
    Clear = 3,
    Has = 4,
    Keys = 5,
    Error = 6,
    End = 7,
}

impl FrameType {
    pub fn from_tag(tag: i8) -> Result<Self, NetKvError> {
        match tag {
            0 => Ok(FrameType::Set),
            1 => Ok(FrameType::Get),
            2 => Ok(FrameType::Delete),
            3 => Ok(FrameType::Clear),
            4 => Ok(FrameType::Has),
            5 => Ok(FrameType::Keys),
            6 => Ok(FrameType::Error),
            7 => Ok(FrameType::End),
            _ => Err(NetKvError::InvalidFrame(format!(
                "unknown operation tag: {}",
                tag
            ))),
        }
    }
}

impl fmt::Display for FrameType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FrameType::Set => "SET",
            FrameType::Get => "GET",
            FrameType::Delete => "DELETE",
            FrameType::Clear => "CLEAR",
            FrameType::Has => "HAS",
            FrameType::Keys => "KEYS",
            FrameType::Error => "ERROR",
            FrameType::End => "END",
        };
        f.write_str(name)
    }
}

/// One complete wire message
///
/// `ttl` is a signed nanosecond count; only SET requests and GET replies
/// carry a meaningful value, every other frame leaves it at zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub frame_type: FrameType,
    pub ttl: i64,
    pub key: String,
    pub value: Vec<u8>,
}

impl Frame {
    /// A bare frame of the given type
    pub fn new(frame_type: FrameType) -> Self {
        Self {
            frame_type,
            ttl: 0,
            key: String::new(),
            value: Vec::new(),
        }
    }

    /// A SET request frame
    pub fn set(key: impl Into<String>, value: Vec<u8>, ttl: Duration) -> Self {
        Self {
            frame_type: FrameType::Set,
            ttl: ttl.as_nanos() as i64,
            key: key.into(),
            value,
        }
    }

    /// A GET request frame
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            frame_type: FrameType::Get,
            ttl: 0,
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// A DELETE request frame
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            frame_type: FrameType::Delete,
            ttl: 0,
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// A HAS request frame
    pub fn has(key: impl Into<String>) -> Self {
        Self {
            frame_type: FrameType::Has,
            ttl: 0,
            key: key.into(),
            value: Vec::new(),
        }
    }

    /// An ERROR frame carrying the error's message
    pub fn error(message: &str) -> Self {
        Self {
            frame_type: FrameType::Error,
            ttl: 0,
            key: String::new(),
            value: message.as_bytes().to_vec(),
        }
    }

    /// The END terminator frame
    pub fn end() -> Self {
        Self::new(FrameType::End)
    }

    /// Remaining TTL as an unsigned duration, clamped at zero
    pub fn ttl_duration(&self) -> Duration {
        Duration::from_nanos(self.ttl.max(0) as u64)
    }
}
