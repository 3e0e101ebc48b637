//! Entries, key validation, and the sharding hash

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;

use crate::error::{NetKvError, Result};
use super::MIN_TTL;

static KEY_PATTERN: OnceLock<Regex> = OnceLock::new();

fn key_pattern() -> &'static Regex {
    KEY_PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("key pattern compiles"))
}

/// Check key syntax: `[A-Za-z0-9._-]+` with length in [2, 64]
pub fn is_valid_key(key: &str) -> Result<()> {
    if key.len() <= 1 {
        return Err(NetKvError::InvalidKey(format!("key '{}' is too short", key)));
    }
    if key.len() > 64 {
        return Err(NetKvError::InvalidKey(format!("key '{}' is too long", key)));
    }
    if !key_pattern().is_match(key) {
        return Err(NetKvError::InvalidKey(format!(
            "key '{}' contains invalid characters",
            key
        )));
    }
    Ok(())
}

pub(crate) fn validate_ttl(ttl: Duration) -> Result<()> {
    if ttl <= MIN_TTL {
        return Err(NetKvError::TtlTooShort(ttl));
    }
    Ok(())
}

/// Deterministic 64-bit key fingerprint, used only for directory sharding
///
/// Horner-style accumulation seeded at zero; not an equality hash.
pub(crate) fn key_hash(key: &str) -> u64 {
    key.bytes()
        .fold(0u64, |h, b| h.wrapping_mul(63).wrapping_add(u64::from(b)))
}

// =============================================================================
// Memory back-end entry
// =============================================================================

/// An entry holding its value in memory
///
/// `ttl` is the remaining time in nanoseconds as of the worker's last tick;
/// eviction arithmetic may drive it negative.
#[derive(Debug, Clone)]
pub(crate) struct MemEntry {
    pub key: String,
    pub ttl: i64,
    pub value: Vec<u8>,
}

impl MemEntry {
    pub fn new(key: &str, value: Vec<u8>, ttl: Duration) -> Result<Self> {
        validate_ttl(ttl)?;
        is_valid_key(key)?;
        Ok(MemEntry {
            key: key.to_string(),
            ttl: ttl.as_nanos() as i64,
            value,
        })
    }

    /// A comparison probe carrying only the key
    pub fn probe(key: &str) -> Self {
        MemEntry {
            key: key.to_string(),
            ttl: 0,
            value: Vec::new(),
        }
    }
}

// Equality and ordering are defined by the key alone.
impl PartialEq for MemEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MemEntry {}

impl PartialOrd for MemEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MemEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

// =============================================================================
// File back-end entry
// =============================================================================

/// An entry whose value lives on disk at `<dir>/<shard>/<key>`
///
/// `shard` caches the decimal rendering of the key hash, which names the
/// directory the value file is stored in.
#[derive(Debug, Clone)]
pub(crate) struct FileEntry {
    pub key: String,
    pub shard: String,
    pub ttl: i64,
}

impl FileEntry {
    pub fn new(key: &str, ttl: Duration) -> Result<Self> {
        validate_ttl(ttl)?;
        is_valid_key(key)?;
        Ok(FileEntry {
            key: key.to_string(),
            shard: key_hash(key).to_string(),
            ttl: ttl.as_nanos() as i64,
        })
    }

    /// A comparison probe carrying only the key
    pub fn probe(key: &str) -> Self {
        FileEntry {
            key: key.to_string(),
            shard: String::new(),
            ttl: 0,
        }
    }

    /// The shard directory and value file path under `dir`
    pub fn paths(&self, dir: &Path) -> (PathBuf, PathBuf) {
        let shard_dir = dir.join(&self.shard);
        let file = shard_dir.join(&self.key);
        (shard_dir, file)
    }
}

impl PartialEq for FileEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for FileEntry {}

impl PartialOrd for FileEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FileEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}
