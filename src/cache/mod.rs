//! Cache Engine Module
//!
//! Entry lifecycle, TTL accounting, eviction, and snapshot/restore for the
//! two interchangeable back-ends.
//!
//! ## TTL accounting
//!
//! Each entry's TTL is the time remaining as of the worker's last tick. The
//! worker subtracts the tick interval on every sweep and drops entries at or
//! below zero. Reads apply a lazy, non-persisted decrement of
//! `now - last_tick` so callers see fresh TTLs; `last_tick` itself is only
//! advanced by the worker, which makes the tick interval the jitter bound on
//! expiry. Two reads inside the same tick window therefore decrement from
//! the same baseline.

mod entry;
mod file;
mod memory;
mod snapshot;

pub use entry::is_valid_key;
pub use file::FileCache;
pub use memory::MemoryCache;

pub(crate) use entry::{key_hash, FileEntry, MemEntry};

use std::time::Duration;

use crate::error::Result;

/// Default eviction worker tick period
pub const DEFAULT_EVICTION_INTERVAL: Duration = Duration::from_secs(30);

/// TTLs at or below this are rejected by `set`
pub const MIN_TTL: Duration = Duration::from_secs(1);

/// The operation surface shared by both back-ends
///
/// The server depends only on this capability, not on a concrete engine.
pub trait Cache: Send + Sync {
    /// Start the background eviction worker with the given tick period.
    ///
    /// Callers must not start a cache twice.
    fn run(&self, interval: Duration);

    /// Install or replace an entry. Returns `true` when the key was new.
    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool>;

    /// Read an entry's value and remaining TTL.
    fn get(&self, key: &str) -> Result<(Vec<u8>, Duration)>;

    /// Remove an entry. Returns `true` when something was removed.
    fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every entry, accumulating per-entry errors.
    fn clear(&self) -> Result<()>;

    /// All keys, in ascending order.
    fn keys(&self) -> Vec<String>;

    /// Probe an entry without reading its value.
    fn has(&self, key: &str) -> (Duration, bool);

    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether the cache holds no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Signal the worker to stop and release resources.
    fn close(&self);

    /// Serialize the index to a self-describing byte blob.
    fn dump(&self) -> Result<Vec<u8>>;

    /// Restore the index from a dump blob.
    fn load(&self, bytes: &[u8]) -> Result<()>;
}
