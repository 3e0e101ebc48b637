//! Snapshot blob encoding
//!
//! The dump/load format: a bincode-encoded record list. The memory back-end
//! round-trips values; the file back-end dumps metadata only and re-verifies
//! the on-disk files at load time.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One dumped index entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SnapshotRecord {
    /// Entry key
    pub key: String,

    /// Remaining TTL in nanoseconds as of the dump
    pub ttl: i64,

    /// Payload bytes; `None` for the file back-end
    pub value: Option<Vec<u8>>,
}

/// A dumped index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Snapshot {
    pub records: Vec<SnapshotRecord>,
}

pub(crate) fn encode(snapshot: &Snapshot) -> Result<Vec<u8>> {
    Ok(bincode::serialize(snapshot)?)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Snapshot> {
    Ok(bincode::deserialize(bytes)?)
}
