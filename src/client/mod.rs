//! Client Module
//!
//! Pooled blocking client mirroring the server's dispatch matrix, with a
//! pluggable typed-value serializer.

mod client;
mod pool;

pub use client::{Client, DEFAULT_POOL_SIZE, DEFAULT_TIMEOUT};
