//! # netkv
//!
//! A network-accessible, TTL-bounded key/value cache with:
//! - Compact length-prefixed binary wire protocol
//! - Interchangeable in-memory and on-disk back-ends
//! - Lazy plus periodic TTL eviction
//! - Periodic snapshots with restore-on-restart
//! - Pooled blocking client with typed value serialization
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Pooled Clients                          │
//! │               (length-prefixed frames)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                    TCP Server                               │
//! │        (per-connection handler, request timeout)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │ MemoryCache │          │  FileCache  │
//!   │  (index)    │          │ (index+dir) │
//!   └──────┬──────┘          └──────┬──────┘
//!          │                        │
//!          └───────────┬────────────┘
//!                      ▼
//!          ┌──────────────────────┐
//!          │   Eviction worker    │
//!          │      (ticker)        │
//!          └──────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod index;
pub mod cache;
pub mod server;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{NetKvError, Result};
pub use config::Config;
pub use cache::{Cache, FileCache, MemoryCache};
pub use server::Server;
pub use client::Client;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of netkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
