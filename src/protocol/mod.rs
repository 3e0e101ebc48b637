//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Frame Format
//!
//! Every frame is prefixed by a little-endian signed 64-bit body size:
//!
//! ```text
//! ┌───────────────┬──────────────────────────────────────────────┐
//! │ body_size (8) │                    body                      │
//! └───────────────┴──────────────────────────────────────────────┘
//! ```
//!
//! The body is, in order (all integers little-endian and signed):
//!
//! ```text
//! ┌──────────┬──────────┬─────────────┬──────┬───────────────┬───────┐
//! │ type (1) │ ttl (8)  │ key_len (8) │ key  │ value_len (8) │ value │
//! └──────────┴──────────┴─────────────┴──────┴───────────────┴───────┘
//! ```
//!
//! ### Operation Tags
//! - 0: SET     - install an entry (key, value, ttl)
//! - 1: GET     - read an entry (key); reply carries value and ttl
//! - 2: DELETE  - remove an entry (key)
//! - 3: CLEAR   - remove every entry
//! - 4: HAS     - probe an entry (key); reply value is "true" or "false"
//! - 5: KEYS    - list keys; reply value is comma-joined keys
//! - 6: ERROR   - server-side failure; value is the error message
//! - 7: END     - terminator closing a successful response sequence
//!
//! TTLs travel as nanoseconds. An ERROR frame is never followed by END.

mod frame;
mod codec;
mod serializer;

pub use frame::{Frame, FrameType};
pub use codec::{
    decode_frame, encode_frame,
    read_frame, write_end, write_frame,
    MAX_BODY_SIZE, SIZE_PREFIX_LEN,
};
pub use serializer::{BincodeSerializer, JsonSerializer, Serializer};
