//! Server Module
//!
//! TCP accept loop, per-connection dispatch, per-request timeout
//! enforcement, and the snapshot scheduler.

mod handlers;
mod server;

pub use server::Server;
