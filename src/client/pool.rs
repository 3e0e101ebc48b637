//! Connection pool
//!
//! A bounded stack of TCP connections dialed up front. Acquisition under a
//! deadline: an empty pool blocks at most half the deadline for a slot so
//! the aggregate wait-plus-I/O budget stays within the deadline.

use std::net::TcpStream;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{NetKvError, Result};

pub(crate) struct Pool {
    /// Address of the server, kept for redialing replacements
    addr: String,

    /// The connection stack
    connections: Mutex<Vec<TcpStream>>,

    /// Waiter signal for blocked acquirers
    available: Condvar,
}

impl Pool {
    /// Dial `size` connections up front
    pub fn connect(addr: &str, size: usize) -> Result<Self> {
        let mut connections = Vec::with_capacity(size);
        for _ in 0..size {
            connections.push(TcpStream::connect(addr)?);
        }
        Ok(Pool {
            addr: addr.to_string(),
            connections: Mutex::new(connections),
            available: Condvar::new(),
        })
    }

    /// Pop a connection, waiting at most `deadline / 2` for one to free up
    ///
    /// The returned guard carries socket timeouts of the full deadline, or
    /// the remaining half if the caller had to wait.
    pub fn acquire(&self, deadline: Duration) -> Result<PooledConn<'_>> {
        let mut budget = deadline;
        let mut connections = self.connections.lock();

        if connections.is_empty() {
            let _ = self.available.wait_for(&mut connections, deadline / 2);
            budget = deadline / 2;
        }

        let Some(stream) = connections.pop() else {
            return Err(NetKvError::Timeout);
        };
        drop(connections);

        stream.set_read_timeout(Some(budget))?;
        stream.set_write_timeout(Some(budget))?;

        Ok(PooledConn {
            pool: self,
            stream: Some(stream),
            failed: false,
        })
    }

    fn release(&self, stream: TcpStream) {
        self.connections.lock().push(stream);
        self.available.notify_one();
    }

    /// Replace a failed connection. If the server is unreachable the pool
    /// shrinks and a later acquirer may time out instead.
    fn replace(&self) {
        match TcpStream::connect(&self.addr) {
            Ok(stream) => self.release(stream),
            Err(e) => tracing::warn!("failed to replace pooled connection: {}", e),
        }
    }

    /// Drop every pooled connection
    pub fn close(&self) {
        self.connections.lock().clear();
    }
}

/// A pooled connection, returned to the pool when dropped
///
/// A guard marked failed is discarded instead, and the pool redials a
/// replacement in its place.
pub(crate) struct PooledConn<'a> {
    pool: &'a Pool,
    stream: Option<TcpStream>,
    failed: bool,
}

impl PooledConn<'_> {
    pub fn stream(&mut self) -> &mut TcpStream {
        self.stream.as_mut().expect("stream present until drop")
    }

    /// Mark the connection as failed; it will not return to the pool
    pub fn fail(&mut self) {
        self.failed = true;
    }
}

impl Drop for PooledConn<'_> {
    fn drop(&mut self) {
        let Some(stream) = self.stream.take() else {
            return;
        };
        if self.failed {
            drop(stream);
            self.pool.replace();
        } else {
            self.pool.release(stream);
        }
    }
}
