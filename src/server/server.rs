//! TCP Server
//!
//! Accepts connections and dispatches each request under a deadline.
//!
//! ## Architecture
//! - Main thread runs the accept loop
//! - One handler thread per connection
//! - Each dispatch runs on its own thread so the deadline can abandon it
//! - Optional snapshot scheduler persists the cache to the init file

use std::fs;
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::channel::{bounded, tick};

use crate::cache::Cache;
use crate::config::Config;
use crate::error::{NetKvError, Result};
use crate::protocol::read_frame;

use super::handlers;

/// Consecutive snapshot failures tolerated before the process exits
const MAX_SAVE_FAILURES: u32 = 5;

/// TCP server for netkv
pub struct Server {
    /// Server configuration
    config: Config,

    /// Shared cache engine
    cache: Arc<dyn Cache>,
}

impl Server {
    /// Create a new server with the given config and cache engine
    pub fn new(config: Config, cache: Arc<dyn Cache>) -> Self {
        Self { config, cache }
    }

    /// Start the server (blocking)
    ///
    /// This method:
    /// 1. Starts the cache's eviction worker
    /// 2. Restores the init file, if one is configured and present
    /// 3. Starts the snapshot scheduler and interrupt hook, if configured
    /// 4. Accepts connections until an accept error occurs
    pub fn run(&self) -> Result<()> {
        tracing::info!("Starting cache...");
        self.cache.run(self.config.eviction_interval);

        self.restore_init_file();
        self.start_snapshot_scheduler();
        self.install_interrupt_hook();

        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)?;
        tracing::info!("Listening on {}", addr);

        for stream in listener.incoming() {
            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("Error accepting connection: {}", e);
                    return Err(e.into());
                }
            };

            let peer = stream
                .peer_addr()
                .map(|a| a.to_string())
                .unwrap_or_else(|_| "unknown".to_string());
            tracing::info!("Connection from {}", peer);

            let cache = Arc::clone(&self.cache);
            let timeout = self.config.timeout;
            let spawned = thread::Builder::new()
                .name("netkv-conn".to_string())
                .spawn(move || handle_connection(stream, cache, timeout, peer));

            if let Err(e) = spawned {
                tracing::error!("Failed to spawn connection handler: {}", e);
            }
        }

        Ok(())
    }

    /// Load the init file into the cache, if configured and present.
    /// Integrity pruning is logged, not fatal.
    fn restore_init_file(&self) {
        let Some(path) = &self.config.init_file else {
            return;
        };
        if !path.is_file() {
            return;
        }

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!("Failed to read init file {}: {}", path.display(), e);
                return;
            }
        };

        match self.cache.load(&bytes) {
            Ok(()) => {
                tracing::info!(
                    "Restored {} entries from {}",
                    self.cache.len(),
                    path.display()
                );
            }
            Err(NetKvError::Integrity(missing)) => {
                tracing::warn!(
                    "Restored {} entries; {} pruned by integrity verification: {}",
                    self.cache.len(),
                    missing.len(),
                    missing.join(", ")
                );
            }
            Err(e) => tracing::error!("Failed to restore init file: {}", e),
        }
    }

    /// Periodically save the cache to the init file. Five consecutive save
    /// failures exit the process.
    fn start_snapshot_scheduler(&self) {
        let Some(path) = self.config.init_file.clone() else {
            return;
        };
        if self.config.save_period.is_zero() {
            return;
        }

        let cache = Arc::clone(&self.cache);
        let period = self.config.save_period;
        let spawned = thread::Builder::new()
            .name("netkv-snapshot".to_string())
            .spawn(move || {
                let ticker = tick(period);
                let mut failures = 0u32;
                for _ in ticker.iter() {
                    match save_snapshot(cache.as_ref(), &path) {
                        Ok(()) => failures = 0,
                        Err(e) => {
                            failures += 1;
                            tracing::error!(
                                "Snapshot save failed ({} consecutive): {}",
                                failures,
                                e
                            );
                            if failures >= MAX_SAVE_FAILURES {
                                tracing::error!(
                                    "Giving up after {} consecutive snapshot failures",
                                    failures
                                );
                                process::exit(1);
                            }
                        }
                    }
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn snapshot scheduler: {}", e);
        }
    }

    /// On the first interrupt: save once, synchronously, and exit zero.
    fn install_interrupt_hook(&self) {
        if !self.config.save_on_interrupt {
            return;
        }
        let Some(path) = self.config.init_file.clone() else {
            return;
        };

        let cache = Arc::clone(&self.cache);
        let hooked = ctrlc::set_handler(move || {
            tracing::info!("Interrupt received, saving snapshot...");
            if let Err(e) = save_snapshot(cache.as_ref(), &path) {
                tracing::error!("Snapshot save on interrupt failed: {}", e);
            }
            process::exit(0);
        });

        if let Err(e) = hooked {
            tracing::error!("Failed to install interrupt handler: {}", e);
        }
    }
}

/// Dump the cache and write the blob to the init file, creating missing
/// parent directories.
fn save_snapshot(cache: &dyn Cache, path: &Path) -> Result<()> {
    let bytes = cache.dump()?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Per-connection loop: read one frame, dispatch it under the deadline,
/// repeat. Requests on a connection are strictly ordered; any read error,
/// write error, or deadline expiry ends the session.
fn handle_connection(
    mut stream: TcpStream,
    cache: Arc<dyn Cache>,
    timeout: Duration,
    peer: String,
) {
    loop {
        tracing::debug!("Waiting for frame...");
        let frame = match read_frame(&mut stream) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("Error reading frame: {}, disconnecting ({})", e, peer);
                return;
            }
        };

        let writer = match stream.try_clone() {
            Ok(writer) => writer,
            Err(e) => {
                tracing::warn!("Failed to clone stream: {}, disconnecting ({})", e, peer);
                return;
            }
        };

        let dispatch_cache = Arc::clone(&cache);
        let outcome = run_with_timeout(timeout, move || {
            handlers::dispatch(writer, dispatch_cache, frame)
        });

        if let Err(e) = outcome {
            tracing::warn!("Request failed: {}, disconnecting ({})", e, peer);
            return;
        }
    }
}

/// Run a dispatch under a wall-clock deadline
///
/// On expiry the dispatch thread is abandoned; it may still finish its cache
/// call against the shared engine, but its session is over.
fn run_with_timeout<F>(timeout: Duration, f: F) -> Result<()>
where
    F: FnOnce() -> Result<()> + Send + 'static,
{
    if timeout.is_zero() {
        return f();
    }

    let (tx, rx) = bounded(1);
    thread::Builder::new()
        .name("netkv-dispatch".to_string())
        .spawn(move || {
            let _ = tx.send(f());
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(_) => Err(NetKvError::Timeout),
    }
}
