//! In-memory cache engine
//!
//! Values live inside the index entries; one mutex guards the index and the
//! eviction clock.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::error::{NetKvError, Result};
use crate::index::Bst;
use super::snapshot::{self, Snapshot, SnapshotRecord};
use super::{Cache, MemEntry};

struct State {
    index: Bst<MemEntry>,
    last_tick: Instant,
}

/// A cache keeping both entries and values in memory
pub struct MemoryCache {
    state: Arc<Mutex<State>>,
    shutdown: Mutex<Option<Sender<()>>>,
}

impl MemoryCache {
    /// Create a new, stopped memory cache
    pub fn new() -> Self {
        MemoryCache {
            state: Arc::new(Mutex::new(State {
                index: Bst::new(),
                last_tick: Instant::now(),
            })),
            shutdown: Mutex::new(None),
        }
    }

    fn spawn_worker(&self, interval: Duration, shutdown: Receiver<()>) {
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name("netkv-mem-evictor".to_string())
            .spawn(move || worker_loop(state, interval, shutdown));

        if let Err(e) = spawned {
            tracing::error!("failed to spawn eviction worker: {}", e);
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

fn worker_loop(state: Arc<Mutex<State>>, interval: Duration, shutdown: Receiver<()>) {
    let ticker = tick(interval);
    let interval_nanos = interval.as_nanos() as i64;
    state.lock().last_tick = Instant::now();

    loop {
        select! {
            recv(shutdown) -> _ => {
                tracing::debug!("eviction worker stopped");
                return;
            }
            recv(ticker) -> _ => {
                let mut state = state.lock();
                let removed = state.index.delete_if(&mut |entry: &mut MemEntry| {
                    entry.ttl -= interval_nanos;
                    entry.ttl <= 0
                });
                state.last_tick = Instant::now();
                if removed > 0 {
                    tracing::debug!("evicted {} expired entries", removed);
                }
            }
        }
    }
}

impl Cache for MemoryCache {
    fn run(&self, interval: Duration) {
        let (tx, rx) = bounded(0);
        *self.shutdown.lock() = Some(tx);
        self.spawn_worker(interval, rx);
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let entry = MemEntry::new(key, value, ttl)?;
        let mut state = self.state.lock();
        Ok(state.index.insert(entry))
    }

    fn get(&self, key: &str) -> Result<(Vec<u8>, Duration)> {
        let probe = MemEntry::probe(key);
        let mut state = self.state.lock();

        let (ttl, value) = match state.index.search(&probe) {
            Some(entry) => (entry.ttl, entry.value.clone()),
            None => return Err(NetKvError::NotFound),
        };

        let elapsed = state.last_tick.elapsed().as_nanos() as i64;
        let remaining = ttl - elapsed;
        if remaining <= 0 {
            state.index.delete(&probe);
            return Err(NetKvError::NotFound);
        }

        Ok((value, Duration::from_nanos(remaining as u64)))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let probe = MemEntry::probe(key);
        let mut state = self.state.lock();
        if !state.index.delete(&probe) {
            return Err(NetKvError::NotFound);
        }
        Ok(true)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.index.clear();
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keys = Vec::with_capacity(state.index.len());
        state.index.traverse(|entry| keys.push(entry.key.clone()));
        keys
    }

    fn has(&self, key: &str) -> (Duration, bool) {
        let probe = MemEntry::probe(key);
        let mut state = self.state.lock();

        let Some(ttl) = state.index.search(&probe).map(|entry| entry.ttl) else {
            return (Duration::ZERO, false);
        };

        let elapsed = state.last_tick.elapsed().as_nanos() as i64;
        let remaining = ttl - elapsed;
        if remaining <= 0 {
            state.index.delete(&probe);
            return (Duration::ZERO, false);
        }

        (Duration::from_nanos(remaining as u64), true)
    }

    fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    fn close(&self) {
        // Dropping the sender disconnects the worker's shutdown channel.
        self.shutdown.lock().take();
    }

    fn dump(&self) -> Result<Vec<u8>> {
        let state = self.state.lock();
        let mut records = Vec::with_capacity(state.index.len());
        state.index.traverse(|entry| {
            records.push(SnapshotRecord {
                key: entry.key.clone(),
                ttl: entry.ttl,
                value: Some(entry.value.clone()),
            });
        });
        snapshot::encode(&Snapshot { records })
    }

    fn load(&self, bytes: &[u8]) -> Result<()> {
        let snapshot = snapshot::decode(bytes)?;
        let mut state = self.state.lock();
        state.index.clear();
        for record in snapshot.records {
            state.index.insert(MemEntry {
                key: record.key,
                ttl: record.ttl,
                value: record.value.unwrap_or_default(),
            });
        }
        state.last_tick = Instant::now();
        Ok(())
    }
}
