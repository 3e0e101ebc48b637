//! File-backed cache engine
//!
//! Keys live in the index; each value is a file at `<dir>/<shard>/<key>`,
//! where `shard` is the decimal key hash. Writes go through a bounded queue
//! drained by the worker so disk I/O never happens under the index lock;
//! `set` blocks on the job's completion channel before inserting.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam::channel::{bounded, tick, Receiver, Sender};
use crossbeam::select;
use parking_lot::Mutex;

use crate::error::{NetKvError, Result};
use crate::index::Bst;
use super::snapshot::{self, Snapshot, SnapshotRecord};
use super::{Cache, FileEntry};

/// Capacity of the write queue between `set` callers and the worker
const WRITE_QUEUE_DEPTH: usize = 100;

struct State {
    index: Bst<FileEntry>,
    last_tick: Instant,
}

struct WriteJob {
    shard: String,
    key: String,
    value: Vec<u8>,
    done: Sender<Result<()>>,
}

/// A cache storing each value in a content-addressed directory layout
pub struct FileCache {
    dir: PathBuf,
    state: Arc<Mutex<State>>,
    queue: Mutex<Option<Sender<WriteJob>>>,
    shutdown: Mutex<Option<Sender<()>>>,
}

impl FileCache {
    /// Create a new, stopped file cache rooted at `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileCache {
            dir: dir.into(),
            state: Arc::new(Mutex::new(State {
                index: Bst::new(),
                last_tick: Instant::now(),
            })),
            queue: Mutex::new(None),
            shutdown: Mutex::new(None),
        }
    }

    fn spawn_worker(
        &self,
        interval: Duration,
        jobs: Receiver<WriteJob>,
        shutdown: Receiver<()>,
    ) {
        let state = Arc::clone(&self.state);
        let dir = self.dir.clone();
        let spawned = thread::Builder::new()
            .name("netkv-file-worker".to_string())
            .spawn(move || worker_loop(state, dir, interval, jobs, shutdown));

        if let Err(e) = spawned {
            tracing::error!("failed to spawn cache worker: {}", e);
        }
    }
}

fn worker_loop(
    state: Arc<Mutex<State>>,
    dir: PathBuf,
    interval: Duration,
    jobs: Receiver<WriteJob>,
    shutdown: Receiver<()>,
) {
    let ticker = tick(interval);
    let interval_nanos = interval.as_nanos() as i64;
    state.lock().last_tick = Instant::now();

    loop {
        select! {
            recv(shutdown) -> _ => {
                tracing::debug!("cache worker stopped");
                return;
            }
            recv(ticker) -> _ => {
                sweep(&state, &dir, interval_nanos);
            }
            recv(jobs) -> job => {
                let Ok(job) = job else {
                    return;
                };
                let result = write_value(&dir, &job.shard, &job.key, &job.value);
                let _ = job.done.send(result);
            }
        }
    }
}

/// One eviction pass: decrement every TTL by the tick interval and drop
/// entries at or below zero, removing their value files.
fn sweep(state: &Mutex<State>, dir: &Path, interval_nanos: i64) {
    let mut state = state.lock();
    let removed = state.index.delete_if(&mut |entry: &mut FileEntry| {
        entry.ttl -= interval_nanos;
        if entry.ttl > 0 {
            return false;
        }
        if let Err(e) = delete_value(dir, &entry.shard, &entry.key) {
            tracing::warn!("failed to remove expired value file for '{}': {}", entry.key, e);
        }
        true
    });
    state.last_tick = Instant::now();
    if removed > 0 {
        tracing::debug!("evicted {} expired entries", removed);
    }
}

fn write_value(dir: &Path, shard: &str, key: &str, value: &[u8]) -> Result<()> {
    let shard_dir = dir.join(shard);
    fs::create_dir_all(&shard_dir)?;
    fs::write(shard_dir.join(key), value)?;
    Ok(())
}

fn read_value(dir: &Path, shard: &str, key: &str) -> Result<Vec<u8>> {
    Ok(fs::read(dir.join(shard).join(key))?)
}

/// Remove a value file; prune the shard directory if it became empty.
/// A file already gone is not an error.
fn delete_value(dir: &Path, shard: &str, key: &str) -> Result<()> {
    let shard_dir = dir.join(shard);
    match fs::remove_file(shard_dir.join(key)) {
        Ok(()) => remove_if_empty(&shard_dir),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn remove_if_empty(shard_dir: &Path) -> Result<()> {
    if fs::read_dir(shard_dir)?.next().is_none() {
        fs::remove_dir(shard_dir)?;
    }
    Ok(())
}

impl Cache for FileCache {
    fn run(&self, interval: Duration) {
        let (job_tx, job_rx) = bounded(WRITE_QUEUE_DEPTH);
        let (shutdown_tx, shutdown_rx) = bounded(0);
        *self.queue.lock() = Some(job_tx);
        *self.shutdown.lock() = Some(shutdown_tx);
        self.spawn_worker(interval, job_rx, shutdown_rx);
    }

    fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<bool> {
        let entry = FileEntry::new(key, ttl)?;

        let Some(queue) = self.queue.lock().clone() else {
            return Err(NetKvError::NotRunning);
        };

        let (done_tx, done_rx) = bounded(1);
        queue
            .send(WriteJob {
                shard: entry.shard.clone(),
                key: entry.key.clone(),
                value,
                done: done_tx,
            })
            .map_err(|_| NetKvError::NotRunning)?;

        // Block until the worker has written the value file.
        done_rx.recv().map_err(|_| NetKvError::NotRunning)??;

        let mut state = self.state.lock();
        Ok(state.index.insert(entry))
    }

    fn get(&self, key: &str) -> Result<(Vec<u8>, Duration)> {
        let probe = FileEntry::probe(key);
        let mut state = self.state.lock();

        let (shard, ttl) = match state.index.search(&probe) {
            Some(entry) => (entry.shard.clone(), entry.ttl),
            None => return Err(NetKvError::NotFound),
        };

        let value = match read_value(&self.dir, &shard, key) {
            Ok(value) => value,
            Err(NetKvError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                // The value file disappeared out from under the index.
                state.index.delete(&probe);
                return Err(NetKvError::NotFound);
            }
            Err(e) => return Err(e),
        };

        let elapsed = state.last_tick.elapsed().as_nanos() as i64;
        let remaining = ttl - elapsed;
        if remaining <= 0 {
            state.index.delete(&probe);
            if let Err(e) = delete_value(&self.dir, &shard, key) {
                tracing::warn!("failed to remove expired value file for '{}': {}", key, e);
            }
            return Err(NetKvError::NotFound);
        }

        Ok((value, Duration::from_nanos(remaining as u64)))
    }

    fn delete(&self, key: &str) -> Result<bool> {
        let probe = FileEntry::probe(key);
        let mut state = self.state.lock();

        let shard = match state.index.search(&probe) {
            Some(entry) => entry.shard.clone(),
            None => return Err(NetKvError::NotFound),
        };

        delete_value(&self.dir, &shard, key)?;
        state.index.delete(&probe);
        Ok(true)
    }

    fn clear(&self) -> Result<()> {
        let mut state = self.state.lock();

        let mut failures = 0usize;
        state.index.traverse(|entry| {
            if let Err(e) = delete_value(&self.dir, &entry.shard, &entry.key) {
                tracing::warn!("failed to remove value file for '{}': {}", entry.key, e);
                failures += 1;
            }
        });
        state.index.clear();

        if failures > 0 {
            return Err(NetKvError::Clear(failures));
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let state = self.state.lock();
        let mut keys = Vec::with_capacity(state.index.len());
        state.index.traverse(|entry| keys.push(entry.key.clone()));
        keys
    }

    fn has(&self, key: &str) -> (Duration, bool) {
        let probe = FileEntry::probe(key);
        let mut state = self.state.lock();

        let (shard, ttl) = match state.index.search(&probe) {
            Some(entry) => (entry.shard.clone(), entry.ttl),
            None => return (Duration::ZERO, false),
        };

        let elapsed = state.last_tick.elapsed().as_nanos() as i64;
        let remaining = ttl - elapsed;
        if remaining <= 0 {
            state.index.delete(&probe);
            if let Err(e) = delete_value(&self.dir, &shard, key) {
                tracing::warn!("failed to remove expired value file for '{}': {}", key, e);
            }
            return (Duration::ZERO, false);
        }

        (Duration::from_nanos(remaining as u64), true)
    }

    fn len(&self) -> usize {
        self.state.lock().index.len()
    }

    fn close(&self) {
        // Dropping both senders disconnects the worker's channels.
        self.queue.lock().take();
        self.shutdown.lock().take();
    }

    fn dump(&self) -> Result<Vec<u8>> {
        let state = self.state.lock();
        let mut records = Vec::with_capacity(state.index.len());
        state.index.traverse(|entry| {
            records.push(SnapshotRecord {
                key: entry.key.clone(),
                ttl: entry.ttl,
                value: None,
            });
        });
        snapshot::encode(&Snapshot { records })
    }

    /// Restore the index from a dump, then verify it against the on-disk
    /// state: entries whose value files are missing are pruned and reported
    /// together in one `Integrity` error. Surviving entries stay loaded.
    fn load(&self, bytes: &[u8]) -> Result<()> {
        let snapshot = snapshot::decode(bytes)?;
        let mut state = self.state.lock();

        state.index.clear();
        let mut missing = Vec::new();
        for record in snapshot.records {
            let entry = FileEntry {
                shard: super::key_hash(&record.key).to_string(),
                key: record.key,
                ttl: record.ttl,
            };
            let (_, file) = entry.paths(&self.dir);
            if file.is_file() {
                state.index.insert(entry);
            } else {
                missing.push(entry.key);
            }
        }
        state.last_tick = Instant::now();

        if !missing.is_empty() {
            return Err(NetKvError::Integrity(missing));
        }
        Ok(())
    }
}
