//! Server-Client Integration Tests
//!
//! End-to-end tests spanning the server accept loop, the dispatch matrix,
//! the cache engines, and the pooled client.

use std::net::TcpStream;
use std::sync::Arc;
use std::thread;
use std::thread::sleep;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use netkv::error::NetKvError;
use netkv::{Cache, Client, Config, FileCache, Server};

fn start_server(port: u16, cache: Arc<dyn Cache>, timeout: Duration) {
    let config = Config::builder()
        .address("127.0.0.1")
        .port(port)
        .timeout(timeout)
        .build();
    let server = Server::new(config, cache);
    thread::spawn(move || {
        let _ = server.run();
    });
    wait_for_listener(port);
}

fn wait_for_listener(port: u16) {
    for _ in 0..100 {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return;
        }
        sleep(Duration::from_millis(50));
    }
    panic!("server did not start on port {}", port);
}

// =============================================================================
// Typed End-to-End Test
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TestItem {
    value: String,
    keyable: String,
}

#[test]
fn test_end_to_end_typed_round_trip() {
    let dir = TempDir::new().unwrap();
    let cache: Arc<dyn Cache> = Arc::new(FileCache::new(dir.path()));
    start_server(13323, cache, Duration::from_secs(1));

    let client = Client::connect("127.0.0.1:13323", Duration::from_secs(1), 5).unwrap();

    let items: Vec<(String, TestItem)> = (1..=5)
        .map(|i| {
            let key = format!("key{}", i);
            let item = TestItem {
                value: format!("value{}", i),
                keyable: key.clone(),
            };
            (key, item)
        })
        .collect();

    // Set, then get into the typed destination.
    for (key, item) in &items {
        client.set(key, item, Duration::from_secs(5)).unwrap();
    }
    for (key, item) in &items {
        let (got, ttl): (TestItem, Duration) = client.get(key).unwrap();
        assert_eq!(&got, item, "value mismatch for {}", key);
        assert!(ttl > Duration::ZERO && ttl <= Duration::from_secs(5));
    }

    // Delete each key; subsequent gets error.
    for (key, _) in &items {
        client.delete(key).unwrap();
    }
    for (key, _) in &items {
        let result: netkv::Result<(TestItem, Duration)> = client.get(key);
        assert!(result.is_err(), "item not deleted {}", key);
    }

    // Re-set, then list keys.
    for (key, item) in &items {
        client.set(key, item, Duration::from_secs(5)).unwrap();
    }
    let keys = client.keys().unwrap();
    for (key, _) in &items {
        assert!(keys.contains(key), "key not found {}", key);
    }

    assert!(client.has("key1").unwrap());
    assert!(!client.has("unknown-key").unwrap());

    // Past the TTL every get errors.
    sleep(Duration::from_secs(6));
    for (key, _) in &items {
        let result: netkv::Result<(TestItem, Duration)> = client.get(key);
        assert!(result.is_err(), "item not expired {}", key);
    }

    client.clear().unwrap();
}

#[test]
fn test_server_error_frame_surfaces_to_caller() {
    let dir = TempDir::new().unwrap();
    let cache: Arc<dyn Cache> = Arc::new(FileCache::new(dir.path()));
    start_server(13324, cache, Duration::from_secs(1));

    let client = Client::connect("127.0.0.1:13324", Duration::from_secs(1), 2).unwrap();

    match client.get_raw("missing-key") {
        Err(NetKvError::Server(message)) => assert!(message.contains("not found")),
        other => panic!("expected server error, got {:?}", other),
    }

    // TTL rejections travel back the same way.
    match client.set_raw("somekey", b"v".to_vec(), Duration::from_millis(100)) {
        Err(NetKvError::Server(message)) => assert!(message.contains("too short")),
        other => panic!("expected server error, got {:?}", other),
    }
}

// =============================================================================
// Per-request Timeout Test
// =============================================================================

/// A cache whose reads stall, standing in for a wedged engine
struct SlowCache;

impl Cache for SlowCache {
    fn run(&self, _interval: Duration) {}

    fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> netkv::Result<bool> {
        Ok(true)
    }

    fn get(&self, _key: &str) -> netkv::Result<(Vec<u8>, Duration)> {
        sleep(Duration::from_secs(2));
        Ok((b"late".to_vec(), Duration::from_secs(1)))
    }

    fn delete(&self, _key: &str) -> netkv::Result<bool> {
        Ok(true)
    }

    fn clear(&self) -> netkv::Result<()> {
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        Vec::new()
    }

    fn has(&self, _key: &str) -> (Duration, bool) {
        (Duration::ZERO, false)
    }

    fn len(&self) -> usize {
        0
    }

    fn close(&self) {}

    fn dump(&self) -> netkv::Result<Vec<u8>> {
        Ok(Vec::new())
    }

    fn load(&self, _bytes: &[u8]) -> netkv::Result<()> {
        Ok(())
    }
}

#[test]
fn test_request_deadline_terminates_session() {
    start_server(13377, Arc::new(SlowCache), Duration::from_millis(50));

    let client = Client::connect("127.0.0.1:13377", Duration::from_millis(500), 1).unwrap();

    // The server abandons the stalled dispatch after 50 ms and never
    // replies; the client's read on that connection fails.
    assert!(client.get_raw("slowkey").is_err());

    // The pool replaced the dead connection; fast operations still work.
    client.set_raw("somekey", b"v".to_vec(), Duration::from_secs(5)).unwrap();
}
