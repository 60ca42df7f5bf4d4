//! # Configuration Namespace
//!
//! ## Responsibility
//! Process-wide mutable mapping from string key to string value. Populated
//! once by the bootstrap loader, rewritten every maintainer cycle by the row
//! projector, and read at arbitrary times by the HTTP front door.
//!
//! ## Guarantees
//! - Thread-safe: every handle is `Send + Sync` and cheap to clone
//! - Last-writer-wins on key collision; no deletion
//! - Individual reads and writes are race-free
//!
//! ## NOT Responsible For
//! - Transactional isolation across a projection pass. Readers may observe a
//!   partially-updated namespace while the projector is mid-cycle; the
//!   maintainer's own read-after-write ordering comes from its sequential
//!   cycle, not from this type.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Well-known namespace keys consumed by the daemon itself.
pub mod keys {
    /// Verbosity threshold override (numeric severity level).
    pub const LOG_LEVEL: &str = "LOG_LEVEL";
    /// Poll interval override, in whole seconds.
    pub const RELOAD_CONF: &str = "RELOAD_CONF";

    /// Store connection parameters, supplied by the bootstrap env file.
    pub const DB_HOST: &str = "DB_HOST";
    pub const DB_PORT: &str = "DB_PORT";
    pub const DB_USER: &str = "DB_USER";
    pub const DB_PASSWORD: &str = "DB_PASSWORD";
    pub const DB_NAME: &str = "DB_NAME";
}

/// Shared, injectable configuration namespace.
///
/// Cloning produces another handle to the same underlying map, so the
/// maintainer, the projector, and the HTTP handlers can each hold one
/// without any of them owning the namespace exclusively.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl ConfigStore {
    /// Create an empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the value for `key`, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .read()
            .ok()
            .and_then(|map| map.get(key).cloned())
    }

    /// Write `namespace[key] = value`, overwriting any existing entry.
    pub fn set(&self, key: &str, value: &str) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(key.to_string(), value.to_string());
        }
    }

    /// Number of entries currently in the namespace.
    pub fn len(&self) -> usize {
        self.inner.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Clone the full contents. Intended for status surfaces and tests, not
    /// for the hot path.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.inner
            .read()
            .map(|map| map.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty() {
        let store = ConfigStore::new();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(store.get("anything"), None);
    }

    #[test]
    fn test_set_then_get() {
        let store = ConfigStore::new();
        store.set("RELOAD_CONF", "30");
        assert_eq!(store.get("RELOAD_CONF").as_deref(), Some("30"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_last_writer_wins() {
        let store = ConfigStore::new();
        store.set("LOG_LEVEL", "20");
        store.set("LOG_LEVEL", "10");
        assert_eq!(store.get("LOG_LEVEL").as_deref(), Some("10"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clone_shares_underlying_map() {
        let store = ConfigStore::new();
        let handle = store.clone();
        store.set("A", "1");
        assert_eq!(handle.get("A").as_deref(), Some("1"));
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let store = ConfigStore::new();
        store.set("A", "1");
        let snap = store.snapshot();
        store.set("A", "2");
        assert_eq!(snap.get("A").map(String::as_str), Some("1"));
        assert_eq!(store.get("A").as_deref(), Some("2"));
    }

    #[test]
    fn test_concurrent_readers_and_writer() {
        let store = ConfigStore::new();
        let writer = store.clone();
        let t = std::thread::spawn(move || {
            for i in 0..1_000 {
                writer.set("counter", &i.to_string());
            }
        });
        for _ in 0..1_000 {
            // Any observed value must be a fully-written one.
            if let Some(v) = store.get("counter") {
                assert!(v.parse::<u32>().is_ok());
            }
        }
        t.join().expect("writer thread panicked");
        assert_eq!(store.get("counter").as_deref(), Some("999"));
    }
}
