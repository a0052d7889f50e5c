//! Content-addressed cache for resolved configurations.
//!
//! Keys are derived from the content being resolved, so concurrent writers
//! can only race on identical values; duplicate writes are benign
//! (last-writer-wins). Entries live for the owner's lifetime.

use std::sync::Mutex;

use rustc_hash::FxHashMap;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a value's canonical (key-sorted) serialization.
pub fn content_key(value: &Value) -> String {
    let canonical = value.to_string();
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Default)]
pub struct ConfigCache {
    entries: Mutex<FxHashMap<String, Value>>,
}

impl ConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    pub fn insert(&self, key: String, value: Value) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
