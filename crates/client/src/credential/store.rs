// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable key-value storage for credentials, with atomic file writes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::credential::{TokenPair, TOKENS_KEY};

/// Minimal key-value contract the credential layer persists through.
///
/// Write failures are logged and swallowed: losing a persisted pair
/// degrades to "logged out on next start", never to a request failure.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// Load the stored pair. Malformed or missing JSON reads as "no credentials".
pub fn load_pair(store: &dyn KeyValueStore) -> Option<TokenPair> {
    let raw = store.get(TOKENS_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(pair) => Some(pair),
        Err(err) => {
            tracing::warn!(err = %err, "stored credential pair is malformed, ignoring");
            None
        }
    }
}

/// Serialize and store the pair.
pub fn save_pair(store: &dyn KeyValueStore, pair: &TokenPair) {
    match serde_json::to_string(pair) {
        Ok(json) => store.set(TOKENS_KEY, &json),
        Err(err) => tracing::warn!(err = %err, "failed to serialize credential pair"),
    }
}

/// Remove the stored pair.
pub fn clear_pair(store: &dyn KeyValueStore) {
    store.remove(TOKENS_KEY);
}

/// File-backed store: one JSON file per key under a state directory.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        std::fs::read_to_string(self.path_for(key)).ok()
    }

    /// Atomic write (tmp + rename).
    ///
    /// Temp filenames carry the PID and a counter so concurrent saves never
    /// share a `.tmp` path; a shorter write racing a longer one on the same
    /// file would leave trailing bytes.
    fn set(&self, key: &str, value: &str) {
        use std::sync::atomic::{AtomicU32, Ordering};
        static COUNTER: AtomicU32 = AtomicU32::new(0);

        if !self.dir.exists() {
            if let Err(err) = std::fs::create_dir_all(&self.dir) {
                tracing::warn!(err = %err, "failed to create state dir");
                return;
            }
        }
        let path = self.path_for(key);
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(
            "{}.{}.{}.tmp",
            path.file_name().unwrap_or_default().to_string_lossy(),
            std::process::id(),
            seq,
        );
        let tmp_path = path.with_file_name(tmp_name);
        let result =
            std::fs::write(&tmp_path, value).and_then(|()| std::fs::rename(&tmp_path, &path));
        if let Err(err) = result {
            tracing::warn!(err = %err, key, "failed to persist store entry");
        }
    }

    fn remove(&self, key: &str) {
        if let Err(err) = std::fs::remove_file(self.path_for(key)) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(err = %err, key, "failed to remove store entry");
            }
        }
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
