//! Write-through key-value store for statistics and the message archive
//!
//! The core never reads back from the store; restoring state is the
//! shell's business.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;
use serde::Serialize;

use crate::core::lock;
use crate::error::{Result, StationError};

/// Store key for session statistics
pub const STATS_KEY: &str = "stats";

/// Store key for the message archive
pub const MESSAGES_KEY: &str = "messages";

/// Durable key-value store (localStorage equivalent)
pub trait KeyValueStore: Send + Sync {
    fn put(&self, key: &str, value: &str) -> Result<()>;
}

/// Serialize `value` as JSON and store it under `key`
pub fn put_json<T: Serialize + ?Sized>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(|source| StationError::StoreSerialize {
        key: key.to_string(),
        source,
    })?;
    store.put(key, &json)
}

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct JsonDirStore {
    dir: PathBuf,
}

impl JsonDirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for JsonDirStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|source| StationError::StoreWrite {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path_for(key);
        std::fs::write(&path, value).map_err(|source| StationError::StoreWrite { path, source })
    }
}

/// In-memory store; the default when no directory is configured
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn put(&self, key: &str, value: &str) -> Result<()> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }
}
