//! In-process log engine
//!
//! Deterministic, single-process implementation of [`LogStore`] and
//! [`RegistryStore`]: an append-only history vector plus a materialized map
//! with tombstone removal. There is no peer replication; `sync` completes
//! against local state. Used by the test suites and by embedders that want
//! space semantics without a networked engine.

use super::entry::{EntryMetadata, LogEntry, LogStore, PutOptions, RegistryStore, StoreAddress};
use crate::core_space::errors::{SpaceError, SpaceResult};
use async_trait::async_trait;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

struct Inner {
    /// Every appended entry, in append order
    history: Vec<LogEntry>,

    /// Physical key -> index into `history` of the live value
    current: HashMap<String, usize>,

    /// Keys removed via the tombstone primitive
    tombstones: HashSet<String>,

    /// Monotonic append counter, doubles as the timestamp source
    seq: i64,
}

/// In-memory append-only log store
pub struct MemoryLogStore {
    name: String,
    writer: String,
    inner: RwLock<Inner>,
}

impl MemoryLogStore {
    /// Create a store for `name`, attributing writes to `writer`
    pub fn new(name: impl Into<String>, writer: impl Into<String>) -> Self {
        MemoryLogStore {
            name: name.into(),
            writer: writer.into(),
            inner: RwLock::new(Inner {
                history: Vec::new(),
                current: HashMap::new(),
                tombstones: HashSet::new(),
                seq: 0,
            }),
        }
    }

    /// Content address derived from the store name
    pub fn address(&self) -> StoreAddress {
        let root = bs58::encode(Sha256::digest(self.name.as_bytes())).into_string();
        StoreAddress::new(format!("/logspace/{}/{}", root, self.name))
    }

    /// Overwrite the stored payload of the live entry for `key`, bypassing
    /// the write path. Tampering hook for corruption tests.
    pub async fn corrupt_value(&self, key: &str, value: Value) -> bool {
        let mut inner = self.inner.write().await;
        match inner.current.get(key).copied() {
            Some(idx) => {
                inner.history[idx].value = value;
                true
            }
            None => false,
        }
    }

    fn metadata(&self, key: &str, value: &Value, seq: i64) -> EntryMetadata {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        hasher.update(value.to_string().as_bytes());
        hasher.update(seq.to_be_bytes());
        EntryMetadata {
            writer: self.writer.clone(),
            timestamp: seq,
            entry_hash: hex::encode(hasher.finalize()),
        }
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn load(&self) -> SpaceResult<StoreAddress> {
        Ok(self.address())
    }

    async fn sync(&self, num_entries_hint: Option<usize>) -> SpaceResult<()> {
        // No peers in-process; local state is already the full replay.
        tracing::debug!(store = %self.name, hint = ?num_entries_hint, "memory store sync");
        Ok(())
    }

    async fn get(&self, key: &str) -> SpaceResult<Option<LogEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.current.get(key).map(|&idx| inner.history[idx].clone()))
    }

    async fn put(&self, key: &str, value: Value, _opts: PutOptions) -> SpaceResult<()> {
        if key.is_empty() {
            return Err(SpaceError::Store("empty physical key".to_string()));
        }
        let mut inner = self.inner.write().await;
        inner.seq += 1;
        let seq = inner.seq;
        let meta = self.metadata(key, &value, seq);
        let entry = LogEntry {
            key: key.to_string(),
            value,
            meta,
        };
        inner.history.push(entry);
        let idx = inner.history.len() - 1;
        inner.current.insert(key.to_string(), idx);
        inner.tombstones.remove(key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> SpaceResult<()> {
        let mut inner = self.inner.write().await;
        if inner.current.remove(key).is_some() {
            inner.tombstones.insert(key.to_string());
        }
        Ok(())
    }

    async fn entries(&self) -> SpaceResult<Vec<LogEntry>> {
        let inner = self.inner.read().await;
        let mut indices: Vec<usize> = inner.current.values().copied().collect();
        indices.sort_unstable();
        Ok(indices.iter().map(|&idx| inner.history[idx].clone()).collect())
    }

    async fn log_entries(&self) -> SpaceResult<Vec<LogEntry>> {
        let inner = self.inner.read().await;
        Ok(inner.history.clone())
    }
}

/// In-memory root registry feed
#[derive(Default)]
pub struct MemoryRegistry {
    entries: RwLock<Vec<Value>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryStore for MemoryRegistry {
    async fn entries(&self, limit: usize) -> SpaceResult<Vec<Value>> {
        let entries = self.entries.read().await;
        let start = entries.len().saturating_sub(limit);
        Ok(entries[start..].to_vec())
    }

    async fn add(&self, value: Value) -> SpaceResult<()> {
        self.entries.write().await.push(value);
        Ok(())
    }
}
