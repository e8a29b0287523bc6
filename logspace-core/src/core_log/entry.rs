//! Collaborator contract for the replicated log engine
//!
//! The engine is an external system: content-addressed, append-only and
//! eventually consistent across peers. This crate only depends on the
//! interface below; conflict resolution, peer sync and persistence are the
//! engine's concern.

use crate::core_space::errors::SpaceResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Content address of an opened store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoreAddress(String);

impl StoreAddress {
    pub fn new(address: impl Into<String>) -> Self {
        StoreAddress(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata the engine attaches to every appended entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    /// Identity of the writer, as reported by the engine
    pub writer: String,

    /// Engine-assigned timestamp (milliseconds)
    pub timestamp: i64,

    /// Content hash of the entry
    pub entry_hash: String,
}

/// An immutable record appended to the underlying log
///
/// `key` is the physical key as written to the engine; views translate it
/// back to a logical key. Entries are never mutated here: decoding produces
/// new records.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub key: String,
    pub value: Value,
    pub meta: EntryMetadata,
}

/// Storage-layout hints passed through to the engine on writes
#[derive(Debug, Clone, Copy, Default)]
pub struct PutOptions {
    /// Do not chain this entry for fast lookup; the record still replicates,
    /// it just need not participate in the engine's lookup index
    pub no_link: bool,
}

/// Key-value surface of one replicated log store
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Open the store and return its content address. Idempotent.
    async fn load(&self) -> SpaceResult<StoreAddress>;

    /// Replay peer state. `num_entries_hint`, when supplied, lets the engine
    /// pick a fast path over a full replay.
    async fn sync(&self, num_entries_hint: Option<usize>) -> SpaceResult<()>;

    /// Current value for a physical key, or `None` if absent
    async fn get(&self, key: &str) -> SpaceResult<Option<LogEntry>>;

    /// Append one entry. Returns once the write is durable in the local log;
    /// peer replication happens asynchronously.
    async fn put(&self, key: &str, value: Value, opts: PutOptions) -> SpaceResult<()>;

    /// Append several entries in input order. Engines with a native batch
    /// primitive should override; the default appends sequentially.
    async fn put_batch(&self, pairs: Vec<(String, Value)>, opts: PutOptions) -> SpaceResult<()> {
        for (key, value) in pairs {
            self.put(&key, value, opts).await?;
        }
        Ok(())
    }

    /// Delete via the engine's own tombstone primitive. No-op when absent.
    async fn remove(&self, key: &str) -> SpaceResult<()>;

    /// Materialized current state: one entry per live physical key
    async fn entries(&self) -> SpaceResult<Vec<LogEntry>>;

    /// Full ordered history of appended entries, superseded values included
    async fn log_entries(&self) -> SpaceResult<Vec<LogEntry>>;
}

/// Shared root registry feed where spaces announce their store addresses
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Most recent entries, newest last, up to `limit`
    async fn entries(&self, limit: usize) -> SpaceResult<Vec<Value>>;

    /// Append a registry record
    async fn add(&self, value: Value) -> SpaceResult<()>;
}
