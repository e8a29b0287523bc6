//! Public and private projections over the shared log
//!
//! Both views expose the same key-value surface and differ only in their
//! encoding policy: the public view writes plaintext under reversible
//! `pub_`-prefixed keys, the private view writes encrypted envelopes under
//! hashed `priv_`-prefixed keys. Policies are concrete types plugged into one
//! generic store, so the two views cannot drift apart structurally.

use super::codec::{self, Envelope};
use super::errors::{SpaceError, SpaceResult};
use super::key_transform;
use super::types::ValueWithMeta;
use crate::core_identity::SpaceKeyring;
use crate::core_log::{EntryMetadata, LogEntry, LogStore, PutOptions};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An immutable decoded record from one view's history
///
/// Always a new value; entries returned by the engine are never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEntry {
    /// Logical key (for private entries, recovered from the envelope)
    pub key: String,
    pub value: Value,
    pub meta: EntryMetadata,
}

/// Encoding policy of one view
pub trait ViewCodec: Send + Sync {
    /// Physical key for a logical key
    fn physical_key(&self, logical: &str) -> SpaceResult<String>;

    /// Stored payload for a logical key and value
    fn encode_value(&self, logical: &str, value: &Value) -> SpaceResult<Value>;

    /// Value of a payload fetched under this view's own physical key
    fn decode_current(&self, stored: &Value) -> SpaceResult<Value>;

    /// Decode an engine entry into this view's record.
    ///
    /// `Ok(None)` means the entry belongs to another view and is filtered;
    /// `Err` means the entry is this view's but cannot be decoded, which
    /// aborts the surrounding bulk read.
    fn decode_entry(&self, entry: &LogEntry) -> SpaceResult<Option<DecodedEntry>>;
}

/// Identity transform: plaintext values under reversible prefixed keys
pub struct PublicCodec;

impl ViewCodec for PublicCodec {
    fn physical_key(&self, logical: &str) -> SpaceResult<String> {
        key_transform::public_key(logical)
    }

    fn encode_value(&self, _logical: &str, value: &Value) -> SpaceResult<Value> {
        Ok(value.clone())
    }

    fn decode_current(&self, stored: &Value) -> SpaceResult<Value> {
        Ok(stored.clone())
    }

    fn decode_entry(&self, entry: &LogEntry) -> SpaceResult<Option<DecodedEntry>> {
        Ok(key_transform::public_logical_key(&entry.key).map(|logical| DecodedEntry {
            key: logical.to_string(),
            value: entry.value.clone(),
            meta: entry.meta.clone(),
        }))
    }
}

/// Hash-and-cipher transform: encrypted envelopes under one-way hashed keys
pub struct PrivateCodec {
    keyring: Arc<SpaceKeyring>,
    block_size: usize,
}

impl PrivateCodec {
    pub fn new(keyring: Arc<SpaceKeyring>, block_size: usize) -> Self {
        PrivateCodec { keyring, block_size }
    }
}

impl ViewCodec for PrivateCodec {
    fn physical_key(&self, logical: &str) -> SpaceResult<String> {
        key_transform::private_key(self.keyring.db_salt(), logical)
    }

    fn encode_value(&self, logical: &str, value: &Value) -> SpaceResult<Value> {
        let envelope = Envelope {
            key: logical.to_string(),
            value: value.clone(),
        };
        codec::encrypt_entry(&envelope, &self.keyring, self.block_size)
    }

    fn decode_current(&self, stored: &Value) -> SpaceResult<Value> {
        Ok(codec::decrypt_entry(stored, &self.keyring)?.value)
    }

    fn decode_entry(&self, entry: &LogEntry) -> SpaceResult<Option<DecodedEntry>> {
        if !key_transform::is_private_key(&entry.key) {
            return Ok(None);
        }
        // The envelope's stored key is authoritative; the physical key is a
        // one-way hash. A failed decrypt surfaces, never skips: silently
        // dropping would hide data corruption.
        let envelope = codec::decrypt_entry(&entry.value, &self.keyring)?;
        Ok(Some(DecodedEntry {
            key: envelope.key,
            value: envelope.value,
            meta: entry.meta.clone(),
        }))
    }
}

/// One view of a space's key-value data
pub struct SpaceStore<C: ViewCodec> {
    store: Arc<dyn LogStore>,
    codec: C,
}

/// Plaintext projection
pub type PublicView = SpaceStore<PublicCodec>;

/// Encrypted projection
pub type PrivateView = SpaceStore<PrivateCodec>;

impl<C: ViewCodec> SpaceStore<C> {
    pub fn new(store: Arc<dyn LogStore>, codec: C) -> Self {
        SpaceStore { store, codec }
    }

    /// Current value for a logical key, or `None` if absent
    pub async fn get(&self, key: &str) -> SpaceResult<Option<Value>> {
        let physical = self.codec.physical_key(key)?;
        match self.store.get(&physical).await? {
            Some(entry) => Ok(Some(self.codec.decode_current(&entry.value)?)),
            None => Ok(None),
        }
    }

    /// Current value together with the engine metadata of its entry
    pub async fn get_with_metadata(&self, key: &str) -> SpaceResult<Option<ValueWithMeta>> {
        let physical = self.codec.physical_key(key)?;
        match self.store.get(&physical).await? {
            Some(entry) => Ok(Some(ValueWithMeta {
                value: self.codec.decode_current(&entry.value)?,
                meta: entry.meta,
            })),
            None => Ok(None),
        }
    }

    /// Engine metadata only, without decoding the value
    pub async fn get_metadata(&self, key: &str) -> SpaceResult<Option<EntryMetadata>> {
        let physical = self.codec.physical_key(key)?;
        Ok(self.store.get(&physical).await?.map(|entry| entry.meta))
    }

    /// Write one entry. Returns once the write is durable in the local log.
    pub async fn set(&self, key: &str, value: Value) -> SpaceResult<()> {
        self.set_with_options(key, value, PutOptions::default()).await
    }

    pub(crate) async fn set_with_options(
        &self,
        key: &str,
        value: Value,
        opts: PutOptions,
    ) -> SpaceResult<()> {
        let physical = self.codec.physical_key(key)?;
        let encoded = self.codec.encode_value(key, &value)?;
        self.store.put(&physical, encoded, opts).await
    }

    /// Write several entries in input order, batched when the engine
    /// supports it
    pub async fn set_multiple(&self, keys: &[String], values: &[Value]) -> SpaceResult<()> {
        if keys.len() != values.len() {
            return Err(SpaceError::InvalidArgument(format!(
                "{} keys but {} values",
                keys.len(),
                values.len()
            )));
        }

        let mut pairs = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            let physical = self.codec.physical_key(key)?;
            let encoded = self.codec.encode_value(key, value)?;
            pairs.push((physical, encoded));
        }
        self.store.put_batch(pairs, PutOptions::default()).await
    }

    /// Delete via the engine's tombstone primitive. No-op when absent.
    pub async fn remove(&self, key: &str) -> SpaceResult<()> {
        let physical = self.codec.physical_key(key)?;
        self.store.remove(&physical).await
    }

    /// Full ordered history of this view's entries, decoded
    ///
    /// Entries of the other view are filtered out entirely; a decode failure
    /// aborts the whole read.
    pub async fn log(&self) -> SpaceResult<Vec<DecodedEntry>> {
        let mut decoded = Vec::new();
        for entry in self.store.log_entries().await? {
            if let Some(record) = self.codec.decode_entry(&entry)? {
                decoded.push(record);
            }
        }
        Ok(decoded)
    }

    /// Snapshot of logical key -> current value for every key in this view
    pub async fn all(&self) -> SpaceResult<HashMap<String, Value>> {
        let mut snapshot = HashMap::new();
        for entry in self.store.entries().await? {
            if let Some(record) = self.codec.decode_entry(&entry)? {
                snapshot.insert(record.key, record.value);
            }
        }
        Ok(snapshot)
    }

    /// Like [`all`](Self::all), with each value's engine metadata attached
    pub async fn all_with_metadata(&self) -> SpaceResult<HashMap<String, ValueWithMeta>> {
        let mut snapshot = HashMap::new();
        for entry in self.store.entries().await? {
            if let Some(record) = self.codec.decode_entry(&entry)? {
                snapshot.insert(
                    record.key,
                    ValueWithMeta {
                        value: record.value,
                        meta: record.meta,
                    },
                );
            }
        }
        Ok(snapshot)
    }
}
