//! Thread handles
//!
//! A thread is a shared feed addressed independently of the space that joins
//! it. The message protocol (posting, moderation, membership enforcement)
//! lives in the engine; this crate only constructs handles, resolves their
//! addresses, and loads them so the space can track and subscribe to them.

use crate::core_log::LogStore;
use crate::core_space::errors::{SpaceError, SpaceResult};
use crate::core_space::types::ThreadAddress;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Handle to a joined thread feed
pub struct Thread {
    store: Arc<dyn LogStore>,
    name: String,
    space_name: String,
    members_only: bool,
    root_mod: Option<String>,
    address: RwLock<Option<ThreadAddress>>,
}

impl Thread {
    pub fn new(
        store: Arc<dyn LogStore>,
        name: impl Into<String>,
        space_name: impl Into<String>,
        members_only: bool,
        root_mod: Option<String>,
    ) -> Self {
        Thread {
            store,
            name: name.into(),
            space_name: space_name.into(),
            members_only,
            root_mod,
            address: RwLock::new(None),
        }
    }

    /// Bind the handle to its feed and return the resolved address
    ///
    /// With `known` the handle attaches to an existing feed; without it the
    /// address is derived from the `<space>.<thread>` dbname, so every member
    /// resolving the same named thread lands on the same feed.
    pub async fn load(&self, known: Option<ThreadAddress>) -> SpaceResult<ThreadAddress> {
        let address = match known {
            Some(addr) => addr,
            None => {
                let db_name = format!("{}.{}", self.space_name, self.name);
                let root = bs58::encode(Sha256::digest(db_name.as_bytes())).into_string();
                ThreadAddress::new(root, db_name)?
            }
        };
        self.store.load().await?;
        if let Err(e) = self.store.sync(None).await {
            tracing::warn!(thread = %self.name, error = %e, "thread sync failed");
        }
        *self.address.write().await = Some(address.clone());
        tracing::debug!(thread = %self.name, address = %address, "thread loaded");
        Ok(address)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members_only(&self) -> bool {
        self.members_only
    }

    pub fn root_mod(&self) -> Option<&str> {
        self.root_mod.as_deref()
    }

    /// Resolved address; errors until [`load`](Self::load) has run
    pub async fn address(&self) -> SpaceResult<ThreadAddress> {
        self.address.read().await.clone().ok_or_else(|| {
            SpaceError::InvalidState(format!("thread {} is not loaded", self.name))
        })
    }
}

impl std::fmt::Debug for Thread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Thread")
            .field("name", &self.name)
            .field("space_name", &self.space_name)
            .field("members_only", &self.members_only)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_log::MemoryLogStore;

    fn thread(name: &str) -> Thread {
        Thread::new(
            Arc::new(MemoryLogStore::new(name, "alice")),
            name,
            "notes",
            false,
            None,
        )
    }

    #[tokio::test]
    async fn test_load_derives_stable_address() {
        let t = thread("chat");
        let a1 = t.load(None).await.unwrap();
        let a2 = t.load(None).await.unwrap();
        assert_eq!(a1, a2);
        assert_eq!(a1.db_name(), "notes.chat");
        assert!(a1.belongs_to("notes"));
    }

    #[tokio::test]
    async fn test_load_with_known_address() {
        let t = thread("chat");
        let known: ThreadAddress = format!("/logspace/{}/notes.chat", "3".repeat(44))
            .parse()
            .unwrap();
        let resolved = t.load(Some(known.clone())).await.unwrap();
        assert_eq!(resolved, known);
        assert_eq!(t.address().await.unwrap(), known);
    }

    #[test]
    fn test_debug_skips_store_handle() {
        let t = thread("chat");
        let rendered = format!("{:?}", t);
        assert!(rendered.contains("chat"));
        assert!(rendered.contains("notes"));
        assert!(!rendered.contains("store"));
    }

    #[tokio::test]
    async fn test_address_before_load_errors() {
        let t = thread("chat");
        assert!(matches!(
            t.address().await,
            Err(SpaceError::InvalidState(_))
        ));
    }
}
