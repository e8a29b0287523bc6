//! Space lifecycle
//!
//! A space is a named namespace owned by one identity, opened over one
//! underlying log store. `open()` drives the forward-only state machine:
//! request key material (with its consent signal), load the store, announce
//! the address in the shared root registry, construct the two views, then
//! sync against peers in the background and self-publish the identity proof
//! once replay completes. Local reads and writes work as soon as `open()`
//! returns; operations that depend on full replay await the sync signal.

use super::errors::{SpaceError, SpaceResult};
use super::types::LifecycleState;
use super::view::{PrivateCodec, PrivateView, PublicCodec, PublicView, SpaceStore};
use crate::config::SpaceConfig;
use crate::core_identity::IdentityProvider;
use crate::core_log::{LogStore, PutOptions, RegistryStore, StoreAddress};
use crate::core_thread::Thread;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

/// Reserved public key holding the space's signed identity proof
pub const PROOF_DID_KEY: &str = "proof_did";

/// Invoked during `open()` with whether user consent was newly required
pub type ConsentCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Construction-time options for a space
#[derive(Default, Clone)]
pub struct SpaceOptions {
    pub config: SpaceConfig,
    pub consent_callback: Option<ConsentCallback>,
}

/// A named storage namespace for one identity, backed by a replicated log
pub struct Space {
    pub(super) name: String,
    pub(super) config: SpaceConfig,
    pub(super) store: Arc<dyn LogStore>,
    registry: Arc<dyn RegistryStore>,
    pub(super) identity: Arc<dyn IdentityProvider>,
    consent_callback: Option<ConsentCallback>,

    state: RwLock<LifecycleState>,
    address: RwLock<Option<StoreAddress>>,
    public: OnceLock<Arc<PublicView>>,
    private: OnceLock<Arc<PrivateView>>,

    /// Active thread handles, keyed by the name they were joined under
    pub(super) threads: RwLock<HashMap<String, Arc<Thread>>>,

    sync_tx: watch::Sender<bool>,
    sync_rx: watch::Receiver<bool>,
    sync_task: Mutex<Option<JoinHandle<()>>>,

    /// First background-sync failure, kept so waiters can observe it
    sync_error: OnceLock<String>,
}

impl Space {
    /// Construct a space over its collaborators. Call [`open`](Self::open)
    /// before using the views.
    pub fn new(
        name: impl Into<String>,
        store: Arc<dyn LogStore>,
        registry: Arc<dyn RegistryStore>,
        identity: Arc<dyn IdentityProvider>,
        options: SpaceOptions,
    ) -> Arc<Self> {
        let (sync_tx, sync_rx) = watch::channel(false);
        Arc::new(Space {
            name: name.into(),
            config: options.config,
            store,
            registry,
            identity,
            consent_callback: options.consent_callback,
            state: RwLock::new(LifecycleState::Uninitialized),
            address: RwLock::new(None),
            public: OnceLock::new(),
            private: OnceLock::new(),
            threads: RwLock::new(HashMap::new()),
            sync_tx,
            sync_rx,
            sync_task: Mutex::new(None),
            sync_error: OnceLock::new(),
        })
    }

    /// Open the space: keyring, store load, registry announcement, views,
    /// background sync. Idempotent; a second call is a no-op.
    pub async fn open(self: &Arc<Self>) -> SpaceResult<()> {
        {
            let mut state = self.state.write().await;
            if *state != LifecycleState::Uninitialized {
                tracing::debug!(space = %self.name, state = %*state, "store already loaded");
                return Ok(());
            }
            *state = LifecycleState::Loading;
        }

        let consent_needed = self.identity.init_keyring_by_name(&self.name).await?;
        if let Some(callback) = &self.consent_callback {
            callback(consent_needed);
        }

        let address = self.store.load().await?;
        tracing::info!(space = %self.name, address = %address, "store loaded");
        self.register_address(&address).await?;
        *self.address.write().await = Some(address);

        let keyring = self.identity.keyring(&self.name).await?;
        let _ = self
            .public
            .set(Arc::new(SpaceStore::new(self.store.clone(), PublicCodec)));
        let _ = self.private.set(Arc::new(SpaceStore::new(
            self.store.clone(),
            PrivateCodec::new(keyring, self.config.pad_block_size),
        )));

        self.advance(LifecycleState::Syncing).await;

        let me = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Err(e) = me.run_sync().await {
                tracing::warn!(space = %me.name, error = %e, "background sync failed");
                let _ = me.sync_error.set(e.to_string());
            }
            let _ = me.sync_tx.send(true);
        });
        *self.sync_task.lock().await = Some(handle);

        Ok(())
    }

    async fn run_sync(&self) -> SpaceResult<()> {
        self.store.sync(self.config.sync_entry_hint).await?;
        self.publish_identity_proof().await?;
        self.advance(LifecycleState::Ready).await;
        tracing::info!(space = %self.name, "space ready");
        Ok(())
    }

    /// Wait until the background sync has completed
    ///
    /// Operations ordered after full replay (`subscribe_thread`,
    /// self-publication) await this; local `get`/`set` do not and may observe
    /// a partially-synced view. A failed sync surfaces here: the space stays
    /// in `Syncing` and the stored failure is returned instead of hanging.
    pub async fn await_synced(&self) -> SpaceResult<()> {
        let mut rx = self.sync_rx.clone();
        if !*rx.borrow() {
            // The sender lives on self, so changed() cannot fail before the
            // signal
            let _ = rx.changed().await;
        }
        match self.sync_error.get() {
            Some(msg) => Err(SpaceError::Store(format!("sync failed: {}", msg))),
            None => Ok(()),
        }
    }

    /// Announce this space's address in the shared root registry
    ///
    /// Skips re-adding when a scanned entry already mentions the address.
    /// An idempotence guard, not a uniqueness guarantee.
    async fn register_address(&self, address: &StoreAddress) -> SpaceResult<()> {
        let entries = self.registry.entries(self.config.registry_scan_limit).await?;
        let known = entries
            .iter()
            .any(|entry| entry.to_string().contains(address.as_str()));
        if !known {
            self.registry
                .add(json!({ "type": "space", "address": address.as_str() }))
                .await?;
            tracing::debug!(space = %self.name, address = %address, "address registered");
        }
        Ok(())
    }

    /// Publish a signed empty assertion under `proof_did` when absent
    ///
    /// Read-then-write-if-absent; a concurrent writer would produce the same
    /// logical fact, so the race is harmless. The entry carries the `no_link`
    /// layout hint: it need not be chained for fast lookup.
    async fn publish_identity_proof(&self) -> SpaceResult<()> {
        let public = self.public()?;
        if public.get(PROOF_DID_KEY).await?.is_none() {
            let token = self.identity.sign_jwt(json!({}), &self.name).await?;
            public
                .set_with_options(PROOF_DID_KEY, Value::String(token), PutOptions { no_link: true })
                .await?;
            tracing::debug!(space = %self.name, "identity proof published");
        }
        Ok(())
    }

    /// Forward-only state transition; regressions are ignored
    async fn advance(&self, next: LifecycleState) {
        let mut state = self.state.write().await;
        if next > *state {
            *state = next;
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Content address of the underlying store, known once opened
    pub async fn address(&self) -> Option<StoreAddress> {
        self.address.read().await.clone()
    }

    /// DID of the sub-identity owning this space
    pub async fn did(&self) -> SpaceResult<String> {
        self.identity.sub_did(&self.name).await
    }

    /// Plaintext view
    pub fn public(&self) -> SpaceResult<Arc<PublicView>> {
        self.public
            .get()
            .cloned()
            .ok_or_else(|| SpaceError::InvalidState(format!("space {} is not open", self.name)))
    }

    /// Encrypted view
    pub fn private(&self) -> SpaceResult<Arc<PrivateView>> {
        self.private
            .get()
            .cloned()
            .ok_or_else(|| SpaceError::InvalidState(format!("space {} is not open", self.name)))
    }
}
