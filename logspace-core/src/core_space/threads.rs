//! Thread registry
//!
//! Subscriptions live as ordinary public-view entries under
//! `thread-<address>` keys, so they replicate with the space itself. Joined
//! threads additionally get a cached [`Thread`] handle on the space.

use super::errors::{SpaceError, SpaceResult};
use super::space::Space;
use super::types::{ThreadAddress, ThreadSubscription};
use crate::core_thread::Thread;
use std::sync::Arc;

/// Public-view key prefix marking a thread subscription record
pub const THREAD_KEY_PREFIX: &str = "thread-";

/// Options for [`Space::join_thread`]
#[derive(Debug, Default, Clone)]
pub struct JoinThreadOptions {
    pub members_only: bool,
    pub root_mod: Option<String>,
    /// Skip the automatic subscription after joining
    pub no_auto_sub: bool,
}

/// Extra fields recorded by [`Space::subscribe_thread`]
#[derive(Debug, Default, Clone)]
pub struct SubscribeConfig {
    pub name: Option<String>,
    pub root_mod: Option<String>,
    pub members: Option<bool>,
}

fn subscription_key(address: &ThreadAddress) -> String {
    format!("{}{}", THREAD_KEY_PREFIX, address)
}

impl Space {
    /// Join a thread by short name or full address
    ///
    /// Returns the cached handle when the thread was already joined. A full
    /// address naming another space's thread is rejected with
    /// [`SpaceError::CrossSpace`] before any load is attempted. Unless
    /// `opts.no_auto_sub` is set, the joined thread is also subscribed.
    pub async fn join_thread(
        &self,
        name: &str,
        opts: JoinThreadOptions,
    ) -> SpaceResult<Arc<Thread>> {
        if let Some(thread) = self.threads.read().await.get(name) {
            return Ok(thread.clone());
        }

        let known = if name.starts_with('/') {
            let address = ThreadAddress::parse(name)?;
            if !address.belongs_to(&self.name) {
                return Err(SpaceError::CrossSpace {
                    address: address.to_string(),
                    space: self.name.clone(),
                });
            }
            Some(address)
        } else {
            None
        };

        let thread_name = match &known {
            Some(address) => address.thread_name().to_string(),
            None => name.to_string(),
        };
        let thread = Arc::new(Thread::new(
            self.store.clone(),
            thread_name,
            self.name.clone(),
            opts.members_only,
            opts.root_mod.clone(),
        ));
        let address = thread.load(known).await?;
        tracing::info!(space = %self.name, thread = %thread.name(), address = %address, "thread joined");

        self.threads
            .write()
            .await
            .insert(name.to_string(), thread.clone());

        if !opts.no_auto_sub {
            let config = SubscribeConfig {
                name: Some(thread.name().to_string()),
                root_mod: opts.root_mod,
                members: Some(opts.members_only),
            };
            self.subscribe_thread(&address.to_string(), config).await?;
        }

        Ok(thread)
    }

    /// Record a subscription to `address`, idempotently
    ///
    /// Waits for the background sync so the absence check runs against the
    /// fully replayed view.
    pub async fn subscribe_thread(
        &self,
        address: &str,
        config: SubscribeConfig,
    ) -> SpaceResult<()> {
        let address = ThreadAddress::parse(address)?;
        let public = self.public()?;
        self.await_synced().await?;

        let key = subscription_key(&address);
        if public.get(&key).await?.is_none() {
            let mut record = ThreadSubscription::from_address(&address);
            record.name = config.name;
            record.root_mod = config.root_mod;
            record.members = config.members;
            public.set(&key, serde_json::to_value(&record)?).await?;
            tracing::debug!(space = %self.name, address = %address, "thread subscribed");
        }
        Ok(())
    }

    /// Remove the subscription record for `address`; no-op when absent
    pub async fn unsubscribe_thread(&self, address: &str) -> SpaceResult<()> {
        let address = ThreadAddress::parse(address)?;
        let public = self.public()?;

        let key = subscription_key(&address);
        if public.get(&key).await?.is_some() {
            public.remove(&key).await?;
            tracing::debug!(space = %self.name, address = %address, "thread unsubscribed");
        }
        Ok(())
    }

    /// All well-formed subscription records in the public view
    ///
    /// `thread-` keys carrying a malformed or legacy address are excluded
    /// silently; such records are expected in old spaces and are not data
    /// corruption.
    pub async fn subscribed_threads(&self) -> SpaceResult<Vec<ThreadSubscription>> {
        let public = self.public()?;
        let snapshot = public.all().await?;

        let mut subscriptions = Vec::new();
        for (key, value) in snapshot {
            let Some(suffix) = key.strip_prefix(THREAD_KEY_PREFIX) else {
                continue;
            };
            if !ThreadAddress::is_valid(suffix) {
                tracing::debug!(space = %self.name, key = %key, "skipping legacy thread record");
                continue;
            }
            let record = match serde_json::from_value::<ThreadSubscription>(value) {
                Ok(record) => record,
                // The key itself carries a valid address; fall back to it
                // when the stored payload predates the current record shape.
                Err(_) => ThreadSubscription::from_address(&ThreadAddress::parse(suffix)?),
            };
            subscriptions.push(record);
        }
        subscriptions.sort_by(|a, b| a.address.cmp(&b.address));
        Ok(subscriptions)
    }
}
